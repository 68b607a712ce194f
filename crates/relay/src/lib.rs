//! # Relay
//!
//! 行转发模块。
//!
//! 负责：
//! - 从 ingestion 通道消费行
//! - 写入唯一的输出 sink
//! - 在两次写入之间应用轮转策略产生的 reopen

pub mod error;
pub mod metrics;
pub mod relay;
pub mod sinks;
pub mod stats;

pub use contracts::{LineSink, RotationPolicy};
pub use error::RelayError;
pub use metrics::{MetricsSnapshot, RelayMetrics};
pub use relay::{create_relay, Relay};
pub use sinks::{FileSink, FileSinkConfig};
pub use stats::RelayStats;
