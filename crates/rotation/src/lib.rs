//! # Rotation
//!
//! 轮转策略模块。
//!
//! 三种互斥的策略决定何时重新打开输出文件：
//! - [`WatchedPolicy`]: 每次写入前比较路径的 device+inode，文件被外部改名/删除后重新打开
//! - [`SignaledPolicy`]: 收到配置的信号后重新打开（信号只设置标记，由 relay 在两次写入之间处理）
//! - [`SizeCountPolicy`]: 写入字节数达到上限后按编号后缀滚动备份，再打开新文件
//!
//! [`Policy`] 根据配置构造具体策略。

mod policy;
mod signaled;
mod size_count;
mod watched;

pub use contracts::{RotationEvent, RotationPolicy, RotationReason};
pub use policy::Policy;
pub use signaled::{RotationTrigger, SignaledPolicy};
pub use size_count::{backup_path, SizeCountPolicy, SizeState};
pub use watched::{WatchState, WatchedPolicy};
