//! # Contracts
//!
//! Frozen interface contracts shared by every rotator crate.
//! Business crates only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Rotation model
//! - A [`LineSink`] owns exactly one live output handle and can [`reopen`](LineSink::reopen) it
//! - A [`RotationPolicy`] observes writes and external stimuli and emits [`RotationEvent`]s
//! - The relay is the only writer; it applies rotation events between writes

mod config;
mod error;
mod identity;
mod policy;
mod signal;
mod sink;
mod size;

pub use config::*;
pub use error::*;
pub use identity::{FileIdentity, SinkState};
pub use policy::*;
pub use signal::SignalKind;
pub use sink::*;
pub use size::ByteSize;
