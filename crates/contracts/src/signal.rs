//! Signal table
//!
//! Maps accepted signal names to platform signal numbers. Only signals a process
//! can catch are listed, so `KILL` and `STOP` are rejected like any unknown name.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::ContractError;

/// A catchable OS signal that can trigger rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    Hup,
    Int,
    Quit,
    Usr1,
    Usr2,
    Term,
    Alrm,
    Chld,
    Pipe,
    Io,
    Winch,
}

const TABLE: &[(&str, SignalKind, libc::c_int)] = &[
    ("HUP", SignalKind::Hup, libc::SIGHUP),
    ("INT", SignalKind::Int, libc::SIGINT),
    ("QUIT", SignalKind::Quit, libc::SIGQUIT),
    ("USR1", SignalKind::Usr1, libc::SIGUSR1),
    ("USR2", SignalKind::Usr2, libc::SIGUSR2),
    ("TERM", SignalKind::Term, libc::SIGTERM),
    ("ALRM", SignalKind::Alrm, libc::SIGALRM),
    ("CHLD", SignalKind::Chld, libc::SIGCHLD),
    ("PIPE", SignalKind::Pipe, libc::SIGPIPE),
    ("IO", SignalKind::Io, libc::SIGIO),
    ("WINCH", SignalKind::Winch, libc::SIGWINCH),
];

impl SignalKind {
    /// All accepted signals
    pub fn all() -> impl Iterator<Item = SignalKind> {
        TABLE.iter().map(|(_, kind, _)| *kind)
    }

    // TABLE is declared in variant order.
    fn entry(self) -> &'static (&'static str, SignalKind, libc::c_int) {
        &TABLE[self as usize]
    }

    /// Short name without the `SIG` prefix, e.g. `"HUP"`
    pub fn name(self) -> &'static str {
        self.entry().0
    }

    /// Platform signal number
    pub fn raw(self) -> libc::c_int {
        self.entry().2
    }

    /// Whether the signal is also used to request a graceful shutdown
    pub fn is_shutdown(self) -> bool {
        matches!(self, SignalKind::Int | SignalKind::Term)
    }
}

impl FromStr for SignalKind {
    type Err = ContractError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let upper = input.trim().to_ascii_uppercase();
        let bare = upper.strip_prefix("SIG").unwrap_or(&upper);
        TABLE
            .iter()
            .find(|(name, _, _)| *name == bare)
            .map(|(_, kind, _)| *kind)
            .ok_or_else(|| ContractError::unknown_signal(input))
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SIG{}", self.name())
    }
}

impl Serialize for SignalKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for SignalKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}
