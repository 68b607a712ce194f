//! Human readable byte sizes
//!
//! Grammar: `\s* <digits> \s* (kb|mb|gb)? \s*`, units are case-insensitive and
//! powers of 1024. A bare number is a byte count.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ContractError;

const KB: u64 = 1024;
const MB: u64 = 1024 * KB;
const GB: u64 = 1024 * MB;

/// A size in bytes parsed from a human string such as `"10 MB"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ByteSize(pub u64);

impl ByteSize {
    /// Size in bytes
    pub fn bytes(self) -> u64 {
        self.0
    }
}

impl FromStr for ByteSize {
    type Err = ContractError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = || ContractError::invalid_size(input);

        let trimmed = input.trim();
        let digits_end = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        if digits_end == 0 {
            return Err(invalid());
        }

        let (digits, rest) = trimmed.split_at(digits_end);
        let value: u64 = digits.parse().map_err(|_| invalid())?;

        let multiplier = match rest.trim_start().to_ascii_lowercase().as_str() {
            "" => 1,
            "kb" => KB,
            "mb" => MB,
            "gb" => GB,
            _ => return Err(invalid()),
        };

        value.checked_mul(multiplier).map(ByteSize).ok_or_else(invalid)
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            0 => write!(f, "0"),
            n if n % GB == 0 => write!(f, "{} gb", n / GB),
            n if n % MB == 0 => write!(f, "{} mb", n / MB),
            n if n % KB == 0 => write!(f, "{} kb", n / KB),
            n => write!(f, "{n}"),
        }
    }
}
