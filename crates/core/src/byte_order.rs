//! Byte order of multi-byte values

use serde::{Deserialize, Serialize};
use std::fmt;

/// Byte order of a multi-byte scalar in the stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ByteOrder {
    /// Least significant byte first
    #[default]
    #[serde(rename = "little", alias = "little-endian")]
    LittleEndian,
    /// Most significant byte first
    #[serde(rename = "big", alias = "big-endian")]
    BigEndian,
}

impl ByteOrder {
    /// Byte order of the host
    pub const fn native() -> Self {
        if cfg!(target_endian = "big") {
            ByteOrder::BigEndian
        } else {
            ByteOrder::LittleEndian
        }
    }

    /// Whether bytes must be reversed relative to little-endian
    pub const fn is_big(self) -> bool {
        matches!(self, ByteOrder::BigEndian)
    }
}

impl fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ByteOrder::LittleEndian => write!(f, "little-endian"),
            ByteOrder::BigEndian => write!(f, "big-endian"),
        }
    }
}
