//! Stream layer for the versioned binary structure codec
//!
//! - EndianReader / EndianWriter: seekable streams with a default byte order
//! - strategy: scalar, string and bufferable codec strategies
//! - vectors: packed and normalised vector types
//! - CodecConfig: TOML-backed stream configuration

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod reader;
pub mod strategy;
pub mod vectors;
pub mod writer;

pub use config::{CodecConfig, CONFIG_FILE_NAME};
pub use reader::{EndianReader, ReadSeek};
pub use strategy::{Bufferable, StringEncoding};
pub use vectors::{ByteN4, DecN4, Int16N4, PackedAxes, SignMode, UInt16N4, Vector3};
pub use writer::{EndianWriter, WriteSeek};
