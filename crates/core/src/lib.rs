//! Core types for the versioned binary structure codec
//!
//! This crate defines the foundational types shared by the stream and
//! engine layers:
//! - Version / VersionRange: fixed-point format versions and half-open ranges
//! - Ranged<V>: a declaration scoped to a version range
//! - ByteOrder: little/big endian selection
//! - StoreType / Primitive: the closed set of physical scalar encodings
//! - Error / SchemaError / ConversionError: error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod byte_order;
pub mod error;
pub mod primitive;
pub mod version;

pub use half::f16;
pub use uuid::Uuid;

pub use byte_order::ByteOrder;
pub use error::{ConversionError, Error, Result, SchemaError};
pub use primitive::{Primitive, StoreType};
pub use version::{find_overlap, Ranged, Version, VersionRange};
