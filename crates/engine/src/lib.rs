//! Structure engine for the versioned binary structure codec
//!
//! This crate turns per-type layout declarations into decoders and encoders:
//! - schema: the `Structure` trait and its declaration model
//! - resolver: splits declarations into non-overlapping version layouts
//! - SchemaRegistry: lazily built, process-wide schema cache
//! - orchestrator: decode / populate / encode over seekable streams
//! - dynamic: runtime-typed dispatch for tag-selected record types
//!
//! The engine is the only component that knows about:
//! - Version selection and version-field detection
//! - Cursor repositioning after a structure (fixed size, data length)
//! - Recursion into nested structures

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod dynamic;
pub mod orchestrator;
pub mod registry;
mod resolver;
pub mod schema;

pub use dynamic::{encode_dyn, populate_dyn, StructureTable, StructureType};
pub use orchestrator::{decode, encode, populate, ReadObjectExt, WriteObjectExt};
pub use registry::SchemaRegistry;
pub use schema::{
    Declaration, FieldBuilder, FieldKind, FieldLayout, Scalar, Schema, Structure, VersionBuilder,
    VersionFieldBuilder, VersionLayout,
};

// Re-exported for `impl_scalar_enum!` and for declaring structures without
// depending on the lower crates directly.
pub use vercodec_core::{
    f16, ByteOrder, ConversionError, Error, Primitive, Result, SchemaError, StoreType, Uuid,
    Version, VersionRange,
};
pub use vercodec_io::{EndianReader, EndianWriter, StringEncoding};
