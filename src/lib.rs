//! Vercodec - declarative, versioned binary structure codec
//!
//! Types describe their on-disk layout once, per format version, and the
//! engine decodes and encodes them over any seekable stream.
//!
//! # Quick Start
//!
//! ```ignore
//! use vercodec::{ByteOrder, Declaration, EndianReader, SchemaRegistry, Structure, Version, VersionRange};
//!
//! #[derive(Default)]
//! struct Header {
//!     version: u16,
//!     flags: u32,
//! }
//!
//! impl Structure for Header {
//!     fn describe(decl: &mut Declaration<Self>) {
//!         decl.scalar("version", |h| &h.version, |h| &mut h.version)
//!             .offset(0)
//!             .version_number();
//!         decl.scalar("flags", |h| &h.flags, |h| &mut h.flags)
//!             .offset_in(VersionRange::below(Version::new(3)), 2)
//!             .offset_in(VersionRange::from(Version::new(3)), 4);
//!     }
//! }
//!
//! let mut reader = EndianReader::new(file, ByteOrder::LittleEndian);
//! let header: Header = vercodec::decode(&mut reader, 0, None)?;
//! ```
//!
//! # Architecture
//!
//! - `vercodec-core`: versions, ranges, store types and errors
//! - `vercodec-io`: endian-aware streams, field codec strategies, configuration
//! - `vercodec-engine`: declarations, layout resolution, the schema registry
//!   and the decode / encode orchestrator
//!
//! Everything needed to declare and codec a structure is re-exported here.

pub use vercodec_engine::*;
pub use vercodec_io::{
    Bufferable, ByteN4, CodecConfig, DecN4, Int16N4, PackedAxes, ReadSeek, SignMode, UInt16N4,
    Vector3, WriteSeek, CONFIG_FILE_NAME,
};

pub use vercodec_core::{find_overlap, Ranged};
