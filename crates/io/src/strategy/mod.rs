//! Codec strategies
//!
//! Pure conversions between byte spans and field values. Each strategy is
//! stateless; the stream helpers in [`EndianReader`](crate::EndianReader) and
//! [`EndianWriter`](crate::EndianWriter) delegate here.

pub mod buffer;
pub mod scalar;
pub mod string;

pub use buffer::Bufferable;
pub use scalar::{decode_scalar, encode_scalar};
pub use string::StringEncoding;
