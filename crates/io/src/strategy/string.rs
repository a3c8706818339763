//! String strategies
//!
//! Three on-disk shapes are supported. All lengths are byte counts in the
//! stream's text encoding.
//!
//! | Variant | Decode | Encode |
//! |---------|--------|--------|
//! | `FixedLength` | read exactly `length` bytes, optionally strip trailing padding | truncate or pad to exactly `length` bytes |
//! | `NullTerminated` | read to the first `0x00`, or read `max_length` bytes and cut at the first `0x00` | write bytes plus terminator, or exactly `max_length` bytes zero-filled |
//! | `LengthPrefixed` | read an `i32` count then that many bytes | write the count then the bytes |
//!
//! Truncation never splits a character.

use crate::reader::EndianReader;
use crate::writer::EndianWriter;
use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use vercodec_core::{ByteOrder, Error, Result};

/// On-disk shape of a string field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StringEncoding {
    /// Always occupies exactly `length` bytes
    FixedLength {
        /// Byte length
        length: usize,
        /// Strip trailing padding and NUL characters on decode
        trim: bool,
        /// ASCII character used to pad short values on encode
        padding: char,
    },
    /// Terminated by a zero byte
    NullTerminated {
        /// When present, the field always occupies this many bytes
        max_length: Option<usize>,
    },
    /// Preceded by a 4-byte signed byte count in the field's byte order
    LengthPrefixed,
}

impl StringEncoding {
    /// Fixed-length string padded with spaces
    pub const fn fixed(length: usize) -> Self {
        StringEncoding::FixedLength {
            length,
            trim: false,
            padding: ' ',
        }
    }

    /// Whether the encoding's parameters are usable
    pub fn validate(&self) -> std::result::Result<(), &'static str> {
        match *self {
            StringEncoding::FixedLength { padding, .. } if !padding.is_ascii() => {
                Err("padding character must be ASCII")
            }
            StringEncoding::NullTerminated {
                max_length: Some(0),
            } => Err("maximum length must be positive"),
            _ => Ok(()),
        }
    }

    /// Byte order matters only for the length prefix
    pub fn is_order_sensitive(&self) -> bool {
        matches!(self, StringEncoding::LengthPrefixed)
    }
}

/// Read a string at the reader's current position
pub fn read_string(
    reader: &mut EndianReader<'_>,
    encoding: &StringEncoding,
    order: ByteOrder,
) -> Result<String> {
    let position = reader.position()?;
    match *encoding {
        StringEncoding::FixedLength {
            length,
            trim,
            padding,
        } => {
            let bytes = reader.read_bytes(length)?;
            let text = reader.decode_text(&bytes, position)?;
            if trim {
                Ok(text.trim_end_matches(|c: char| c == padding || c == '\0').to_string())
            } else {
                Ok(text)
            }
        }
        StringEncoding::NullTerminated {
            max_length: Some(max),
        } => {
            let bytes = reader.read_bytes(max)?;
            let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
            reader.decode_text(&bytes[..end], position)
        }
        StringEncoding::NullTerminated { max_length: None } => {
            let mut bytes = Vec::new();
            loop {
                let chunk = reader.read_up_to(64)?;
                if chunk.is_empty() {
                    break;
                }
                if let Some(end) = chunk.iter().position(|&b| b == 0) {
                    bytes.extend_from_slice(&chunk[..end]);
                    let consumed = bytes.len() as u64 + 1;
                    reader.seek(position + consumed)?;
                    break;
                }
                bytes.extend_from_slice(&chunk);
            }
            reader.decode_text(&bytes, position)
        }
        StringEncoding::LengthPrefixed => {
            let count = reader.read_i32_with(order)?;
            if count < 0 {
                return Err(Error::InvalidLength {
                    position,
                    value: count as i64,
                });
            }
            let bytes = reader.read_bytes(count as usize)?;
            reader.decode_text(&bytes, position)
        }
    }
}

/// Write a string at the writer's current position
pub fn write_string(
    writer: &mut EndianWriter<'_>,
    value: &str,
    encoding: &StringEncoding,
    order: ByteOrder,
) -> Result<()> {
    match *encoding {
        StringEncoding::FixedLength {
            length, padding, ..
        } => {
            let mut bytes = truncate_encoded(writer, value, length)?;
            let mut pad = [0u8; 4];
            let pad = padding.encode_utf8(&mut pad).as_bytes();
            while bytes.len() + pad.len() <= length {
                bytes.extend_from_slice(pad);
            }
            bytes.resize(length, 0);
            writer.write_bytes(&bytes)
        }
        StringEncoding::NullTerminated {
            max_length: Some(max),
        } => {
            let mut bytes = truncate_encoded(writer, value, max)?;
            bytes.resize(max, 0);
            writer.write_bytes(&bytes)
        }
        StringEncoding::NullTerminated { max_length: None } => {
            let mut bytes = writer.encode_text(value)?;
            bytes.push(0);
            writer.write_bytes(&bytes)
        }
        StringEncoding::LengthPrefixed => {
            let position = writer.position()?;
            let bytes = writer.encode_text(value)?;
            let count = i32::try_from(bytes.len()).map_err(|_| Error::InvalidLength {
                position,
                value: bytes.len() as i64,
            })?;
            writer.write_i32_with(count, order)?;
            writer.write_bytes(&bytes)
        }
    }
}

/// Encode `value`, dropping whole trailing characters until it fits in `limit` bytes
fn truncate_encoded(writer: &mut EndianWriter<'_>, value: &str, limit: usize) -> Result<Vec<u8>> {
    let bytes = writer.encode_text(value)?;
    if bytes.len() <= limit {
        return Ok(bytes);
    }
    for (end, _) in value.char_indices().rev() {
        let prefix = writer.encode_text(&value[..end])?;
        if prefix.len() <= limit {
            return Ok(prefix);
        }
    }
    Ok(Vec::new())
}

/// Decode text in `encoding`
///
/// Strict mode rejects malformed input; otherwise malformed sequences become U+FFFD.
pub fn decode_text(
    bytes: &[u8],
    encoding: &'static Encoding,
    strict: bool,
    position: u64,
) -> Result<String> {
    if strict {
        return encoding
            .decode_without_bom_handling_and_without_replacement(bytes)
            .map(Cow::into_owned)
            .ok_or(Error::InvalidText {
                position,
                encoding: encoding.name(),
            });
    }
    let (text, _) = encoding.decode_without_bom_handling(bytes);
    Ok(text.into_owned())
}

/// Encode text in `encoding`
///
/// Strict mode rejects characters the encoding cannot represent.
pub fn encode_text(
    value: &str,
    encoding: &'static Encoding,
    strict: bool,
    position: u64,
) -> Result<Vec<u8>> {
    let (bytes, _, had_errors) = encoding.encode(value);
    if strict && had_errors {
        return Err(Error::InvalidText {
            position,
            encoding: encoding.name(),
        });
    }
    Ok(bytes.into_owned())
}
