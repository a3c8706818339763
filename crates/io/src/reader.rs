//! Seekable byte-order-aware reader
//!
//! [`EndianReader`] wraps any `Read + Seek` source with a default byte order
//! and a text encoding. Every scalar read has two forms: `read_u32()` uses
//! the reader's default order, `read_u32_with(order)` uses an explicit one.
//!
//! Reads that run past the end of the source fail with
//! [`Error::EndOfStream`] carrying the position where the read started.

use crate::strategy::buffer::{self, Bufferable};
use crate::strategy::scalar::decode_scalar;
use crate::strategy::string::{self, StringEncoding};
use byteorder::{ByteOrder as _, BE, LE};
use encoding_rs::{Encoding, UTF_8};
use std::io::{self, Read, Seek, SeekFrom};
use vercodec_core::{f16, ByteOrder, Error, Primitive, Result, StoreType, Uuid};

/// Any seekable byte source
pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek + ?Sized> ReadSeek for T {}

/// Byte-order-aware reader over a seekable source
pub struct EndianReader<'a> {
    inner: Box<dyn ReadSeek + 'a>,
    byte_order: ByteOrder,
    encoding: &'static Encoding,
    strict_text: bool,
}

macro_rules! read_multi_byte {
    ($($name:ident, $with:ident, $ty:ty, $method:ident;)*) => {
        $(
            #[doc = concat!("Read a `", stringify!($ty), "` in the default byte order")]
            pub fn $name(&mut self) -> Result<$ty> {
                self.$with(self.byte_order)
            }

            #[doc = concat!("Read a `", stringify!($ty), "` in the given byte order")]
            pub fn $with(&mut self, order: ByteOrder) -> Result<$ty> {
                let mut buf = [0u8; std::mem::size_of::<$ty>()];
                self.read_exact(&mut buf)?;
                Ok(match order {
                    ByteOrder::LittleEndian => LE::$method(&buf),
                    ByteOrder::BigEndian => BE::$method(&buf),
                })
            }
        )*
    };
}

impl<'a> EndianReader<'a> {
    /// Wrap `inner` with UTF-8 text and lossy decoding
    pub fn new(inner: impl ReadSeek + 'a, byte_order: ByteOrder) -> Self {
        Self {
            inner: Box::new(inner),
            byte_order,
            encoding: UTF_8,
            strict_text: false,
        }
    }

    /// Set the text encoding used by string fields
    pub fn with_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Fail on malformed text instead of substituting replacement characters
    pub fn with_strict_text(mut self, strict: bool) -> Self {
        self.strict_text = strict;
        self
    }

    /// Default byte order
    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Change the default byte order
    pub fn set_byte_order(&mut self, byte_order: ByteOrder) {
        self.byte_order = byte_order;
    }

    /// Text encoding
    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    /// Whether malformed text is an error
    pub fn strict_text(&self) -> bool {
        self.strict_text
    }

    /// Current absolute position
    pub fn position(&mut self) -> Result<u64> {
        Ok(self.inner.stream_position()?)
    }

    /// Seek to an absolute position
    pub fn seek(&mut self, position: u64) -> Result<()> {
        self.inner.seek(SeekFrom::Start(position))?;
        Ok(())
    }

    /// Total length of the source
    pub fn len(&mut self) -> Result<u64> {
        let current = self.inner.stream_position()?;
        let end = self.inner.seek(SeekFrom::End(0))?;
        if end != current {
            self.inner.seek(SeekFrom::Start(current))?;
        }
        Ok(end)
    }

    /// Whether the source is empty
    pub fn is_empty(&mut self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Fill `buf` completely
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let position = self.position()?;
        self.inner.read_exact(buf).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => Error::EndOfStream {
                position,
                needed: buf.len(),
            },
            _ => Error::Io(e),
        })
    }

    /// Read exactly `count` bytes
    pub fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; count];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Read up to `max` bytes, stopping early at end of stream
    pub fn read_up_to(&mut self, max: usize) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(max.min(4096));
        (&mut self.inner).take(max as u64).read_to_end(&mut buf)?;
        Ok(buf)
    }

    /// Read a `u8`
    pub fn read_u8(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    /// Read an `i8`
    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    /// Read a one-byte boolean
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    read_multi_byte! {
        read_i16, read_i16_with, i16, read_i16;
        read_u16, read_u16_with, u16, read_u16;
        read_i32, read_i32_with, i32, read_i32;
        read_u32, read_u32_with, u32, read_u32;
        read_i64, read_i64_with, i64, read_i64;
        read_u64, read_u64_with, u64, read_u64;
        read_f32, read_f32_with, f32, read_f32;
        read_f64, read_f64_with, f64, read_f64;
    }

    /// Read a half-precision float in the reader's byte order
    pub fn read_f16(&mut self) -> Result<f16> {
        self.read_f16_with(self.byte_order)
    }

    /// Read a half-precision float in `order`
    pub fn read_f16_with(&mut self, order: ByteOrder) -> Result<f16> {
        Ok(f16::from_bits(self.read_u16_with(order)?))
    }

    /// Read a guid in the reader's byte order
    pub fn read_guid(&mut self) -> Result<Uuid> {
        self.read_guid_with(self.byte_order)
    }

    /// Read a guid in `order`
    pub fn read_guid_with(&mut self, order: ByteOrder) -> Result<Uuid> {
        let a = self.read_u32_with(order)?;
        let b = self.read_u16_with(order)?;
        let c = self.read_u16_with(order)?;
        let mut tail = [0u8; 8];
        self.read_exact(&mut tail)?;
        Ok(Uuid::from_fields(a, b, c, &tail))
    }

    /// Read a scalar of the given store type
    pub fn read_scalar(&mut self, store: StoreType, order: ByteOrder) -> Result<Primitive> {
        let mut buf = [0u8; StoreType::MAX_SIZE];
        let span = &mut buf[..store.size()];
        self.read_exact(span)?;
        Ok(decode_scalar(span, store, order))
    }

    /// Read a string using one of the string strategies
    pub fn read_string(&mut self, encoding: &StringEncoding, order: ByteOrder) -> Result<String> {
        string::read_string(self, encoding, order)
    }

    /// Read a null-terminated string with no length limit
    pub fn read_null_terminated(&mut self) -> Result<String> {
        string::read_string(
            self,
            &StringEncoding::NullTerminated { max_length: None },
            self.byte_order,
        )
    }

    /// Read a bufferable value
    pub fn read_bufferable<T: Bufferable>(&mut self, order: ByteOrder) -> Result<T> {
        let bytes = self.read_bytes(T::SIZE_OF)?;
        Ok(buffer::decode::<T>(&bytes, order))
    }

    /// Decode raw bytes into text using the reader's encoding
    pub(crate) fn decode_text(&self, bytes: &[u8], position: u64) -> Result<String> {
        string::decode_text(bytes, self.encoding, self.strict_text, position)
    }
}

impl std::fmt::Debug for EndianReader<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndianReader")
            .field("byte_order", &self.byte_order)
            .field("encoding", &self.encoding.name())
            .field("strict_text", &self.strict_text)
            .finish()
    }
}
