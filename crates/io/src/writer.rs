//! Seekable byte-order-aware writer
//!
//! Mirrors [`EndianReader`](crate::EndianReader). [`EndianWriter::seek_padded`]
//! zero-fills the gap when seeking beyond the current end of the sink, so a
//! structure that declares a fixed size always occupies it.

use crate::strategy::buffer::{self, Bufferable};
use crate::strategy::scalar::encode_scalar;
use crate::strategy::string::{self, StringEncoding};
use byteorder::{ByteOrder as _, BE, LE};
use encoding_rs::{Encoding, UTF_8};
use std::io::{self, Read, Seek, SeekFrom, Write};
use vercodec_core::{f16, ByteOrder, Primitive, Result, StoreType, Uuid};

/// Any seekable byte sink
pub trait WriteSeek: Write + Seek {}

impl<T: Write + Seek + ?Sized> WriteSeek for T {}

/// Byte-order-aware writer over a seekable sink
pub struct EndianWriter<'a> {
    inner: Box<dyn WriteSeek + 'a>,
    byte_order: ByteOrder,
    encoding: &'static Encoding,
    strict_text: bool,
}

macro_rules! write_multi_byte {
    ($($name:ident, $with:ident, $ty:ty, $method:ident;)*) => {
        $(
            #[doc = concat!("Write a `", stringify!($ty), "` in the default byte order")]
            pub fn $name(&mut self, value: $ty) -> Result<()> {
                self.$with(value, self.byte_order)
            }

            #[doc = concat!("Write a `", stringify!($ty), "` in the given byte order")]
            pub fn $with(&mut self, value: $ty, order: ByteOrder) -> Result<()> {
                let mut buf = [0u8; std::mem::size_of::<$ty>()];
                match order {
                    ByteOrder::LittleEndian => LE::$method(&mut buf, value),
                    ByteOrder::BigEndian => BE::$method(&mut buf, value),
                }
                self.write_bytes(&buf)
            }
        )*
    };
}

impl<'a> EndianWriter<'a> {
    /// Wrap `inner` with UTF-8 text and lossy encoding
    pub fn new(inner: impl WriteSeek + 'a, byte_order: ByteOrder) -> Self {
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

    /// Fail on unmappable characters instead of writing numeric references
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

    /// Current absolute position
    pub fn position(&mut self) -> Result<u64> {
        Ok(self.inner.stream_position()?)
    }

    /// Seek to an absolute position
    pub fn seek(&mut self, position: u64) -> Result<()> {
        self.inner.seek(SeekFrom::Start(position))?;
        Ok(())
    }

    /// Seek to `position`, zero-filling if it lies past the current end
    pub fn seek_padded(&mut self, position: u64) -> Result<()> {
        let end = self.inner.seek(SeekFrom::End(0))?;
        if position > end {
            io::copy(&mut io::repeat(0).take(position - end), &mut self.inner)?;
        }
        self.seek(position)
    }

    /// Write raw bytes
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes)?;
        Ok(())
    }

    /// Flush the underlying sink
    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    /// Write a `u8`
    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.write_bytes(&[value])
    }

    /// Write an `i8`
    pub fn write_i8(&mut self, value: i8) -> Result<()> {
        self.write_bytes(&[value as u8])
    }

    /// Write a one-byte boolean
    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_bytes(&[value as u8])
    }

    write_multi_byte! {
        write_i16, write_i16_with, i16, write_i16;
        write_u16, write_u16_with, u16, write_u16;
        write_i32, write_i32_with, i32, write_i32;
        write_u32, write_u32_with, u32, write_u32;
        write_i64, write_i64_with, i64, write_i64;
        write_u64, write_u64_with, u64, write_u64;
        write_f32, write_f32_with, f32, write_f32;
        write_f64, write_f64_with, f64, write_f64;
    }

    /// Write a half-precision float in the writer's byte order
    pub fn write_f16(&mut self, value: f16) -> Result<()> {
        self.write_f16_with(value, self.byte_order)
    }

    /// Write a half-precision float in `order`
    pub fn write_f16_with(&mut self, value: f16, order: ByteOrder) -> Result<()> {
        self.write_u16_with(value.to_bits(), order)
    }

    /// Write a guid in the writer's byte order
    pub fn write_guid(&mut self, value: Uuid) -> Result<()> {
        self.write_guid_with(value, self.byte_order)
    }

    /// Write a guid in `order`
    pub fn write_guid_with(&mut self, value: Uuid, order: ByteOrder) -> Result<()> {
        self.write_scalar(Primitive::Guid(value), order)
    }

    /// Write a scalar in its own store type
    pub fn write_scalar(&mut self, value: Primitive, order: ByteOrder) -> Result<()> {
        let mut buf = [0u8; StoreType::MAX_SIZE];
        let size = value.store_type().size();
        encode_scalar(value, order, &mut buf[..size]);
        self.write_bytes(&buf[..size])
    }

    /// Write a string using one of the string strategies
    pub fn write_string(
        &mut self,
        value: &str,
        encoding: &StringEncoding,
        order: ByteOrder,
    ) -> Result<()> {
        string::write_string(self, value, encoding, order)
    }

    /// Write a string followed by a terminator
    pub fn write_null_terminated(&mut self, value: &str) -> Result<()> {
        string::write_string(
            self,
            value,
            &StringEncoding::NullTerminated { max_length: None },
            self.byte_order,
        )
    }

    /// Write a bufferable value
    pub fn write_bufferable<T: Bufferable>(&mut self, value: &T, order: ByteOrder) -> Result<()> {
        let mut bytes = vec![0u8; T::SIZE_OF];
        buffer::encode(value, order, &mut bytes);
        self.write_bytes(&bytes)
    }

    /// Encode text using the writer's encoding
    pub(crate) fn encode_text(&mut self, value: &str) -> Result<Vec<u8>> {
        let position = self.position()?;
        string::encode_text(value, self.encoding, self.strict_text, position)
    }
}

impl std::fmt::Debug for EndianWriter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndianWriter")
            .field("byte_order", &self.byte_order)
            .field("encoding", &self.encoding.name())
            .field("strict_text", &self.strict_text)
            .finish()
    }
}
