//! Bufferable value strategy
//!
//! A [`Bufferable`] type converts to and from a fixed-size byte span. The
//! span is always little-endian; for a big-endian stream every `PACK_SIZE`
//! chunk is reversed before decoding and after encoding. A type made of four
//! `u16` components therefore declares `PACK_SIZE = 2` and `SIZE_OF = 8`.

use vercodec_core::ByteOrder;

/// Fixed-size value with pure byte-span conversions
pub trait Bufferable: Sized {
    /// Bytes in one byte-order unit
    const PACK_SIZE: usize;
    /// Total encoded bytes
    const SIZE_OF: usize;

    /// Decode from a little-endian span of `SIZE_OF` bytes
    fn read_from_buffer(buffer: &[u8]) -> Self;

    /// Encode into a little-endian span of `SIZE_OF` bytes
    fn write_to_buffer(&self, buffer: &mut [u8]);
}

fn reverse_chunks(bytes: &mut [u8], pack_size: usize) {
    if pack_size > 1 {
        for chunk in bytes.chunks_mut(pack_size) {
            chunk.reverse();
        }
    }
}

/// Decode `T` from `bytes` stored in `order`
///
/// # Panics
///
/// Panics if `bytes` is shorter than `T::SIZE_OF`.
pub fn decode<T: Bufferable>(bytes: &[u8], order: ByteOrder) -> T {
    let span = &bytes[..T::SIZE_OF];
    if order.is_big() {
        let mut owned = span.to_vec();
        reverse_chunks(&mut owned, T::PACK_SIZE);
        T::read_from_buffer(&owned)
    } else {
        T::read_from_buffer(span)
    }
}

/// Encode `value` into `out` in `order`
///
/// # Panics
///
/// Panics if `out` is shorter than `T::SIZE_OF`.
pub fn encode<T: Bufferable>(value: &T, order: ByteOrder, out: &mut [u8]) {
    let span = &mut out[..T::SIZE_OF];
    value.write_to_buffer(span);
    if order.is_big() {
        reverse_chunks(span, T::PACK_SIZE);
    }
}
