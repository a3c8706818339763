//! Fixed-width scalar strategy
//!
//! Pure conversions between a byte span and a [`Primitive`]. Single-byte
//! types ignore the byte order. A guid swaps its leading `u32` and two `u16`
//! groups and keeps the trailing eight bytes as they are.

use byteorder::{ByteOrder as _, BE, LE};
use vercodec_core::{f16, ByteOrder, Primitive, StoreType, Uuid};

macro_rules! order_dispatch {
    ($order:expr, $method:ident ( $($arg:expr),* )) => {
        match $order {
            ByteOrder::LittleEndian => LE::$method($($arg),*),
            ByteOrder::BigEndian => BE::$method($($arg),*),
        }
    };
}

/// Decode a scalar of `store` from the first `store.size()` bytes of `bytes`
///
/// # Panics
///
/// Panics if `bytes` is shorter than `store.size()`.
pub fn decode_scalar(bytes: &[u8], store: StoreType, order: ByteOrder) -> Primitive {
    match store {
        StoreType::Bool => Primitive::Bool(bytes[0] != 0),
        StoreType::I8 => Primitive::I8(bytes[0] as i8),
        StoreType::U8 => Primitive::U8(bytes[0]),
        StoreType::I16 => Primitive::I16(order_dispatch!(order, read_i16(bytes))),
        StoreType::U16 => Primitive::U16(order_dispatch!(order, read_u16(bytes))),
        StoreType::I32 => Primitive::I32(order_dispatch!(order, read_i32(bytes))),
        StoreType::U32 => Primitive::U32(order_dispatch!(order, read_u32(bytes))),
        StoreType::I64 => Primitive::I64(order_dispatch!(order, read_i64(bytes))),
        StoreType::U64 => Primitive::U64(order_dispatch!(order, read_u64(bytes))),
        StoreType::F16 => Primitive::F16(f16::from_bits(order_dispatch!(order, read_u16(bytes)))),
        StoreType::F32 => Primitive::F32(order_dispatch!(order, read_f32(bytes))),
        StoreType::F64 => Primitive::F64(order_dispatch!(order, read_f64(bytes))),
        StoreType::Guid => {
            let mut tail = [0u8; 8];
            tail.copy_from_slice(&bytes[8..16]);
            Primitive::Guid(Uuid::from_fields(
                order_dispatch!(order, read_u32(&bytes[0..4])),
                order_dispatch!(order, read_u16(&bytes[4..6])),
                order_dispatch!(order, read_u16(&bytes[6..8])),
                &tail,
            ))
        }
    }
}

/// Encode `value` into the first `size()` bytes of `out`
///
/// # Panics
///
/// Panics if `out` is shorter than the value's store size.
pub fn encode_scalar(value: Primitive, order: ByteOrder, out: &mut [u8]) {
    match value {
        Primitive::Bool(v) => out[0] = v as u8,
        Primitive::I8(v) => out[0] = v as u8,
        Primitive::U8(v) => out[0] = v,
        Primitive::I16(v) => order_dispatch!(order, write_i16(out, v)),
        Primitive::U16(v) => order_dispatch!(order, write_u16(out, v)),
        Primitive::I32(v) => order_dispatch!(order, write_i32(out, v)),
        Primitive::U32(v) => order_dispatch!(order, write_u32(out, v)),
        Primitive::I64(v) => order_dispatch!(order, write_i64(out, v)),
        Primitive::U64(v) => order_dispatch!(order, write_u64(out, v)),
        Primitive::F16(v) => order_dispatch!(order, write_u16(out, v.to_bits())),
        Primitive::F32(v) => order_dispatch!(order, write_f32(out, v)),
        Primitive::F64(v) => order_dispatch!(order, write_f64(out, v)),
        Primitive::Guid(v) => {
            let (a, b, c, tail) = v.as_fields();
            order_dispatch!(order, write_u32(&mut out[0..4], a));
            order_dispatch!(order, write_u16(&mut out[4..6], b));
            order_dispatch!(order, write_u16(&mut out[6..8], c));
            out[8..16].copy_from_slice(tail);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_decode_respects_order() {
        let bytes = [0x00, 0x00, 0x00, 0x2A];
        assert_eq!(
            decode_scalar(&bytes, StoreType::I32, ByteOrder::BigEndian),
            Primitive::I32(42)
        );
        assert_eq!(
            decode_scalar(&bytes, StoreType::I32, ByteOrder::LittleEndian),
            Primitive::I32(0x2A00_0000)
        );
    }

    #[test]
    fn test_single_byte_ignores_order() {
        let bytes = [0xFF];
        assert_eq!(
            decode_scalar(&bytes, StoreType::I8, ByteOrder::BigEndian),
            Primitive::I8(-1)
        );
        assert_eq!(
            decode_scalar(&bytes, StoreType::U8, ByteOrder::LittleEndian),
            Primitive::U8(255)
        );
        assert_eq!(
            decode_scalar(&[2], StoreType::Bool, ByteOrder::LittleEndian),
            Primitive::Bool(true)
        );
    }

    #[test]
    fn test_encode_layout() {
        let mut out = [0u8; 8];
        encode_scalar(Primitive::U16(0x1234), ByteOrder::BigEndian, &mut out);
        assert_eq!(&out[..2], &[0x12, 0x34]);
        encode_scalar(Primitive::U16(0x1234), ByteOrder::LittleEndian, &mut out);
        assert_eq!(&out[..2], &[0x34, 0x12]);
        encode_scalar(Primitive::F64(1.0), ByteOrder::BigEndian, &mut out);
        assert_eq!(out, [0x3F, 0xF0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_half_respects_order() {
        let one = f16::from_f32(1.0);
        let mut out = [0u8; 2];
        encode_scalar(Primitive::F16(one), ByteOrder::BigEndian, &mut out);
        assert_eq!(out, [0x3C, 0x00]);
        encode_scalar(Primitive::F16(one), ByteOrder::LittleEndian, &mut out);
        assert_eq!(out, [0x00, 0x3C]);

        assert_eq!(
            decode_scalar(&[0xC0, 0x00], StoreType::F16, ByteOrder::BigEndian),
            Primitive::F16(f16::from_f32(-2.0))
        );
        assert_eq!(
            decode_scalar(&[0x00, 0xC0], StoreType::F16, ByteOrder::LittleEndian),
            Primitive::F16(f16::from_f32(-2.0))
        );
    }

    #[test]
    fn test_guid_swaps_leading_groups() {
        let id = Uuid::from_u128(0x0011_2233_4455_6677_8899_aabb_ccdd_eeff);
        let mut out = [0u8; 16];

        encode_scalar(Primitive::Guid(id), ByteOrder::BigEndian, &mut out);
        assert_eq!(&out, id.as_bytes());

        encode_scalar(Primitive::Guid(id), ByteOrder::LittleEndian, &mut out);
        assert_eq!(
            out,
            [
                0x33, 0x22, 0x11, 0x00, 0x55, 0x44, 0x77, 0x66, 0x88, 0x99, 0xAA, 0xBB, 0xCC, 0xDD,
                0xEE, 0xFF
            ]
        );
        assert_eq!(
            decode_scalar(&out, StoreType::Guid, ByteOrder::LittleEndian),
            Primitive::Guid(id)
        );
        assert_ne!(
            decode_scalar(&out, StoreType::Guid, ByteOrder::BigEndian),
            Primitive::Guid(id)
        );
    }

    #[test]
    fn test_float_round_trip() {
        let mut out = [0u8; 4];
        encode_scalar(Primitive::F32(-1.25), ByteOrder::BigEndian, &mut out);
        assert_eq!(
            decode_scalar(&out, StoreType::F32, ByteOrder::BigEndian),
            Primitive::F32(-1.25)
        );
    }

    fn multi_byte_store() -> impl Strategy<Value = StoreType> {
        prop::sample::select(vec![
            StoreType::I16,
            StoreType::U16,
            StoreType::F16,
            StoreType::I32,
            StoreType::U32,
            StoreType::F32,
            StoreType::I64,
            StoreType::U64,
            StoreType::F64,
        ])
    }

    proptest! {
        #[test]
        fn big_endian_reads_reversed_little_endian_bytes(
            store in multi_byte_store(),
            raw in prop::collection::vec(any::<u8>(), 8),
        ) {
            let span = &raw[..store.size()];
            let mut reversed = span.to_vec();
            reversed.reverse();

            let little = decode_scalar(span, store, ByteOrder::LittleEndian);
            let big = decode_scalar(&reversed, store, ByteOrder::BigEndian);
            prop_assert_eq!(little.store_type(), store);

            let mut out = vec![0u8; store.size()];
            encode_scalar(big, ByteOrder::LittleEndian, &mut out);
            prop_assert_eq!(&out[..], span);
            encode_scalar(little, ByteOrder::BigEndian, &mut out);
            prop_assert_eq!(out, reversed);
        }

        #[test]
        fn guid_tail_ignores_byte_order(raw in any::<u128>()) {
            let id = Primitive::Guid(Uuid::from_u128(raw));
            let mut little = [0u8; 16];
            let mut big = [0u8; 16];
            encode_scalar(id, ByteOrder::LittleEndian, &mut little);
            encode_scalar(id, ByteOrder::BigEndian, &mut big);

            prop_assert_eq!(&little[8..], &big[8..]);
            for (from, to) in [(0, 4), (4, 6), (6, 8)] {
                let mut group = big[from..to].to_vec();
                group.reverse();
                prop_assert_eq!(&little[from..to], &group[..]);
            }
            prop_assert_eq!(decode_scalar(&little, StoreType::Guid, ByteOrder::LittleEndian), id);
        }
    }
}
