//! Version layout selection through the public decode and encode API
//!
//! Covers:
//! 1. Half-open range boundaries
//! 2. Exact-version layouts taking precedence over ranges
//! 3. Overlap rejection at registration time
//! 4. Per-field byte order overrides
//! 5. The split-offset record scenario (offset 4 below v10, offset 8 from v10)

use std::io::Cursor;

use vercodec_engine::{
    ByteOrder, Declaration, EndianReader, EndianWriter, Error, SchemaError, SchemaRegistry,
    Structure, Version, VersionRange,
};

// ============================================================================
// Test Helpers
// ============================================================================

fn v(n: i64) -> Version {
    Version::new(n)
}

fn reader(bytes: &[u8], order: ByteOrder) -> EndianReader<'static> {
    EndianReader::new(Cursor::new(bytes.to_vec()), order)
}

fn encode_with<T: Structure>(
    registry: &SchemaRegistry,
    value: &T,
    order: ByteOrder,
    version: Option<Version>,
) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    {
        let mut writer = EndianWriter::new(&mut buf, order);
        registry.encode(value, &mut writer, version).unwrap();
    }
    buf.into_inner()
}

// ============================================================================
// Half-open boundaries
// ============================================================================

#[derive(Debug, Default, PartialEq)]
struct Banded {
    value: u8,
}

impl Structure for Banded {
    fn describe(decl: &mut Declaration<Self>) {
        decl.scalar("value", |b| &b.value, |b| &mut b.value)
            .offset_in(VersionRange::between(v(0), v(10)), 0)
            .offset_in(VersionRange::between(v(10), v(20)), 1);
    }
}

#[test]
fn test_upper_bound_is_exclusive() {
    let registry = SchemaRegistry::new();
    let bytes = [0xAA, 0xBB];

    let at = |version: i64| -> u8 {
        registry
            .decode::<Banded>(&mut reader(&bytes, ByteOrder::LittleEndian), 0, Some(v(version)))
            .unwrap()
            .value
    };

    assert_eq!(at(0), 0xAA);
    assert_eq!(at(9), 0xAA);
    assert_eq!(at(10), 0xBB, "version 10 belongs to [10, 20)");
    assert_eq!(at(19), 0xBB);
}

#[test]
fn test_version_outside_all_ranges_uses_default_layout() {
    let registry = SchemaRegistry::new();
    let value = registry
        .decode::<Banded>(&mut reader(&[0xAA, 0xBB], ByteOrder::LittleEndian), 0, Some(v(25)))
        .unwrap();
    // The default layout has no placement for `value`.
    assert_eq!(value, Banded::default());
}

#[test]
fn test_fractional_version_boundary() {
    #[derive(Default)]
    struct Marker {
        value: u8,
    }

    impl Structure for Marker {
        fn describe(decl: &mut Declaration<Self>) {
            let half = Version::from_raw(1_500);
            decl.scalar("value", |m| &m.value, |m| &mut m.value)
                .offset_in(VersionRange::below(half), 0)
                .offset_in(VersionRange::from(half), 1);
        }
    }

    let registry = SchemaRegistry::new();
    let bytes = [1, 2];
    let decode = |version: f64| {
        registry
            .decode::<Marker>(
                &mut reader(&bytes, ByteOrder::LittleEndian),
                0,
                Version::from_f64(version),
            )
            .unwrap()
            .value
    };
    assert_eq!(decode(1.0), 1);
    assert_eq!(decode(1.499), 1);
    assert_eq!(decode(1.5), 2);
    assert_eq!(decode(2.0), 2);
}

// ============================================================================
// Exact-version precedence
// ============================================================================

#[derive(Debug, Default, PartialEq)]
struct Patched {
    value: u8,
}

impl Structure for Patched {
    fn describe(decl: &mut Declaration<Self>) {
        decl.scalar("value", |p| &p.value, |p| &mut p.value);
        decl.version(VersionRange::from(v(0))).field("value", 0);
        decl.version(VersionRange::exact(v(10))).field("value", 2);
    }
}

#[test]
fn test_exact_layout_wins_over_open_range() {
    let registry = SchemaRegistry::new();
    let bytes = [1, 2, 3];
    let at = |version: i64| {
        registry
            .decode::<Patched>(&mut reader(&bytes, ByteOrder::LittleEndian), 0, Some(v(version)))
            .unwrap()
            .value
    };
    assert_eq!(at(9), 1);
    assert_eq!(at(10), 3);
    assert_eq!(at(11), 1);

    let schema = registry.schema::<Patched>().unwrap();
    assert_eq!(schema.layouts()[0].range, VersionRange::exact(v(10)));
}

// ============================================================================
// Overlap rejection
// ============================================================================

#[derive(Default)]
#[derive(Debug)]
struct OverlappingOffsets {
    flags: u16,
}

impl Structure for OverlappingOffsets {
    fn describe(decl: &mut Declaration<Self>) {
        decl.scalar("flags", |o| &o.flags, |o| &mut o.flags)
            .offset_in(VersionRange::below(v(10)), 0)
            .offset_in(VersionRange::from(v(5)), 2);
    }
}

#[derive(Default)]
struct OverlappingLayouts {
    flags: u16,
}

impl Structure for OverlappingLayouts {
    fn describe(decl: &mut Declaration<Self>) {
        decl.scalar("flags", |o| &o.flags, |o| &mut o.flags);
        decl.version(VersionRange::between(v(0), v(10)))
            .field("flags", 0);
        decl.version(VersionRange::between(v(9), v(20)))
            .field("flags", 2);
    }
}

#[test]
fn test_overlapping_field_declarations_fail_at_registration() {
    let registry = SchemaRegistry::new();
    let err = registry.schema::<OverlappingOffsets>().unwrap_err();
    match err {
        Error::Schema(SchemaError::VersionOverlap {
            type_name,
            member,
            declaration,
            ..
        }) => {
            assert_eq!(type_name, "OverlappingOffsets");
            assert_eq!(member, "flags");
            assert_eq!(declaration, "offset");
        }
        other => panic!("expected VersionOverlap, got {:?}", other),
    }

    // Decoding surfaces the same registration error without touching the stream.
    let mut r = reader(&[], ByteOrder::LittleEndian);
    let err = registry
        .decode::<OverlappingOffsets>(&mut r, 0, Some(v(1)))
        .unwrap_err();
    assert!(matches!(err, Error::Schema(SchemaError::VersionOverlap { .. })));
}

#[test]
fn test_overlapping_layouts_fail_at_registration() {
    let registry = SchemaRegistry::new();
    let err = registry.schema::<OverlappingLayouts>().unwrap_err();
    assert!(matches!(
        err,
        Error::Schema(SchemaError::LayoutOverlap {
            type_name: "OverlappingLayouts",
            ..
        })
    ));
    assert!(err.to_string().contains("OverlappingLayouts"));
}

// ============================================================================
// Byte order overrides
// ============================================================================

#[derive(Debug, Default, PartialEq)]
struct MixedOrder {
    little: u32,
    big: u32,
    stream: u16,
}

impl Structure for MixedOrder {
    fn describe(decl: &mut Declaration<Self>) {
        decl.byte_order(ByteOrder::LittleEndian);
        decl.scalar("little", |m| &m.little, |m| &mut m.little)
            .offset(0);
        decl.scalar("big", |m| &m.big, |m| &mut m.big)
            .offset(4)
            .byte_order(ByteOrder::BigEndian);
        decl.scalar("stream", |m| &m.stream, |m| &mut m.stream)
            .offset(8);
    }
}

#[derive(Debug, Default, PartialEq)]
struct StreamOrder {
    value: u16,
}

impl Structure for StreamOrder {
    fn describe(decl: &mut Declaration<Self>) {
        decl.scalar("value", |s| &s.value, |s| &mut s.value).offset(0);
    }
}

#[test]
fn test_field_byte_order_overrides_structure_default() {
    let registry = SchemaRegistry::new();
    let bytes = [1, 0, 0, 0, 0, 0, 0, 2, 3, 0];
    for order in [ByteOrder::LittleEndian, ByteOrder::BigEndian] {
        let value: MixedOrder = registry.decode(&mut reader(&bytes, order), 0, None).unwrap();
        assert_eq!(
            value,
            MixedOrder {
                little: 1,
                big: 2,
                stream: 3
            }
        );
        assert_eq!(encode_with(&registry, &value, order, None), bytes);
    }
}

#[test]
fn test_stream_default_applies_without_declaration() {
    let registry = SchemaRegistry::new();
    let little: StreamOrder = registry
        .decode(&mut reader(&[1, 2], ByteOrder::LittleEndian), 0, None)
        .unwrap();
    let big: StreamOrder = registry
        .decode(&mut reader(&[1, 2], ByteOrder::BigEndian), 0, None)
        .unwrap();
    assert_eq!(little.value, 0x0201);
    assert_eq!(big.value, 0x0102);
}

// ============================================================================
// Split-offset record
// ============================================================================

#[derive(Debug, Default, PartialEq)]
struct R {
    a: i32,
}

impl Structure for R {
    fn describe(decl: &mut Declaration<Self>) {
        let old = VersionRange::below(v(10));
        let new = VersionRange::from(v(10));
        decl.fixed_size_in(old, 16)
            .fixed_size_in(new, 24)
            .byte_order_in(old, ByteOrder::LittleEndian)
            .byte_order_in(new, ByteOrder::BigEndian);
        decl.scalar("a", |r| &r.a, |r| &mut r.a)
            .offset_in(old, 4)
            .offset_in(new, 8);
    }
}

fn r_bytes() -> Vec<u8> {
    let mut bytes = vec![0u8; 32];
    bytes[8] = 0x2A;
    bytes
}

#[test]
fn test_split_offset_record_before_boundary() {
    let registry = SchemaRegistry::new();
    let mut r = reader(&r_bytes(), ByteOrder::LittleEndian);
    let value: R = registry.decode(&mut r, 0, Some(v(9))).unwrap();
    assert_eq!(value.a, 0);
    assert_eq!(r.position().unwrap(), 16);
}

#[test]
fn test_split_offset_record_after_boundary() {
    let registry = SchemaRegistry::new();
    let mut r = reader(&r_bytes(), ByteOrder::LittleEndian);
    let value: R = registry.decode(&mut r, 0, Some(v(12))).unwrap();
    assert_eq!(value.a, 0x2A00_0000);
    assert_eq!(r.position().unwrap(), 24);
}

#[test]
fn test_split_offset_record_reencodes_per_version() {
    let registry = SchemaRegistry::new();
    let value = R { a: 0x0102_0304 };

    let old = encode_with(&registry, &value, ByteOrder::BigEndian, Some(v(9)));
    assert_eq!(old.len(), 16);
    assert_eq!(&old[4..8], &[4, 3, 2, 1]);

    let new = encode_with(&registry, &value, ByteOrder::LittleEndian, Some(v(12)));
    assert_eq!(new.len(), 24);
    assert_eq!(&new[8..12], &[1, 2, 3, 4]);
    assert!(new[..8].iter().all(|&b| b == 0));
}

#[test]
fn test_split_offset_record_at_nonzero_origin() {
    let registry = SchemaRegistry::new();
    let mut bytes = vec![0xFFu8; 5];
    bytes.extend(r_bytes());
    let mut r = reader(&bytes, ByteOrder::LittleEndian);
    let value: R = registry.decode(&mut r, 5, Some(v(12))).unwrap();
    assert_eq!(value.a, 0x2A00_0000);
    assert_eq!(r.position().unwrap(), 29);
}
