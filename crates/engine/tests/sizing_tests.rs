//! Cursor repositioning after a structure
//!
//! Fixed-size layouts snap the cursor to `origin + size` whether the fields
//! consumed fewer, exactly, or more bytes than declared. Layouts with a
//! data-length field snap to `origin + length`, and reject negative or
//! out-of-range lengths instead of seeking. On encode a length shorter than
//! the bytes already written is rejected too.

use std::io::Cursor;

use vercodec_engine::{
    ByteOrder, Declaration, EndianReader, EndianWriter, Error, SchemaRegistry, StoreType,
    Structure,
};

fn reader(bytes: Vec<u8>) -> EndianReader<'static> {
    EndianReader::new(Cursor::new(bytes), ByteOrder::LittleEndian)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}

// ============================================================================
// Fixed size
// ============================================================================

#[derive(Debug, Default, PartialEq)]
struct Short {
    a: u32,
}

impl Structure for Short {
    fn describe(decl: &mut Declaration<Self>) {
        decl.fixed_size(16);
        decl.scalar("a", |s| &s.a, |s| &mut s.a).offset(0);
    }
}

#[derive(Debug, Default, PartialEq)]
struct Exact {
    a: u64,
    b: u64,
}

impl Structure for Exact {
    fn describe(decl: &mut Declaration<Self>) {
        decl.fixed_size(16);
        decl.scalar("a", |e| &e.a, |e| &mut e.a).offset(0);
        decl.scalar("b", |e| &e.b, |e| &mut e.b).offset(8);
    }
}

#[derive(Debug, Default, PartialEq)]
struct Overrun {
    a: u64,
    b: u64,
}

impl Structure for Overrun {
    fn describe(decl: &mut Declaration<Self>) {
        decl.fixed_size(16);
        decl.scalar("a", |o| &o.a, |o| &mut o.a).offset(0);
        decl.scalar("b", |o| &o.b, |o| &mut o.b).offset(12);
    }
}

#[test]
fn test_fixed_size_snaps_when_fields_are_shorter() {
    let registry = SchemaRegistry::new();
    let mut r = reader(vec![0u8; 32]);
    registry.decode::<Short>(&mut r, 0, None).unwrap();
    assert_eq!(r.position().unwrap(), 16);
}

#[test]
fn test_fixed_size_snaps_when_fields_fill_exactly() {
    let registry = SchemaRegistry::new();
    let mut r = reader(vec![0u8; 32]);
    registry.decode::<Exact>(&mut r, 0, None).unwrap();
    assert_eq!(r.position().unwrap(), 16);
}

#[test]
fn test_fixed_size_snaps_back_when_fields_overrun() {
    init_tracing();
    let registry = SchemaRegistry::new();
    let mut r = reader(vec![0u8; 32]);
    registry.decode::<Overrun>(&mut r, 0, None).unwrap();
    assert_eq!(r.position().unwrap(), 16);
}

#[test]
fn test_consecutive_fixed_size_structures() {
    let registry = SchemaRegistry::new();
    let mut bytes = vec![0u8; 48];
    bytes[0] = 1;
    bytes[16] = 2;
    bytes[32] = 3;
    let mut r = reader(bytes);
    let mut seen = Vec::new();
    for _ in 0..3 {
        let origin = r.position().unwrap();
        let value: Short = registry.decode(&mut r, origin, None).unwrap();
        seen.push(value.a);
    }
    assert_eq!(seen, vec![1, 2, 3]);
    assert_eq!(r.position().unwrap(), 48);
}

#[test]
fn test_encode_pads_to_fixed_size() {
    let registry = SchemaRegistry::new();
    let mut buf = Cursor::new(Vec::new());
    {
        let mut writer = EndianWriter::new(&mut buf, ByteOrder::LittleEndian);
        registry.encode(&Short { a: 7 }, &mut writer, None).unwrap();
        registry.encode(&Short { a: 8 }, &mut writer, None).unwrap();
        assert_eq!(writer.position().unwrap(), 32);
    }
    let bytes = buf.into_inner();
    assert_eq!(bytes.len(), 32);
    assert_eq!(bytes[0], 7);
    assert_eq!(bytes[16], 8);
    assert!(bytes[1..16].iter().all(|&b| b == 0));
}

// ============================================================================
// Data length
// ============================================================================

#[derive(Debug, Default, PartialEq)]
struct Chunk {
    length: i32,
    tag: u16,
}

impl Structure for Chunk {
    fn describe(decl: &mut Declaration<Self>) {
        decl.scalar("length", |c| &c.length, |c| &mut c.length)
            .offset(0)
            .data_length();
        decl.scalar("tag", |c| &c.tag, |c| &mut c.tag).offset(4);
    }
}

fn chunk_bytes(length: i32, total: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; total];
    bytes[..4].copy_from_slice(&length.to_le_bytes());
    bytes[4] = 0x99;
    bytes
}

#[test]
fn test_data_length_snaps_cursor() {
    let registry = SchemaRegistry::new();
    let mut r = reader(chunk_bytes(24, 40));
    let chunk: Chunk = registry.decode(&mut r, 0, None).unwrap();
    assert_eq!(chunk, Chunk { length: 24, tag: 0x99 });
    assert_eq!(r.position().unwrap(), 24);
}

#[test]
fn test_data_length_relative_to_origin() {
    let registry = SchemaRegistry::new();
    let mut bytes = vec![0u8; 10];
    bytes.extend(chunk_bytes(24, 30));
    let mut r = reader(bytes);
    registry.decode::<Chunk>(&mut r, 10, None).unwrap();
    assert_eq!(r.position().unwrap(), 34);
}

#[test]
fn test_negative_data_length_rejected() {
    let registry = SchemaRegistry::new();
    let mut r = reader(chunk_bytes(-1, 40));
    let err = registry.decode::<Chunk>(&mut r, 0, None).unwrap_err();
    match err {
        Error::NegativeDataLength {
            type_name,
            field,
            value,
        } => {
            assert_eq!(type_name, "Chunk");
            assert_eq!(field, "length");
            assert_eq!(value, -1);
        }
        other => panic!("expected NegativeDataLength, got {:?}", other),
    }
}

#[test]
fn test_data_length_past_end_rejected() {
    let registry = SchemaRegistry::new();
    let mut r = reader(chunk_bytes(1_000, 40));
    let err = registry.decode::<Chunk>(&mut r, 0, None).unwrap_err();
    assert!(matches!(
        err,
        Error::DataLengthOutOfRange {
            value: 1_000,
            available: 40,
            ..
        }
    ));
}

#[test]
fn test_encode_seeks_past_data_length() {
    let registry = SchemaRegistry::new();
    let mut buf = Cursor::new(Vec::new());
    {
        let mut writer = EndianWriter::new(&mut buf, ByteOrder::LittleEndian);
        registry
            .encode(&Chunk { length: 12, tag: 5 }, &mut writer, None)
            .unwrap();
        assert_eq!(writer.position().unwrap(), 12);
        writer.write_u8(0xEE).unwrap();
    }
    let bytes = buf.into_inner();
    assert_eq!(bytes.len(), 13);
    assert_eq!(&bytes[..6], &[12, 0, 0, 0, 5, 0]);
    assert_eq!(bytes[12], 0xEE);
}

#[test]
fn test_encode_negative_data_length_rejected() {
    let registry = SchemaRegistry::new();
    let mut buf = Cursor::new(Vec::new());
    let mut writer = EndianWriter::new(&mut buf, ByteOrder::LittleEndian);
    let err = registry
        .encode(&Chunk { length: -4, tag: 0 }, &mut writer, None)
        .unwrap_err();
    assert!(matches!(err, Error::NegativeDataLength { value: -4, .. }));
}

#[test]
fn test_encode_data_length_shorter_than_fields_rejected() {
    init_tracing();
    let registry = SchemaRegistry::new();
    let mut buf = Cursor::new(Vec::new());
    let mut writer = EndianWriter::new(&mut buf, ByteOrder::LittleEndian);
    writer.write_bytes(&[0xAB; 4]).unwrap();

    let err = registry
        .encode(&Chunk { length: 2, tag: 7 }, &mut writer, None)
        .unwrap_err();
    match err {
        Error::DataLengthTooShort {
            type_name,
            field,
            value,
            written,
        } => {
            assert_eq!(type_name, "Chunk");
            assert_eq!(field, "length");
            assert_eq!(value, 2);
            assert_eq!(written, 6);
        }
        other => panic!("expected DataLengthTooShort, got {:?}", other),
    }

    let exact = registry.encode(&Chunk { length: 6, tag: 7 }, &mut writer, None);
    assert!(exact.is_ok());
    assert_eq!(writer.position().unwrap(), 10 + 6);
}

#[derive(Debug, Default)]
struct NarrowLength {
    length: u64,
}

impl Structure for NarrowLength {
    fn describe(decl: &mut Declaration<Self>) {
        decl.scalar("length", |n| &n.length, |n| &mut n.length)
            .offset(0)
            .store_as(StoreType::U8)
            .data_length();
    }
}

#[test]
fn test_data_length_with_narrow_store() {
    let registry = SchemaRegistry::new();
    let mut r = reader(vec![3, 0xAA, 0xBB, 0xCC]);
    let value: NarrowLength = registry.decode(&mut r, 0, None).unwrap();
    assert_eq!(value.length, 3);
    assert_eq!(r.position().unwrap(), 3);

    let mut buf = Cursor::new(Vec::new());
    let mut writer = EndianWriter::new(&mut buf, ByteOrder::LittleEndian);
    let err = registry
        .encode(&NarrowLength { length: 300 }, &mut writer, None)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Conversion {
            field: "length",
            ..
        }
    ));
}
