//! Concurrent schema construction and parallel decoding
//!
//! Container readers start decoding several top-level structures at once as
//! soon as a file is opened, so first use of a type routinely races across
//! threads. Every caller must see the same fully built schema, and parallel
//! decodes over independent streams must not interfere.

use std::fs::File;
use std::io::{BufReader, Cursor, Write};
use std::sync::{Arc, Barrier};
use std::thread;

use tempfile::TempDir;
use vercodec_engine::{
    ByteOrder, Declaration, EndianReader, Error, SchemaError, SchemaRegistry, Structure, Version,
    VersionRange,
};

// ============================================================================
// Test Types
// ============================================================================

#[derive(Debug, Default, PartialEq, Clone)]
struct Entry {
    version: u16,
    id: u32,
    weight: f32,
}

impl Structure for Entry {
    fn describe(decl: &mut Declaration<Self>) {
        decl.fixed_size(12);
        decl.scalar("version", |e| &e.version, |e| &mut e.version)
            .offset(0)
            .version_number();
        decl.scalar("id", |e| &e.id, |e| &mut e.id)
            .offset_in(VersionRange::below(Version::new(2)), 2)
            .offset_in(VersionRange::from(Version::new(2)), 4);
        decl.scalar("weight", |e| &e.weight, |e| &mut e.weight)
            .offset(8)
            .min_version(Version::new(2));
    }
}

#[derive(Default)]
struct Defective {
    a: u8,
    b: u8,
}

impl Structure for Defective {
    fn describe(decl: &mut Declaration<Self>) {
        decl.scalar("a", |d| &d.a, |d| &mut d.a).offset(0).version_number();
        decl.scalar("b", |d| &d.b, |d| &mut d.b).offset(1).version_number();
    }
}

fn entry_bytes(index: u32) -> Vec<u8> {
    let mut bytes = vec![0u8; 12];
    bytes[0..2].copy_from_slice(&2u16.to_le_bytes());
    bytes[4..8].copy_from_slice(&index.to_le_bytes());
    bytes[8..12].copy_from_slice(&(index as f32 * 0.5).to_le_bytes());
    bytes
}

// ============================================================================
// Concurrent first use
// ============================================================================

#[test]
fn test_concurrent_first_use_shares_one_schema() {
    let registry = Arc::new(SchemaRegistry::new());
    let num_threads = 16;
    let barrier = Arc::new(Barrier::new(num_threads));

    let handles: Vec<_> = (0..num_threads)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                registry.schema::<Entry>().unwrap()
            })
        })
        .collect();

    let schemas: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for schema in &schemas[1..] {
        assert!(Arc::ptr_eq(&schemas[0], schema));
    }
    assert_eq!(registry.len(), 1);
    assert!(registry.is_built::<Entry>());
}

#[test]
fn test_concurrent_first_decode() {
    let registry = Arc::new(SchemaRegistry::new());
    let num_threads = 8;
    let barrier = Arc::new(Barrier::new(num_threads));

    let handles: Vec<_> = (0..num_threads as u32)
        .map(|index| {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let mut reader =
                    EndianReader::new(Cursor::new(entry_bytes(index)), ByteOrder::LittleEndian);
                barrier.wait();
                registry.decode::<Entry>(&mut reader, 0, None).unwrap()
            })
        })
        .collect();

    for (index, handle) in handles.into_iter().enumerate() {
        let entry = handle.join().unwrap();
        assert_eq!(entry.version, 2);
        assert_eq!(entry.id, index as u32);
        assert_eq!(entry.weight, index as f32 * 0.5);
    }
}

#[test]
fn test_concurrent_defective_schema_reports_same_error() {
    let registry = Arc::new(SchemaRegistry::new());
    let num_threads = 8;
    let barrier = Arc::new(Barrier::new(num_threads));

    let handles: Vec<_> = (0..num_threads)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                match registry.schema::<Defective>() {
                    Err(Error::Schema(err)) => err,
                    other => panic!("expected a schema error, got {:?}", other.map(|_| ())),
                }
            })
        })
        .collect();

    let errors: Vec<SchemaError> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(errors.iter().all(|e| *e == errors[0]));
    assert!(matches!(
        errors[0],
        SchemaError::MultipleVersionFields {
            first: "a",
            second: "b",
            ..
        }
    ));
}

// ============================================================================
// Parallel decoding over independent file handles
// ============================================================================

#[test]
fn test_parallel_decode_from_independent_file_handles() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("entries.bin");
    let count = 64u32;
    {
        let mut file = File::create(&path).unwrap();
        for index in 0..count {
            file.write_all(&entry_bytes(index)).unwrap();
        }
    }

    let registry = Arc::new(SchemaRegistry::new());
    let num_threads = 4u32;
    let per_thread = count / num_threads;

    let handles: Vec<_> = (0..num_threads)
        .map(|t| {
            let registry = Arc::clone(&registry);
            let path = path.clone();
            thread::spawn(move || {
                let file = BufReader::new(File::open(&path).unwrap());
                let mut reader = EndianReader::new(file, ByteOrder::LittleEndian);
                let mut ids = Vec::new();
                for i in 0..per_thread {
                    let index = t * per_thread + i;
                    let entry: Entry = registry
                        .decode(&mut reader, u64::from(index) * 12, None)
                        .unwrap();
                    ids.push(entry.id);
                }
                ids
            })
        })
        .collect();

    let mut all: Vec<u32> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    all.sort_unstable();
    assert_eq!(all, (0..count).collect::<Vec<_>>());
}
