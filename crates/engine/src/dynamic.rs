//! Runtime-typed decode and encode
//!
//! Container formats often name the record type of a blob with a tag or class
//! code, so the concrete structure is only known once the container has been
//! read. [`StructureType`] erases a structure type into plain function
//! pointers, and [`StructureTable`] maps tags to those erased types.
//!
//! ```ignore
//! let table = StructureTable::new();
//! table.register::<Mesh>(0x10);
//! table.register::<Texture>(0x20);
//!
//! let record = table.decode(&tag, &mut reader, origin, None)?;
//! if let Some(mesh) = record.downcast_ref::<Mesh>() { /* ... */ }
//! ```

use crate::registry::SchemaRegistry;
use crate::schema::Structure;
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use vercodec_core::{Error, Result, Version};
use vercodec_io::{EndianReader, EndianWriter};

type PopulateFn = fn(
    &SchemaRegistry,
    &mut (dyn Any + Send),
    &mut EndianReader<'_>,
    u64,
    Option<Version>,
) -> Result<()>;

type EncodeFn = fn(&SchemaRegistry, &dyn Any, &mut EndianWriter<'_>, Option<Version>) -> Result<()>;

/// A structure type erased to runtime dispatch
#[derive(Clone, Copy)]
pub struct StructureType {
    type_id: TypeId,
    name: &'static str,
    create: fn() -> Box<dyn Any + Send>,
    populate: PopulateFn,
    encode: EncodeFn,
}

impl StructureType {
    /// Erase `T`
    pub fn of<T: Structure + Default + Send>() -> Self {
        StructureType {
            type_id: TypeId::of::<T>(),
            name: T::type_name(),
            create: create_erased::<T>,
            populate: populate_erased::<T>,
            encode: encode_erased::<T>,
        }
    }

    /// `TypeId` of the erased type
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Name of the erased type
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether this is the erased form of `T`
    pub fn is<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// A default instance
    pub fn create(&self) -> Box<dyn Any + Send> {
        (self.create)()
    }
}

impl PartialEq for StructureType {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for StructureType {}

impl Debug for StructureType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("StructureType").field(&self.name).finish()
    }
}

fn create_erased<T: Default + Send + 'static>() -> Box<dyn Any + Send> {
    Box::new(T::default())
}

fn mismatch<T: Structure>() -> Error {
    Error::TypeMismatch {
        expected: T::type_name(),
        actual: "instance of another type".to_string(),
    }
}

fn populate_erased<T: Structure>(
    registry: &SchemaRegistry,
    target: &mut (dyn Any + Send),
    reader: &mut EndianReader<'_>,
    origin: u64,
    version: Option<Version>,
) -> Result<()> {
    let target = target.downcast_mut::<T>().ok_or_else(mismatch::<T>)?;
    registry.populate(target, reader, origin, version)
}

fn encode_erased<T: Structure>(
    registry: &SchemaRegistry,
    source: &dyn Any,
    writer: &mut EndianWriter<'_>,
    version: Option<Version>,
) -> Result<()> {
    let source = source.downcast_ref::<T>().ok_or_else(mismatch::<T>)?;
    registry.encode(source, writer, version)
}

impl SchemaRegistry {
    /// Decode a structure whose type is only known at runtime
    ///
    /// Fills `instance` when given, otherwise a default instance of `ty`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] when `instance` is not of type `ty`.
    pub fn populate_dyn(
        &self,
        instance: Option<Box<dyn Any + Send>>,
        ty: &StructureType,
        reader: &mut EndianReader<'_>,
        origin: u64,
        version: Option<Version>,
    ) -> Result<Box<dyn Any + Send>> {
        let mut instance = instance.unwrap_or_else(|| ty.create());
        (ty.populate)(self, instance.as_mut(), reader, origin, version)?;
        Ok(instance)
    }

    /// Encode a structure whose type is only known at runtime
    pub fn encode_dyn(
        &self,
        value: &dyn Any,
        ty: &StructureType,
        writer: &mut EndianWriter<'_>,
        version: Option<Version>,
    ) -> Result<()> {
        (ty.encode)(self, value, writer, version)
    }
}

/// [`SchemaRegistry::populate_dyn`] on the global registry
pub fn populate_dyn(
    instance: Option<Box<dyn Any + Send>>,
    ty: &StructureType,
    reader: &mut EndianReader<'_>,
    origin: u64,
    version: Option<Version>,
) -> Result<Box<dyn Any + Send>> {
    SchemaRegistry::global().populate_dyn(instance, ty, reader, origin, version)
}

/// [`SchemaRegistry::encode_dyn`] on the global registry
pub fn encode_dyn(
    value: &dyn Any,
    ty: &StructureType,
    writer: &mut EndianWriter<'_>,
    version: Option<Version>,
) -> Result<()> {
    SchemaRegistry::global().encode_dyn(value, ty, writer, version)
}

/// Structure types keyed by container tag
pub struct StructureTable<K> {
    types: RwLock<HashMap<K, StructureType>>,
}

impl<K: Eq + Hash + Debug> StructureTable<K> {
    /// Empty table
    pub fn new() -> Self {
        StructureTable {
            types: RwLock::new(HashMap::new()),
        }
    }

    /// Map `key` to `T`, returning the type it replaced
    pub fn register<T: Structure + Default + Send>(&self, key: K) -> Option<StructureType> {
        self.types.write().insert(key, StructureType::of::<T>())
    }

    /// Type registered for `key`
    pub fn get(&self, key: &K) -> Option<StructureType> {
        self.types.read().get(key).copied()
    }

    /// Whether `key` is registered
    pub fn contains(&self, key: &K) -> bool {
        self.types.read().contains_key(key)
    }

    /// Number of registered tags
    pub fn len(&self) -> usize {
        self.types.read().len()
    }

    /// Whether no tag is registered
    pub fn is_empty(&self) -> bool {
        self.types.read().is_empty()
    }

    /// Decode the structure registered for `key` using the global registry
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownStructure`] when `key` is not registered.
    pub fn decode(
        &self,
        key: &K,
        reader: &mut EndianReader<'_>,
        origin: u64,
        version: Option<Version>,
    ) -> Result<Box<dyn Any + Send>> {
        self.decode_with(SchemaRegistry::global(), key, reader, origin, version)
    }

    /// Decode the structure registered for `key` using `registry`
    pub fn decode_with(
        &self,
        registry: &SchemaRegistry,
        key: &K,
        reader: &mut EndianReader<'_>,
        origin: u64,
        version: Option<Version>,
    ) -> Result<Box<dyn Any + Send>> {
        let ty = self
            .get(key)
            .ok_or_else(|| Error::UnknownStructure(format!("{:?}", key)))?;
        registry.populate_dyn(None, &ty, reader, origin, version)
    }
}

impl<K: Eq + Hash + Debug> Default for StructureTable<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Debug> Debug for StructureTable<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.types.read().iter()).finish()
    }
}
