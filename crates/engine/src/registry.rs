//! Process-wide schema cache
//!
//! Schemas are built lazily, once per type, and shared for the life of the
//! registry. Each type owns a slot keyed by its `TypeId`. The first caller
//! builds inside the slot's `OnceCell`; concurrent callers for the same type
//! block on that cell and receive the same `Arc<Schema<T>>`. The map lock is
//! only held while fetching the slot, so builds of unrelated types never
//! serialise on each other.
//!
//! A failed build is memoised too: every later lookup returns the identical
//! [`SchemaError`](vercodec_core::SchemaError).

use crate::orchestrator;
use crate::resolver;
use crate::schema::{Schema, Structure};
use dashmap::DashMap;
use once_cell::sync::{Lazy, OnceCell};
use std::any::{Any, TypeId};
use std::sync::Arc;
use tracing::{debug, warn};
use vercodec_core::{Error, Result, SchemaError, Version};
use vercodec_io::{EndianReader, EndianWriter};

type Slot<T> = OnceCell<std::result::Result<Arc<Schema<T>>, SchemaError>>;

static GLOBAL: Lazy<SchemaRegistry> = Lazy::new(SchemaRegistry::new);

/// Cache of built schemas, keyed by structure type
pub struct SchemaRegistry {
    schemas: DashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl SchemaRegistry {
    /// Empty registry
    pub fn new() -> Self {
        SchemaRegistry {
            schemas: DashMap::new(),
        }
    }

    /// The process-wide registry used by the free decode and encode functions
    pub fn global() -> &'static SchemaRegistry {
        &GLOBAL
    }

    fn slot<T: Structure>(&self) -> Result<Arc<Slot<T>>> {
        let type_id = TypeId::of::<T>();

        // Use entry API for atomic get-or-insert
        let slot = self
            .schemas
            .entry(type_id)
            .or_insert_with(|| Arc::new(Slot::<T>::new()) as Arc<dyn Any + Send + Sync>)
            .value()
            .clone();

        // The TypeId key guarantees this succeeds
        slot.downcast::<Slot<T>>().map_err(|_| Error::TypeMismatch {
            expected: std::any::type_name::<T>(),
            actual: format!("schema slot for {:?}", type_id),
        })
    }

    /// Schema of `T`, building it on first use
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] when the type's declaration is defective.
    /// The same error is returned on every call.
    pub fn schema<T: Structure>(&self) -> Result<Arc<Schema<T>>> {
        let slot = self.slot::<T>()?;
        let built = slot.get_or_init(|| match resolver::build_schema::<T>() {
            Ok(schema) => {
                debug!(
                    type_name = schema.type_name(),
                    layouts = schema.layouts().len(),
                    "Built schema"
                );
                Ok(Arc::new(schema))
            }
            Err(error) => {
                warn!(type_name = T::type_name(), %error, "Schema declaration rejected");
                Err(error)
            }
        });
        built.clone().map_err(Error::from)
    }

    /// Whether the schema of `T` has been built successfully
    pub fn is_built<T: Structure>(&self) -> bool {
        self.schemas
            .get(&TypeId::of::<T>())
            .and_then(|entry| entry.value().clone().downcast::<Slot<T>>().ok())
            .map_or(false, |slot| matches!(slot.get(), Some(Ok(_))))
    }

    /// Number of types that have been looked up
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Whether no type has been looked up yet
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    // ========================================================================
    // Registry-scoped orchestrator entry points
    // ========================================================================

    /// Decode a new `T` at `origin`
    pub fn decode<T: Structure + Default>(
        &self,
        reader: &mut EndianReader<'_>,
        origin: u64,
        version: Option<Version>,
    ) -> Result<T> {
        let mut target = T::default();
        self.populate(&mut target, reader, origin, version)?;
        Ok(target)
    }

    /// Decode into an existing `T` at `origin`
    pub fn populate<T: Structure>(
        &self,
        target: &mut T,
        reader: &mut EndianReader<'_>,
        origin: u64,
        version: Option<Version>,
    ) -> Result<()> {
        let schema = self.schema::<T>()?;
        orchestrator::populate_with(self, &schema, target, reader, origin, version)
    }

    /// Encode `source` at the writer's current position
    pub fn encode<T: Structure>(
        &self,
        source: &T,
        writer: &mut EndianWriter<'_>,
        version: Option<Version>,
    ) -> Result<()> {
        let schema = self.schema::<T>()?;
        let origin = writer.position()?;
        orchestrator::encode_with(self, &schema, source, writer, origin, version)
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("types", &self.schemas.len())
            .finish()
    }
}
