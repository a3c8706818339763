//! Structure decode and encode
//!
//! Walks a selected [`VersionLayout`] field by field, seeking to
//! `origin + offset` before each one, and repositions the cursor afterwards:
//! to `origin + size` for fixed-size layouts, or to `origin + length` when a
//! data-length field is present.
//!
//! The version comes from the caller or, when absent, from the structure's
//! own version field, read through the unconditional layout before the real
//! layout is chosen.

use crate::registry::SchemaRegistry;
use crate::schema::access::FieldCodec;
use crate::schema::{FieldEntry, FieldLayout, Schema, Structure, VersionLayout};
use tracing::{trace, warn};
use vercodec_core::{ConversionError, Error, Primitive, Result, SchemaError, StoreType, Version};
use vercodec_io::{EndianReader, EndianWriter, StringEncoding};

/// Decode a new `T` at `origin` using the global registry
pub fn decode<T: Structure + Default>(
    reader: &mut EndianReader<'_>,
    origin: u64,
    version: Option<Version>,
) -> Result<T> {
    SchemaRegistry::global().decode(reader, origin, version)
}

/// Decode into an existing `T` at `origin` using the global registry
///
/// Fields absent from the selected layout keep their current values.
pub fn populate<T: Structure>(
    target: &mut T,
    reader: &mut EndianReader<'_>,
    origin: u64,
    version: Option<Version>,
) -> Result<()> {
    SchemaRegistry::global().populate(target, reader, origin, version)
}

/// Encode `source` at the writer's current position using the global registry
pub fn encode<T: Structure>(
    source: &T,
    writer: &mut EndianWriter<'_>,
    version: Option<Version>,
) -> Result<()> {
    SchemaRegistry::global().encode(source, writer, version)
}

/// Structure reads at the current position
pub trait ReadObjectExt {
    /// Decode a `T` at the current position, detecting its version
    fn read_object<T: Structure + Default>(&mut self) -> Result<T>;

    /// Decode a `T` at the current position as `version`
    fn read_object_versioned<T: Structure + Default>(&mut self, version: Version) -> Result<T>;
}

impl ReadObjectExt for EndianReader<'_> {
    fn read_object<T: Structure + Default>(&mut self) -> Result<T> {
        let origin = self.position()?;
        decode(self, origin, None)
    }

    fn read_object_versioned<T: Structure + Default>(&mut self, version: Version) -> Result<T> {
        let origin = self.position()?;
        decode(self, origin, Some(version))
    }
}

/// Structure writes at the current position
pub trait WriteObjectExt {
    /// Encode `value` at the current position
    fn write_object<T: Structure>(&mut self, value: &T) -> Result<()>;

    /// Encode `value` at the current position as `version`
    fn write_object_versioned<T: Structure>(&mut self, value: &T, version: Version) -> Result<()>;
}

impl WriteObjectExt for EndianWriter<'_> {
    fn write_object<T: Structure>(&mut self, value: &T) -> Result<()> {
        encode(value, self, None)
    }

    fn write_object_versioned<T: Structure>(&mut self, value: &T, version: Version) -> Result<()> {
        encode(value, self, Some(version))
    }
}

// ============================================================================
// Decode
// ============================================================================

pub(crate) fn populate_with<T>(
    registry: &SchemaRegistry,
    schema: &Schema<T>,
    target: &mut T,
    reader: &mut EndianReader<'_>,
    origin: u64,
    version: Option<Version>,
) -> Result<()> {
    let type_name = schema.type_name();
    let version = match version {
        Some(version) => Some(version),
        None => detect_version(schema, reader, origin)?,
    };
    let layout = select(schema, version)?;
    trace!(type_name, origin, version = ?version, "Decoding structure");

    let mut data_length = None;
    for (position, field) in layout.fields.iter().enumerate() {
        reader.seek(origin + field.offset)?;
        let entry = &schema.fields[field.field];
        let order = layout.byte_order_for(field, reader.byte_order());
        match &entry.codec {
            FieldCodec::Scalar(slot) => {
                let value = reader.read_scalar(store_of(field)?, order)?;
                if layout.data_length_field == Some(position) {
                    data_length = Some(integer(value).map_err(conversion(type_name, field))?);
                }
                slot.store(target, value).map_err(conversion(type_name, field))?;
            }
            FieldCodec::Text(slot) => {
                let encoding = encoding_of(type_name, entry)?;
                let value = reader.read_string(&encoding, order)?;
                slot.store(target, value);
            }
            FieldCodec::Buffer(slot) => {
                let bytes = reader.read_bytes(slot.size())?;
                slot.decode(target, &bytes, order);
            }
            FieldCodec::Nested(slot) => {
                slot.decode(target, reader, registry, origin + field.offset, version)?;
            }
        }
    }

    if let Some(size) = layout.size {
        let end = origin + size;
        let position = reader.position()?;
        if position > end {
            warn!(type_name, origin, size, position, "Fields overran declared structure size");
        }
        reader.seek(end)?;
    } else if let (Some(value), Some(index)) = (data_length, layout.data_length_field) {
        let field = layout.fields[index].name;
        let length = u64::try_from(value).map_err(|_| Error::NegativeDataLength {
            type_name,
            field,
            value,
        })?;
        let available = reader.len()?.saturating_sub(origin);
        if length > available {
            return Err(Error::DataLengthOutOfRange {
                type_name,
                field,
                value,
                available,
            });
        }
        reader.seek(origin + length)?;
    }
    Ok(())
}

fn detect_version<T>(
    schema: &Schema<T>,
    reader: &mut EndianReader<'_>,
    origin: u64,
) -> Result<Option<Version>> {
    let Some(layout) = schema.default_layout() else {
        return Ok(None);
    };
    let Some(index) = layout.version_field else {
        return Ok(None);
    };
    let field = &layout.fields[index];
    let order = layout.byte_order_for(field, reader.byte_order());

    reader.seek(origin + field.offset)?;
    let value = reader.read_scalar(store_of(field)?, order)?;
    reader.seek(origin)?;

    let version = version_of(value).map_err(conversion(schema.type_name(), field))?;
    Ok(Some(version))
}

// ============================================================================
// Encode
// ============================================================================

pub(crate) fn encode_with<T>(
    registry: &SchemaRegistry,
    schema: &Schema<T>,
    source: &T,
    writer: &mut EndianWriter<'_>,
    origin: u64,
    version: Option<Version>,
) -> Result<()> {
    let type_name = schema.type_name();
    let version = match version {
        Some(version) => Some(version),
        None => held_version(schema, source)?,
    };
    let layout = select(schema, version)?;
    trace!(type_name, origin, version = ?version, "Encoding structure");

    let mut extent = origin;
    for (position, field) in layout.fields.iter().enumerate() {
        writer.seek_padded(origin + field.offset)?;
        let entry = &schema.fields[field.field];
        let order = layout.byte_order_for(field, writer.byte_order());
        match &entry.codec {
            FieldCodec::Scalar(slot) => {
                let store = store_of(field)?;
                let value = match version {
                    Some(version) if layout.version_field == Some(position) => {
                        version_primitive(version, store)
                    }
                    _ => slot.load(source).and_then(|v| v.convert(store)),
                }
                .map_err(conversion(type_name, field))?;
                writer.write_scalar(value, order)?;
            }
            FieldCodec::Text(slot) => {
                let encoding = encoding_of(type_name, entry)?;
                writer.write_string(slot.load(source), &encoding, order)?;
            }
            FieldCodec::Buffer(slot) => {
                let mut bytes = vec![0u8; slot.size()];
                slot.encode(source, order, &mut bytes);
                writer.write_bytes(&bytes)?;
            }
            FieldCodec::Nested(slot) => {
                slot.encode(source, writer, registry, origin + field.offset, version)?;
            }
        }
        extent = extent.max(writer.position()?);
    }

    if let Some(size) = layout.size {
        let end = origin + size;
        if extent > end {
            warn!(type_name, origin, size, extent, "Fields overran declared structure size");
        }
        writer.seek_padded(end)?;
    } else if let Some(index) = layout.data_length_field {
        let field = &layout.fields[index];
        let value = load_scalar(&schema.fields[field.field], source)
            .and_then(integer)
            .map_err(conversion(type_name, field))?;
        let length = u64::try_from(value).map_err(|_| Error::NegativeDataLength {
            type_name,
            field: field.name,
            value,
        })?;
        // The cursor must never land inside bytes this structure just wrote.
        if origin + length < extent {
            return Err(Error::DataLengthTooShort {
                type_name,
                field: field.name,
                value,
                written: extent - origin,
            });
        }
        writer.seek_padded(origin + length)?;
    }
    Ok(())
}

/// Version currently held by the instance's version field
fn held_version<T>(schema: &Schema<T>, source: &T) -> Result<Option<Version>> {
    let Some(layout) = schema.default_layout() else {
        return Ok(None);
    };
    let Some(index) = layout.version_field else {
        return Ok(None);
    };
    let field = &layout.fields[index];
    let version = load_scalar(&schema.fields[field.field], source)
        .and_then(version_of)
        .map_err(conversion(schema.type_name(), field))?;
    Ok(Some(version))
}

// ============================================================================
// Helpers
// ============================================================================

fn select<T>(schema: &Schema<T>, version: Option<Version>) -> Result<&VersionLayout> {
    schema.select(version).ok_or(Error::NoLayout {
        type_name: schema.type_name(),
        version,
    })
}

fn store_of(field: &FieldLayout) -> Result<StoreType> {
    field.store.ok_or_else(|| Error::TypeMismatch {
        expected: "scalar field",
        actual: field.name.to_string(),
    })
}

fn encoding_of<T>(type_name: &'static str, entry: &FieldEntry<T>) -> Result<StringEncoding> {
    entry.string_encoding.ok_or_else(|| {
        Error::Schema(SchemaError::StringEncodingMissing {
            type_name,
            field: entry.name,
        })
    })
}

fn load_scalar<T>(
    entry: &FieldEntry<T>,
    source: &T,
) -> std::result::Result<Primitive, ConversionError> {
    match &entry.codec {
        FieldCodec::Scalar(slot) => slot.load(source),
        other => Err(ConversionError::InvalidValue {
            value: format!("{:?}", other.kind()),
            logical: "scalar",
        }),
    }
}

fn conversion<'a>(
    type_name: &'static str,
    field: &'a FieldLayout,
) -> impl FnOnce(ConversionError) -> Error + 'a {
    move |source| Error::Conversion {
        type_name,
        field: field.name,
        source,
    }
}

fn integer(value: Primitive) -> std::result::Result<i64, ConversionError> {
    value
        .convert(StoreType::I64)
        .map(|v| v.as_i128().unwrap_or_default() as i64)
}

/// Version number held in a scalar
fn version_of(value: Primitive) -> std::result::Result<Version, ConversionError> {
    match value.as_i128() {
        Some(whole) => i64::try_from(whole)
            .ok()
            .and_then(Version::checked_new)
            .ok_or_else(|| ConversionError::OutOfRange {
                value: whole.to_string(),
                target: StoreType::I64,
            }),
        None => {
            let marker = value.as_f64();
            Version::from_f64(marker).ok_or_else(|| ConversionError::NotFinite {
                value: marker.to_string(),
                target: StoreType::I64,
            })
        }
    }
}

/// Scalar of type `store` holding `version`
fn version_primitive(
    version: Version,
    store: StoreType,
) -> std::result::Result<Primitive, ConversionError> {
    match version.as_whole() {
        Some(whole) => Primitive::I64(whole).convert(store),
        None if store.is_float() => Primitive::F64(version.to_f64()).convert(store),
        None => Err(ConversionError::InvalidValue {
            value: version.to_string(),
            logical: "whole version number",
        }),
    }
}
