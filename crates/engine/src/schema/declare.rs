//! Declaration model
//!
//! [`Declaration`] collects a structure's layout metadata in one of two
//! styles:
//!
//! - **Inline**: each field carries its own version-scoped offsets, byte
//!   orders and store types (`decl.scalar(..).offset_in(range, 8)`), and the
//!   resolver derives the layouts.
//! - **Explicit**: fields are registered without placement and each layout is
//!   spelled out with [`Declaration::version`], for layouts that are easier to
//!   state per version than per field.
//!
//! Mixing the two styles in one type is rejected. Shape validation happens
//! in [`Declaration::validate`]; version semantics are left to the resolver.

use super::access::{FieldCodec, Lens, Scalar};
use super::Structure;
use vercodec_core::{find_overlap, ByteOrder, Ranged, SchemaError, StoreType, Version, VersionRange};
use vercodec_io::{Bufferable, StringEncoding};

const TYPE_MEMBER: &str = "<type>";

pub(crate) struct FieldDecl<T> {
    pub(crate) name: &'static str,
    pub(crate) codec: FieldCodec<T>,
    pub(crate) offsets: Vec<Ranged<u64>>,
    pub(crate) byte_orders: Vec<Ranged<ByteOrder>>,
    pub(crate) store_types: Vec<Ranged<StoreType>>,
    pub(crate) membership: VersionRange,
    pub(crate) data_length: Vec<VersionRange>,
    pub(crate) version_number: bool,
    pub(crate) string_encodings: Vec<StringEncoding>,
}

impl<T> FieldDecl<T> {
    fn has_inline_layout(&self) -> bool {
        !self.offsets.is_empty()
            || !self.byte_orders.is_empty()
            || !self.store_types.is_empty()
            || !self.membership.is_unbounded()
            || !self.data_length.is_empty()
            || self.version_number
    }

    fn logical_store(&self) -> Option<StoreType> {
        match &self.codec {
            FieldCodec::Scalar(slot) => Some(slot.logical()),
            _ => None,
        }
    }

    fn describe_kind(&self) -> String {
        match &self.codec {
            FieldCodec::Scalar(slot) => format!("{:?}", slot.logical()),
            FieldCodec::Text(_) => "text".to_string(),
            FieldCodec::Buffer(_) => "bufferable".to_string(),
            FieldCodec::Nested(slot) => slot.type_name().to_string(),
        }
    }
}

pub(crate) struct VersionDecl {
    pub(crate) range: VersionRange,
    pub(crate) byte_order: Option<ByteOrder>,
    pub(crate) size: Option<u64>,
    pub(crate) fields: Vec<VersionFieldDecl>,
}

pub(crate) struct VersionFieldDecl {
    pub(crate) field: usize,
    pub(crate) offset: u64,
    pub(crate) byte_order: Option<ByteOrder>,
    pub(crate) store: Option<StoreType>,
    pub(crate) data_length: bool,
    pub(crate) version_number: bool,
}

/// Layout metadata of one structure type, filled in by [`Structure::describe`]
pub struct Declaration<T> {
    type_name: &'static str,
    pub(crate) fields: Vec<FieldDecl<T>>,
    pub(crate) byte_orders: Vec<Ranged<ByteOrder>>,
    pub(crate) sizes: Vec<Ranged<u64>>,
    pub(crate) versions: Vec<VersionDecl>,
    errors: Vec<SchemaError>,
}

impl<T: 'static> Declaration<T> {
    pub(crate) fn new(type_name: &'static str) -> Self {
        Declaration {
            type_name,
            fields: Vec::new(),
            byte_orders: Vec::new(),
            sizes: Vec::new(),
            versions: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Name of the structure type
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    // ========================================================================
    // Type-level declarations (inline style)
    // ========================================================================

    /// Default byte order for every version
    pub fn byte_order(&mut self, order: ByteOrder) -> &mut Self {
        self.byte_order_in(VersionRange::any(), order)
    }

    /// Default byte order for versions in `range`
    pub fn byte_order_in(&mut self, range: VersionRange, order: ByteOrder) -> &mut Self {
        self.byte_orders.push(Ranged::new(range, order));
        self
    }

    /// Total encoded size for every version
    pub fn fixed_size(&mut self, size: u64) -> &mut Self {
        self.fixed_size_in(VersionRange::any(), size)
    }

    /// Total encoded size for versions in `range`
    pub fn fixed_size_in(&mut self, range: VersionRange, size: u64) -> &mut Self {
        self.sizes.push(Ranged::new(range, size));
        self
    }

    // ========================================================================
    // Field registration
    // ========================================================================

    fn push_field(&mut self, name: &'static str, codec: FieldCodec<T>) -> FieldBuilder<'_, T> {
        self.fields.push(FieldDecl {
            name,
            codec,
            offsets: Vec::new(),
            byte_orders: Vec::new(),
            store_types: Vec::new(),
            membership: VersionRange::any(),
            data_length: Vec::new(),
            version_number: false,
            string_encodings: Vec::new(),
        });
        let index = self.fields.len() - 1;
        FieldBuilder {
            field: &mut self.fields[index],
        }
    }

    /// Register a scalar member
    pub fn scalar<F: Scalar>(
        &mut self,
        name: &'static str,
        get: impl Fn(&T) -> &F + Send + Sync + 'static,
        get_mut: impl Fn(&mut T) -> &mut F + Send + Sync + 'static,
    ) -> FieldBuilder<'_, T> {
        let codec = FieldCodec::Scalar(Box::new(Lens::new(get, get_mut)));
        self.push_field(name, codec)
    }

    /// Register a string member
    pub fn text(
        &mut self,
        name: &'static str,
        get: impl Fn(&T) -> &String + Send + Sync + 'static,
        get_mut: impl Fn(&mut T) -> &mut String + Send + Sync + 'static,
    ) -> FieldBuilder<'_, T> {
        let codec = FieldCodec::Text(Box::new(Lens::new(get, get_mut)));
        self.push_field(name, codec)
    }

    /// Register a bufferable member
    pub fn bufferable<B: Bufferable + 'static>(
        &mut self,
        name: &'static str,
        get: impl Fn(&T) -> &B + Send + Sync + 'static,
        get_mut: impl Fn(&mut T) -> &mut B + Send + Sync + 'static,
    ) -> FieldBuilder<'_, T> {
        let codec = FieldCodec::Buffer(Box::new(Lens::new(get, get_mut)));
        self.push_field(name, codec)
    }

    /// Register a nested structure member
    pub fn nested<N: Structure>(
        &mut self,
        name: &'static str,
        get: impl Fn(&T) -> &N + Send + Sync + 'static,
        get_mut: impl Fn(&mut T) -> &mut N + Send + Sync + 'static,
    ) -> FieldBuilder<'_, T> {
        let codec = FieldCodec::Nested(Box::new(Lens::new(get, get_mut)));
        self.push_field(name, codec)
    }

    // ========================================================================
    // Explicit layouts
    // ========================================================================

    /// Declare the layout used for versions in `range`
    pub fn version(&mut self, range: VersionRange) -> VersionBuilder<'_, T> {
        self.versions.push(VersionDecl {
            range,
            byte_order: None,
            size: None,
            fields: Vec::new(),
        });
        let index = self.versions.len() - 1;
        VersionBuilder { decl: self, index }
    }

    /// Declare the layout used when no other layout matches
    pub fn default_version(&mut self) -> VersionBuilder<'_, T> {
        self.version(VersionRange::any())
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Check the declaration's shape
    ///
    /// Covers everything that does not depend on resolving version
    /// intervals: duplicate names, string encodings, store type
    /// compatibility, overlapping declarations on one member, and the
    /// version and data-length roles.
    pub(crate) fn validate(&self) -> Result<(), SchemaError> {
        if let Some(err) = self.errors.first() {
            return Err(err.clone());
        }
        let type_name = self.type_name;

        for (i, field) in self.fields.iter().enumerate() {
            if self.fields[..i].iter().any(|f| f.name == field.name) {
                return Err(SchemaError::DuplicateField {
                    type_name,
                    field: field.name,
                });
            }
        }

        let inline = !self.byte_orders.is_empty()
            || !self.sizes.is_empty()
            || self.fields.iter().any(FieldDecl::has_inline_layout);
        if inline && !self.versions.is_empty() {
            return Err(SchemaError::MixedDeclarationStyles { type_name });
        }

        check_ranged(type_name, TYPE_MEMBER, "byte order", &self.byte_orders)?;
        check_ranged(type_name, TYPE_MEMBER, "fixed size", &self.sizes)?;
        if self.sizes.iter().any(|s| s.value == 0) {
            return Err(SchemaError::InvalidFixedSize { type_name });
        }

        let mut version_field: Option<&'static str> = None;
        for field in &self.fields {
            self.validate_field(field)?;
            if field.version_number {
                if let Some(first) = version_field {
                    return Err(SchemaError::MultipleVersionFields {
                        type_name,
                        first,
                        second: field.name,
                    });
                }
                version_field = Some(field.name);
            }
        }

        for version in &self.versions {
            self.validate_version(version)?;
        }
        self.validate_explicit_version_field()
    }

    /// All explicit layouts that mark a version field must mark the same one,
    /// and the default layout must place it so detection can read it before
    /// any bounded layout is chosen.
    fn validate_explicit_version_field(&self) -> Result<(), SchemaError> {
        let type_name = self.type_name;
        let mut first: Option<usize> = None;
        for version in &self.versions {
            for entry in version.fields.iter().filter(|e| e.version_number) {
                match first {
                    None => first = Some(entry.field),
                    Some(index) if index != entry.field => {
                        return Err(SchemaError::MultipleVersionFields {
                            type_name,
                            first: self.fields[index].name,
                            second: self.fields[entry.field].name,
                        });
                    }
                    Some(_) => {}
                }
            }
        }

        let Some(index) = first else {
            return Ok(());
        };
        let in_default = self.versions.iter().any(|version| {
            version.range.is_unbounded()
                && version
                    .fields
                    .iter()
                    .any(|e| e.field == index && e.version_number)
        });
        if in_default {
            Ok(())
        } else {
            Err(SchemaError::InvalidVersionField {
                type_name,
                field: self.fields[index].name,
                reason: "must be placed in the default layout",
            })
        }
    }

    fn validate_field(&self, field: &FieldDecl<T>) -> Result<(), SchemaError> {
        let type_name = self.type_name;
        let name = field.name;

        check_ranged(type_name, name, "offset", &field.offsets)?;
        check_ranged(type_name, name, "byte order", &field.byte_orders)?;
        check_ranged(type_name, name, "store type", &field.store_types)?;
        check_range(type_name, name, &field.membership)?;
        for range in &field.data_length {
            check_range(type_name, name, range)?;
        }

        match (&field.codec, field.string_encodings.as_slice()) {
            (FieldCodec::Text(_), []) => {
                return Err(SchemaError::StringEncodingMissing {
                    type_name,
                    field: name,
                })
            }
            (FieldCodec::Text(_), [encoding]) => {
                encoding
                    .validate()
                    .map_err(|reason| SchemaError::InvalidStringEncoding {
                        type_name,
                        field: name,
                        reason,
                    })?;
            }
            (FieldCodec::Text(_), _) => {
                return Err(SchemaError::StringEncodingConflict {
                    type_name,
                    field: name,
                })
            }
            (_, []) => {}
            (_, _) => {
                return Err(SchemaError::StringEncodingOnNonText {
                    type_name,
                    field: name,
                })
            }
        }

        for store in &field.store_types {
            self.check_store(field, store.value)?;
        }
        if !field.data_length.is_empty() {
            self.check_data_length(field, field.store_types.iter().map(|s| s.value))?;
        }
        if field.version_number {
            self.check_version_kind(field, field.store_types.iter().map(|s| s.value))?;
            let invalid = |reason| SchemaError::InvalidVersionField {
                type_name,
                field: name,
                reason,
            };
            if !field.data_length.is_empty() {
                return Err(invalid("cannot also be the data-length field"));
            }
            if !field.membership.is_unbounded() {
                return Err(invalid("must exist in every version"));
            }
            if field.offsets.is_empty() {
                return Err(invalid("has no offset"));
            }
            let scoped = field.offsets.iter().any(|o| !o.range.is_unbounded())
                || field.byte_orders.iter().any(|o| !o.range.is_unbounded())
                || field.store_types.iter().any(|o| !o.range.is_unbounded());
            if scoped {
                return Err(invalid("placement cannot depend on the version"));
            }
        }
        Ok(())
    }

    fn validate_version(&self, version: &VersionDecl) -> Result<(), SchemaError> {
        let type_name = self.type_name;
        check_range(type_name, TYPE_MEMBER, &version.range)?;
        if version.size == Some(0) {
            return Err(SchemaError::InvalidFixedSize { type_name });
        }

        let mut version_field: Option<&'static str> = None;
        for (i, entry) in version.fields.iter().enumerate() {
            let field = &self.fields[entry.field];
            if version.fields[..i].iter().any(|e| e.field == entry.field) {
                return Err(SchemaError::DuplicateField {
                    type_name,
                    field: field.name,
                });
            }
            if let Some(store) = entry.store {
                self.check_store(field, store)?;
            }
            if entry.data_length {
                self.check_data_length(field, entry.store)?;
            }
            if entry.version_number {
                self.check_version_kind(field, entry.store)?;
                if entry.data_length {
                    return Err(SchemaError::InvalidVersionField {
                        type_name,
                        field: field.name,
                        reason: "cannot also be the data-length field",
                    });
                }
                if let Some(first) = version_field {
                    return Err(SchemaError::MultipleVersionFields {
                        type_name,
                        first,
                        second: field.name,
                    });
                }
                version_field = Some(field.name);
            }
        }
        Ok(())
    }

    fn check_store(&self, field: &FieldDecl<T>, store: StoreType) -> Result<(), SchemaError> {
        let supported = field
            .logical_store()
            .map_or(false, |logical| logical.can_convert(store));
        if supported {
            Ok(())
        } else {
            Err(SchemaError::UnsupportedStoreType {
                type_name: self.type_name,
                field: field.name,
                logical: field.describe_kind(),
                store,
            })
        }
    }

    fn check_data_length(
        &self,
        field: &FieldDecl<T>,
        overrides: impl IntoIterator<Item = StoreType>,
    ) -> Result<(), SchemaError> {
        let integer = field.logical_store().map_or(false, StoreType::is_integer)
            && overrides.into_iter().all(StoreType::is_integer);
        if integer {
            Ok(())
        } else {
            Err(SchemaError::InvalidDataLengthField {
                type_name: self.type_name,
                field: field.name,
            })
        }
    }

    fn check_version_kind(
        &self,
        field: &FieldDecl<T>,
        overrides: impl IntoIterator<Item = StoreType>,
    ) -> Result<(), SchemaError> {
        let valid = field.logical_store().map_or(false, StoreType::is_numeric)
            && overrides.into_iter().all(StoreType::is_numeric);
        if valid {
            Ok(())
        } else {
            Err(SchemaError::InvalidVersionField {
                type_name: self.type_name,
                field: field.name,
                reason: "must be a numeric scalar",
            })
        }
    }
}

fn check_range(
    type_name: &'static str,
    member: &'static str,
    range: &VersionRange,
) -> Result<(), SchemaError> {
    if range.is_valid() {
        Ok(())
    } else {
        Err(SchemaError::InvalidRange {
            type_name,
            member,
            range: *range,
        })
    }
}

fn check_ranged<V>(
    type_name: &'static str,
    member: &'static str,
    declaration: &'static str,
    entries: &[Ranged<V>],
) -> Result<(), SchemaError> {
    for entry in entries {
        check_range(type_name, member, &entry.range)?;
    }
    match find_overlap(entries) {
        Some((first, second)) => Err(SchemaError::VersionOverlap {
            type_name,
            member,
            declaration,
            first,
            second,
        }),
        None => Ok(()),
    }
}

/// Inline placement of one field
pub struct FieldBuilder<'d, T> {
    field: &'d mut FieldDecl<T>,
}

impl<'d, T> FieldBuilder<'d, T> {
    /// Offset from the structure origin in every version
    pub fn offset(self, offset: u64) -> Self {
        self.offset_in(VersionRange::any(), offset)
    }

    /// Offset from the structure origin for versions in `range`
    pub fn offset_in(self, range: VersionRange, offset: u64) -> Self {
        self.field.offsets.push(Ranged::new(range, offset));
        self
    }

    /// Byte order override in every version
    pub fn byte_order(self, order: ByteOrder) -> Self {
        self.byte_order_in(VersionRange::any(), order)
    }

    /// Byte order override for versions in `range`
    pub fn byte_order_in(self, range: VersionRange, order: ByteOrder) -> Self {
        self.field.byte_orders.push(Ranged::new(range, order));
        self
    }

    /// Store the value as `store` in every version
    pub fn store_as(self, store: StoreType) -> Self {
        self.store_as_in(VersionRange::any(), store)
    }

    /// Store the value as `store` for versions in `range`
    pub fn store_as_in(self, range: VersionRange, store: StoreType) -> Self {
        self.field.store_types.push(Ranged::new(range, store));
        self
    }

    /// The field exists from `version` onwards
    pub fn min_version(self, version: Version) -> Self {
        self.field.membership.min = Some(version);
        self
    }

    /// The field exists below `version`
    pub fn max_version(self, version: Version) -> Self {
        self.field.membership.max = Some(version);
        self
    }

    /// The field exists only in `version`
    pub fn only_version(self, version: Version) -> Self {
        self.field.membership = VersionRange::exact(version);
        self
    }

    /// The field's value is the structure's version number
    pub fn version_number(self) -> Self {
        self.field.version_number = true;
        self
    }

    /// The field's value is the structure's total encoded length
    pub fn data_length(self) -> Self {
        self.data_length_in(VersionRange::any())
    }

    /// The field's value is the structure's total encoded length in `range`
    pub fn data_length_in(self, range: VersionRange) -> Self {
        self.field.data_length.push(range);
        self
    }

    /// Fixed-length string, space padded, untrimmed
    pub fn fixed_length(self, length: usize) -> Self {
        self.string(StringEncoding::fixed(length))
    }

    /// Fixed-length string with explicit trimming and padding
    pub fn fixed_length_with(self, length: usize, trim: bool, padding: char) -> Self {
        self.string(StringEncoding::FixedLength {
            length,
            trim,
            padding,
        })
    }

    /// Null-terminated string of any length
    pub fn null_terminated(self) -> Self {
        self.string(StringEncoding::NullTerminated { max_length: None })
    }

    /// Null-terminated string occupying exactly `max_length` bytes
    pub fn null_terminated_max(self, max_length: usize) -> Self {
        self.string(StringEncoding::NullTerminated {
            max_length: Some(max_length),
        })
    }

    /// String preceded by a 32-bit byte count
    pub fn length_prefixed(self) -> Self {
        self.string(StringEncoding::LengthPrefixed)
    }

    /// Any string encoding
    pub fn string(self, encoding: StringEncoding) -> Self {
        self.field.string_encodings.push(encoding);
        self
    }
}

/// One explicitly declared layout
pub struct VersionBuilder<'d, T> {
    decl: &'d mut Declaration<T>,
    index: usize,
}

impl<'d, T> VersionBuilder<'d, T> {
    /// Default byte order of the layout
    pub fn byte_order(self, order: ByteOrder) -> Self {
        self.decl.versions[self.index].byte_order = Some(order);
        self
    }

    /// Total encoded size of the layout
    pub fn fixed_size(self, size: u64) -> Self {
        self.decl.versions[self.index].size = Some(size);
        self
    }

    /// Place the registered field `name` at `offset`
    pub fn field(&mut self, name: &str, offset: u64) -> VersionFieldBuilder<'_> {
        let Some(field) = self.decl.fields.iter().position(|f| f.name == name) else {
            self.decl.errors.push(SchemaError::MissingAccessor {
                type_name: self.decl.type_name,
                field: name.to_string(),
            });
            return VersionFieldBuilder { entry: None };
        };
        let fields = &mut self.decl.versions[self.index].fields;
        fields.push(VersionFieldDecl {
            field,
            offset,
            byte_order: None,
            store: None,
            data_length: false,
            version_number: false,
        });
        VersionFieldBuilder {
            entry: fields.last_mut(),
        }
    }
}

/// Placement of one field within an explicit layout
pub struct VersionFieldBuilder<'v> {
    entry: Option<&'v mut VersionFieldDecl>,
}

impl<'v> VersionFieldBuilder<'v> {
    /// Byte order override
    pub fn byte_order(mut self, order: ByteOrder) -> Self {
        if let Some(entry) = self.entry.as_deref_mut() {
            entry.byte_order = Some(order);
        }
        self
    }

    /// Store the value as `store`
    pub fn store_as(mut self, store: StoreType) -> Self {
        if let Some(entry) = self.entry.as_deref_mut() {
            entry.store = Some(store);
        }
        self
    }

    /// The field's value is the structure's total encoded length
    pub fn data_length(mut self) -> Self {
        if let Some(entry) = self.entry.as_deref_mut() {
            entry.data_length = true;
        }
        self
    }

    /// The field's value is the structure's version number
    ///
    /// Every layout that marks a version field must mark the same field, and
    /// the default layout must mark it too: detection reads it from there.
    pub fn version_number(mut self) -> Self {
        if let Some(entry) = self.entry.as_deref_mut() {
            entry.version_number = true;
        }
        self
    }
}
