//! Structure schemas
//!
//! A [`Structure`] describes its binary layout once, through
//! [`Structure::describe`]. The description is normalised and validated by
//! the declaration model ([`declare`]), split into non-overlapping
//! [`VersionLayout`]s by the resolver, and cached as an immutable
//! [`Schema`] in the [`SchemaRegistry`](crate::SchemaRegistry).
//!
//! # Example
//!
//! ```ignore
//! #[derive(Default)]
//! struct Header {
//!     magic: u32,
//!     version: i32,
//!     name: String,
//! }
//!
//! impl Structure for Header {
//!     fn describe(decl: &mut Declaration<Self>) {
//!         decl.fixed_size(64);
//!         decl.scalar("magic", |h| &h.magic, |h| &mut h.magic).offset(0);
//!         decl.scalar("version", |h| &h.version, |h| &mut h.version)
//!             .offset(4)
//!             .version_number();
//!         decl.text("name", |h| &h.name, |h| &mut h.name)
//!             .offset(8)
//!             .null_terminated_max(32);
//!     }
//! }
//! ```

pub(crate) mod access;
pub mod declare;

use access::FieldCodec;
use vercodec_core::{ByteOrder, StoreType, Version, VersionRange};
use vercodec_io::StringEncoding;

pub use access::Scalar;
pub use declare::{Declaration, FieldBuilder, VersionBuilder, VersionFieldBuilder};

/// A type with a declared binary layout
pub trait Structure: Sized + 'static {
    /// Declare the type's fields and layout metadata
    fn describe(decl: &mut Declaration<Self>);

    /// Name used in diagnostics
    fn type_name() -> &'static str {
        let full = std::any::type_name::<Self>();
        let base = full.split('<').next().unwrap_or(full);
        base.rsplit("::").next().unwrap_or(base)
    }
}

/// What kind of value a field holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Fixed-width primitive
    Scalar {
        /// Natural store type of the member
        logical: StoreType,
    },
    /// String
    Text,
    /// Fixed-size bufferable value
    Bufferable {
        /// Encoded size
        size: usize,
    },
    /// Nested structure
    Nested {
        /// Name of the nested type
        type_name: &'static str,
    },
}

pub(crate) struct FieldEntry<T> {
    pub(crate) name: &'static str,
    pub(crate) codec: FieldCodec<T>,
    pub(crate) string_encoding: Option<StringEncoding>,
}

/// Placement of one field within a layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLayout {
    /// Index of the field in its schema
    pub field: usize,
    /// Field name
    pub name: &'static str,
    /// Byte offset from the structure origin
    pub offset: u64,
    /// Byte order override
    pub byte_order: Option<ByteOrder>,
    /// Store type for scalar fields
    pub store: Option<StoreType>,
}

/// One physical shape of a structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionLayout {
    /// Versions this layout applies to
    pub range: VersionRange,
    /// Default byte order of the layout's fields; the stream default when absent
    pub byte_order: Option<ByteOrder>,
    /// Total encoded size
    pub size: Option<u64>,
    /// Fields in ascending offset order
    pub fields: Vec<FieldLayout>,
    /// Position in `fields` of the version field
    pub version_field: Option<usize>,
    /// Position in `fields` of the data-length field
    pub data_length_field: Option<usize>,
}

impl VersionLayout {
    /// Field placement by name
    pub fn field(&self, name: &str) -> Option<&FieldLayout> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Byte order for `field`, falling back to the layout and then `stream_default`
    pub fn byte_order_for(&self, field: &FieldLayout, stream_default: ByteOrder) -> ByteOrder {
        field.byte_order.or(self.byte_order).unwrap_or(stream_default)
    }
}

/// Resolved layouts of one structure type
pub struct Schema<T> {
    type_name: &'static str,
    pub(crate) fields: Vec<FieldEntry<T>>,
    layouts: Vec<VersionLayout>,
}

impl<T> Schema<T> {
    pub(crate) fn new(
        type_name: &'static str,
        fields: Vec<FieldEntry<T>>,
        layouts: Vec<VersionLayout>,
    ) -> Self {
        Schema {
            type_name,
            fields,
            layouts,
        }
    }

    /// Name of the structure type
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Layouts in selection order: exact, bounded, default
    pub fn layouts(&self) -> &[VersionLayout] {
        &self.layouts
    }

    /// Names and kinds of all registered fields
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, FieldKind)> + '_ {
        self.fields.iter().map(|f| (f.name, f.codec.kind()))
    }

    /// The first layout whose range contains `version`
    pub fn select(&self, version: Option<Version>) -> Option<&VersionLayout> {
        self.layouts.iter().find(|l| l.range.contains(version))
    }

    /// The unconditional layout, if declared
    pub fn default_layout(&self) -> Option<&VersionLayout> {
        self.layouts.iter().find(|l| l.range.is_unbounded())
    }

    /// Whether the structure carries its own version number
    pub fn has_version_field(&self) -> bool {
        self.default_layout()
            .map_or(false, |l| l.version_field.is_some())
    }
}

impl<T> std::fmt::Debug for Schema<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schema")
            .field("type_name", &self.type_name)
            .field("fields", &self.fields.iter().map(|e| e.name).collect::<Vec<_>>())
            .field("layouts", &self.layouts)
            .finish()
    }
}
