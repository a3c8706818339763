//! Error types for the codec
//!
//! Two tiers of failure are distinguished:
//!
//! - [`SchemaError`]: authoring-time defects in a type's layout declaration.
//!   Raised once when the type's schema is first built and reproduced
//!   verbatim on every later lookup, so it is `Clone`.
//! - [`Error`]: data-time failures raised while decoding or encoding a
//!   particular stream.
//!
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use crate::primitive::StoreType;
use crate::version::{Version, VersionRange};
use std::io;
use thiserror::Error;

/// Result type alias for codec operations
pub type Result<T> = std::result::Result<T, Error>;

/// Data-time errors returned from decode and encode calls
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from the underlying stream
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The stream ended before a field could be fully read
    #[error("unexpected end of stream at position {position}: {needed} more bytes needed")]
    EndOfStream {
        /// Stream position where the read started
        position: u64,
        /// Bytes that were requested
        needed: usize,
    },

    /// The type's layout declaration is defective
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// A value could not be converted between its logical and storage types
    #[error("cannot convert field {type_name}.{field}: {source}")]
    Conversion {
        /// Structure type
        type_name: &'static str,
        /// Field name
        field: &'static str,
        /// Underlying conversion failure
        #[source]
        source: ConversionError,
    },

    /// A data-length field held a negative value
    #[error("data length of {type_name}.{field} is negative: {value}")]
    NegativeDataLength {
        /// Structure type
        type_name: &'static str,
        /// Field name
        field: &'static str,
        /// Decoded value
        value: i64,
    },

    /// A data-length field points past the end of the stream
    #[error("data length of {type_name}.{field} is {value} but only {available} bytes remain")]
    DataLengthOutOfRange {
        /// Structure type
        type_name: &'static str,
        /// Field name
        field: &'static str,
        /// Decoded value
        value: i64,
        /// Bytes available from the structure origin to the end of the stream
        available: u64,
    },

    /// A data-length value on encode is shorter than the fields it covers
    #[error("data length of {type_name}.{field} is {value} but the fields span {written} bytes")]
    DataLengthTooShort {
        /// Structure type
        type_name: &'static str,
        /// Field name
        field: &'static str,
        /// Instance value
        value: i64,
        /// Bytes written from the structure origin
        written: u64,
    },

    /// A length prefix was negative or does not fit in 32 bits
    #[error("invalid length prefix {value} at position {position}")]
    InvalidLength {
        /// Stream position of the prefix
        position: u64,
        /// Prefix value
        value: i64,
    },

    /// Malformed text under strict decoding
    #[error("malformed {encoding} text at position {position}")]
    InvalidText {
        /// Stream position where the string started
        position: u64,
        /// Name of the text encoding in use
        encoding: &'static str,
    },

    /// No layout of the type matches the requested version
    #[error("{type_name} has no layout for version {}", display_version(.version))]
    NoLayout {
        /// Structure type
        type_name: &'static str,
        /// Requested version, if any
        version: Option<Version>,
    },

    /// A runtime tag does not name a registered structure
    #[error("unknown structure: {0}")]
    UnknownStructure(String),

    /// A dynamic instance is not of the expected type
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Type the dispatcher was asked to handle
        expected: &'static str,
        /// Description of the instance that was supplied
        actual: String,
    },

    /// Invalid codec configuration
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

fn display_version(version: &Option<Version>) -> String {
    match version {
        Some(v) => v.to_string(),
        None => "<none>".to_string(),
    }
}

/// Authoring-time errors in a structure's layout declaration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Two declarations of the same kind on one member intersect
    #[error("{type_name}.{member}: {declaration} declarations {first} and {second} overlap")]
    VersionOverlap {
        /// Structure type
        type_name: &'static str,
        /// Field name, or `<type>` for type-level declarations
        member: &'static str,
        /// Declaration kind (offset, byte order, ...)
        declaration: &'static str,
        /// First range
        first: VersionRange,
        /// Second range
        second: VersionRange,
    },

    /// Two resolved layouts of a type intersect
    #[error("{type_name}: layouts {first} and {second} overlap")]
    LayoutOverlap {
        /// Structure type
        type_name: &'static str,
        /// First range
        first: VersionRange,
        /// Second range
        second: VersionRange,
    },

    /// A layout references a field that was never registered with accessors
    #[error("{type_name}.{field}: no accessor registered")]
    MissingAccessor {
        /// Structure type
        type_name: &'static str,
        /// Field name
        field: String,
    },

    /// A field name was registered twice
    #[error("{type_name}.{field}: field registered more than once")]
    DuplicateField {
        /// Structure type
        type_name: &'static str,
        /// Field name
        field: &'static str,
    },

    /// A textual field declares no string encoding
    #[error("{type_name}.{field}: text field requires a string encoding")]
    StringEncodingMissing {
        /// Structure type
        type_name: &'static str,
        /// Field name
        field: &'static str,
    },

    /// A textual field declares more than one string encoding
    #[error("{type_name}.{field}: more than one string encoding declared")]
    StringEncodingConflict {
        /// Structure type
        type_name: &'static str,
        /// Field name
        field: &'static str,
    },

    /// A non-textual field declares a string encoding
    #[error("{type_name}.{field}: string encoding declared on a non-text field")]
    StringEncodingOnNonText {
        /// Structure type
        type_name: &'static str,
        /// Field name
        field: &'static str,
    },

    /// A string encoding has unusable parameters
    #[error("{type_name}.{field}: invalid string encoding: {reason}")]
    InvalidStringEncoding {
        /// Structure type
        type_name: &'static str,
        /// Field name
        field: &'static str,
        /// What is wrong
        reason: &'static str,
    },

    /// More than one field is marked as the version field
    #[error("{type_name}: fields {first} and {second} are both marked as the version field")]
    MultipleVersionFields {
        /// Structure type
        type_name: &'static str,
        /// First field
        first: &'static str,
        /// Second field
        second: &'static str,
    },

    /// The version field cannot hold a version number or is version-scoped
    #[error("{type_name}.{field}: invalid version field: {reason}")]
    InvalidVersionField {
        /// Structure type
        type_name: &'static str,
        /// Field name
        field: &'static str,
        /// What is wrong
        reason: &'static str,
    },

    /// More than one data-length field applies to one layout
    #[error("{type_name}: fields {first} and {second} are both data-length fields in {range}")]
    MultipleDataLengthFields {
        /// Structure type
        type_name: &'static str,
        /// First field
        first: &'static str,
        /// Second field
        second: &'static str,
        /// Layout range
        range: VersionRange,
    },

    /// The data-length field is not integer-backed
    #[error("{type_name}.{field}: data-length field must be stored as an integer")]
    InvalidDataLengthField {
        /// Structure type
        type_name: &'static str,
        /// Field name
        field: &'static str,
    },

    /// No conversion exists between the logical and the storage type
    #[error("{type_name}.{field}: cannot store {logical} as {store:?}")]
    UnsupportedStoreType {
        /// Structure type
        type_name: &'static str,
        /// Field name
        field: &'static str,
        /// Logical type of the member
        logical: String,
        /// Requested storage type
        store: StoreType,
    },

    /// A version range has its minimum above its maximum
    #[error("{type_name}.{member}: invalid version range {range}")]
    InvalidRange {
        /// Structure type
        type_name: &'static str,
        /// Field name, or `<type>` for type-level declarations
        member: &'static str,
        /// The offending range
        range: VersionRange,
    },

    /// A fixed size of zero was declared
    #[error("{type_name}: fixed size must be positive")]
    InvalidFixedSize {
        /// Structure type
        type_name: &'static str,
    },

    /// Inline field declarations and explicit version layouts were mixed
    #[error("{type_name}: inline offsets cannot be combined with explicit version layouts")]
    MixedDeclarationStyles {
        /// Structure type
        type_name: &'static str,
    },
}

/// Failure converting a value between its logical and storage types
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    /// The value does not fit the target type
    #[error("value {value} is out of range for {target:?}")]
    OutOfRange {
        /// Rendered source value
        value: String,
        /// Target type
        target: StoreType,
    },

    /// A floating-point value is NaN or infinite
    #[error("non-finite value {value} cannot be stored as {target:?}")]
    NotFinite {
        /// Rendered source value
        value: String,
        /// Target type
        target: StoreType,
    },

    /// The pairing of source and target types has no conversion
    #[error("no conversion from {from:?} to {to:?}")]
    Unsupported {
        /// Source type
        from: StoreType,
        /// Target type
        to: StoreType,
    },

    /// A decoded number is not a valid logical value (e.g. an unknown enum ordinal)
    #[error("invalid value {value} for {logical}")]
    InvalidValue {
        /// Rendered value
        value: String,
        /// Logical type name
        logical: &'static str,
    },
}
