//! Field accessors
//!
//! A field is bound to its structure through a lens pair: a getter
//! `Fn(&T) -> &F` and a mutator `Fn(&mut T) -> &mut F`. The lens is erased
//! into one of four slot kinds, matching the closed set of field codecs:
//!
//! | Kind | Member type | Codec |
//! |------|-------------|-------|
//! | scalar | any [`Scalar`] | fixed-width primitive, optional store override |
//! | text | `String` | one of the string strategies |
//! | bufferable | any [`Bufferable`] | fixed-size span, chunk-reversed for big-endian |
//! | nested | any [`Structure`] | recursive structure decode |

use super::Structure;
use crate::registry::SchemaRegistry;
use std::marker::PhantomData;
use vercodec_core::{f16, ByteOrder, ConversionError, Primitive, Result, StoreType, Uuid, Version};
use vercodec_io::strategy::buffer;
use vercodec_io::{Bufferable, EndianReader, EndianWriter};

/// A logical member value with a primitive representation
///
/// Implemented for the integer, float and bool primitives, [`f16`],
/// [`Uuid`] and `Option<S>`. Ordinal-backed enums implement it with
/// [`impl_scalar_enum!`](crate::impl_scalar_enum).
pub trait Scalar: Sized + 'static {
    /// Natural store type of the member
    const STORE: StoreType;

    /// Primitive of type `STORE` for this value
    fn to_primitive(&self) -> std::result::Result<Primitive, ConversionError>;

    /// Value from a primitive of type `STORE`
    fn from_primitive(value: Primitive) -> std::result::Result<Self, ConversionError>;
}

macro_rules! impl_scalar_native {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Scalar for $ty {
                const STORE: StoreType = StoreType::$variant;

                fn to_primitive(&self) -> std::result::Result<Primitive, ConversionError> {
                    Ok(Primitive::$variant(*self))
                }

                fn from_primitive(value: Primitive) -> std::result::Result<Self, ConversionError> {
                    match value.convert(StoreType::$variant)? {
                        Primitive::$variant(v) => Ok(v),
                        other => Err(ConversionError::Unsupported {
                            from: other.store_type(),
                            to: StoreType::$variant,
                        }),
                    }
                }
            }
        )*
    };
}

impl_scalar_native! {
    bool => Bool,
    i8 => I8,
    u8 => U8,
    i16 => I16,
    u16 => U16,
    i32 => I32,
    u32 => U32,
    i64 => I64,
    u64 => U64,
    f16 => F16,
    f32 => F32,
    f64 => F64,
    Uuid => Guid,
}

/// `None` encodes as zero; decoding always yields `Some`
impl<S: Scalar> Scalar for Option<S> {
    const STORE: StoreType = S::STORE;

    fn to_primitive(&self) -> std::result::Result<Primitive, ConversionError> {
        match self {
            Some(value) => value.to_primitive(),
            None => Ok(Primitive::zero(S::STORE)),
        }
    }

    fn from_primitive(value: Primitive) -> std::result::Result<Self, ConversionError> {
        S::from_primitive(value).map(Some)
    }
}

/// Implement [`Scalar`] for a fieldless `Copy` enum with explicit discriminants
///
/// ```ignore
/// #[derive(Clone, Copy, Debug, PartialEq, Default)]
/// #[repr(u8)]
/// enum Format { #[default] Dxt1 = 0, Dxt5 = 2 }
///
/// impl_scalar_enum!(Format: U8 { Dxt1, Dxt5 });
/// ```
#[macro_export]
macro_rules! impl_scalar_enum {
    ($ty:ident : $store:ident { $($variant:ident),+ $(,)? }) => {
        impl $crate::Scalar for $ty {
            const STORE: $crate::StoreType = $crate::StoreType::$store;

            fn to_primitive(
                &self,
            ) -> ::std::result::Result<$crate::Primitive, $crate::ConversionError> {
                $crate::Primitive::from_i128(*self as i128, Self::STORE).ok_or_else(|| {
                    $crate::ConversionError::OutOfRange {
                        value: (*self as i128).to_string(),
                        target: Self::STORE,
                    }
                })
            }

            fn from_primitive(
                value: $crate::Primitive,
            ) -> ::std::result::Result<Self, $crate::ConversionError> {
                let ordinal = value.as_i128();
                $(
                    if ordinal == Some($ty::$variant as i128) {
                        return Ok($ty::$variant);
                    }
                )+
                Err($crate::ConversionError::InvalidValue {
                    value: format!("{:?}", value),
                    logical: stringify!($ty),
                })
            }
        }
    };
}

/// Lens pair binding a member of type `F` inside `T`
pub(crate) struct Lens<T, F, G, M> {
    get: G,
    get_mut: M,
    _marker: PhantomData<fn(&T) -> &F>,
}

impl<T, F, G, M> Lens<T, F, G, M>
where
    G: Fn(&T) -> &F + Send + Sync + 'static,
    M: Fn(&mut T) -> &mut F + Send + Sync + 'static,
{
    pub(crate) fn new(get: G, get_mut: M) -> Self {
        Lens {
            get,
            get_mut,
            _marker: PhantomData,
        }
    }
}

pub(crate) trait ScalarSlot<T>: Send + Sync {
    /// Natural store type of the member
    fn logical(&self) -> StoreType;

    /// Member value as a primitive of its natural store type
    fn load(&self, target: &T) -> std::result::Result<Primitive, ConversionError>;

    /// Assign from a primitive of any convertible store type
    fn store(&self, target: &mut T, value: Primitive) -> std::result::Result<(), ConversionError>;
}

impl<T, F, G, M> ScalarSlot<T> for Lens<T, F, G, M>
where
    F: Scalar,
    G: Fn(&T) -> &F + Send + Sync + 'static,
    M: Fn(&mut T) -> &mut F + Send + Sync + 'static,
{
    fn logical(&self) -> StoreType {
        F::STORE
    }

    fn load(&self, target: &T) -> std::result::Result<Primitive, ConversionError> {
        (self.get)(target).to_primitive()
    }

    fn store(&self, target: &mut T, value: Primitive) -> std::result::Result<(), ConversionError> {
        let value = F::from_primitive(value.convert(F::STORE)?)?;
        *(self.get_mut)(target) = value;
        Ok(())
    }
}

pub(crate) trait TextSlot<T>: Send + Sync {
    fn load<'a>(&self, target: &'a T) -> &'a str;

    fn store(&self, target: &mut T, value: String);
}

impl<T, G, M> TextSlot<T> for Lens<T, String, G, M>
where
    G: Fn(&T) -> &String + Send + Sync + 'static,
    M: Fn(&mut T) -> &mut String + Send + Sync + 'static,
{
    fn load<'a>(&self, target: &'a T) -> &'a str {
        (self.get)(target).as_str()
    }

    fn store(&self, target: &mut T, value: String) {
        *(self.get_mut)(target) = value;
    }
}

pub(crate) trait BufferSlot<T>: Send + Sync {
    fn size(&self) -> usize;

    fn decode(&self, target: &mut T, bytes: &[u8], order: ByteOrder);

    fn encode(&self, source: &T, order: ByteOrder, out: &mut [u8]);
}

impl<T, B, G, M> BufferSlot<T> for Lens<T, B, G, M>
where
    B: Bufferable + 'static,
    G: Fn(&T) -> &B + Send + Sync + 'static,
    M: Fn(&mut T) -> &mut B + Send + Sync + 'static,
{
    fn size(&self) -> usize {
        B::SIZE_OF
    }

    fn decode(&self, target: &mut T, bytes: &[u8], order: ByteOrder) {
        *(self.get_mut)(target) = buffer::decode::<B>(bytes, order);
    }

    fn encode(&self, source: &T, order: ByteOrder, out: &mut [u8]) {
        buffer::encode((self.get)(source), order, out);
    }
}

pub(crate) trait NestedSlot<T>: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn decode(
        &self,
        target: &mut T,
        reader: &mut EndianReader<'_>,
        registry: &SchemaRegistry,
        origin: u64,
        version: Option<Version>,
    ) -> Result<()>;

    fn encode(
        &self,
        source: &T,
        writer: &mut EndianWriter<'_>,
        registry: &SchemaRegistry,
        origin: u64,
        version: Option<Version>,
    ) -> Result<()>;
}

impl<T, N, G, M> NestedSlot<T> for Lens<T, N, G, M>
where
    N: Structure,
    G: Fn(&T) -> &N + Send + Sync + 'static,
    M: Fn(&mut T) -> &mut N + Send + Sync + 'static,
{
    fn type_name(&self) -> &'static str {
        N::type_name()
    }

    fn decode(
        &self,
        target: &mut T,
        reader: &mut EndianReader<'_>,
        registry: &SchemaRegistry,
        origin: u64,
        version: Option<Version>,
    ) -> Result<()> {
        let schema = registry.schema::<N>()?;
        let version = if schema.has_version_field() { None } else { version };
        crate::orchestrator::populate_with(
            registry,
            &schema,
            (self.get_mut)(target),
            reader,
            origin,
            version,
        )
    }

    fn encode(
        &self,
        source: &T,
        writer: &mut EndianWriter<'_>,
        registry: &SchemaRegistry,
        origin: u64,
        version: Option<Version>,
    ) -> Result<()> {
        let schema = registry.schema::<N>()?;
        let version = if schema.has_version_field() { None } else { version };
        crate::orchestrator::encode_with(registry, &schema, (self.get)(source), writer, origin, version)
    }
}

/// Erased field codec, one variant per field kind
pub(crate) enum FieldCodec<T> {
    Scalar(Box<dyn ScalarSlot<T>>),
    Text(Box<dyn TextSlot<T>>),
    Buffer(Box<dyn BufferSlot<T>>),
    Nested(Box<dyn NestedSlot<T>>),
}

impl<T> FieldCodec<T> {
    pub(crate) fn kind(&self) -> super::FieldKind {
        match self {
            FieldCodec::Scalar(slot) => super::FieldKind::Scalar {
                logical: slot.logical(),
            },
            FieldCodec::Text(_) => super::FieldKind::Text,
            FieldCodec::Buffer(slot) => super::FieldKind::Bufferable { size: slot.size() },
            FieldCodec::Nested(slot) => super::FieldKind::Nested {
                type_name: slot.type_name(),
            },
        }
    }
}
