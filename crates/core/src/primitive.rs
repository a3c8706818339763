//! Scalar storage model
//!
//! [`StoreType`] enumerates every fixed-width scalar the codec can place in a
//! stream. [`Primitive`] is a value tagged with its store type, used as the
//! common currency between logical member types and their physical storage.
//!
//! Conversions between store types are checked:
//! - integer to integer fails when the value does not fit
//! - integer to float is always permitted
//! - float to integer rounds to nearest and fails when non-finite or out of range
//! - bool to integer yields 0 or 1; integer to bool is `value != 0`
//! - bool and float have no conversion
//! - guids convert to nothing but themselves

use crate::error::ConversionError;
use half::f16;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Physical storage type of a scalar field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreType {
    /// One byte, 0 or 1
    Bool,
    /// Signed 8-bit integer
    I8,
    /// Unsigned 8-bit integer
    U8,
    /// Signed 16-bit integer
    I16,
    /// Unsigned 16-bit integer
    U16,
    /// Signed 32-bit integer
    I32,
    /// Unsigned 32-bit integer
    U32,
    /// Signed 64-bit integer
    I64,
    /// Unsigned 64-bit integer
    U64,
    /// IEEE 754 half precision
    F16,
    /// IEEE 754 single precision
    F32,
    /// IEEE 754 double precision
    F64,
    /// 16-byte globally unique identifier
    ///
    /// The leading `u32` and two `u16` groups follow the byte order; the
    /// trailing eight bytes are copied as-is.
    Guid,
}

impl StoreType {
    /// Widest encoded scalar, in bytes
    pub const MAX_SIZE: usize = 16;

    /// Encoded width in bytes
    pub const fn size(self) -> usize {
        match self {
            StoreType::Bool | StoreType::I8 | StoreType::U8 => 1,
            StoreType::I16 | StoreType::U16 | StoreType::F16 => 2,
            StoreType::I32 | StoreType::U32 | StoreType::F32 => 4,
            StoreType::I64 | StoreType::U64 | StoreType::F64 => 8,
            StoreType::Guid => 16,
        }
    }

    /// Integer store types
    pub const fn is_integer(self) -> bool {
        !matches!(self, StoreType::Bool | StoreType::Guid) && !self.is_float()
    }

    /// Floating-point store types
    pub const fn is_float(self) -> bool {
        matches!(self, StoreType::F16 | StoreType::F32 | StoreType::F64)
    }

    /// Integer and floating-point store types
    pub const fn is_numeric(self) -> bool {
        self.is_integer() || self.is_float()
    }

    /// Whether byte order affects the encoding
    pub const fn is_order_sensitive(self) -> bool {
        self.size() > 1
    }

    /// Whether values of this type can ever be converted to `target`
    pub const fn can_convert(self, target: StoreType) -> bool {
        if matches!(self, StoreType::Guid) || matches!(target, StoreType::Guid) {
            return matches!(self, StoreType::Guid) && matches!(target, StoreType::Guid);
        }
        let bool_float = matches!(self, StoreType::Bool) && target.is_float();
        let float_bool = self.is_float() && matches!(target, StoreType::Bool);
        !(bool_float || float_bool)
    }

    fn int_bounds(self) -> (i128, i128) {
        match self {
            StoreType::I8 => (i8::MIN as i128, i8::MAX as i128),
            StoreType::U8 => (0, u8::MAX as i128),
            StoreType::I16 => (i16::MIN as i128, i16::MAX as i128),
            StoreType::U16 => (0, u16::MAX as i128),
            StoreType::I32 => (i32::MIN as i128, i32::MAX as i128),
            StoreType::U32 => (0, u32::MAX as i128),
            StoreType::I64 => (i64::MIN as i128, i64::MAX as i128),
            StoreType::U64 => (0, u64::MAX as i128),
            StoreType::Bool => (0, 1),
            StoreType::F16 => (-65504, 65504),
            StoreType::F32 | StoreType::F64 => (i128::MIN, i128::MAX),
            StoreType::Guid => (0, 0),
        }
    }
}

/// A scalar value tagged with its store type
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    /// Boolean
    Bool(bool),
    /// `i8`
    I8(i8),
    /// `u8`
    U8(u8),
    /// `i16`
    I16(i16),
    /// `u16`
    U16(u16),
    /// `i32`
    I32(i32),
    /// `u32`
    U32(u32),
    /// `i64`
    I64(i64),
    /// `u64`
    U64(u64),
    /// `f16`
    F16(f16),
    /// `f32`
    F32(f32),
    /// `f64`
    F64(f64),
    /// Globally unique identifier
    Guid(Uuid),
}

impl Primitive {
    /// Zero value of a store type
    pub const fn zero(store: StoreType) -> Primitive {
        match store {
            StoreType::Bool => Primitive::Bool(false),
            StoreType::I8 => Primitive::I8(0),
            StoreType::U8 => Primitive::U8(0),
            StoreType::I16 => Primitive::I16(0),
            StoreType::U16 => Primitive::U16(0),
            StoreType::I32 => Primitive::I32(0),
            StoreType::U32 => Primitive::U32(0),
            StoreType::I64 => Primitive::I64(0),
            StoreType::U64 => Primitive::U64(0),
            StoreType::F16 => Primitive::F16(f16::ZERO),
            StoreType::F32 => Primitive::F32(0.0),
            StoreType::F64 => Primitive::F64(0.0),
            StoreType::Guid => Primitive::Guid(Uuid::nil()),
        }
    }

    /// Store type of this value
    pub const fn store_type(&self) -> StoreType {
        match self {
            Primitive::Bool(_) => StoreType::Bool,
            Primitive::I8(_) => StoreType::I8,
            Primitive::U8(_) => StoreType::U8,
            Primitive::I16(_) => StoreType::I16,
            Primitive::U16(_) => StoreType::U16,
            Primitive::I32(_) => StoreType::I32,
            Primitive::U32(_) => StoreType::U32,
            Primitive::I64(_) => StoreType::I64,
            Primitive::U64(_) => StoreType::U64,
            Primitive::F16(_) => StoreType::F16,
            Primitive::F32(_) => StoreType::F32,
            Primitive::F64(_) => StoreType::F64,
            Primitive::Guid(_) => StoreType::Guid,
        }
    }

    /// Integer value, widened (bools map to 0/1)
    pub fn as_i128(&self) -> Option<i128> {
        match *self {
            Primitive::Bool(b) => Some(b as i128),
            Primitive::I8(v) => Some(v as i128),
            Primitive::U8(v) => Some(v as i128),
            Primitive::I16(v) => Some(v as i128),
            Primitive::U16(v) => Some(v as i128),
            Primitive::I32(v) => Some(v as i128),
            Primitive::U32(v) => Some(v as i128),
            Primitive::I64(v) => Some(v as i128),
            Primitive::U64(v) => Some(v as i128),
            Primitive::F16(_) | Primitive::F32(_) | Primitive::F64(_) | Primitive::Guid(_) => None,
        }
    }

    /// Numeric value as `f64` (bools map to 0/1, guids to NaN)
    pub fn as_f64(&self) -> f64 {
        match *self {
            Primitive::F16(v) => v.to_f64(),
            Primitive::F32(v) => v as f64,
            Primitive::F64(v) => v,
            Primitive::Guid(_) => f64::NAN,
            _ => self.as_i128().unwrap_or_default() as f64,
        }
    }

    fn render(&self) -> String {
        match *self {
            Primitive::Bool(b) => b.to_string(),
            Primitive::F16(v) => v.to_string(),
            Primitive::F32(v) => v.to_string(),
            Primitive::F64(v) => v.to_string(),
            Primitive::Guid(v) => v.to_string(),
            _ => self.as_i128().unwrap_or_default().to_string(),
        }
    }

    /// Convert to another store type
    pub fn convert(self, target: StoreType) -> Result<Primitive, ConversionError> {
        let source = self.store_type();
        if source == target {
            return Ok(self);
        }
        if !source.can_convert(target) {
            return Err(ConversionError::Unsupported {
                from: source,
                to: target,
            });
        }

        if target.is_float() {
            let value = self.as_f64();
            return Ok(match target {
                StoreType::F16 => {
                    if value.is_finite() && value.abs() > f16::MAX.to_f64() {
                        return Err(ConversionError::OutOfRange {
                            value: self.render(),
                            target,
                        });
                    }
                    Primitive::F16(f16::from_f64(value))
                }
                StoreType::F32 => {
                    if value.is_finite() && value.abs() > f32::MAX as f64 {
                        return Err(ConversionError::OutOfRange {
                            value: self.render(),
                            target,
                        });
                    }
                    Primitive::F32(value as f32)
                }
                _ => Primitive::F64(value),
            });
        }

        let integer = match self {
            Primitive::F16(_) | Primitive::F32(_) | Primitive::F64(_) => {
                let value = self.as_f64();
                if !value.is_finite() {
                    return Err(ConversionError::NotFinite {
                        value: self.render(),
                        target,
                    });
                }
                let rounded = value.round();
                let (lo, hi) = target.int_bounds();
                if rounded < lo as f64 || rounded > hi as f64 {
                    return Err(ConversionError::OutOfRange {
                        value: self.render(),
                        target,
                    });
                }
                rounded as i128
            }
            _ => self.as_i128().unwrap_or_default(),
        };

        if target == StoreType::Bool {
            return Ok(Primitive::Bool(integer != 0));
        }
        Primitive::from_i128(integer, target).ok_or_else(|| ConversionError::OutOfRange {
            value: self.render(),
            target,
        })
    }

    /// Integer value of `store`, if it fits
    pub fn from_i128(value: i128, store: StoreType) -> Option<Primitive> {
        let (lo, hi) = store.int_bounds();
        if value < lo || value > hi {
            return None;
        }
        Some(match store {
            StoreType::Bool => Primitive::Bool(value != 0),
            StoreType::I8 => Primitive::I8(value as i8),
            StoreType::U8 => Primitive::U8(value as u8),
            StoreType::I16 => Primitive::I16(value as i16),
            StoreType::U16 => Primitive::U16(value as u16),
            StoreType::I32 => Primitive::I32(value as i32),
            StoreType::U32 => Primitive::U32(value as u32),
            StoreType::I64 => Primitive::I64(value as i64),
            StoreType::U64 => Primitive::U64(value as u64),
            StoreType::F16 => Primitive::F16(f16::from_f64(value as f64)),
            StoreType::F32 => Primitive::F32(value as f32),
            StoreType::F64 => Primitive::F64(value as f64),
            StoreType::Guid => return None,
        })
    }
}

macro_rules! impl_from_native {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Primitive {
                fn from(value: $ty) -> Self {
                    Primitive::$variant(value)
                }
            }
        )*
    };
}

impl_from_native! {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizes() {
        assert_eq!(StoreType::Bool.size(), 1);
        assert_eq!(StoreType::U16.size(), 2);
        assert_eq!(StoreType::F32.size(), 4);
        assert_eq!(StoreType::U64.size(), 8);
        assert!(!StoreType::U8.is_order_sensitive());
        assert!(StoreType::I16.is_order_sensitive());
    }

    #[test]
    fn test_narrowing_checked() {
        assert_eq!(
            Primitive::I32(200).convert(StoreType::U8),
            Ok(Primitive::U8(200))
        );
        assert!(matches!(
            Primitive::I32(300).convert(StoreType::U8),
            Err(ConversionError::OutOfRange { target: StoreType::U8, .. })
        ));
        assert!(Primitive::I8(-1).convert(StoreType::U32).is_err());
        assert_eq!(
            Primitive::U64(u32::MAX as u64).convert(StoreType::U32),
            Ok(Primitive::U32(u32::MAX))
        );
    }

    #[test]
    fn test_float_to_int_rounds() {
        assert_eq!(Primitive::F32(2.6).convert(StoreType::I16), Ok(Primitive::I16(3)));
        assert_eq!(Primitive::F64(-2.4).convert(StoreType::I16), Ok(Primitive::I16(-2)));
        assert!(matches!(
            Primitive::F64(f64::NAN).convert(StoreType::I32),
            Err(ConversionError::NotFinite { .. })
        ));
        assert!(Primitive::F64(1e12).convert(StoreType::I32).is_err());
    }

    #[test]
    fn test_int_to_float() {
        assert_eq!(Primitive::I32(7).convert(StoreType::F64), Ok(Primitive::F64(7.0)));
        assert_eq!(Primitive::U8(7).convert(StoreType::F32), Ok(Primitive::F32(7.0)));
        assert!(Primitive::F64(1e300).convert(StoreType::F32).is_err());
    }

    #[test]
    fn test_bool_conversions() {
        assert_eq!(Primitive::Bool(true).convert(StoreType::U8), Ok(Primitive::U8(1)));
        assert_eq!(Primitive::U16(5).convert(StoreType::Bool), Ok(Primitive::Bool(true)));
        assert_eq!(Primitive::I32(0).convert(StoreType::Bool), Ok(Primitive::Bool(false)));
        assert!(!StoreType::Bool.can_convert(StoreType::F32));
        assert!(!StoreType::F64.can_convert(StoreType::Bool));
        assert_eq!(
            Primitive::Bool(true).convert(StoreType::F32),
            Err(ConversionError::Unsupported {
                from: StoreType::Bool,
                to: StoreType::F32
            })
        );
    }

    #[test]
    fn test_half_precision() {
        assert_eq!(StoreType::F16.size(), 2);
        assert!(StoreType::F16.is_float());
        assert!(!StoreType::F16.is_integer());
        assert_eq!(
            Primitive::F32(1.5).convert(StoreType::F16),
            Ok(Primitive::F16(f16::from_f32(1.5)))
        );
        assert_eq!(
            Primitive::F16(f16::from_f32(2.5)).convert(StoreType::I32),
            Ok(Primitive::I32(3))
        );
        assert_eq!(
            Primitive::U16(300).convert(StoreType::F16),
            Ok(Primitive::F16(f16::from_f32(300.0)))
        );
        assert!(matches!(
            Primitive::F64(70000.0).convert(StoreType::F16),
            Err(ConversionError::OutOfRange { target: StoreType::F16, .. })
        ));
        assert!(Primitive::F16(f16::INFINITY).convert(StoreType::U8).is_err());
    }

    #[test]
    fn test_guid_converts_only_to_itself() {
        let id = Uuid::from_u128(0x0011_2233_4455_6677_8899_aabb_ccdd_eeff);
        assert_eq!(StoreType::Guid.size(), StoreType::MAX_SIZE);
        assert!(!StoreType::Guid.is_numeric());
        assert!(StoreType::Guid.can_convert(StoreType::Guid));
        assert!(!StoreType::Guid.can_convert(StoreType::U64));
        assert!(!StoreType::U8.can_convert(StoreType::Guid));
        assert_eq!(Primitive::Guid(id).convert(StoreType::Guid), Ok(Primitive::Guid(id)));
        assert_eq!(
            Primitive::Guid(id).convert(StoreType::I64),
            Err(ConversionError::Unsupported {
                from: StoreType::Guid,
                to: StoreType::I64
            })
        );
        assert_eq!(Primitive::from_i128(0, StoreType::Guid), None);
        assert_eq!(Primitive::zero(StoreType::Guid), Primitive::Guid(Uuid::nil()));
    }

    #[test]
    fn test_zero() {
        assert_eq!(Primitive::zero(StoreType::I16), Primitive::I16(0));
        assert_eq!(Primitive::zero(StoreType::F64), Primitive::F64(0.0));
        assert_eq!(Primitive::zero(StoreType::Bool).store_type(), StoreType::Bool);
    }
}
