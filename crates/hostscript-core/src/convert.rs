//! Conversion traits between host values and script [`Value`]s.
//!
//! - [`FromValue`]: extract a Rust value from a script value
//! - [`IntoValue`]: convert a Rust value into a script value
//! - [`ScriptTyped`]: the static script type a Rust type maps to
//!
//! ## Supported Types
//!
//! - Integers: `i8`, `i16`, `i32`, `i64`, `u8`, `u16`, `u32` (all `int`)
//! - Floats: `f32`, `f64` (`float`)
//! - `bool`, `String` (`string`), `()` (`void`)
//! - `Vec<T>` for any supported `T` (`T[]`)

use crate::error::ConversionError;
use crate::value::{ArrayValue, Value};
use crate::ScriptType;

/// A Rust type with a fixed script type.
pub trait ScriptTyped {
    fn script_type() -> ScriptType;
}

/// Extract a host value from a script value.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self, ConversionError>;
}

/// Convert a host value into a script value.
pub trait IntoValue {
    fn into_value(self) -> Value;
}

fn mismatch(expected: &ScriptType, value: &Value) -> ConversionError {
    ConversionError::TypeMismatch {
        expected: expected.to_string(),
        actual: value.script_type().to_string(),
    }
}

// ============================================================================
// Integer implementations
// ============================================================================

macro_rules! impl_int {
    ($($ty:ty),*) => {
        $(
            impl ScriptTyped for $ty {
                fn script_type() -> ScriptType {
                    ScriptType::Int
                }
            }

            impl FromValue for $ty {
                fn from_value(value: &Value) -> Result<Self, ConversionError> {
                    match value {
                        Value::Int(v) => <$ty>::try_from(*v).map_err(|_| {
                            ConversionError::IntegerOverflow {
                                value: *v,
                                target_type: stringify!($ty),
                            }
                        }),
                        other => Err(mismatch(&ScriptType::Int, other)),
                    }
                }
            }

            impl IntoValue for $ty {
                fn into_value(self) -> Value {
                    Value::Int(self as i64)
                }
            }
        )*
    };
}

impl_int!(i8, i16, i32, i64, u8, u16, u32);

// ============================================================================
// Float implementations
// ============================================================================

macro_rules! impl_float {
    ($($ty:ty),*) => {
        $(
            impl ScriptTyped for $ty {
                fn script_type() -> ScriptType {
                    ScriptType::Float
                }
            }

            impl FromValue for $ty {
                fn from_value(value: &Value) -> Result<Self, ConversionError> {
                    value
                        .as_float()
                        .map(|v| v as $ty)
                        .ok_or_else(|| mismatch(&ScriptType::Float, value))
                }
            }

            impl IntoValue for $ty {
                fn into_value(self) -> Value {
                    Value::Float(self as f64)
                }
            }
        )*
    };
}

impl_float!(f32, f64);

// ============================================================================
// Other scalars
// ============================================================================

impl ScriptTyped for bool {
    fn script_type() -> ScriptType {
        ScriptType::Bool
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        value
            .as_bool()
            .ok_or_else(|| mismatch(&ScriptType::Bool, value))
    }
}

impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

impl ScriptTyped for String {
    fn script_type() -> ScriptType {
        ScriptType::String
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| mismatch(&ScriptType::String, value))
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::String(self)
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::String(self.to_string())
    }
}

impl ScriptTyped for () {
    fn script_type() -> ScriptType {
        ScriptType::Void
    }
}

impl IntoValue for () {
    fn into_value(self) -> Value {
        Value::Void
    }
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        Ok(value.clone())
    }
}

// ============================================================================
// Arrays
// ============================================================================

impl<T: ScriptTyped> ScriptTyped for Vec<T> {
    fn script_type() -> ScriptType {
        T::script_type().array_of()
    }
}

impl<T: FromValue + ScriptTyped> FromValue for Vec<T> {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Array(array) => array.elements.iter().map(T::from_value).collect(),
            other => Err(mismatch(&Self::script_type(), other)),
        }
    }
}

impl<T: IntoValue + ScriptTyped> IntoValue for Vec<T> {
    fn into_value(self) -> Value {
        Value::Array(ArrayValue::new(
            T::script_type(),
            self.into_iter().map(IntoValue::into_value).collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_narrowing_checks_bounds() {
        assert_eq!(i32::from_value(&Value::Int(7)), Ok(7));
        assert!(matches!(
            u8::from_value(&Value::Int(300)),
            Err(ConversionError::IntegerOverflow { value: 300, target_type: "u8" })
        ));
        assert!(matches!(
            u32::from_value(&Value::Int(-1)),
            Err(ConversionError::IntegerOverflow { .. })
        ));
    }

    #[test]
    fn float_accepts_promoted_int() {
        assert_eq!(f64::from_value(&Value::Int(2)), Ok(2.0));
        assert_eq!(f32::from_value(&Value::Float(0.5)), Ok(0.5));
    }

    #[test]
    fn mismatch_reports_types() {
        let err = bool::from_value(&Value::Int(1)).unwrap_err();
        assert_eq!(err.to_string(), "type mismatch: expected bool, got int");
    }

    #[test]
    fn vectors_map_to_arrays() {
        let value = vec![1i64, 2, 3].into_value();
        assert_eq!(value.script_type(), ScriptType::Int.array_of());
        assert_eq!(Vec::<i64>::from_value(&value), Ok(vec![1, 2, 3]));
        assert_eq!(
            <Vec<Vec<f64>>>::script_type(),
            ScriptType::Float.array_of().array_of()
        );
    }

    #[test]
    fn script_types() {
        assert_eq!(<i32>::script_type(), ScriptType::Int);
        assert_eq!(<()>::script_type(), ScriptType::Void);
        assert_eq!(String::script_type(), ScriptType::String);
    }
}
