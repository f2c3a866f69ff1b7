//! Runtime values.

use std::fmt;

use crate::ScriptType;

/// A dynamically tagged script value.
///
/// The resolver guarantees that every value flowing through a typed slot
/// matches the slot's [`ScriptType`], so the interpreter can rely on the tag.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Void,
    Int(i64),
    Float(f64),
    Bool(bool),
    String(String),
    /// Array elements together with the declared element type.
    Array(ArrayValue),
}

/// An array value. Arrays are copied on assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayValue {
    pub element_type: ScriptType,
    pub elements: Vec<Value>,
}

impl ArrayValue {
    pub fn new(element_type: ScriptType, elements: Vec<Value>) -> Self {
        Self {
            element_type,
            elements,
        }
    }

    /// Build an array of `len` default elements.
    pub fn filled(element_type: ScriptType, len: usize) -> Self {
        let init = Value::default_for(&element_type);
        Self {
            elements: vec![init; len],
            element_type,
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl Value {
    /// The zero value used for declarations without an initializer.
    pub fn default_for(ty: &ScriptType) -> Value {
        match ty {
            ScriptType::Void => Value::Void,
            ScriptType::Int => Value::Int(0),
            ScriptType::Float => Value::Float(0.0),
            ScriptType::Bool => Value::Bool(false),
            ScriptType::String => Value::String(String::new()),
            ScriptType::Array(inner) => Value::Array(ArrayValue::new((**inner).clone(), Vec::new())),
        }
    }

    /// The runtime type of this value.
    pub fn script_type(&self) -> ScriptType {
        match self {
            Value::Void => ScriptType::Void,
            Value::Int(_) => ScriptType::Int,
            Value::Float(_) => ScriptType::Float,
            Value::Bool(_) => ScriptType::Bool,
            Value::String(_) => ScriptType::String,
            Value::Array(array) => array.element_type.clone().array_of(),
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Value::Void)
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Read a numeric value as a float, promoting integers.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayValue> {
        match self {
            Value::Array(array) => Some(array),
            _ => None,
        }
    }

    /// Convert this value to the given type, applying the implicit
    /// int-to-float promotion. Returns `None` for any other mismatch.
    pub fn coerce_to(self, ty: &ScriptType) -> Option<Value> {
        match (self, ty) {
            (Value::Int(v), ScriptType::Float) => Some(Value::Float(v as f64)),
            (Value::Array(array), ScriptType::Array(inner)) if array.element_type != **inner => {
                let elements = array
                    .elements
                    .into_iter()
                    .map(|e| e.coerce_to(inner))
                    .collect::<Option<Vec<_>>>()?;
                Some(Value::Array(ArrayValue::new((**inner).clone(), elements)))
            }
            (value, ty) if value.script_type() == *ty => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => write!(f, "void"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => {
                if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 {
                    write!(f, "{v:.1}")
                } else {
                    write!(f, "{v}")
                }
            }
            Value::Bool(v) => write!(f, "{v}"),
            Value::String(s) => write!(f, "{s}"),
            Value::Array(array) => {
                write!(f, "{{")?;
                for (i, element) in array.elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{element}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_per_type() {
        assert_eq!(Value::default_for(&ScriptType::Int), Value::Int(0));
        assert_eq!(Value::default_for(&ScriptType::Bool), Value::Bool(false));
        let arr = Value::default_for(&ScriptType::Float.array_of());
        assert_eq!(arr.script_type(), ScriptType::Float.array_of());
        assert_eq!(arr.as_array().map(ArrayValue::len), Some(0));
    }

    #[test]
    fn coerce_promotes_int_to_float_only() {
        assert_eq!(
            Value::Int(3).coerce_to(&ScriptType::Float),
            Some(Value::Float(3.0))
        );
        assert_eq!(Value::Float(3.5).coerce_to(&ScriptType::Int), None);
        assert_eq!(Value::Bool(true).coerce_to(&ScriptType::Int), None);
        assert_eq!(
            Value::String("x".into()).coerce_to(&ScriptType::String),
            Some(Value::String("x".into()))
        );
    }

    #[test]
    fn coerce_promotes_array_elements() {
        let ints = Value::Array(ArrayValue::new(
            ScriptType::Int,
            vec![Value::Int(1), Value::Int(2)],
        ));
        let floats = ints.coerce_to(&ScriptType::Float.array_of());
        assert_eq!(
            floats,
            Some(Value::Array(ArrayValue::new(
                ScriptType::Float,
                vec![Value::Float(1.0), Value::Float(2.0)]
            )))
        );
    }

    #[test]
    fn filled_array() {
        let array = ArrayValue::filled(ScriptType::Int, 3);
        assert_eq!(array.elements, vec![Value::Int(0); 3]);
    }

    #[test]
    fn display() {
        assert_eq!(Value::Int(-4).to_string(), "-4");
        assert_eq!(Value::Float(2.0).to_string(), "2.0");
        assert_eq!(Value::Float(0.25).to_string(), "0.25");
        assert_eq!(
            Value::Array(ArrayValue::new(
                ScriptType::Int,
                vec![Value::Int(1), Value::Int(2)]
            ))
            .to_string(),
            "{1, 2}"
        );
    }
}
