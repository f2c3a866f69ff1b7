//! Operator and conversion semantics on runtime values.
//!
//! `int` arithmetic wraps on overflow; `/` and `%` by zero fault. `float`
//! follows IEEE-754. `+` with a string operand concatenates the display
//! forms of both operands.

use hostscript_core::{ArrayValue, RuntimeError, ScriptType, Span, Value};
use hostscript_parser::ast::BinaryOp;

/// Apply a non-short-circuit binary operator. Numeric operands already share
/// a type.
pub fn binary(op: BinaryOp, left: Value, right: Value, span: Span) -> Result<Value, RuntimeError> {
    use BinaryOp::*;

    if op == Add && (matches!(left, Value::String(_)) || matches!(right, Value::String(_))) {
        return Ok(Value::String(format!("{left}{right}")));
    }

    Ok(match (left, right) {
        (Value::Int(a), Value::Int(b)) => match op {
            Add => Value::Int(a.wrapping_add(b)),
            Sub => Value::Int(a.wrapping_sub(b)),
            Mul => Value::Int(a.wrapping_mul(b)),
            Div if b == 0 => return Err(RuntimeError::DivisionByZero { span }),
            Div => Value::Int(a.wrapping_div(b)),
            Mod if b == 0 => return Err(RuntimeError::DivisionByZero { span }),
            Mod => Value::Int(a.wrapping_rem(b)),
            Equal => Value::Bool(a == b),
            NotEqual => Value::Bool(a != b),
            Less => Value::Bool(a < b),
            LessEqual => Value::Bool(a <= b),
            Greater => Value::Bool(a > b),
            GreaterEqual => Value::Bool(a >= b),
            LogicalAnd | LogicalOr => return Err(unsupported(op, "int")),
        },
        (Value::Float(a), Value::Float(b)) => match op {
            Add => Value::Float(a + b),
            Sub => Value::Float(a - b),
            Mul => Value::Float(a * b),
            Div => Value::Float(a / b),
            Mod => Value::Float(a % b),
            Equal => Value::Bool(a == b),
            NotEqual => Value::Bool(a != b),
            Less => Value::Bool(a < b),
            LessEqual => Value::Bool(a <= b),
            Greater => Value::Bool(a > b),
            GreaterEqual => Value::Bool(a >= b),
            LogicalAnd | LogicalOr => return Err(unsupported(op, "float")),
        },
        (left, right) => match op {
            Equal => Value::Bool(left == right),
            NotEqual => Value::Bool(left != right),
            _ => {
                return Err(RuntimeError::internal(format!(
                    "operator '{op}' applied to '{}' and '{}'",
                    left.script_type(),
                    right.script_type()
                )));
            }
        },
    })
}

fn unsupported(op: BinaryOp, ty: &str) -> RuntimeError {
    RuntimeError::internal(format!("operator '{op}' applied to '{ty}' operands"))
}

/// Add `delta` to a numeric value, for `++` and `--`.
pub fn step(value: Value, delta: i64) -> Result<Value, RuntimeError> {
    match value {
        Value::Int(v) => Ok(Value::Int(v.wrapping_add(delta))),
        Value::Float(v) => Ok(Value::Float(v + delta as f64)),
        other => Err(RuntimeError::internal(format!(
            "cannot step a value of type '{}'",
            other.script_type()
        ))),
    }
}

pub fn negate(value: Value) -> Result<Value, RuntimeError> {
    match value {
        Value::Int(v) => Ok(Value::Int(v.wrapping_neg())),
        Value::Float(v) => Ok(Value::Float(-v)),
        other => Err(RuntimeError::internal(format!(
            "cannot negate a value of type '{}'",
            other.script_type()
        ))),
    }
}

/// Implicit promotion or explicit cast to `ty`.
///
/// Float to int truncates toward zero and saturates at the `int` range.
pub fn convert(value: Value, ty: &ScriptType) -> Result<Value, RuntimeError> {
    let converted = match (value, ty) {
        (Value::String(s), ScriptType::String) => Value::String(s),
        (value, ScriptType::String) if value.script_type().is_scalar() => Value::String(value.to_string()),
        (Value::Int(v), ScriptType::Float) => Value::Float(v as f64),
        (Value::Float(v), ScriptType::Int) => Value::Int(v as i64),
        (Value::Bool(v), ScriptType::Int) => Value::Int(i64::from(v)),
        (Value::Bool(v), ScriptType::Float) => Value::Float(if v { 1.0 } else { 0.0 }),
        (Value::Int(v), ScriptType::Bool) => Value::Bool(v != 0),
        (Value::Float(v), ScriptType::Bool) => Value::Bool(v != 0.0),
        (value, ty) => {
            let from = value.script_type();
            return value
                .coerce_to(ty)
                .ok_or_else(|| RuntimeError::internal(format!("cannot convert '{from}' to '{ty}'")));
        }
    };
    Ok(converted)
}

/// Most elements a sized array declaration may allocate, over all of its
/// dimensions.
pub const MAX_ARRAY_ELEMENTS: usize = 1 << 24;

/// Build a C-style sized array: `int a[3][2]` is three arrays of two zeros.
/// A `None` dimension yields an empty array at that level.
///
/// Returns `None` if the allocation fails.
pub fn sized_array(ty: &ScriptType, dims: &[Option<usize>]) -> Option<Value> {
    let (Some((first, rest)), Some(element)) = (dims.split_first(), ty.element()) else {
        return Some(Value::default_for(ty));
    };
    let len = first.unwrap_or(0);
    let mut elements = Vec::new();
    elements.try_reserve_exact(len).ok()?;
    for _ in 0..len {
        elements.push(sized_array(element, rest)?);
    }
    Some(Value::Array(ArrayValue::new(element.clone(), elements)))
}

/// Element `index` of an array value.
pub fn element(value: &Value, index: i64, span: Span) -> Result<&Value, RuntimeError> {
    let array = as_array(value)?;
    let len = array.elements.len();
    usize::try_from(index)
        .ok()
        .and_then(|i| array.elements.get(i))
        .ok_or(RuntimeError::IndexOutOfBounds { index, len, span })
}

pub fn element_mut(value: &mut Value, index: i64, span: Span) -> Result<&mut Value, RuntimeError> {
    let Value::Array(array) = value else {
        return Err(not_an_array(value));
    };
    let len = array.elements.len();
    usize::try_from(index)
        .ok()
        .and_then(|i| array.elements.get_mut(i))
        .ok_or(RuntimeError::IndexOutOfBounds { index, len, span })
}

fn as_array(value: &Value) -> Result<&ArrayValue, RuntimeError> {
    value.as_array().ok_or_else(|| not_an_array(value))
}

fn not_an_array(value: &Value) -> RuntimeError {
    RuntimeError::internal(format!("indexing a value of type '{}'", value.script_type()))
}
