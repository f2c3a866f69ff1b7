//! Variable storage for one activation.

use hostscript_core::{RuntimeError, ScriptType, Value};

/// Slot storage for the globals of a run or the locals of one call.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    slots: Vec<Value>,
}

impl Frame {
    /// A frame of `size` empty slots.
    pub fn new(size: usize) -> Self {
        Self {
            slots: vec![Value::Void; size],
        }
    }

    /// A frame whose slots hold the default value of each type.
    pub fn with_types(types: &[ScriptType]) -> Self {
        Self {
            slots: types.iter().map(Value::default_for).collect(),
        }
    }

    /// A call frame: arguments in the first slots, the rest empty.
    pub fn for_call(args: Vec<Value>, size: usize) -> Self {
        let mut slots = args;
        if slots.len() < size {
            slots.resize(size, Value::Void);
        }
        Self { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, slot: usize) -> Result<&Value, RuntimeError> {
        self.slots.get(slot).ok_or_else(|| missing(slot))
    }

    pub fn get_mut(&mut self, slot: usize) -> Result<&mut Value, RuntimeError> {
        self.slots.get_mut(slot).ok_or_else(|| missing(slot))
    }

    pub fn set(&mut self, slot: usize, value: Value) -> Result<(), RuntimeError> {
        *self.get_mut(slot)? = value;
        Ok(())
    }
}

fn missing(slot: usize) -> RuntimeError {
    RuntimeError::internal(format!("slot {slot} is outside the frame"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_frame_defaults() {
        let frame = Frame::with_types(&[ScriptType::Int, ScriptType::String.array_of()]);
        assert_eq!(frame.get(0).unwrap(), &Value::Int(0));
        assert!(matches!(frame.get(1).unwrap(), Value::Array(a) if a.is_empty()));
    }

    #[test]
    fn call_frame_layout() {
        let mut frame = Frame::for_call(vec![Value::Int(7)], 3);
        assert_eq!(frame.len(), 3);
        assert_eq!(frame.get(0).unwrap(), &Value::Int(7));
        frame.set(2, Value::Bool(true)).unwrap();
        assert_eq!(frame.get(2).unwrap(), &Value::Bool(true));
        assert!(matches!(frame.get(3), Err(RuntimeError::Internal { .. })));
    }
}
