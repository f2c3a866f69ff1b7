//! Expression evaluation.

use hostscript_compiler::{CallTarget, Place, RExpr, RExprKind, VarRef};
use hostscript_core::stack::ensure_sufficient_stack;
use hostscript_core::{ArrayValue, BoundVariable, ConversionError, NativeError, RuntimeError, Span, Value};
use hostscript_parser::ast::BinaryOp;

use super::{Frame, Interpreter, Result, ops};

impl Interpreter<'_> {
    pub(super) fn eval(&mut self, expr: &RExpr, locals: &mut Frame) -> Result<Value> {
        ensure_sufficient_stack(|| self.eval_kind(expr, locals))
    }

    fn eval_kind(&mut self, expr: &RExpr, locals: &mut Frame) -> Result<Value> {
        match &expr.kind {
            RExprKind::Literal(value) => Ok(value.clone()),
            RExprKind::Var { var, name } => self.read_var(var, name, locals),
            RExprKind::Index { base, index } => {
                let base = self.eval(base, locals)?;
                let index = self.eval_index(index, locals)?;
                ops::element(&base, index, expr.span).cloned()
            }
            RExprKind::Binary { op, left, right } => {
                let left = self.eval(left, locals)?;
                let right = self.eval(right, locals)?;
                ops::binary(*op, left, right, expr.span)
            }
            RExprKind::Logical { and, left, right } => {
                let left = self.eval_bool(left, locals)?;
                if left != *and {
                    return Ok(Value::Bool(left));
                }
                Ok(Value::Bool(self.eval_bool(right, locals)?))
            }
            RExprKind::Negate(operand) => ops::negate(self.eval(operand, locals)?),
            RExprKind::Not(operand) => Ok(Value::Bool(!self.eval_bool(operand, locals)?)),
            RExprKind::Convert(operand) => ops::convert(self.eval(operand, locals)?, &expr.ty),
            RExprKind::Assign { target, op, value } => self.eval_assign(target, *op, value, expr.span, locals),
            RExprKind::Step { target, delta, prefix } => self.eval_step(target, *delta, *prefix, expr.span, locals),
            RExprKind::Call { target, args, .. } => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval(arg, locals)?);
                }
                match target {
                    CallTarget::Script(index) => self.call_script(*index, values),
                    CallTarget::Host(function) => self.call_host(function, &values),
                }
            }
            RExprKind::ArrayLiteral(elements) => {
                let element_type = expr
                    .ty
                    .element()
                    .cloned()
                    .ok_or_else(|| RuntimeError::internal(format!("array literal of type '{}'", expr.ty)))?;
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.eval(element, locals)?);
                }
                Ok(Value::Array(ArrayValue::new(element_type, values)))
            }
        }
    }

    pub(super) fn eval_bool(&mut self, expr: &RExpr, locals: &mut Frame) -> Result<bool> {
        let value = self.eval(expr, locals)?;
        value
            .as_bool()
            .ok_or_else(|| RuntimeError::internal(format!("expected bool, found '{}'", value.script_type())))
    }

    pub(super) fn eval_index(&mut self, expr: &RExpr, locals: &mut Frame) -> Result<i64> {
        let value = self.eval(expr, locals)?;
        value
            .as_int()
            .ok_or_else(|| RuntimeError::internal(format!("expected int index, found '{}'", value.script_type())))
    }

    fn read_var(&self, var: &VarRef, name: &str, locals: &Frame) -> Result<Value> {
        match var {
            VarRef::Local(slot) => locals.get(*slot).cloned(),
            VarRef::Global(slot) => self.globals.get(*slot).cloned(),
            VarRef::Bound(variable) => read_bound(variable, name),
        }
    }

    fn eval_assign(
        &mut self,
        target: &Place,
        op: Option<BinaryOp>,
        value: &RExpr,
        span: Span,
        locals: &mut Frame,
    ) -> Result<Value> {
        let indices = self.eval_indices(target, locals)?;
        let value = self.eval(value, locals)?;

        // Plain stores to a bound variable skip the getter.
        if let (None, VarRef::Bound(variable), true) = (op, &target.var, indices.is_empty()) {
            write_bound(variable, &target.name, value.clone())?;
            return Ok(value);
        }

        self.update_place(target, &indices, span, locals, |slot| {
            let new = match op {
                None => value,
                Some(op) => ops::binary(op, std::mem::take(slot), value, span)?,
            };
            *slot = new.clone();
            Ok(new)
        })
    }

    fn eval_step(&mut self, target: &Place, delta: i64, prefix: bool, span: Span, locals: &mut Frame) -> Result<Value> {
        let indices = self.eval_indices(target, locals)?;
        self.update_place(target, &indices, span, locals, |slot| {
            let old = std::mem::take(slot);
            let new = ops::step(old.clone(), delta)?;
            *slot = new.clone();
            Ok(if prefix { new } else { old })
        })
    }

    fn eval_indices(&mut self, target: &Place, locals: &mut Frame) -> Result<Vec<i64>> {
        let mut indices = Vec::with_capacity(target.indices.len());
        for index in &target.indices {
            indices.push(self.eval_index(index, locals)?);
        }
        Ok(indices)
    }

    /// Apply `update` to the storage behind `target`. Bound variables are
    /// read, updated and written back as a whole.
    fn update_place<F>(&mut self, target: &Place, indices: &[i64], span: Span, locals: &mut Frame, update: F) -> Result<Value>
    where
        F: FnOnce(&mut Value) -> Result<Value>,
    {
        match &target.var {
            VarRef::Local(slot) => update(walk(locals.get_mut(*slot)?, indices, span)?),
            VarRef::Global(slot) => update(walk(self.globals.get_mut(*slot)?, indices, span)?),
            VarRef::Bound(variable) => {
                let mut whole = read_bound(variable, &target.name)?;
                let result = update(walk(&mut whole, indices, span)?)?;
                write_bound(variable, &target.name, whole)?;
                Ok(result)
            }
        }
    }
}

fn walk<'v>(mut value: &'v mut Value, indices: &[i64], span: Span) -> Result<&'v mut Value> {
    for &index in indices {
        value = ops::element_mut(value, index, span)?;
    }
    Ok(value)
}

fn read_bound(variable: &BoundVariable, name: &str) -> Result<Value> {
    let host_error = |cause| RuntimeError::HostInvocation {
        name: name.to_string(),
        cause,
    };
    let value = variable.get().map_err(host_error)?;
    let expected = variable.script_type();
    let actual = value.script_type();
    value.coerce_to(expected).ok_or_else(|| {
        host_error(NativeError::Conversion(ConversionError::TypeMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }))
    })
}

fn write_bound(variable: &BoundVariable, name: &str, value: Value) -> Result<()> {
    variable.set(value).map_err(|cause| RuntimeError::HostInvocation {
        name: name.to_string(),
        cause,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, RwLock};

    use super::*;
    use hostscript_compiler::{ResolveOptions, Resolver, Unit};
    use hostscript_parser::Parser;
    use hostscript_registry::BindingRegistry;

    fn eval_with(registry: &BindingRegistry, source: &str) -> Result<Value> {
        let arena = bumpalo::Bump::new();
        let script = Parser::parse(source, &arena).unwrap();
        let program = Resolver::new(registry, ResolveOptions::default())
            .resolve(&[], Unit::new("main script", script))
            .unwrap();
        Interpreter::new(&program, 32).run()
    }

    fn eval(source: &str) -> Result<Value> {
        eval_with(&BindingRegistry::new(), source)
    }

    #[test]
    fn arithmetic_and_promotion() {
        assert_eq!(eval("1 + 2 * 3;").unwrap(), Value::Int(7));
        assert_eq!(eval("7 / 2;").unwrap(), Value::Int(3));
        assert_eq!(eval("7 / 2.0;").unwrap(), Value::Float(3.5));
        assert_eq!(eval("1 < 1.5;").unwrap(), Value::Bool(true));
        assert_eq!(eval("-(3 - 5);").unwrap(), Value::Int(2));
    }

    #[test]
    fn short_circuit() {
        let source = "int calls = 0; bool touch() { calls++; return true; } false && touch(); true || touch(); calls;";
        assert_eq!(eval(source).unwrap(), Value::Int(0));
        assert_eq!(eval("!(true && false);").unwrap(), Value::Bool(true));
    }

    #[test]
    fn casts_and_strings() {
        assert_eq!(eval("(int)2.9;").unwrap(), Value::Int(2));
        assert_eq!(eval("\"n = \" + 4;").unwrap(), Value::String("n = 4".into()));
        assert_eq!(eval("(string)true;").unwrap(), Value::String("true".into()));
        assert_eq!(eval("string s = \"a\"; s += 1; s;").unwrap(), Value::String("a1".into()));
    }

    #[test]
    fn assignment_yields_stored_value() {
        assert_eq!(eval("int a; int b; a = b = 4; a + b;").unwrap(), Value::Int(8));
        assert_eq!(eval("float f = 1; f += 2; f;").unwrap(), Value::Float(3.0));
    }

    #[test]
    fn prefix_and_postfix_steps() {
        assert_eq!(eval("int i = 5; int j = i++; j * 10 + i;").unwrap(), Value::Int(56));
        assert_eq!(eval("int i = 5; int j = --i; j * 10 + i;").unwrap(), Value::Int(44));
    }

    #[test]
    fn arrays_are_values() {
        assert_eq!(eval("int[] a = {1, 2, 3}; int[] b = a; b[0] = 9; a[0];").unwrap(), Value::Int(1));
        assert_eq!(eval("int[] a = {1, 2, 3}; a[1] += 10; a[1];").unwrap(), Value::Int(12));
        assert_eq!(eval("int g[2][3]; g[1][2] = 7; g[1][2] + g[0][0];").unwrap(), Value::Int(7));
    }

    #[test]
    fn index_out_of_bounds() {
        let err = eval("int[] a = {1}; a[3];").unwrap_err();
        assert!(matches!(err, RuntimeError::IndexOutOfBounds { index: 3, len: 1, .. }));
        let err = eval("int[] a = {1}; a[-1] = 2;").unwrap_err();
        assert!(matches!(err, RuntimeError::IndexOutOfBounds { index: -1, .. }));
    }

    #[test]
    fn division_by_zero() {
        let err = eval("int zero = 0; 1 / zero;").unwrap_err();
        assert!(matches!(err, RuntimeError::DivisionByZero { .. }));
        assert_eq!(eval("1.0 / 0;").unwrap(), Value::Float(f64::INFINITY));
    }

    #[test]
    fn bound_cell_read_and_write() {
        let cell = Arc::new(RwLock::new(10i64));
        let mut registry = BindingRegistry::new();
        registry.register("counter", BoundVariable::from_cell("counter", &cell)).unwrap();

        assert_eq!(eval_with(&registry, "counter += 5; counter++; counter;").unwrap(), Value::Int(16));
        assert_eq!(*cell.read().unwrap(), 16);
    }

    #[test]
    fn bound_array_element_write_back() {
        let cell = Arc::new(RwLock::new(vec![1i64, 2, 3]));
        let mut registry = BindingRegistry::new();
        registry.register("values", BoundVariable::from_cell("values", &cell)).unwrap();

        eval_with(&registry, "values[2] = 30;").unwrap();
        assert_eq!(*cell.read().unwrap(), vec![1, 2, 30]);
    }

    #[test]
    fn dropped_cell_is_a_host_error() {
        let cell = Arc::new(RwLock::new(1i64));
        let mut registry = BindingRegistry::new();
        registry.register("gone", BoundVariable::from_cell("gone", &cell)).unwrap();
        drop(cell);

        let err = eval_with(&registry, "gone + 1;").unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::HostInvocation { ref name, cause: NativeError::OwnerDropped { .. } } if name == "gone"
        ));
    }
}
