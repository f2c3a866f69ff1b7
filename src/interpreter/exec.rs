//! Statement execution.

use hostscript_compiler::{Init, RExpr, RStmt, VarRef};
use hostscript_core::stack::ensure_sufficient_stack;
use hostscript_core::{RuntimeError, ScriptType, Value};

use super::{Flow, Frame, Interpreter, Result, ops};

impl Interpreter<'_> {
    pub(super) fn exec(&mut self, stmt: &RStmt, locals: &mut Frame) -> Result<Flow> {
        ensure_sufficient_stack(|| self.exec_kind(stmt, locals))
    }

    fn exec_kind(&mut self, stmt: &RStmt, locals: &mut Frame) -> Result<Flow> {
        match stmt {
            RStmt::Expr(expr) => {
                self.eval(expr, locals)?;
                Ok(Flow::Normal)
            }
            RStmt::Decl { target, ty, init } => {
                let value = match init {
                    Init::Default => Value::default_for(ty),
                    Init::Expr(expr) => self.eval(expr, locals)?,
                    Init::Sized(dims) => self.build_sized(ty, dims, locals)?,
                };
                self.declare(target, value, locals)?;
                Ok(Flow::Normal)
            }
            RStmt::Block(stmts) => self.exec_all(stmts, locals),
            RStmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.eval_bool(condition, locals)? {
                    self.exec(then_branch, locals)
                } else if let Some(else_branch) = else_branch {
                    self.exec(else_branch, locals)
                } else {
                    Ok(Flow::Normal)
                }
            }
            RStmt::While { condition, body } => {
                loop {
                    self.check_terminated()?;
                    if !self.eval_bool(condition, locals)? {
                        break;
                    }
                    match self.exec(body, locals)? {
                        Flow::Break => break,
                        Flow::Normal | Flow::Continue => {}
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                }
                Ok(Flow::Normal)
            }
            RStmt::For {
                init,
                condition,
                update,
                body,
            } => {
                for stmt in init {
                    self.exec(stmt, locals)?;
                }
                loop {
                    self.check_terminated()?;
                    if let Some(condition) = condition
                        && !self.eval_bool(condition, locals)?
                    {
                        break;
                    }
                    match self.exec(body, locals)? {
                        Flow::Break => break,
                        Flow::Normal | Flow::Continue => {}
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                    if let Some(update) = update {
                        self.eval(update, locals)?;
                    }
                }
                Ok(Flow::Normal)
            }
            RStmt::Break => Ok(Flow::Break),
            RStmt::Continue => Ok(Flow::Continue),
            RStmt::Return(value, _) => {
                let value = match value {
                    Some(expr) => self.eval(expr, locals)?,
                    None => Value::Void,
                };
                Ok(Flow::Return(value))
            }
            RStmt::Empty => Ok(Flow::Normal),
        }
    }

    pub(super) fn exec_all(&mut self, stmts: &[RStmt], locals: &mut Frame) -> Result<Flow> {
        for stmt in stmts {
            match self.exec(stmt, locals)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn declare(&mut self, target: &VarRef, value: Value, locals: &mut Frame) -> Result<()> {
        match target {
            VarRef::Local(slot) => locals.set(*slot, value),
            VarRef::Global(slot) => self.globals.set(*slot, value),
            VarRef::Bound(variable) => Err(RuntimeError::internal(format!(
                "declaration targets bound variable '{}'",
                variable.name()
            ))),
        }
    }

    /// Evaluate the dimensions of a sized declaration and build the array.
    ///
    /// The element count over all dimensions may not exceed
    /// [`ops::MAX_ARRAY_ELEMENTS`].
    fn build_sized(&mut self, ty: &ScriptType, dims: &[Option<RExpr>], locals: &mut Frame) -> Result<Value> {
        let mut sizes = Vec::with_capacity(dims.len());
        let mut total: u128 = 1;
        // Dimensions below an unsized one allocate nothing.
        let mut sized = true;
        for dim in dims {
            let size = match dim {
                Some(expr) => {
                    let size = self.eval_index(expr, locals)?;
                    let size = usize::try_from(size)
                        .map_err(|_| RuntimeError::NegativeArraySize { size, span: expr.span })?;
                    total = total.saturating_mul(size as u128);
                    if sized && total > ops::MAX_ARRAY_ELEMENTS as u128 {
                        return Err(RuntimeError::ArrayTooLarge {
                            len: total,
                            limit: ops::MAX_ARRAY_ELEMENTS,
                            span: expr.span,
                        });
                    }
                    Some(size)
                }
                None => {
                    sized = false;
                    None
                }
            };
            sizes.push(size);
        }
        let span = dims.iter().flatten().next().map(|expr| expr.span).unwrap_or_default();
        ops::sized_array(ty, &sizes).ok_or(RuntimeError::ArrayTooLarge {
            len: total,
            limit: ops::MAX_ARRAY_ELEMENTS,
            span,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostscript_compiler::{ResolveOptions, Resolver, Unit};
    use hostscript_parser::Parser;
    use hostscript_registry::BindingRegistry;

    fn run(source: &str) -> Result<Value> {
        let arena = bumpalo::Bump::new();
        let script = Parser::parse(source, &arena).unwrap();
        let registry = BindingRegistry::new();
        let program = Resolver::new(&registry, ResolveOptions::default())
            .resolve(&[], Unit::new("main script", script))
            .unwrap();
        Interpreter::new(&program, 32).run()
    }

    #[test]
    fn if_else_chains() {
        let source = "int sign(int x) { if (x < 0) return -1; else if (x == 0) return 0; else return 1; } \
                      sign(-4) * 100 + sign(0) * 10 + sign(9);";
        assert_eq!(run(source).unwrap(), Value::Int(-99));
    }

    #[test]
    fn break_and_continue() {
        let source = "int sum = 0; for (int i = 0; i < 10; i++) { if (i % 2 == 0) continue; if (i > 7) break; sum += i; } sum;";
        assert_eq!(run(source).unwrap(), Value::Int(1 + 3 + 5 + 7));
    }

    #[test]
    fn while_loop_with_return_inside() {
        let source = "int first_square_over(int n) { int i = 0; while (true) { if (i * i > n) return i; i++; } } \
                      first_square_over(50);";
        assert_eq!(run(source).unwrap(), Value::Int(8));
    }

    #[test]
    fn for_without_condition() {
        let source = "int n = 0; for (;;) { n++; if (n == 3) break; } n;";
        assert_eq!(run(source).unwrap(), Value::Int(3));
    }

    #[test]
    fn loop_locals_are_reinitialised() {
        let source = "int total = 0; for (int i = 0; i < 3; i++) { int x; x += i; total += x; } total;";
        assert_eq!(run(source).unwrap(), Value::Int(3));
    }

    #[test]
    fn sized_declarations() {
        assert_eq!(run("int n = 4; float v[n]; v[3];").unwrap(), Value::Float(0.0));
        let err = run("int n = -2; int v[n];").unwrap_err();
        assert!(matches!(err, RuntimeError::NegativeArraySize { size: -2, .. }));
    }

    #[test]
    fn oversized_declarations_fail() {
        let err = run("int a[1000000000000000000];").unwrap_err();
        assert!(matches!(err, RuntimeError::ArrayTooLarge { limit: ops::MAX_ARRAY_ELEMENTS, .. }));

        // Each dimension fits, the product does not.
        let err = run("int n = 1048576; float m[n][n];").unwrap_err();
        assert!(matches!(err, RuntimeError::ArrayTooLarge { len, .. } if len == 1u128 << 40));

        assert_eq!(run("int r[0][1000000000000]; 1;").unwrap(), Value::Int(1));
    }

    #[test]
    fn void_function_returns_early() {
        let source = "int hits = 0; void bump(int n) { if (n > 1) return; hits++; } bump(1); bump(2); hits;";
        assert_eq!(run(source).unwrap(), Value::Int(1));
    }
}
