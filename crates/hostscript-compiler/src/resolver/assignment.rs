//! Assignment, compound assignment and increment/decrement.

use hostscript_core::{ResolveError, ScriptType, Span};
use hostscript_parser::ast::{AssignExpr, BinaryOp, Expr};

use super::expr::{coerce, element_type};
use super::{Resolver, Result};
use crate::conversion::numeric_common_type;
use crate::program::{Place, RExpr, RExprKind, VarRef};

impl<'r> Resolver<'r> {
    pub(super) fn resolve_assign(&mut self, assign: &AssignExpr<'_>) -> Result<RExpr> {
        let (target, target_ty) = self.resolve_place(assign.target)?;
        let value = self.resolve_value(assign.value, Some(&target_ty))?;

        let op = assign.op.binary_op();
        let value = match op {
            None => {
                let value_ty = value.ty.clone();
                coerce(value, &target_ty).map_err(|_| {
                    ResolveError::type_mismatch(
                        assign.span,
                        format!(
                            "cannot assign '{value_ty}' to '{}' of type '{target_ty}'",
                            target.name
                        ),
                    )
                })?
            }
            Some(op) => compound_operand(op, &target_ty, value, assign.span)?,
        };

        Ok(RExpr::new(
            RExprKind::Assign {
                target,
                op,
                value: Box::new(value),
            },
            target_ty,
            assign.span,
        ))
    }

    /// `++`/`--` in prefix or postfix form.
    pub(super) fn resolve_step(
        &mut self,
        operand: &Expr<'_>,
        delta: i64,
        prefix: bool,
        span: Span,
    ) -> Result<RExpr> {
        let (target, ty) = self.resolve_place(operand)?;
        if !ty.is_numeric() {
            let op = if delta > 0 { "++" } else { "--" };
            return Err(ResolveError::type_mismatch(
                span,
                format!("operator '{op}' cannot be applied to '{ty}'"),
            ));
        }
        Ok(RExpr::new(RExprKind::Step { target, delta, prefix }, ty, span))
    }

    /// Resolve an assignable location: a variable, or an index chain rooted
    /// at one. Bound variables must have a setter.
    pub(super) fn resolve_place(&mut self, expr: &Expr<'_>) -> Result<(Place, ScriptType)> {
        match expr {
            Expr::Paren(paren) => self.resolve_place(paren.expr),
            Expr::Ident(ident) => {
                let (var, ty) = self.lookup_variable(ident)?;
                if let VarRef::Bound(variable) = &var {
                    if !variable.is_writable() {
                        return Err(ResolveError::ReadOnlyBinding {
                            name: ident.qualified_string(),
                            span: ident.span,
                        });
                    }
                }
                let place = Place {
                    var,
                    name: ident.qualified_string(),
                    indices: Vec::new(),
                };
                Ok((place, ty))
            }
            Expr::Index(index) => {
                let (mut place, base_ty) = self.resolve_place(index.base)?;
                let element = element_type(&base_ty, index.span)?;
                let position = self.resolve_as(index.index, &ScriptType::Int)?;
                place.indices.push(position);
                Ok((place, element))
            }
            other => Err(ResolveError::NotAnLvalue { span: other.span() }),
        }
    }
}

/// Check `target op= value` and convert the operand to the target type.
///
/// The result of `target op value` must have the target's type, so
/// `int += float` is rejected while `float += int` promotes the operand.
fn compound_operand(op: BinaryOp, target_ty: &ScriptType, value: RExpr, span: Span) -> Result<RExpr> {
    if op == BinaryOp::Add && *target_ty == ScriptType::String {
        return Ok(value);
    }

    match numeric_common_type(target_ty, &value.ty) {
        Some(common) if common == *target_ty => coerce(value, target_ty),
        _ => Err(ResolveError::type_mismatch(
            span,
            format!("operator '{op}=' cannot be applied to '{target_ty}' and '{}'", value.ty),
        )),
    }
}

#[cfg(test)]
mod tests {
    use crate::program::{RExprKind, RStmt, VarRef};
    use crate::{ResolveOptions, Resolver, Unit};
    use bumpalo::Bump;
    use hostscript_core::{BoundVariable, ResolveError, ScriptType};
    use hostscript_parser::Parser;
    use hostscript_registry::BindingRegistry;
    use std::sync::{Arc, RwLock};

    fn resolve(source: &str) -> Result<Vec<RStmt>, ResolveError> {
        let arena = Bump::new();
        let script = Parser::parse(source, &arena).unwrap();
        let mut registry = BindingRegistry::new();
        registry
            .register("fixed", BoundVariable::constant("fixed", 1.5f64))
            .unwrap();
        let cell = Arc::new(RwLock::new(vec![1i64, 2, 3]));
        registry
            .register("items", BoundVariable::from_cell("items", &cell))
            .unwrap();
        Resolver::new(&registry, ResolveOptions::default())
            .resolve(&[], Unit::new("test", script))
            .map(|p| p.main)
            .map_err(|e| e.error)
    }

    #[test]
    fn plain_assignment_promotes() {
        let stmts = resolve("float f; f = 2;").unwrap();
        let RStmt::Expr(expr) = &stmts[1] else {
            panic!("expected expression");
        };
        let RExprKind::Assign { value, op: None, .. } = &expr.kind else {
            panic!("expected assignment");
        };
        assert_eq!(value.ty, ScriptType::Float);
    }

    #[test]
    fn narrowing_assignment_rejected() {
        let err = resolve("int i; i = 2.5;").unwrap_err();
        assert!(matches!(err, ResolveError::TypeMismatch { .. }));
        assert!(err.to_string().contains("cannot assign 'float' to 'i' of type 'int'"));
    }

    #[test]
    fn compound_assignment_types() {
        assert!(resolve("float f = 1.0; f += 1;").is_ok());
        assert!(resolve("int i = 1; i *= 3;").is_ok());
        assert!(resolve("string s = \"a\"; s += 1;").is_ok());
        assert!(resolve("int i = 1; i += 0.5;").is_err());
        assert!(resolve("string s = \"a\"; s -= \"b\";").is_err());
        assert!(resolve("bool b = true; b += true;").is_err());
    }

    #[test]
    fn increment_needs_numeric_place() {
        assert!(resolve("int i = 0; i++; --i;").is_ok());
        assert!(resolve("bool b = true; b++;").is_err());
        let err = resolve("int i = 0; (i + 1)++;").unwrap_err();
        assert!(matches!(err, ResolveError::NotAnLvalue { .. }));
        let err = resolve("5 = 3;").unwrap_err();
        assert!(matches!(err, ResolveError::NotAnLvalue { .. }));
    }

    #[test]
    fn indexed_places() {
        let stmts = resolve("int[][] m = {{1, 2}}; m[0][1] = 7;").unwrap();
        let RStmt::Expr(expr) = &stmts[1] else {
            panic!("expected expression");
        };
        let RExprKind::Assign { target, .. } = &expr.kind else {
            panic!("expected assignment");
        };
        assert_eq!(target.indices.len(), 2);
        assert!(matches!(target.var, VarRef::Global(0)));
    }

    #[test]
    fn bound_places() {
        assert!(resolve("items[0] = 9;").is_ok());
        let err = resolve("fixed += 1.0;").unwrap_err();
        assert!(matches!(err, ResolveError::ReadOnlyBinding { ref name, .. } if name == "fixed"));
    }
}
