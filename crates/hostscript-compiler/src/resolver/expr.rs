//! Expression resolution.
//!
//! Every expression resolves to an [`RExpr`] carrying its static type.
//! Implicit `int` to `float` promotions become explicit `Convert` nodes, so
//! the interpreter never has to reconcile mixed operand types.

use hostscript_core::{QualifiedName, ResolveError, ScriptType, Span, Value};
use hostscript_parser::ast::{
    BinaryExpr, BinaryOp, CastExpr, Expr, IdentExpr, IndexExpr, InitListExpr, LiteralExpr,
    LiteralKind, PostfixOp, UnaryExpr, UnaryOp,
};
use hostscript_registry::Binding;

use super::{Resolver, Result};
use crate::conversion::{can_cast, implicit_cost, numeric_common_type};
use crate::program::{RExpr, RExprKind, VarRef};

impl<'r> Resolver<'r> {
    /// Resolve an expression whose value may be `void` (statement position).
    pub(super) fn resolve_expr(&mut self, expr: &Expr<'_>) -> Result<RExpr> {
        self.resolve_expr_expecting(expr, None)
    }

    /// Resolve an expression that must produce a value.
    pub(super) fn resolve_value(&mut self, expr: &Expr<'_>, expected: Option<&ScriptType>) -> Result<RExpr> {
        let resolved = self.resolve_expr_expecting(expr, expected)?;
        if resolved.ty.is_void() {
            return Err(ResolveError::type_mismatch(
                resolved.span,
                "expression does not produce a value",
            ));
        }
        Ok(resolved)
    }

    /// Resolve a value and convert it to `ty`.
    pub(super) fn resolve_as(&mut self, expr: &Expr<'_>, ty: &ScriptType) -> Result<RExpr> {
        let value = self.resolve_value(expr, Some(ty))?;
        coerce(value, ty)
    }

    /// Resolve a `bool` condition.
    pub(super) fn resolve_condition(&mut self, expr: &Expr<'_>) -> Result<RExpr> {
        let condition = self.resolve_value(expr, None)?;
        if condition.ty != ScriptType::Bool {
            return Err(ResolveError::type_mismatch(
                condition.span,
                format!("condition must be 'bool', found '{}'", condition.ty),
            ));
        }
        Ok(condition)
    }

    /// `expected` is the type the context wants, used to type initializer
    /// lists. It is not enforced here.
    fn resolve_expr_expecting(&mut self, expr: &Expr<'_>, expected: Option<&ScriptType>) -> Result<RExpr> {
        self.nested(expr.span(), |r| r.resolve_expr_kind(expr, expected))
    }

    fn resolve_expr_kind(&mut self, expr: &Expr<'_>, expected: Option<&ScriptType>) -> Result<RExpr> {
        match expr {
            Expr::Literal(lit) => self.resolve_literal(lit),
            Expr::Ident(ident) => self.resolve_ident(ident),
            Expr::Binary(binary) => self.resolve_binary(binary),
            Expr::Unary(unary) => self.resolve_unary(unary),
            Expr::Postfix(postfix) => {
                let delta = match postfix.op {
                    PostfixOp::PostInc => 1,
                    PostfixOp::PostDec => -1,
                };
                self.resolve_step(postfix.operand, delta, false, postfix.span)
            }
            Expr::Assign(assign) => self.resolve_assign(assign),
            Expr::Call(call) => self.resolve_call(call),
            Expr::Index(index) => self.resolve_index(index),
            Expr::Cast(cast) => self.resolve_cast(cast),
            Expr::InitList(list) => self.resolve_init_list(list, expected),
            Expr::Paren(paren) => {
                let mut inner = self.resolve_expr_expecting(paren.expr, expected)?;
                inner.span = paren.span;
                Ok(inner)
            }
        }
    }

    // ==========================================================================
    // Primaries
    // ==========================================================================

    fn resolve_literal(&self, lit: &LiteralExpr<'_>) -> Result<RExpr> {
        let value = match lit.kind {
            LiteralKind::Int(v) if self.options.int_literal_as_float => Value::Float(v as f64),
            LiteralKind::Int(v) => Value::Int(v),
            LiteralKind::Float(v) => Value::Float(v),
            LiteralKind::Bool(v) => Value::Bool(v),
            LiteralKind::String(s) => Value::String(s.to_string()),
        };
        let ty = value.script_type();
        self.check_only_float(&ty, false, lit.span)?;
        Ok(RExpr::new(RExprKind::Literal(value), ty, lit.span))
    }

    fn resolve_ident(&self, ident: &IdentExpr<'_>) -> Result<RExpr> {
        let (var, ty) = self.lookup_variable(ident)?;
        Ok(RExpr::new(
            RExprKind::Var {
                var,
                name: ident.qualified_string(),
            },
            ty,
            ident.span,
        ))
    }

    /// Find the variable an identifier names.
    pub(super) fn lookup_variable(&self, ident: &IdentExpr<'_>) -> Result<(VarRef, ScriptType)> {
        if !ident.is_qualified() {
            if let Some(found) = self.lookup_script_variable(ident.name()) {
                return Ok(found);
            }
        }

        let qname = QualifiedName::from_qualified_string(&ident.qualified_string());
        match self.registry.lookup(&qname) {
            Some(Binding::Variable(variable)) => {
                let ty = variable.script_type().clone();
                self.check_only_float(&ty, false, ident.span)?;
                Ok((VarRef::Bound(variable.clone()), ty))
            }
            Some(Binding::Functions(_)) => Err(ResolveError::type_mismatch(
                ident.span,
                format!("'{}' is a function, not a variable", ident.qualified_string()),
            )),
            None => Err(ResolveError::UnresolvedSymbol {
                name: ident.qualified_string(),
                span: ident.span,
            }),
        }
    }

    fn resolve_index(&mut self, index: &IndexExpr<'_>) -> Result<RExpr> {
        let base = self.resolve_value(index.base, None)?;
        let element = element_type(&base.ty, index.span)?;
        let position = self.resolve_as(index.index, &ScriptType::Int)?;
        Ok(RExpr::new(
            RExprKind::Index {
                base: Box::new(base),
                index: Box::new(position),
            },
            element,
            index.span,
        ))
    }

    fn resolve_cast(&mut self, cast: &CastExpr<'_>) -> Result<RExpr> {
        let target = cast.target.to_script_type();
        self.check_only_float(&target, false, cast.target.span)?;
        let inner = self.resolve_value(cast.expr, None)?;

        if inner.ty == target {
            return Ok(RExpr { span: cast.span, ..inner });
        }
        if !can_cast(&inner.ty, &target) {
            return Err(ResolveError::type_mismatch(
                cast.span,
                format!("cannot cast '{}' to '{}'", inner.ty, target),
            ));
        }
        Ok(RExpr::new(RExprKind::Convert(Box::new(inner)), target, cast.span))
    }

    fn resolve_init_list(&mut self, list: &InitListExpr<'_>, expected: Option<&ScriptType>) -> Result<RExpr> {
        let element_ty = match expected {
            Some(ScriptType::Array(element)) => Some((**element).clone()),
            Some(other) => {
                return Err(ResolveError::type_mismatch(
                    list.span,
                    format!("an initializer list cannot produce '{other}'"),
                ));
            }
            None => None,
        };

        let (element_ty, elements) = match element_ty {
            Some(element_ty) => {
                let elements = list
                    .elements
                    .iter()
                    .map(|e| self.resolve_as(e, &element_ty))
                    .collect::<Result<Vec<_>>>()?;
                (element_ty, elements)
            }
            None => {
                let elements = list
                    .elements
                    .iter()
                    .map(|e| self.resolve_value(e, None))
                    .collect::<Result<Vec<_>>>()?;
                let element_ty = infer_element_type(&elements, list.span)?;
                let elements = elements
                    .into_iter()
                    .map(|e| coerce(e, &element_ty))
                    .collect::<Result<Vec<_>>>()?;
                (element_ty, elements)
            }
        };

        Ok(RExpr::new(
            RExprKind::ArrayLiteral(elements),
            element_ty.array_of(),
            list.span,
        ))
    }

    // ==========================================================================
    // Operators
    // ==========================================================================

    fn resolve_binary(&mut self, binary: &BinaryExpr<'_>) -> Result<RExpr> {
        let left = self.resolve_value(binary.left, None)?;
        let right = self.resolve_value(binary.right, None)?;
        binary_expr(binary.op, left, right, binary.span)
    }

    fn resolve_unary(&mut self, unary: &UnaryExpr<'_>) -> Result<RExpr> {
        match unary.op {
            UnaryOp::PreInc => return self.resolve_step(unary.operand, 1, true, unary.span),
            UnaryOp::PreDec => return self.resolve_step(unary.operand, -1, true, unary.span),
            _ => {}
        }

        let operand = self.resolve_value(unary.operand, None)?;
        match unary.op {
            UnaryOp::Neg if operand.ty.is_numeric() => {
                // Fold negative literals so `-5` stays a constant.
                if let RExprKind::Literal(value) = &operand.kind {
                    let folded = match value {
                        Value::Int(v) => Some(Value::Int(v.wrapping_neg())),
                        Value::Float(v) => Some(Value::Float(-v)),
                        _ => None,
                    };
                    if let Some(folded) = folded {
                        return Ok(RExpr::new(RExprKind::Literal(folded), operand.ty, unary.span));
                    }
                }
                let ty = operand.ty.clone();
                Ok(RExpr::new(RExprKind::Negate(Box::new(operand)), ty, unary.span))
            }
            UnaryOp::Plus if operand.ty.is_numeric() => Ok(RExpr { span: unary.span, ..operand }),
            UnaryOp::LogicalNot if operand.ty == ScriptType::Bool => Ok(RExpr::new(
                RExprKind::Not(Box::new(operand)),
                ScriptType::Bool,
                unary.span,
            )),
            op => Err(ResolveError::type_mismatch(
                unary.span,
                format!("operator '{op}' cannot be applied to '{}'", operand.ty),
            )),
        }
    }
}

/// Type a binary operation on already resolved operands.
pub(super) fn binary_expr(op: BinaryOp, left: RExpr, right: RExpr, span: Span) -> Result<RExpr> {
    let mismatch = |left: &RExpr, right: &RExpr| {
        ResolveError::type_mismatch(
            span,
            format!("operator '{op}' cannot be applied to '{}' and '{}'", left.ty, right.ty),
        )
    };

    if op.is_logical() {
        if left.ty != ScriptType::Bool || right.ty != ScriptType::Bool {
            return Err(mismatch(&left, &right));
        }
        return Ok(RExpr::new(
            RExprKind::Logical {
                and: op == BinaryOp::LogicalAnd,
                left: Box::new(left),
                right: Box::new(right),
            },
            ScriptType::Bool,
            span,
        ));
    }

    if op == BinaryOp::Add && (left.ty == ScriptType::String || right.ty == ScriptType::String) {
        return Ok(binary_node(op, left, right, ScriptType::String, span));
    }

    if let Some(common) = numeric_common_type(&left.ty, &right.ty) {
        let left = coerce(left, &common)?;
        let right = coerce(right, &common)?;
        let ty = if op.is_comparison() { ScriptType::Bool } else { common };
        return Ok(binary_node(op, left, right, ty, span));
    }

    if matches!(op, BinaryOp::Equal | BinaryOp::NotEqual) && left.ty == right.ty {
        return Ok(binary_node(op, left, right, ScriptType::Bool, span));
    }

    Err(mismatch(&left, &right))
}

fn binary_node(op: BinaryOp, left: RExpr, right: RExpr, ty: ScriptType, span: Span) -> RExpr {
    RExpr::new(
        RExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        ty,
        span,
    )
}

/// Convert a resolved value to `ty` using the implicit conversions.
pub(crate) fn coerce(expr: RExpr, ty: &ScriptType) -> Result<RExpr> {
    match implicit_cost(&expr.ty, ty) {
        Some(0) => Ok(expr),
        Some(_) => {
            let span = expr.span;
            // Promote literals in place.
            if let RExprKind::Literal(Value::Int(v)) = expr.kind {
                return Ok(RExpr::new(RExprKind::Literal(Value::Float(v as f64)), ty.clone(), span));
            }
            Ok(RExpr::new(RExprKind::Convert(Box::new(expr)), ty.clone(), span))
        }
        None => Err(ResolveError::type_mismatch(
            expr.span,
            format!("cannot convert '{}' to '{}'", expr.ty, ty),
        )),
    }
}

pub(super) fn element_type(ty: &ScriptType, span: Span) -> Result<ScriptType> {
    ty.element()
        .cloned()
        .ok_or_else(|| ResolveError::type_mismatch(span, format!("cannot index a value of type '{ty}'")))
}

/// Element type of an untyped initializer list: the common type of its
/// elements after promotion.
fn infer_element_type(elements: &[RExpr], span: Span) -> Result<ScriptType> {
    let mut iter = elements.iter();
    let Some(first) = iter.next() else {
        return Err(ResolveError::type_mismatch(
            span,
            "cannot infer the element type of an empty initializer list",
        ));
    };

    let mut ty = first.ty.clone();
    for element in iter {
        if element.ty == ty {
            continue;
        }
        ty = numeric_common_type(&ty, &element.ty).ok_or_else(|| {
            ResolveError::type_mismatch(
                element.span,
                format!("initializer list mixes '{}' and '{}'", ty, element.ty),
            )
        })?;
    }
    Ok(ty)
}

#[cfg(test)]
mod tests {
    use crate::program::{RExprKind, RStmt};
    use crate::{ResolveOptions, Resolver, Unit};
    use bumpalo::Bump;
    use hostscript_core::{ResolveError, ScriptType, Value};
    use hostscript_parser::Parser;
    use hostscript_registry::BindingRegistry;

    /// Resolve `source` and return the type of its last top-level
    /// expression statement.
    fn type_of(source: &str) -> Result<ScriptType, ResolveError> {
        let arena = Bump::new();
        let script = Parser::parse(source, &arena).unwrap();
        let registry = BindingRegistry::new();
        let program = Resolver::new(&registry, ResolveOptions::default())
            .resolve(&[], Unit::new("test", script))
            .map_err(|e| e.error)?;
        match program.main.last() {
            Some(RStmt::Expr(expr)) => Ok(expr.ty.clone()),
            other => panic!("expected expression statement, got {other:?}"),
        }
    }

    #[test]
    fn arithmetic_promotion() {
        assert_eq!(type_of("1 + 2;").unwrap(), ScriptType::Int);
        assert_eq!(type_of("1 + 2.5;").unwrap(), ScriptType::Float);
        assert_eq!(type_of("7 % 2;").unwrap(), ScriptType::Int);
        assert_eq!(type_of("1 < 2.0;").unwrap(), ScriptType::Bool);
    }

    #[test]
    fn string_concatenation() {
        assert_eq!(type_of("\"n = \" + 5;").unwrap(), ScriptType::String);
        assert_eq!(type_of("1.5 + \"!\";").unwrap(), ScriptType::String);
        let err = type_of("\"a\" - 1;").unwrap_err();
        assert!(matches!(err, ResolveError::TypeMismatch { .. }));
    }

    #[test]
    fn logical_operators_need_bool() {
        assert_eq!(type_of("true && !false;").unwrap(), ScriptType::Bool);
        assert!(type_of("1 && true;").is_err());
        assert!(type_of("!1;").is_err());
    }

    #[test]
    fn equality() {
        assert_eq!(type_of("\"a\" == \"b\";").unwrap(), ScriptType::Bool);
        assert_eq!(type_of("true != false;").unwrap(), ScriptType::Bool);
        assert!(type_of("true == 1;").is_err());
        assert!(type_of("\"a\" < \"b\";").is_err());
    }

    #[test]
    fn casts() {
        assert_eq!(type_of("(int)2.7;").unwrap(), ScriptType::Int);
        assert_eq!(type_of("(string)3;").unwrap(), ScriptType::String);
        assert_eq!(type_of("(bool)1;").unwrap(), ScriptType::Bool);
        let err = type_of("(int)\"3\";").unwrap_err();
        assert!(matches!(err, ResolveError::TypeMismatch { .. }));
    }

    #[test]
    fn init_lists() {
        assert_eq!(type_of("int[] a = {1, 2}; a;").unwrap(), ScriptType::Int.array_of());
        assert_eq!(type_of("float[] a = {1, 2.5}; a[0];").unwrap(), ScriptType::Float);
        assert_eq!(type_of("({1, 2.5})[0];").unwrap(), ScriptType::Float);
        assert!(type_of("({})[0];").is_err());
        assert!(type_of("({1, true})[0];").is_err());
        assert!(type_of("int x = {1};").is_err());
    }

    #[test]
    fn indexing() {
        assert_eq!(type_of("int[][] m = {{1}, {2, 3}}; m[1];").unwrap(), ScriptType::Int.array_of());
        assert!(type_of("int x = 1; x[0];").is_err());
        assert!(type_of("int[] a = {1}; a[1.5];").is_err());
    }

    #[test]
    fn negative_literals_fold() {
        let arena = Bump::new();
        let script = Parser::parse("-5;", &arena).unwrap();
        let registry = BindingRegistry::new();
        let program = Resolver::new(&registry, ResolveOptions::default())
            .resolve(&[], Unit::new("test", script))
            .unwrap();
        let Some(RStmt::Expr(expr)) = program.main.first() else {
            panic!("expected expression");
        };
        assert!(matches!(expr.kind, RExprKind::Literal(Value::Int(-5))));
    }

    #[test]
    fn void_value_rejected() {
        let err = type_of("void f() { } int x = f();").unwrap_err();
        assert!(matches!(err, ResolveError::TypeMismatch { .. }));
        assert_eq!(type_of("void f() { } f();").unwrap(), ScriptType::Void);
    }
}
