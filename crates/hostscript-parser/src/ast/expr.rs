//! Expression AST nodes.
//!
//! # Expression Precedence
//!
//! The parser uses Pratt parsing with the following levels, lowest first:
//! 1. Assignment (=, +=, -=, *=, /=, %=) - right associative
//! 2. Logical OR (||)
//! 3. Logical AND (&&)
//! 4. Equality (==, !=)
//! 5. Relational (<, <=, >, >=)
//! 6. Additive (+, -)
//! 7. Multiplicative (*, /, %)
//! 8. Prefix unary (-, +, !, ++, --) and casts
//! 9. Postfix (call, index, ++, --)

use crate::ast::node::{Ident, TypeExpr};
use crate::ast::ops::{AssignOp, BinaryOp, PostfixOp, UnaryOp};
use hostscript_core::Span;

/// An expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Expr<'ast> {
    Literal(LiteralExpr<'ast>),
    /// A possibly namespace-qualified name: `sum`, `Example.LOOP_MAX`.
    Ident(IdentExpr<'ast>),
    Binary(&'ast BinaryExpr<'ast>),
    Unary(&'ast UnaryExpr<'ast>),
    Postfix(&'ast PostfixExpr<'ast>),
    Assign(&'ast AssignExpr<'ast>),
    Call(&'ast CallExpr<'ast>),
    Index(&'ast IndexExpr<'ast>),
    Cast(&'ast CastExpr<'ast>),
    /// Array initializer: `{1, 2, 3}`.
    InitList(InitListExpr<'ast>),
    Paren(&'ast ParenExpr<'ast>),
}

impl<'ast> Expr<'ast> {
    pub fn span(&self) -> Span {
        match self {
            Self::Literal(e) => e.span,
            Self::Ident(e) => e.span,
            Self::Binary(e) => e.span,
            Self::Unary(e) => e.span,
            Self::Postfix(e) => e.span,
            Self::Assign(e) => e.span,
            Self::Call(e) => e.span,
            Self::Index(e) => e.span,
            Self::Cast(e) => e.span,
            Self::InitList(e) => e.span,
            Self::Paren(e) => e.span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiteralExpr<'ast> {
    pub kind: LiteralKind<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LiteralKind<'ast> {
    Int(i64),
    Float(f64),
    Bool(bool),
    /// String contents with escapes already processed.
    String(&'ast str),
}

/// A name reference. The last path segment is the name, the rest its namespace.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IdentExpr<'ast> {
    pub path: &'ast [Ident<'ast>],
    pub span: Span,
}

impl<'ast> IdentExpr<'ast> {
    /// The final (simple) name. Paths are never empty.
    pub fn name(&self) -> &'ast str {
        self.path.last().map(|i| i.name).unwrap_or("")
    }

    /// The namespace segments before the name.
    pub fn namespace(&self) -> &'ast [Ident<'ast>] {
        &self.path[..self.path.len().saturating_sub(1)]
    }

    pub fn is_qualified(&self) -> bool {
        self.path.len() > 1
    }

    /// The dotted form, e.g. `Example.output`.
    pub fn qualified_string(&self) -> String {
        self.path
            .iter()
            .map(|i| i.name)
            .collect::<Vec<_>>()
            .join(".")
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinaryExpr<'ast> {
    pub left: &'ast Expr<'ast>,
    pub op: BinaryOp,
    pub right: &'ast Expr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnaryExpr<'ast> {
    pub op: UnaryOp,
    pub operand: &'ast Expr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostfixExpr<'ast> {
    pub operand: &'ast Expr<'ast>,
    pub op: PostfixOp,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssignExpr<'ast> {
    pub target: &'ast Expr<'ast>,
    pub op: AssignOp,
    pub value: &'ast Expr<'ast>,
    pub span: Span,
}

/// A call to a named function: `output(sum)`, `Math.scale(x, 2.0)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CallExpr<'ast> {
    pub callee: IdentExpr<'ast>,
    pub args: &'ast [&'ast Expr<'ast>],
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexExpr<'ast> {
    pub base: &'ast Expr<'ast>,
    pub index: &'ast Expr<'ast>,
    pub span: Span,
}

/// C-style cast: `(int)x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CastExpr<'ast> {
    pub target: TypeExpr,
    pub expr: &'ast Expr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InitListExpr<'ast> {
    pub elements: &'ast [&'ast Expr<'ast>],
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParenExpr<'ast> {
    pub expr: &'ast Expr<'ast>,
    pub span: Span,
}
