//! Statement AST nodes.
//!
//! Provides nodes for expression statements, variable declarations,
//! control flow (if, while, for), jumps (return, break, continue), blocks
//! and top-level function definitions.

use crate::ast::expr::Expr;
use crate::ast::node::{Ident, TypeExpr};
use hostscript_core::Span;

/// A statement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Stmt<'ast> {
    Expr(ExprStmt<'ast>),
    VarDecl(VarDeclStmt<'ast>),
    Return(ReturnStmt<'ast>),
    Break(BreakStmt),
    Continue(ContinueStmt),
    Block(Block<'ast>),
    If(&'ast IfStmt<'ast>),
    While(&'ast WhileStmt<'ast>),
    For(&'ast ForStmt<'ast>),
    /// Function definition. Only produced at the top level.
    Function(&'ast FunctionDecl<'ast>),
}

impl<'ast> Stmt<'ast> {
    pub fn span(&self) -> Span {
        match self {
            Self::Expr(s) => s.span,
            Self::VarDecl(s) => s.span,
            Self::Return(s) => s.span,
            Self::Break(s) => s.span,
            Self::Continue(s) => s.span,
            Self::Block(s) => s.span,
            Self::If(s) => s.span,
            Self::While(s) => s.span,
            Self::For(s) => s.span,
            Self::Function(s) => s.span,
        }
    }
}

/// An expression statement. `expr` is `None` for the empty statement `;`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExprStmt<'ast> {
    pub expr: Option<&'ast Expr<'ast>>,
    pub span: Span,
}

/// A variable declaration statement.
///
/// Examples:
/// - `int x;`
/// - `int sum = 0, n = LOOP_MAX;`
/// - `float values[8];`
/// - `int[] data = {1, 2, 3};`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VarDeclStmt<'ast> {
    pub ty: TypeExpr,
    pub vars: &'ast [VarDeclarator<'ast>],
    pub span: Span,
}

/// A single declarator within a variable declaration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VarDeclarator<'ast> {
    pub name: Ident<'ast>,
    /// C-style array suffixes after the name. `Some(len)` allocates that
    /// many elements; `None` (written `[]`) only adds a dimension.
    pub dims: &'ast [Option<&'ast Expr<'ast>>],
    pub init: Option<&'ast Expr<'ast>>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReturnStmt<'ast> {
    pub value: Option<&'ast Expr<'ast>>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreakStmt {
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContinueStmt {
    pub span: Span,
}

/// A braced block of statements, which opens a new scope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Block<'ast> {
    pub stmts: &'ast [Stmt<'ast>],
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IfStmt<'ast> {
    pub condition: &'ast Expr<'ast>,
    pub then_stmt: &'ast Stmt<'ast>,
    pub else_stmt: Option<&'ast Stmt<'ast>>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WhileStmt<'ast> {
    pub condition: &'ast Expr<'ast>,
    pub body: &'ast Stmt<'ast>,
    pub span: Span,
}

/// `for (init; condition; update) body`. Every header part is optional.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForStmt<'ast> {
    pub init: Option<ForInit<'ast>>,
    pub condition: Option<&'ast Expr<'ast>>,
    pub update: Option<&'ast Expr<'ast>>,
    pub body: &'ast Stmt<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ForInit<'ast> {
    VarDecl(VarDeclStmt<'ast>),
    Expr(&'ast Expr<'ast>),
}

/// A script function definition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FunctionDecl<'ast> {
    pub return_type: TypeExpr,
    pub name: Ident<'ast>,
    pub params: &'ast [Param<'ast>],
    pub body: Block<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Param<'ast> {
    pub ty: TypeExpr,
    pub name: Ident<'ast>,
    pub span: Span,
}
