//! The resolved program.
//!
//! Resolution turns the arena AST into an owned tree in which every name has
//! been replaced by exactly one target: a local slot, a global slot, a bound
//! variable, or a call target chosen by overload resolution. Every
//! expression carries its static type, and implicit promotions are explicit
//! [`RExprKind::Convert`] nodes.

use std::sync::Arc;

use hostscript_core::{BoundFunction, BoundVariable, ScriptType, Span, Value};
use hostscript_parser::ast::BinaryOp;

/// A fully resolved program, ready to execute.
#[derive(Debug, Clone, Default)]
pub struct ResolvedProgram {
    /// Script-defined functions, indexed by [`CallTarget::Script`].
    pub functions: Vec<ResolvedFunction>,
    /// Types of the global slots, in slot order.
    pub globals: Vec<ScriptType>,
    /// Top-level statements of the library scripts, in registration order.
    pub libraries: Vec<RStmt>,
    /// Top-level statements of the main script.
    pub main: Vec<RStmt>,
}

impl ResolvedProgram {
    pub fn function(&self, index: usize) -> Option<&ResolvedFunction> {
        self.functions.get(index)
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedFunction {
    pub name: String,
    pub params: Vec<ScriptType>,
    pub return_type: ScriptType,
    /// Number of local slots; parameters occupy the first `params.len()`.
    pub slot_count: usize,
    pub body: Vec<RStmt>,
    pub span: Span,
}

impl ResolvedFunction {
    /// `name(int, float)` form used in diagnostics.
    pub fn signature(&self) -> String {
        format!("{}({})", self.name, hostscript_core::format_params(&self.params))
    }
}

/// Where a variable lives.
#[derive(Debug, Clone)]
pub enum VarRef {
    /// A slot in the current function frame.
    Local(usize),
    /// A slot in the top-level frame shared by all scripts of one run.
    Global(usize),
    /// A host variable, read and written through its accessors.
    Bound(Arc<BoundVariable>),
}

impl VarRef {
    pub fn is_bound(&self) -> bool {
        matches!(self, VarRef::Bound(_))
    }
}

/// The function a call expression was resolved to.
#[derive(Debug, Clone)]
pub enum CallTarget {
    /// Index into [`ResolvedProgram::functions`].
    Script(usize),
    Host(Arc<BoundFunction>),
}

/// An assignable location: a variable, optionally indexed.
#[derive(Debug, Clone)]
pub struct Place {
    pub var: VarRef,
    /// Name used in diagnostics.
    pub name: String,
    /// Index expressions applied in order, outermost array first.
    pub indices: Vec<RExpr>,
}

#[derive(Debug, Clone)]
pub struct RExpr {
    pub kind: RExprKind,
    pub ty: ScriptType,
    pub span: Span,
}

impl RExpr {
    pub fn new(kind: RExprKind, ty: ScriptType, span: Span) -> Self {
        Self { kind, ty, span }
    }
}

#[derive(Debug, Clone)]
pub enum RExprKind {
    Literal(Value),
    Var { var: VarRef, name: String },
    Index {
        base: Box<RExpr>,
        index: Box<RExpr>,
    },
    /// Arithmetic, comparison or string concatenation. Numeric operands
    /// already share one type.
    Binary {
        op: BinaryOp,
        left: Box<RExpr>,
        right: Box<RExpr>,
    },
    /// Short-circuit `&&` (`and == true`) or `||`.
    Logical {
        and: bool,
        left: Box<RExpr>,
        right: Box<RExpr>,
    },
    Negate(Box<RExpr>),
    Not(Box<RExpr>),
    /// Implicit promotion or explicit cast to `RExpr::ty`.
    Convert(Box<RExpr>),
    /// `=` when `op` is `None`, otherwise a compound assignment computed
    /// in the type of the target.
    Assign {
        target: Place,
        op: Option<BinaryOp>,
        value: Box<RExpr>,
    },
    /// `++`/`--`; `prefix` selects whether the new or old value is produced.
    Step {
        target: Place,
        delta: i64,
        prefix: bool,
    },
    Call {
        target: CallTarget,
        name: String,
        args: Vec<RExpr>,
    },
    /// `{a, b, c}`, element values already converted to the element type.
    ArrayLiteral(Vec<RExpr>),
}

/// Initial value of a declared variable.
#[derive(Debug, Clone)]
pub enum Init {
    /// The default value of the declared type.
    Default,
    Expr(RExpr),
    /// A C-style sized array: `int a[3][n]`. `None` dimensions stay empty.
    Sized(Vec<Option<RExpr>>),
}

#[derive(Debug, Clone)]
pub enum RStmt {
    Expr(RExpr),
    Decl {
        target: VarRef,
        ty: ScriptType,
        init: Init,
    },
    Block(Vec<RStmt>),
    If {
        condition: RExpr,
        then_branch: Box<RStmt>,
        else_branch: Option<Box<RStmt>>,
    },
    While {
        condition: RExpr,
        body: Box<RStmt>,
    },
    For {
        init: Vec<RStmt>,
        condition: Option<RExpr>,
        update: Option<RExpr>,
        body: Box<RStmt>,
    },
    Break,
    Continue,
    Return(Option<RExpr>, Span),
    /// No-op; left where a function definition stood.
    Empty,
}
