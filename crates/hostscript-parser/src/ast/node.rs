//! Shared AST building blocks: identifiers and type expressions.

use hostscript_core::{ScriptType, Span};
use std::fmt;

/// An identifier with its location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ident<'ast> {
    /// The identifier name (allocated in the arena).
    pub name: &'ast str,
    pub span: Span,
}

impl<'ast> Ident<'ast> {
    pub fn new(name: &'ast str, span: Span) -> Self {
        Self { name, span }
    }
}

impl fmt::Display for Ident<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Primitive type keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Void,
    Int,
    Float,
    Bool,
    String,
}

impl PrimitiveType {
    pub fn to_script_type(self) -> ScriptType {
        match self {
            PrimitiveType::Void => ScriptType::Void,
            PrimitiveType::Int => ScriptType::Int,
            PrimitiveType::Float => ScriptType::Float,
            PrimitiveType::Bool => ScriptType::Bool,
            PrimitiveType::String => ScriptType::String,
        }
    }
}

/// A written type such as `int` or `float[][]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeExpr {
    pub base: PrimitiveType,
    /// Number of `[]` suffixes.
    pub array_rank: u32,
    pub span: Span,
}

impl TypeExpr {
    pub fn primitive(base: PrimitiveType, span: Span) -> Self {
        Self {
            base,
            array_rank: 0,
            span,
        }
    }

    /// The script type with `extra_rank` more array dimensions.
    pub fn to_script_type_with_rank(&self, extra_rank: u32) -> ScriptType {
        let mut ty = self.base.to_script_type();
        for _ in 0..self.array_rank + extra_rank {
            ty = ty.array_of();
        }
        ty
    }

    pub fn to_script_type(&self) -> ScriptType {
        self.to_script_type_with_rank(0)
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_script_type())
    }
}
