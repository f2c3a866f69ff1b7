//! Abstract Syntax Tree (AST) for the script language.
//!
//! This module provides:
//! - AST node definitions for every supported construct
//! - The [`Parser`] that turns tokens into an AST
//!
//! # Example
//!
//! ```
//! use hostscript_parser::Parser;
//! use bumpalo::Bump;
//!
//! let arena = Bump::new();
//! let source = r#"
//!     int sum = 0;
//!     for (int i = 1; i <= 10; i++) {
//!         sum += i;
//!     }
//!     output(sum);
//! "#;
//!
//! match Parser::parse(source, &arena) {
//!     Ok(script) => println!("Parsed successfully: {} statements", script.stmts().len()),
//!     Err(errors) => eprintln!("Parse errors: {}", errors),
//! }
//! ```

pub mod node;
pub mod ops;

mod parser;
mod type_parser;

pub mod expr;
mod expr_parser;

pub mod stmt;
mod stmt_parser;

pub use hostscript_core::{ParseError, ParseErrorKind, ParseErrors};

pub use expr::*;
pub use node::*;
pub use ops::*;
pub use parser::{MAX_NESTING_DEPTH, Parser};
pub use stmt::*;

use hostscript_core::Span;

/// A parsed script.
///
/// All AST nodes are allocated in the arena passed to [`Parser::parse`] and
/// remain valid for the lifetime of that arena.
#[derive(Debug, Clone, Copy)]
pub struct Script<'ast> {
    stmts: &'ast [Stmt<'ast>],
    span: Span,
}

impl<'ast> Script<'ast> {
    pub(crate) fn new(stmts: &'ast [Stmt<'ast>], span: Span) -> Self {
        Self { stmts, span }
    }

    /// The top-level statements and function definitions, in source order.
    pub fn stmts(&self) -> &'ast [Stmt<'ast>] {
        self.stmts
    }

    /// The top-level function definitions.
    pub fn functions(&self) -> impl Iterator<Item = &'ast FunctionDecl<'ast>> + 'ast {
        self.stmts.iter().filter_map(|stmt| match stmt {
            Stmt::Function(func) => Some(*func),
            _ => None,
        })
    }

    pub fn span(&self) -> Span {
        self.span
    }
}
