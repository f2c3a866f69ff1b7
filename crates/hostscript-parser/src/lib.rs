//! Script parser crate.
//!
//! This crate provides the lexer and parser for the embedded script language.
//! It includes:
//! - Lexical analysis (tokenization)
//! - Abstract Syntax Tree (AST) definitions
//! - Parser for transforming tokens into an AST, with error recovery
//!
//! Parsing never consults host bindings: it is a pure text to AST transform.
//!
//! # Example
//!
//! ```
//! use hostscript_parser::Parser;
//! use bumpalo::Bump;
//!
//! let arena = Bump::new();
//! let script = Parser::parse("int n = LOOP_MAX; output(n * 2);", &arena).unwrap();
//! assert_eq!(script.stmts().len(), 2);
//! ```

pub mod lexer;

pub mod ast;

pub use ast::{Parser, Script};
pub use lexer::{Lexer, Token, TokenKind};
