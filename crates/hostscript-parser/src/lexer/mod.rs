//! Lexical analysis for script text.

mod cursor;
mod lexer;
mod token;

pub use lexer::Lexer;
pub use token::{Token, TokenKind, lookup_keyword};
