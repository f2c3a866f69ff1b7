//! Parser infrastructure.
//!
//! Provides the main [`Parser`] struct with token navigation, error
//! collection and resynchronization.

use crate::ast::{Expr, Script, Stmt};
use crate::lexer::{Lexer, Token, TokenKind};
use bumpalo::Bump;
use bumpalo::collections::Vec as BVec;
use hostscript_core::stack::ensure_sufficient_stack;
use hostscript_core::{ParseError, ParseErrorKind, ParseErrors, Span};

/// Deepest nesting of statements and expressions the parser accepts.
pub const MAX_NESTING_DEPTH: usize = 256;

/// The parser for script text.
///
/// The whole text is tokenized up front. The `'ast` lifetime refers to the
/// arena where AST nodes and token lexemes are allocated; the text only
/// needs to live during [`Parser::new`].
pub struct Parser<'ast> {
    /// Buffered tokens, always terminated by `Eof`.
    pub(super) buffer: Vec<Token<'ast>>,
    pub(super) position: usize,
    pub(super) errors: Vec<ParseError>,
    pub(super) arena: &'ast Bump,
    /// Current statement and expression nesting.
    depth: usize,
    /// Set once nesting overflows; the rest of the input is abandoned.
    overflow: Option<ParseError>,
}

impl<'ast> Parser<'ast> {
    /// Create a parser, tokenizing `source` eagerly.
    ///
    /// Lexer errors are recorded immediately and their `Error` tokens are
    /// dropped from the buffer.
    pub fn new(source: &str, arena: &'ast Bump) -> Self {
        let (tokens, errors) = Lexer::new(source, arena).tokenize();
        let buffer: Vec<Token<'ast>> = tokens
            .into_iter()
            .filter(|t| t.kind != TokenKind::Error)
            .collect();

        Self {
            buffer,
            position: 0,
            errors,
            arena,
            depth: 0,
            overflow: None,
        }
    }

    /// Parse a complete script.
    ///
    /// Returns every syntax error found, ordered by position, if any.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn parse(source: &str, arena: &'ast Bump) -> Result<Script<'ast>, ParseErrors> {
        let (script, errors) = Self::parse_lenient(source, arena);
        if errors.is_empty() {
            Ok(script)
        } else {
            Err(errors)
        }
    }

    /// Parse a complete script, returning a partial AST alongside any errors.
    pub fn parse_lenient(source: &str, arena: &'ast Bump) -> (Script<'ast>, ParseErrors) {
        let mut parser = Parser::new(source, arena);
        let script = parser.parse_script();
        (script, parser.take_errors())
    }

    /// Parse a single expression. Trailing tokens are an error.
    pub fn expression(source: &str, arena: &'ast Bump) -> Result<&'ast Expr<'ast>, ParseErrors> {
        let mut parser = Parser::new(source, arena);
        let result = parser.parse_expr(0).and_then(|expr| {
            let token = *parser.peek();
            if token.kind == TokenKind::Eof {
                Ok(expr)
            } else {
                Err(ParseError::expected_token(token.span, "end of file", &token.describe()))
            }
        });
        match result {
            Ok(expr) if parser.errors.is_empty() => Ok(expr),
            Ok(_) => Err(parser.take_errors()),
            Err(e) => {
                parser.errors.push(e);
                Err(parser.take_errors())
            }
        }
    }

    fn parse_script(&mut self) -> Script<'ast> {
        let start_span = self.peek().span;
        let mut stmts = BVec::new_in(self.arena);

        while !self.is_eof() {
            let start = self.position;
            match self.parse_item() {
                Ok(stmt) => stmts.push(stmt),
                Err(error) => {
                    self.errors.push(error);
                    self.synchronize(start);
                }
            }
        }

        let end_span = self.peek().span;
        Script::new(stmts.into_bump_slice(), start_span.merge(end_span))
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Take the errors sorted by position, leaving none behind.
    ///
    /// After a nesting overflow, errors past the overflow point are dropped;
    /// they only describe the constructs left open by abandoning the input.
    pub fn take_errors(&mut self) -> ParseErrors {
        let mut errors = std::mem::take(&mut self.errors);
        if let Some(overflow) = self.overflow.take() {
            let at = (overflow.span.line, overflow.span.col);
            errors.retain(|e| (e.span.line, e.span.col) < at);
            errors.push(overflow);
        }
        errors.sort_by_key(|e| (e.span.line, e.span.col));
        errors.into_iter().collect()
    }

    // ========================================================================
    // Token Navigation
    // ========================================================================

    /// Peek at the current token without consuming it.
    pub fn peek(&self) -> &Token<'ast> {
        self.peek_nth(0)
    }

    /// Peek ahead `n` tokens. Reads past the end yield the `Eof` token.
    pub fn peek_nth(&self, n: usize) -> &Token<'ast> {
        let last = self.buffer.len().saturating_sub(1);
        &self.buffer[(self.position + n).min(last)]
    }

    /// Consume the current token. `Eof` is never consumed.
    pub fn advance(&mut self) -> Token<'ast> {
        let token = *self.peek();
        if token.kind != TokenKind::Eof {
            self.position += 1;
        }
        token
    }

    pub fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    pub fn is_eof(&self) -> bool {
        self.check(TokenKind::Eof)
    }

    /// Consume the current token if it has the given kind.
    pub fn eat(&mut self, kind: TokenKind) -> Option<Token<'ast>> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            None
        }
    }

    /// Consume a token of the given kind or fail with `expected X, found Y`.
    pub fn expect(&mut self, kind: TokenKind) -> Result<Token<'ast>, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            let token = *self.peek();
            Err(ParseError::expected_token(
                token.span,
                kind.description(),
                &token.describe(),
            ))
        }
    }

    /// The span of the most recently consumed token.
    pub(super) fn previous_span(&self) -> Span {
        self.position
            .checked_sub(1)
            .and_then(|i| self.buffer.get(i))
            .map(|t| t.span)
            .unwrap_or_default()
    }

    // ========================================================================
    // Error Handling
    // ========================================================================

    /// Record an error without aborting the current construct.
    pub fn error(&mut self, kind: ParseErrorKind, span: Span, message: impl Into<String>) {
        self.errors.push(ParseError::new(kind, span, message));
    }

    /// Run `parse` one nesting level deeper.
    ///
    /// Past [`MAX_NESTING_DEPTH`] the parser stops at end of file and fails
    /// with [`ParseErrorKind::NestingTooDeep`].
    pub(super) fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(self.nesting_overflow());
        }
        self.depth += 1;
        let result = ensure_sufficient_stack(|| parse(self));
        self.depth -= 1;
        result
    }

    pub(super) fn nesting_overflow(&mut self) -> ParseError {
        let span = self.peek().span;
        let error = ParseError::new(
            ParseErrorKind::NestingTooDeep,
            span,
            format!("nesting exceeds {MAX_NESTING_DEPTH} levels"),
        );
        self.position = self.buffer.len().saturating_sub(1);
        self.overflow = Some(error.clone());
        error
    }

    /// Skip tokens until a statement boundary after a failed parse that
    /// began at token index `start`.
    ///
    /// Stops after a `;`, or before a `}` or a statement keyword. At least
    /// one token is consumed when the failed parse made no progress, so
    /// callers looping on statements always terminate.
    pub fn synchronize(&mut self, start: usize) {
        while !self.is_eof() {
            if self.position > start {
                if self.position > 0 && self.buffer[self.position - 1].kind == TokenKind::Semicolon {
                    return;
                }
                let kind = self.peek().kind;
                if kind == TokenKind::RightBrace || kind.starts_statement() {
                    return;
                }
            }
            self.advance();
        }
    }

    /// Allocate a statement in the arena.
    pub(super) fn alloc_stmt(&self, stmt: Stmt<'ast>) -> &'ast Stmt<'ast> {
        self.arena.alloc(stmt)
    }
}
