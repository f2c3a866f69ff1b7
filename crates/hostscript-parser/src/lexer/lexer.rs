//! Main lexer implementation.
//!
//! The [`Lexer`] converts script text into a stream of [`Token`]s, dispatching
//! on the first character of each token. Lexemes are copied into the arena so
//! the script text can be freed after lexing completes.

use bumpalo::Bump;
use hostscript_core::{ParseError, ParseErrorKind, Span};

use super::cursor::{Cursor, is_ident_continue, is_ident_start};
use super::token::{Token, TokenKind, lookup_keyword};

/// Lexer for script text.
///
/// The `'src` lifetime is the text being lexed; `'ast` is the arena where
/// token lexemes are allocated.
pub struct Lexer<'src, 'ast> {
    cursor: Cursor<'src>,
    arena: &'ast Bump,
    errors: Vec<ParseError>,
}

impl<'src, 'ast> Lexer<'src, 'ast> {
    pub fn new(source: &'src str, arena: &'ast Bump) -> Self {
        Self {
            cursor: Cursor::new(source),
            arena,
            errors: Vec::new(),
        }
    }

    /// Lex the whole input. The returned vector always ends with `Eof`.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn tokenize(mut self) -> (Vec<Token<'ast>>, Vec<ParseError>) {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        (tokens, self.errors)
    }

    /// Consume and return the next token.
    pub fn next_token(&mut self) -> Token<'ast> {
        loop {
            self.skip_whitespace();

            if self.cursor.is_eof() {
                return self.make_eof();
            }

            let start = self.start();
            let Some(c) = self.cursor.peek() else {
                return self.make_eof();
            };

            // Comments loop back for the next real token.
            if c == '/' && self.skip_comment(start) {
                continue;
            }

            return match c {
                '"' => self.scan_string(start),
                c if c.is_ascii_digit() => self.scan_number(start),
                '.' if self.cursor.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) => {
                    self.scan_number(start)
                }
                c if is_ident_start(c) => self.scan_identifier(start),
                _ => self.scan_operator(start),
            };
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    // =========================================
    // Internal helpers
    // =========================================

    fn start(&self) -> Start {
        Start {
            line: self.cursor.line(),
            col: self.cursor.column(),
            offset: self.cursor.offset(),
        }
    }

    fn skip_whitespace(&mut self) {
        self.cursor.eat('\u{FEFF}');
        self.cursor.eat_while(char::is_whitespace);
    }

    fn make_eof(&self) -> Token<'ast> {
        let span = Span::point(self.cursor.line(), self.cursor.column());
        Token::new(TokenKind::Eof, "", span)
    }

    fn span_from(&self, start: Start) -> Span {
        let len = self.cursor.slice_from(start.offset).chars().count() as u32;
        Span::new(start.line, start.col, len)
    }

    fn make_token(&self, kind: TokenKind, start: Start) -> Token<'ast> {
        let lexeme = self.arena.alloc_str(self.cursor.slice_from(start.offset));
        Token::new(kind, lexeme, self.span_from(start))
    }

    fn make_error(&mut self, kind: ParseErrorKind, start: Start, message: String) -> Token<'ast> {
        let span = self.span_from(start);
        self.errors.push(ParseError::new(kind, span, message));
        Token::new(TokenKind::Error, "", span)
    }

    // =========================================
    // Comments
    // =========================================

    /// Skip a `//` or `/* */` comment. Returns false if the slash is an operator.
    fn skip_comment(&mut self, start: Start) -> bool {
        if self.cursor.check_str("//") {
            self.cursor.eat_while(|c| c != '\n');
            return true;
        }
        if !self.cursor.check_str("/*") {
            return false;
        }
        self.cursor.advance();
        self.cursor.advance();
        loop {
            if self.cursor.check_str("*/") {
                self.cursor.advance();
                self.cursor.advance();
                return true;
            }
            if self.cursor.advance().is_none() {
                self.make_error(
                    ParseErrorKind::UnterminatedComment,
                    start,
                    "block comment is never closed".to_string(),
                );
                return true;
            }
        }
    }

    // =========================================
    // Literals and identifiers
    // =========================================

    /// Scan a string literal. Escapes are validated by the parser.
    fn scan_string(&mut self, start: Start) -> Token<'ast> {
        self.cursor.advance();
        loop {
            match self.cursor.peek() {
                None | Some('\n') => {
                    return self.make_error(
                        ParseErrorKind::UnterminatedString,
                        start,
                        "string literal is never closed".to_string(),
                    );
                }
                Some('\\') => {
                    self.cursor.advance();
                    if self.cursor.peek().is_some_and(|c| c != '\n') {
                        self.cursor.advance();
                    }
                }
                Some('"') => {
                    self.cursor.advance();
                    return self.make_token(TokenKind::StringLiteral, start);
                }
                Some(_) => {
                    self.cursor.advance();
                }
            }
        }
    }

    /// Scan an integer or float literal.
    fn scan_number(&mut self, start: Start) -> Token<'ast> {
        self.cursor.eat_while(|c| c.is_ascii_digit());
        let mut is_float = false;

        if self.cursor.peek() == Some('.') && self.cursor.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) {
            self.cursor.advance();
            self.cursor.eat_while(|c| c.is_ascii_digit());
            is_float = true;
        }

        if matches!(self.cursor.peek(), Some('e' | 'E')) {
            let sign = matches!(self.cursor.peek_nth(1), Some('+' | '-'));
            let digit_at = if sign { 2 } else { 1 };
            if self.cursor.peek_nth(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                self.cursor.advance();
                if sign {
                    self.cursor.advance();
                }
                self.cursor.eat_while(|c| c.is_ascii_digit());
                is_float = true;
            }
        }

        if self.cursor.peek().is_some_and(is_ident_start) {
            self.cursor.eat_while(is_ident_continue);
            let text = self.cursor.slice_from(start.offset).to_string();
            return self.make_error(
                ParseErrorKind::InvalidLiteral,
                start,
                format!("invalid numeric literal '{text}'"),
            );
        }

        let kind = if is_float {
            TokenKind::FloatLiteral
        } else {
            TokenKind::IntLiteral
        };
        self.make_token(kind, start)
    }

    fn scan_identifier(&mut self, start: Start) -> Token<'ast> {
        self.cursor.eat_while(is_ident_continue);
        let lexeme = self.cursor.slice_from(start.offset);
        let kind = lookup_keyword(lexeme).unwrap_or(TokenKind::Identifier);
        self.make_token(kind, start)
    }

    // =========================================
    // Operators
    // =========================================

    /// Scan an operator or punctuation token.
    fn scan_operator(&mut self, start: Start) -> Token<'ast> {
        let Some(c) = self.cursor.advance() else {
            return self.make_eof();
        };
        let next = self.cursor.peek();

        let kind = match (c, next) {
            ('(', _) => TokenKind::LeftParen,
            (')', _) => TokenKind::RightParen,
            ('[', _) => TokenKind::LeftBracket,
            (']', _) => TokenKind::RightBracket,
            ('{', _) => TokenKind::LeftBrace,
            ('}', _) => TokenKind::RightBrace,
            (';', _) => TokenKind::Semicolon,
            (',', _) => TokenKind::Comma,
            ('.', _) => TokenKind::Dot,

            ('+', Some('+')) => { self.cursor.advance(); TokenKind::PlusPlus }
            ('+', Some('=')) => { self.cursor.advance(); TokenKind::PlusEqual }
            ('+', _) => TokenKind::Plus,

            ('-', Some('-')) => { self.cursor.advance(); TokenKind::MinusMinus }
            ('-', Some('=')) => { self.cursor.advance(); TokenKind::MinusEqual }
            ('-', _) => TokenKind::Minus,

            ('*', Some('=')) => { self.cursor.advance(); TokenKind::StarEqual }
            ('*', _) => TokenKind::Star,

            ('/', Some('=')) => { self.cursor.advance(); TokenKind::SlashEqual }
            ('/', _) => TokenKind::Slash,

            ('%', Some('=')) => { self.cursor.advance(); TokenKind::PercentEqual }
            ('%', _) => TokenKind::Percent,

            ('=', Some('=')) => { self.cursor.advance(); TokenKind::EqualEqual }
            ('=', _) => TokenKind::Equal,

            ('!', Some('=')) => { self.cursor.advance(); TokenKind::BangEqual }
            ('!', _) => TokenKind::Bang,

            ('<', Some('=')) => { self.cursor.advance(); TokenKind::LessEqual }
            ('<', _) => TokenKind::Less,

            ('>', Some('=')) => { self.cursor.advance(); TokenKind::GreaterEqual }
            ('>', _) => TokenKind::Greater,

            ('&', Some('&')) => { self.cursor.advance(); TokenKind::AmpAmp }
            ('|', Some('|')) => { self.cursor.advance(); TokenKind::PipePipe }

            (other, _) => {
                return self.make_error(
                    ParseErrorKind::UnexpectedChar,
                    start,
                    format!("unexpected character '{other}'"),
                );
            }
        };

        self.make_token(kind, start)
    }
}

#[derive(Clone, Copy)]
struct Start {
    line: u32,
    col: u32,
    offset: u32,
}
