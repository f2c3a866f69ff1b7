//! Token types for the script lexer.

use hostscript_core::Span;
use std::fmt;

/// A token from the script text.
///
/// The `'ast` lifetime refers to the arena holding the lexeme, so the script
/// text itself can be dropped once lexing is done.
#[derive(Clone, Copy, PartialEq)]
pub struct Token<'ast> {
    pub kind: TokenKind,
    /// The source text of this token (allocated in the arena).
    pub lexeme: &'ast str,
    pub span: Span,
}

impl<'ast> Token<'ast> {
    #[inline]
    pub fn new(kind: TokenKind, lexeme: &'ast str, span: Span) -> Self {
        Self { kind, lexeme, span }
    }

    /// Describe this token for "found X" diagnostics.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Identifier => format!("identifier '{}'", self.lexeme),
            TokenKind::IntLiteral | TokenKind::FloatLiteral => format!("'{}'", self.lexeme),
            kind => kind.description().to_string(),
        }
    }
}

impl fmt::Debug for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:?} @ {:?})", self.kind, self.lexeme, self.span)
    }
}

/// All token types of the script language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // =========================================
    // Literals
    // =========================================
    /// Integer literal: `42`
    IntLiteral,
    /// Float literal: `3.14`, `1e10`
    FloatLiteral,
    /// String literal: `"hello"`
    StringLiteral,

    Identifier,

    // =========================================
    // Type keywords
    // =========================================
    /// `void`
    Void,
    /// `int` or `long`
    Int,
    /// `float` or `double`
    Float,
    /// `bool` or `boolean`
    Bool,
    /// `string`
    String,

    // =========================================
    // Value keywords
    // =========================================
    True,
    False,

    // =========================================
    // Control flow
    // =========================================
    If,
    Else,
    For,
    While,
    Break,
    Continue,
    Return,

    // =========================================
    // Operators
    // =========================================
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    PlusPlus,
    MinusMinus,
    Equal,
    PlusEqual,
    MinusEqual,
    StarEqual,
    SlashEqual,
    PercentEqual,
    EqualEqual,
    BangEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    AmpAmp,
    PipePipe,
    Bang,

    // =========================================
    // Delimiters
    // =========================================
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    Semicolon,
    Comma,
    Dot,

    // =========================================
    // Special
    // =========================================
    Eof,
    /// A lexing error; the error itself is recorded by the lexer.
    Error,
}

impl TokenKind {
    pub fn is_type_keyword(self) -> bool {
        use TokenKind::*;
        matches!(self, Void | Int | Float | Bool | String)
    }

    pub fn is_literal(self) -> bool {
        use TokenKind::*;
        matches!(self, IntLiteral | FloatLiteral | StringLiteral | True | False)
    }

    /// Tokens the parser resynchronizes on after an error.
    pub fn starts_statement(self) -> bool {
        use TokenKind::*;
        matches!(self, If | For | While | Break | Continue | Return | LeftBrace) || self.is_type_keyword()
    }

    /// The string representation of this token kind for error messages.
    pub fn description(self) -> &'static str {
        use TokenKind::*;
        match self {
            IntLiteral => "integer literal",
            FloatLiteral => "float literal",
            StringLiteral => "string literal",
            Identifier => "identifier",
            Void => "'void'",
            Int => "'int'",
            Float => "'float'",
            Bool => "'bool'",
            String => "'string'",
            True => "'true'",
            False => "'false'",
            If => "'if'",
            Else => "'else'",
            For => "'for'",
            While => "'while'",
            Break => "'break'",
            Continue => "'continue'",
            Return => "'return'",
            Plus => "'+'",
            Minus => "'-'",
            Star => "'*'",
            Slash => "'/'",
            Percent => "'%'",
            PlusPlus => "'++'",
            MinusMinus => "'--'",
            Equal => "'='",
            PlusEqual => "'+='",
            MinusEqual => "'-='",
            StarEqual => "'*='",
            SlashEqual => "'/='",
            PercentEqual => "'%='",
            EqualEqual => "'=='",
            BangEqual => "'!='",
            Less => "'<'",
            LessEqual => "'<='",
            Greater => "'>'",
            GreaterEqual => "'>='",
            AmpAmp => "'&&'",
            PipePipe => "'||'",
            Bang => "'!'",
            LeftParen => "'('",
            RightParen => "')'",
            LeftBracket => "'['",
            RightBracket => "']'",
            LeftBrace => "'{'",
            RightBrace => "'}'",
            Semicolon => "';'",
            Comma => "','",
            Dot => "'.'",
            Eof => "end of file",
            Error => "error",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Map a keyword to its [`TokenKind`], or `None` if not a keyword.
///
/// The long-form type names (`long`, `double`, `boolean`) are aliases.
pub fn lookup_keyword(ident: &str) -> Option<TokenKind> {
    use TokenKind::*;
    Some(match ident {
        "void" => Void,
        "int" | "long" => Int,
        "float" | "double" => Float,
        "bool" | "boolean" => Bool,
        "string" => String,
        "true" => True,
        "false" => False,
        "if" => If,
        "else" => Else,
        "for" => For,
        "while" => While,
        "break" => Break,
        "continue" => Continue,
        "return" => Return,
        _ => return None,
    })
}
