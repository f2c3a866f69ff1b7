//! Error types for every phase of script processing.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ParseError / ParseErrors  - malformed script text
//! RegistrationError         - invalid host bindings or options
//! ResolveError              - name, overload and type resolution failures
//! RuntimeError              - faults while a resolved program executes
//! NativeError               - failures reported by host callables
//! ```
//!
//! The engine facade wraps all of them in a single top-level error.

use thiserror::Error;

use crate::Span;

// ============================================================================
// Parse Errors
// ============================================================================

/// Categories of parse errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// A specific token was expected but not found.
    ExpectedToken,
    /// An unexpected token was encountered.
    UnexpectedToken,
    /// A character that cannot start any token.
    UnexpectedChar,
    UnexpectedEof,
    ExpectedExpression,
    ExpectedType,
    ExpectedStatement,
    ExpectedIdentifier,
    /// An expression that cannot be assigned or called.
    InvalidExpression,
    /// A function definition somewhere other than the top level.
    NestedFunction,
    UnterminatedString,
    UnterminatedComment,
    InvalidEscapeSequence,
    /// A numeric literal that does not fit its type.
    InvalidLiteral,
    /// Expressions or statements nested past the parser's limit.
    NestingTooDeep,
}

impl ParseErrorKind {
    /// Returns a human-readable name for this error kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseErrorKind::ExpectedToken => "expected token",
            ParseErrorKind::UnexpectedToken => "unexpected token",
            ParseErrorKind::UnexpectedChar => "unexpected character",
            ParseErrorKind::UnexpectedEof => "unexpected end of file",
            ParseErrorKind::ExpectedExpression => "expected expression",
            ParseErrorKind::ExpectedType => "expected type",
            ParseErrorKind::ExpectedStatement => "expected statement",
            ParseErrorKind::ExpectedIdentifier => "expected identifier",
            ParseErrorKind::InvalidExpression => "invalid expression",
            ParseErrorKind::NestedFunction => "nested function",
            ParseErrorKind::UnterminatedString => "unterminated string",
            ParseErrorKind::UnterminatedComment => "unterminated comment",
            ParseErrorKind::InvalidEscapeSequence => "invalid escape sequence",
            ParseErrorKind::InvalidLiteral => "invalid literal",
            ParseErrorKind::NestingTooDeep => "nesting too deep",
        }
    }
}

impl std::fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A parse error with location and context.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} at {span}: {message}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
    /// A detailed message, `expected X, found Y` for token mismatches.
    pub message: String,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
        }
    }

    /// Create an "expected token" error.
    pub fn expected_token(span: Span, expected: &str, found: &str) -> Self {
        Self::new(
            ParseErrorKind::ExpectedToken,
            span,
            format!("expected {expected}, found {found}"),
        )
    }

    pub fn expected_expression(span: Span, found: &str) -> Self {
        Self::new(
            ParseErrorKind::ExpectedExpression,
            span,
            format!("expected expression, found {found}"),
        )
    }

    pub fn line(&self) -> u32 {
        self.span.line
    }

    pub fn column(&self) -> u32 {
        self.span.col
    }

    /// Format the error with the offending source line and a caret.
    pub fn display_with_source(&self, source: &str) -> String {
        let mut output = String::new();
        let line = self.span.line;
        let column = self.span.col;

        output.push_str(&format!("Error at {}:{}: {}\n", line, column, self.kind));
        if !self.message.is_empty() {
            output.push_str(&format!("  {}\n", self.message));
        }

        if let Some(line_text) = Self::get_line(source, line) {
            output.push_str("  |\n");
            output.push_str(&format!("{:>3} | {}\n", line, line_text));
            let indent = " ".repeat(column.saturating_sub(1) as usize);
            let pointer = if self.span.len <= 1 {
                "^".to_string()
            } else {
                "^".to_string() + &"~".repeat((self.span.len - 1) as usize)
            };
            output.push_str(&format!("  | {}{}\n", indent, pointer));
        }

        output
    }

    fn get_line(source: &str, line_num: u32) -> Option<&str> {
        source.lines().nth((line_num as usize).checked_sub(1)?)
    }
}

/// All parse errors found in one script.
///
/// The parser recovers at statement boundaries, so a single pass can report
/// several independent mistakes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseErrors {
    /// Name of the script the errors belong to, if known.
    pub script_name: Option<String>,
    errors: Vec<ParseError>,
}

impl ParseErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: ParseError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParseError> {
        self.errors.iter()
    }

    /// The first error in source order.
    pub fn first(&self) -> Option<&ParseError> {
        self.errors.first()
    }

    pub fn into_vec(self) -> Vec<ParseError> {
        self.errors
    }

    /// Attach the name of the script these errors came from.
    pub fn with_script_name(mut self, name: impl Into<String>) -> Self {
        self.script_name = Some(name.into());
        self
    }
}

impl IntoIterator for ParseErrors {
    type Item = ParseError;
    type IntoIter = std::vec::IntoIter<ParseError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ParseErrors {
    type Item = &'a ParseError;
    type IntoIter = std::slice::Iter<'a, ParseError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl From<ParseError> for ParseErrors {
    fn from(error: ParseError) -> Self {
        Self {
            script_name: None,
            errors: vec![error],
        }
    }
}

impl FromIterator<ParseError> for ParseErrors {
    fn from_iter<T: IntoIterator<Item = ParseError>>(iter: T) -> Self {
        Self {
            script_name: None,
            errors: iter.into_iter().collect(),
        }
    }
}

impl std::fmt::Display for ParseErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(name) = &self.script_name {
            write!(f, "in {name}: ")?;
        }
        match self.errors.as_slice() {
            [] => write!(f, "no errors"),
            [single] => write!(f, "{single}"),
            errors => {
                writeln!(f, "{} errors:", errors.len())?;
                for (i, error) in errors.iter().enumerate() {
                    writeln!(f, "  {}: {}", i + 1, error)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ParseErrors {}

// ============================================================================
// Native Errors
// ============================================================================

/// Errors converting between script values and host values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("integer overflow: value {value} does not fit in {target_type}")]
    IntegerOverflow { value: i64, target_type: &'static str },
}

/// Errors raised by host callables and accessors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NativeError {
    #[error("conversion error: {0}")]
    Conversion(#[from] ConversionError),

    #[error("argument index {index} out of bounds (function has {count} arguments)")]
    ArgumentIndexOutOfBounds { index: usize, count: usize },

    /// The host object behind a binding has been dropped.
    #[error("host object behind '{name}' is no longer alive")]
    OwnerDropped { name: String },

    /// A host-side lock was poisoned by a panicking writer.
    #[error("host lock poisoned for '{name}'")]
    LockPoisoned { name: String },

    /// A failure reported by host code.
    #[error("{message}")]
    Host { message: String },
}

impl NativeError {
    /// Shorthand for a host-reported failure.
    pub fn host(message: impl Into<String>) -> Self {
        NativeError::Host {
            message: message.into(),
        }
    }
}

// ============================================================================
// Registration Errors
// ============================================================================

/// Errors raised while registering bindings or configuring the engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistrationError {
    /// A signature string such as `output(int)` could not be parsed.
    #[error("invalid signature '{signature}': {reason}")]
    InvalidSignature { signature: String, reason: String },

    /// The registration name's signature disagrees with the handle.
    #[error("signature '{signature}' does not match bound function '{name}({declared})'")]
    SignatureMismatch {
        name: String,
        declared: String,
        signature: String,
    },

    #[error("'{name}' is not a valid script name")]
    InvalidName { name: String },

    /// A variable and a function cannot share one qualified name.
    #[error("'{name}' is already bound as a {existing}")]
    KindConflict { name: String, existing: &'static str },

    #[error("invalid option '{key}': {reason}")]
    InvalidOption { key: String, reason: String },
}

// ============================================================================
// Resolve Errors
// ============================================================================

/// Errors found while resolving a parsed script against the bindings.
///
/// All of these are reported before any statement executes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    #[error("unresolved symbol '{name}' at {span}")]
    UnresolvedSymbol { name: String, span: Span },

    /// The name is bound, but no overload accepts the argument types.
    #[error("no overload of '{name}' accepts ({args}) at {span}")]
    NoMatchingOverload {
        name: String,
        args: String,
        span: Span,
    },

    #[error("ambiguous call to '{name}({args})' at {span}: candidates are {}", .candidates.join(", "))]
    AmbiguousOverload {
        name: String,
        args: String,
        candidates: Vec<String>,
        span: Span,
    },

    #[error("type mismatch at {span}: {message}")]
    TypeMismatch { message: String, span: Span },

    /// Assignment to a bound variable that has no host setter.
    #[error("bound variable '{name}' is read-only at {span}")]
    ReadOnlyBinding { name: String, span: Span },

    #[error("'{name}' is already declared in this scope at {span}")]
    Redeclaration { name: String, span: Span },

    #[error("expression is not assignable at {span}")]
    NotAnLvalue { span: Span },

    #[error("'break' outside of a loop at {span}")]
    BreakOutsideLoop { span: Span },

    #[error("'continue' outside of a loop at {span}")]
    ContinueOutsideLoop { span: Span },

    #[error("'return' outside of a function at {span}")]
    ReturnOutsideFunction { span: Span },

    #[error("function '{name}' does not return a value on every path at {span}")]
    MissingReturn { name: String, span: Span },

    /// Expression-only evaluation was requested but the script has statements.
    #[error("only a single expression is allowed at {span}")]
    ExpressionOnly { span: Span },

    #[error("nesting deeper than {limit} levels at {span}")]
    NestingTooDeep { limit: usize, span: Span },
}

impl ResolveError {
    pub fn span(&self) -> Span {
        match self {
            ResolveError::UnresolvedSymbol { span, .. }
            | ResolveError::NoMatchingOverload { span, .. }
            | ResolveError::AmbiguousOverload { span, .. }
            | ResolveError::TypeMismatch { span, .. }
            | ResolveError::ReadOnlyBinding { span, .. }
            | ResolveError::Redeclaration { span, .. }
            | ResolveError::NotAnLvalue { span }
            | ResolveError::BreakOutsideLoop { span }
            | ResolveError::ContinueOutsideLoop { span }
            | ResolveError::ReturnOutsideFunction { span }
            | ResolveError::MissingReturn { span, .. }
            | ResolveError::ExpressionOnly { span }
            | ResolveError::NestingTooDeep { span, .. } => *span,
        }
    }

    pub fn type_mismatch(span: Span, message: impl Into<String>) -> Self {
        ResolveError::TypeMismatch {
            message: message.into(),
            span,
        }
    }

    /// True for both an unbound name and a bound name with no viable overload.
    pub fn is_unresolved(&self) -> bool {
        matches!(
            self,
            ResolveError::UnresolvedSymbol { .. } | ResolveError::NoMatchingOverload { .. }
        )
    }
}

// ============================================================================
// Runtime Errors
// ============================================================================

/// Faults raised while a resolved program executes.
///
/// Side effects of statements that ran before the fault are not rolled back.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    /// A bound function or variable accessor failed on the host side.
    #[error("host invocation of '{name}' failed: {cause}")]
    HostInvocation {
        name: String,
        #[source]
        cause: NativeError,
    },

    #[error("stack overflow: call depth exceeded {depth}")]
    StackOverflow { depth: usize },

    #[error("integer division by zero at {span}")]
    DivisionByZero { span: Span },

    #[error("index {index} out of bounds for array of length {len} at {span}")]
    IndexOutOfBounds { index: i64, len: usize, span: Span },

    #[error("negative array size {size} at {span}")]
    NegativeArraySize { size: i64, span: Span },

    /// A sized array whose element count exceeds the allocation limit.
    #[error("array of {len} elements exceeds the limit of {limit} at {span}")]
    ArrayTooLarge { len: u128, limit: usize, span: Span },

    /// The host requested termination through the terminator.
    #[error("script terminated by host")]
    Terminated,

    /// A resolved-program invariant did not hold.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl RuntimeError {
    pub fn internal(message: impl Into<String>) -> Self {
        RuntimeError::Internal {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_display() {
        let error = ParseError::expected_token(Span::new(3, 14, 1), "';'", "'}'");
        assert_eq!(
            error.to_string(),
            "expected token at 3:14: expected ';', found '}'"
        );
        assert_eq!(error.line(), 3);
        assert_eq!(error.column(), 14);
    }

    #[test]
    fn parse_error_with_source() {
        let source = "int x = 1;\nint y = ;";
        let error = ParseError::expected_expression(Span::new(2, 9, 1), "';'");
        let rendered = error.display_with_source(source);
        assert!(rendered.contains("Error at 2:9: expected expression"));
        assert!(rendered.contains("  2 | int y = ;"));
        assert!(rendered.contains("  |         ^"));
    }

    #[test]
    fn parse_error_with_source_out_of_range_line() {
        let error = ParseError::new(ParseErrorKind::UnexpectedEof, Span::point(0, 0), "");
        let rendered = error.display_with_source("x");
        assert_eq!(rendered, "Error at 0:0: unexpected end of file\n");
    }

    #[test]
    fn parse_errors_display() {
        let mut errors = ParseErrors::new();
        assert_eq!(errors.to_string(), "no errors");
        errors.push(ParseError::expected_token(Span::new(1, 1, 1), "'('", "'{'"));
        errors.push(ParseError::expected_expression(Span::new(2, 5, 1), "')'"));
        let text = errors.clone().with_script_name("lib.hs").to_string();
        assert!(text.starts_with("in lib.hs: 2 errors:"));
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.first().map(|e| e.span.line), Some(1));
    }

    #[test]
    fn resolve_error_classification() {
        let unbound = ResolveError::UnresolvedSymbol {
            name: "foo".into(),
            span: Span::new(1, 1, 3),
        };
        let no_match = ResolveError::NoMatchingOverload {
            name: "output".into(),
            args: "bool".into(),
            span: Span::new(2, 1, 6),
        };
        assert!(unbound.is_unresolved());
        assert!(no_match.is_unresolved());
        assert_eq!(no_match.span(), Span::new(2, 1, 6));
        assert!(!ResolveError::NotAnLvalue { span: Span::default() }.is_unresolved());
    }

    #[test]
    fn ambiguous_lists_candidates() {
        let error = ResolveError::AmbiguousOverload {
            name: "f".into(),
            args: "int, int".into(),
            candidates: vec!["f(int, float)".into(), "f(float, int)".into()],
            span: Span::new(1, 1, 1),
        };
        assert_eq!(
            error.to_string(),
            "ambiguous call to 'f(int, int)' at 1:1: candidates are f(int, float), f(float, int)"
        );
    }

    #[test]
    fn host_invocation_keeps_cause() {
        use std::error::Error as _;
        let error = RuntimeError::HostInvocation {
            name: "output".into(),
            cause: NativeError::host("disk full"),
        };
        assert_eq!(error.to_string(), "host invocation of 'output' failed: disk full");
        assert_eq!(error.source().map(|s| s.to_string()), Some("disk full".into()));
    }
}
