//! Engine-level error type.

use hostscript_compiler::CompileError;
use hostscript_core::{ParseErrors, RegistrationError, ResolveError, RuntimeError};
use thiserror::Error;

pub type ScriptResult<T> = Result<T, ScriptError>;

/// Every error the engine facade can report.
///
/// Parse and resolve errors are reported before any statement executes.
/// Runtime errors may follow host side effects of earlier statements.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScriptError {
    #[error(transparent)]
    Syntax(#[from] ParseErrors),

    #[error(transparent)]
    Resolve(#[from] CompileError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error(transparent)]
    Registration(#[from] RegistrationError),

    /// Registration was attempted while a script is running.
    #[error("engine is busy: bindings cannot change while a script is running")]
    EngineBusy,
}

/// Coarse classification of a [`ScriptError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Syntax,
    UnresolvedSymbol,
    AmbiguousOverload,
    TypeMismatch,
    HostInvocation,
    StackOverflow,
    EngineBusy,
    Registration,
    /// Any other runtime fault.
    Runtime,
    /// Any other resolve-time error.
    Semantic,
}

impl ScriptError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScriptError::Syntax(_) => ErrorKind::Syntax,
            ScriptError::Resolve(e) => match &e.error {
                err if err.is_unresolved() => ErrorKind::UnresolvedSymbol,
                ResolveError::AmbiguousOverload { .. } => ErrorKind::AmbiguousOverload,
                ResolveError::TypeMismatch { .. } | ResolveError::ReadOnlyBinding { .. } => {
                    ErrorKind::TypeMismatch
                }
                _ => ErrorKind::Semantic,
            },
            ScriptError::Runtime(e) => match e {
                RuntimeError::HostInvocation { .. } => ErrorKind::HostInvocation,
                RuntimeError::StackOverflow { .. } => ErrorKind::StackOverflow,
                _ => ErrorKind::Runtime,
            },
            ScriptError::Registration(_) => ErrorKind::Registration,
            ScriptError::EngineBusy => ErrorKind::EngineBusy,
        }
    }

    pub fn parse_errors(&self) -> Option<&ParseErrors> {
        match self {
            ScriptError::Syntax(errors) => Some(errors),
            _ => None,
        }
    }

    pub fn resolve_error(&self) -> Option<&ResolveError> {
        match self {
            ScriptError::Resolve(e) => Some(&e.error),
            _ => None,
        }
    }

    pub fn runtime_error(&self) -> Option<&RuntimeError> {
        match self {
            ScriptError::Runtime(e) => Some(e),
            _ => None,
        }
    }

    /// Name of the script a syntax or resolve error came from.
    pub fn script_name(&self) -> Option<&str> {
        match self {
            ScriptError::Syntax(errors) => errors.script_name.as_deref(),
            ScriptError::Resolve(e) => Some(&e.script),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostscript_core::{NativeError, ParseError, ParseErrorKind, Span};

    fn resolve(error: ResolveError) -> ScriptError {
        ScriptError::Resolve(CompileError {
            script: "main script".to_string(),
            error,
        })
    }

    #[test]
    fn classification() {
        let span = Span::new(1, 1, 1);
        let syntax: ScriptError =
            ParseErrors::from(ParseError::new(ParseErrorKind::ExpectedToken, span, "expected ';', found '}'"))
                .into();
        assert_eq!(syntax.kind(), ErrorKind::Syntax);

        let unresolved = resolve(ResolveError::UnresolvedSymbol {
            name: "x".into(),
            span,
        });
        assert_eq!(unresolved.kind(), ErrorKind::UnresolvedSymbol);
        assert_eq!(unresolved.script_name(), Some("main script"));

        let no_match = resolve(ResolveError::NoMatchingOverload {
            name: "f".into(),
            args: "bool".into(),
            span,
        });
        assert_eq!(no_match.kind(), ErrorKind::UnresolvedSymbol);

        assert_eq!(
            resolve(ResolveError::ReadOnlyBinding { name: "x".into(), span }).kind(),
            ErrorKind::TypeMismatch
        );
        assert_eq!(
            resolve(ResolveError::BreakOutsideLoop { span }).kind(),
            ErrorKind::Semantic
        );

        let host: ScriptError = RuntimeError::HostInvocation {
            name: "output".into(),
            cause: NativeError::host("disk full"),
        }
        .into();
        assert_eq!(host.kind(), ErrorKind::HostInvocation);
        assert_eq!(ScriptError::from(RuntimeError::StackOverflow { depth: 4 }).kind(), ErrorKind::StackOverflow);
        assert_eq!(ScriptError::from(RuntimeError::Terminated).kind(), ErrorKind::Runtime);
        assert_eq!(ScriptError::EngineBusy.kind(), ErrorKind::EngineBusy);
    }

    #[test]
    fn host_cause_is_preserved() {
        use std::error::Error;
        let err: ScriptError = RuntimeError::HostInvocation {
            name: "output".into(),
            cause: NativeError::host("disk full"),
        }
        .into();
        let source = err.source().map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("disk full"));
    }
}
