//! Core types shared by every hostscript crate.
//!
//! This crate contains:
//! - [`Span`] source locations
//! - the error taxonomy for parsing, registration, resolution and execution
//! - the script type system ([`ScriptType`]) and runtime [`Value`]s
//! - [`QualifiedName`] and registration [`Signature`] parsing
//! - [`stack::ensure_sufficient_stack`] for the recursive passes
//! - host binding descriptors ([`BoundVariable`], [`BoundFunction`],
//!   [`HostObject`]) and the native call plumbing behind them

pub mod bound;
pub mod convert;
pub mod error;
pub mod native_fn;
pub mod qualified_name;
pub mod signature;
pub mod span;
pub mod stack;
pub mod types;
pub mod value;

pub use bound::{
    BoundFunction, BoundHandle, BoundVariable, FunctionBuilder, HostObject, MemberBinder,
    param_hash,
};
pub use convert::{FromValue, IntoValue, ScriptTyped};
pub use error::{
    ConversionError, NativeError, ParseError, ParseErrorKind, ParseErrors, RegistrationError,
    ResolveError, RuntimeError,
};
pub use native_fn::{CallContext, NativeCallable, NativeFn};
pub use qualified_name::{NAMESPACE_SEPARATOR, QualifiedName};
pub use signature::{Signature, format_params};
pub use span::Span;
pub use types::ScriptType;
pub use value::{ArrayValue, Value};
