//! Hostscript: an embeddable, statically resolved script engine.
//!
//! A host registers variables and functions with an [`Engine`], then runs
//! scripts that read, write and call them.
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use hostscript::prelude::*;
//!
//! let engine = Engine::new();
//! engine.register("LOOP_MAX", BoundVariable::constant("LOOP_MAX", 100i64)).unwrap();
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&seen);
//! let output = BoundFunction::builder("output")
//!     .param(ScriptType::Int)
//!     .native(move |ctx| {
//!         sink.lock().unwrap().push(ctx.arg::<i64>(0)?);
//!         Ok(())
//!     })
//!     .build()
//!     .unwrap();
//! engine.register("output(int)", output).unwrap();
//!
//! engine
//!     .run("int sum = 0; for (int i = 1; i <= LOOP_MAX; i++) { sum += i; } output(sum);")
//!     .unwrap();
//! assert_eq!(*seen.lock().unwrap(), vec![5050]);
//! ```
//!
//! ## Pipeline
//!
//! Every [`Engine::run`] goes through the same phases:
//!
//! 1. the lexer and parser build an arena-allocated AST (`hostscript-parser`)
//! 2. the resolver binds every name against script declarations and the
//!    [`BindingRegistry`], selects overloads and checks types
//!    (`hostscript-compiler`)
//! 3. the interpreter executes the resolved program
//!
//! Errors from the first two phases are reported before any statement runs.

pub mod engine;
pub mod error;
pub mod interpreter;
pub mod options;

pub use engine::{Engine, TerminationHandle};
pub use error::{ErrorKind, ScriptError, ScriptResult};
pub use options::{EngineOption, EngineOptions};

pub use hostscript_core::{
    ArrayValue, BoundFunction, BoundHandle, BoundVariable, CallContext, FromValue, HostObject,
    IntoValue, MemberBinder, NativeError, ParseError, ParseErrorKind, ParseErrors, QualifiedName,
    RegistrationError, ResolveError, RuntimeError, ScriptType, ScriptTyped, Span, Value,
};
pub use hostscript_registry::BindingRegistry;

pub mod prelude {
    pub use crate::engine::{Engine, TerminationHandle};
    pub use crate::error::{ErrorKind, ScriptError, ScriptResult};
    pub use crate::options::{EngineOption, EngineOptions};
    pub use hostscript_core::{
        ArrayValue, BoundFunction, BoundVariable, CallContext, HostObject, MemberBinder,
        NativeError, ScriptType, Value,
    };
}
