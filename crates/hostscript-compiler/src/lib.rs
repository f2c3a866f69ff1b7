//! Hostscript symbol resolver.
//!
//! Turns parsed scripts into a [`ResolvedProgram`] in which every identifier
//! refers to exactly one script slot, host variable or call target.
//!
//! ## Modules
//!
//! - [`conversion`]: implicit promotion and explicit cast rules
//! - [`overload`]: cost-based overload selection
//! - [`program`]: the resolved program tree consumed by the interpreter
//! - [`resolver`]: the two-pass resolver (hoisting, then resolution)
//! - [`return_checker`]: all-paths-return analysis for non-void functions
//! - [`scope`]: lexical scopes and slot allocation

pub mod conversion;
pub mod overload;
pub mod program;
pub mod resolver;
pub mod return_checker;
pub mod scope;

pub use overload::{Candidate, OverloadMatch, resolve_overload};
pub use program::{
    CallTarget, Init, Place, RExpr, RExprKind, RStmt, ResolvedFunction, ResolvedProgram, VarRef,
};
pub use resolver::{CompileError, MAX_RESOLVE_DEPTH, ResolveOptions, Resolver, Unit};
pub use return_checker::ReturnChecker;
pub use scope::{LocalScope, LocalVar};

// Re-export ResolveError from core for convenience
pub use hostscript_core::ResolveError;
