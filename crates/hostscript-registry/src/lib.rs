//! Binding registry crate.
//!
//! Holds the host-supplied [`BoundVariable`](hostscript_core::BoundVariable)
//! and [`BoundFunction`](hostscript_core::BoundFunction) handles under their
//! script-visible names, including namespace aliases and overload sets.

mod registry;

pub use registry::{Binding, BindingRegistry};
