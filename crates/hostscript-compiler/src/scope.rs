//! Local scope management for resolution.
//!
//! This module provides `LocalScope` for tracking variables declared by a
//! script. It handles:
//! - Variable declaration with slot allocation
//! - Nested block scopes (if/while/for bodies)
//! - Variable shadowing with restoration on scope exit
//!
//! One scope tracks the top-level (global) variables of a run, and a fresh
//! one is used for each function body.

use hostscript_core::{ResolveError, ScriptType, Span};
use rustc_hash::FxHashMap;

/// Information about a declared variable.
#[derive(Debug, Clone)]
pub struct LocalVar {
    pub name: String,
    pub ty: ScriptType,
    pub slot: usize,
    /// Scope depth where declared.
    pub depth: u32,
    pub span: Span,
}

#[derive(Debug, Default)]
pub struct LocalScope {
    /// Visible variables by name.
    variables: FxHashMap<String, LocalVar>,
    /// Current scope depth (0 = outermost).
    depth: u32,
    /// Variables hidden by a shadowing declaration: (shadowing depth, var).
    shadowed: Vec<(u32, LocalVar)>,
    /// Types of every slot ever allocated.
    slots: Vec<ScriptType>,
}

impl LocalScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a new scope (block, if body, loop body, etc.).
    pub fn push_scope(&mut self) {
        self.depth += 1;
    }

    /// Exit the current scope, removing variables declared in it.
    ///
    /// Slots are not reused, so values of a finished block never leak into
    /// a later declaration.
    pub fn pop_scope(&mut self) {
        let depth = self.depth;
        self.variables.retain(|_, var| var.depth < depth);

        while let Some((shadowing_depth, _)) = self.shadowed.last() {
            if *shadowing_depth != depth {
                break;
            }
            if let Some((_, var)) = self.shadowed.pop() {
                self.variables.insert(var.name.clone(), var);
            }
        }

        self.depth = depth.saturating_sub(1);
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Declare a variable in the current scope, returning its slot.
    ///
    /// Shadowing a variable of an outer scope is allowed; a second
    /// declaration in the same scope is not.
    pub fn declare(&mut self, name: &str, ty: ScriptType, span: Span) -> Result<usize, ResolveError> {
        if let Some(existing) = self.variables.get(name) {
            if existing.depth == self.depth {
                return Err(ResolveError::Redeclaration {
                    name: name.to_string(),
                    span,
                });
            }
            self.shadowed.push((self.depth, existing.clone()));
        }

        let slot = self.slots.len();
        self.slots.push(ty.clone());
        self.variables.insert(
            name.to_string(),
            LocalVar {
                name: name.to_string(),
                ty,
                slot,
                depth: self.depth,
                span,
            },
        );
        Ok(slot)
    }

    pub fn get(&self, name: &str) -> Option<&LocalVar> {
        self.variables.get(name)
    }

    /// Total number of slots allocated so far.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Slot types in slot order.
    pub fn slot_types(&self) -> &[ScriptType] {
        &self.slots
    }
}
