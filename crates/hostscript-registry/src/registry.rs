//! BindingRegistry - storage for host-supplied bindings.
//!
//! This module provides [`BindingRegistry`], the table the resolver consults
//! to turn script names into host capabilities.
//!
//! # Storage Model
//!
//! - **Variables**: one [`BoundVariable`] per qualified name. Registering the
//!   same name again replaces the previous binding.
//! - **Functions**: an overload set per qualified name. A registration whose
//!   parameter list matches an existing overload replaces it; any other
//!   parameter list is added to the set.
//! - **Namespaces**: every member of a namespace is stored under
//!   `Alias.member`, and under the bare `member` when that bare name is not
//!   already taken. The first namespace to claim a bare name keeps it.
//!
//! A variable and a function may never share a qualified name.
//!
//! # Thread Safety
//!
//! `BindingRegistry` is not synchronized. The engine wraps it in an
//! `RwLock` so that runs share it read-only and registration needs exclusive
//! access.
//!
//! # Example
//!
//! ```
//! use hostscript_core::{BoundFunction, BoundVariable, QualifiedName, ScriptType};
//! use hostscript_registry::BindingRegistry;
//!
//! let mut registry = BindingRegistry::new();
//! registry.register("LOOP_MAX", BoundVariable::constant("LOOP_MAX", 100i64)).unwrap();
//!
//! let output = BoundFunction::builder("output")
//!     .param(ScriptType::Int)
//!     .native(|_ctx| Ok(()))
//!     .build()
//!     .unwrap();
//! registry.register("output(int)", output).unwrap();
//!
//! assert!(registry.lookup_variable(&QualifiedName::global("LOOP_MAX")).is_some());
//! assert_eq!(registry.lookup_functions(&QualifiedName::global("output")).len(), 1);
//! ```

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::debug;

use hostscript_core::{
    BoundFunction, BoundHandle, BoundVariable, QualifiedName, RegistrationError, Signature,
    format_params,
};

/// What a qualified name is bound to.
#[derive(Debug, Clone, Copy)]
pub enum Binding<'a> {
    Variable(&'a Arc<BoundVariable>),
    /// A non-empty overload set.
    Functions(&'a [Arc<BoundFunction>]),
}

/// Host bindings keyed by qualified name.
#[derive(Debug, Default, Clone)]
pub struct BindingRegistry {
    variables: FxHashMap<QualifiedName, Arc<BoundVariable>>,
    functions: FxHashMap<QualifiedName, Vec<Arc<BoundFunction>>>,
    /// Bare names created by namespace registration, mapped to the alias
    /// that claimed them.
    bare_owners: FxHashMap<QualifiedName, QualifiedName>,
    /// Namespace aliases and the names registered through them.
    namespaces: FxHashMap<QualifiedName, Vec<QualifiedName>>,
}

impl BindingRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    // ==========================================================================
    // Registration
    // ==========================================================================

    /// Register a handle under a name such as `"LOOP_MAX"`, `"output(int)"`
    /// or `"Math.scale(float)"`.
    ///
    /// A parameter list in the name must agree with the function handle; it
    /// is rejected for variables. The handle is exposed under the simple name
    /// of `name`, whatever name it was built with.
    pub fn register(
        &mut self,
        name: &str,
        handle: impl Into<BoundHandle>,
    ) -> Result<(), RegistrationError> {
        let handle = handle.into();
        let signature = Signature::parse(name)?;
        check_signature(name, &signature, &handle)?;

        let qname = signature.name;
        self.insert(&qname, handle)?;
        // A direct registration owns the name from now on.
        self.bare_owners.remove(&qname);
        Ok(())
    }

    /// Register every handle under `alias.member`, and under the bare
    /// `member` where no other binding already holds that bare name.
    ///
    /// Re-registering the same alias refreshes the bare names it claimed
    /// earlier. Returns the bare names that were skipped because of a
    /// collision.
    ///
    /// Registration is all or nothing: if any member is rejected, the
    /// registry is left as it was.
    pub fn register_namespace(
        &mut self,
        alias: &str,
        handles: impl IntoIterator<Item = BoundHandle>,
    ) -> Result<Vec<String>, RegistrationError> {
        let alias_name = QualifiedName::from_qualified_string(alias);
        if alias_name.name.is_empty() || !alias_name.is_valid_identifier() {
            return Err(RegistrationError::InvalidName {
                name: alias.to_string(),
            });
        }

        let mut staged = self.clone();
        let skipped = staged.insert_namespace(&alias_name, handles)?;
        *self = staged;

        debug!(alias = %alias_name, "registered namespace");
        Ok(skipped)
    }

    fn insert_namespace(
        &mut self,
        alias_name: &QualifiedName,
        handles: impl IntoIterator<Item = BoundHandle>,
    ) -> Result<Vec<String>, RegistrationError> {
        let mut skipped = Vec::new();
        for handle in handles {
            let member = QualifiedName::from_qualified_string(handle.name());
            if !member.is_valid_identifier() {
                return Err(RegistrationError::InvalidName {
                    name: handle.name().to_string(),
                });
            }

            let qualified = member.within(alias_name);
            self.insert(&qualified, handle.clone())?;
            self.record_member(alias_name, qualified);

            let bare = member.to_bare();
            let claimable = match self.bare_owners.get(&bare) {
                Some(owner) => owner == alias_name,
                None => !self.contains(&bare),
            };
            if claimable {
                self.insert(&bare, handle)?;
                self.bare_owners.insert(bare.clone(), alias_name.clone());
                self.record_member(alias_name, bare);
            } else {
                debug!(alias = %alias_name, member = %bare, "bare name already bound, only the qualified form is available");
                skipped.push(bare.name);
            }
        }
        Ok(skipped)
    }

    fn record_member(&mut self, alias: &QualifiedName, name: QualifiedName) {
        let members = self.namespaces.entry(alias.clone()).or_default();
        if !members.contains(&name) {
            members.push(name);
        }
    }

    fn insert(&mut self, qname: &QualifiedName, handle: BoundHandle) -> Result<(), RegistrationError> {
        let handle = handle.renamed(qname.simple_name());
        match handle {
            BoundHandle::Variable(variable) => {
                if self.functions.contains_key(qname) {
                    return Err(RegistrationError::KindConflict {
                        name: qname.to_string(),
                        existing: "function",
                    });
                }
                debug!(name = %qname, ty = %variable.script_type(), "registered variable");
                self.variables.insert(qname.clone(), variable);
            }
            BoundHandle::Function(function) => {
                if self.variables.contains_key(qname) {
                    return Err(RegistrationError::KindConflict {
                        name: qname.to_string(),
                        existing: "variable",
                    });
                }
                let overloads = self.functions.entry(qname.clone()).or_default();
                let hash = function.param_hash();
                match overloads.iter_mut().find(|f| f.param_hash() == hash && f.params() == function.params()) {
                    Some(existing) => {
                        debug!(name = %qname, signature = %function.signature(), "replaced function overload");
                        *existing = function;
                    }
                    None => {
                        debug!(name = %qname, signature = %function.signature(), "registered function overload");
                        overloads.push(function);
                    }
                }
            }
        }
        Ok(())
    }

    /// Remove a binding. Removing a namespace alias removes every name
    /// registered through it. Returns whether anything was removed.
    pub fn unregister(&mut self, name: &str) -> bool {
        let qname = QualifiedName::from_qualified_string(name);

        if let Some(members) = self.namespaces.remove(&qname) {
            for member in members {
                // Bare names are only removed while this alias still owns them.
                if member.is_global() && self.bare_owners.get(&member) != Some(&qname) {
                    continue;
                }
                self.bare_owners.remove(&member);
                self.variables.remove(&member);
                self.functions.remove(&member);
            }
            debug!(alias = %qname, "unregistered namespace");
            return true;
        }

        let removed = self.variables.remove(&qname).is_some() | self.functions.remove(&qname).is_some();
        if removed {
            self.bare_owners.remove(&qname);
            debug!(name = %qname, "unregistered binding");
        }
        removed
    }

    /// Remove every binding.
    pub fn clear(&mut self) {
        self.variables.clear();
        self.functions.clear();
        self.bare_owners.clear();
        self.namespaces.clear();
        debug!("cleared all bindings");
    }

    // ==========================================================================
    // Lookup
    // ==========================================================================

    pub fn lookup(&self, name: &QualifiedName) -> Option<Binding<'_>> {
        if let Some(variable) = self.variables.get(name) {
            return Some(Binding::Variable(variable));
        }
        self.functions
            .get(name)
            .filter(|overloads| !overloads.is_empty())
            .map(|overloads| Binding::Functions(overloads.as_slice()))
    }

    pub fn lookup_variable(&self, name: &QualifiedName) -> Option<&Arc<BoundVariable>> {
        self.variables.get(name)
    }

    /// The overload set of `name`, empty when no function has that name.
    pub fn lookup_functions(&self, name: &QualifiedName) -> &[Arc<BoundFunction>] {
        self.functions.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, name: &QualifiedName) -> bool {
        self.lookup(name).is_some()
    }

    pub fn has_namespace(&self, alias: &QualifiedName) -> bool {
        self.namespaces.contains_key(alias)
    }

    /// Number of bound names (an overload set counts once).
    pub fn len(&self) -> usize {
        self.variables.len() + self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn variables(&self) -> impl Iterator<Item = (&QualifiedName, &Arc<BoundVariable>)> {
        self.variables.iter()
    }

    pub fn functions(&self) -> impl Iterator<Item = (&QualifiedName, &[Arc<BoundFunction>])> {
        self.functions.iter().map(|(name, set)| (name, set.as_slice()))
    }
}

/// Check a parsed registration name against the handle it names.
fn check_signature(
    text: &str,
    signature: &Signature,
    handle: &BoundHandle,
) -> Result<(), RegistrationError> {
    match handle {
        BoundHandle::Function(function) => {
            let params_match = signature
                .params
                .as_ref()
                .is_none_or(|params| params.as_slice() == function.params());
            let return_matches = signature
                .return_type
                .as_ref()
                .is_none_or(|ret| ret == function.return_type());
            if params_match && return_matches {
                Ok(())
            } else {
                Err(RegistrationError::SignatureMismatch {
                    name: function.name().to_string(),
                    declared: format_params(function.params()),
                    signature: text.to_string(),
                })
            }
        }
        BoundHandle::Variable(variable) => {
            if signature.params.is_some() {
                return Err(RegistrationError::InvalidSignature {
                    signature: text.to_string(),
                    reason: "a variable binding cannot take a parameter list".to_string(),
                });
            }
            match &signature.return_type {
                Some(ty) if ty != variable.script_type() => Err(RegistrationError::InvalidSignature {
                    signature: text.to_string(),
                    reason: format!("declared type {ty} does not match variable type {}", variable.script_type()),
                }),
                _ => Ok(()),
            }
        }
    }
}
