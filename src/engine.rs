//! The engine facade.
//!
//! An [`Engine`] owns the binding registry, the engine options and the
//! library scripts. `run` parses the libraries and the main script, resolves
//! them against the registry and executes the result. Registration and runs
//! share the registry through a reader-writer lock: runs hold a read guard
//! from parse to the end of execution, and registrations fail with
//! [`ScriptError::EngineBusy`] instead of waiting for them.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, TryLockError};

use bumpalo::Bump;
use hostscript_compiler::{Resolver, Unit};
use hostscript_core::{BoundHandle, HostObject, MemberBinder, RuntimeError, Value};
use hostscript_parser::{Parser, Script};
use hostscript_registry::BindingRegistry;
use tracing::debug;

use crate::error::{ScriptError, ScriptResult};
use crate::interpreter::Interpreter;
use crate::options::{EngineOption, EngineOptions};

/// An embeddable script engine.
///
/// `Engine` is `Send + Sync`; several threads may run scripts on one engine
/// at the same time, each with its own variables.
#[derive(Debug, Default)]
pub struct Engine {
    registry: RwLock<BindingRegistry>,
    options: RwLock<EngineOptions>,
    libraries: RwLock<Vec<LibraryScript>>,
    terminator: Arc<AtomicBool>,
}

#[derive(Debug, Clone)]
struct LibraryScript {
    name: String,
    source: String,
}

/// Requests termination of the scripts running on an engine, from any
/// thread.
#[derive(Debug, Clone)]
pub struct TerminationHandle {
    flag: Arc<AtomicBool>,
}

impl TerminationHandle {
    pub fn terminate(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_terminated(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: EngineOptions) -> Self {
        Self {
            options: RwLock::new(options),
            ..Self::default()
        }
    }

    // ========== BINDINGS ==========

    /// Bind a host variable or function under `name`.
    ///
    /// `name` may be qualified (`"Math.PI"`) and, for functions, carry a
    /// parameter list that must match the handle (`"output(int)"`).
    pub fn register(&self, name: &str, handle: impl Into<BoundHandle>) -> ScriptResult<()> {
        self.write_registry()?.register(name, handle)?;
        Ok(())
    }

    /// Bind every member `T` describes as `alias.member`, and as bare
    /// `member` where that name is still free.
    ///
    /// Only a weak reference to `owner` is kept. Returns the bare names that
    /// were not claimed because another binding already holds them.
    pub fn register_namespace<T: HostObject>(&self, alias: &str, owner: &Arc<T>) -> ScriptResult<Vec<String>> {
        let handles = MemberBinder::bind(owner)?;
        self.register_namespace_handles(alias, handles)
    }

    /// [`register_namespace`](Self::register_namespace) for an explicit set
    /// of handles.
    pub fn register_namespace_handles(
        &self,
        alias: &str,
        handles: impl IntoIterator<Item = BoundHandle>,
    ) -> ScriptResult<Vec<String>> {
        Ok(self.write_registry()?.register_namespace(alias, handles)?)
    }

    /// Remove the binding with this qualified name. Returns whether one
    /// existed.
    pub fn unregister(&self, name: &str) -> ScriptResult<bool> {
        Ok(self.write_registry()?.unregister(name))
    }

    /// Remove every binding.
    pub fn disconnect_all(&self) -> ScriptResult<()> {
        self.write_registry()?.clear();
        debug!("disconnected all bindings");
        Ok(())
    }

    /// Run `f` with shared access to the registry.
    pub fn with_registry<R>(&self, f: impl FnOnce(&BindingRegistry) -> R) -> R {
        f(&self.read_registry())
    }

    fn read_registry(&self) -> RwLockReadGuard<'_, BindingRegistry> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_registry(&self) -> ScriptResult<RwLockWriteGuard<'_, BindingRegistry>> {
        match self.registry.try_write() {
            Ok(guard) => Ok(guard),
            Err(TryLockError::WouldBlock) => Err(ScriptError::EngineBusy),
            Err(TryLockError::Poisoned(poisoned)) => Ok(poisoned.into_inner()),
        }
    }

    // ========== OPTIONS ==========

    pub fn set_option(&self, option: EngineOption) {
        debug!(key = option.key(), "setting engine option");
        self.options.write().unwrap_or_else(PoisonError::into_inner).apply(option);
    }

    pub fn set_options(&self, options: impl IntoIterator<Item = EngineOption>) {
        let mut current = self.options.write().unwrap_or_else(PoisonError::into_inner);
        for option in options {
            current.apply(option);
        }
    }

    /// Apply options given as a string-keyed map such as
    /// `{"MAX_CALL_DEPTH": 64}`. Nothing changes unless every entry is valid.
    pub fn set_option_map(&self, map: &HashMap<String, Value>) -> ScriptResult<()> {
        let parsed = EngineOptions::parse_map(map)?;
        self.set_options(parsed);
        Ok(())
    }

    /// A snapshot of the current options.
    pub fn options(&self) -> EngineOptions {
        self.options.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    // ========== LIBRARY SCRIPTS ==========

    /// Add a script whose functions and globals are visible to every main
    /// script. A library with the same name is replaced in place.
    ///
    /// The source is parsed now so syntax errors surface at registration.
    pub fn register_library_script(&self, name: &str, source: &str) -> ScriptResult<()> {
        let arena = Bump::new();
        Parser::parse(source, &arena).map_err(|errors| errors.with_script_name(name))?;

        let mut libraries = self.libraries.write().unwrap_or_else(PoisonError::into_inner);
        let library = LibraryScript {
            name: name.to_string(),
            source: source.to_string(),
        };
        match libraries.iter_mut().find(|l| l.name == name) {
            Some(existing) => *existing = library,
            None => libraries.push(library),
        }
        debug!(name, "registered library script");
        Ok(())
    }

    /// Returns whether a library of that name existed.
    pub fn unregister_library_script(&self, name: &str) -> bool {
        let mut libraries = self.libraries.write().unwrap_or_else(PoisonError::into_inner);
        let before = libraries.len();
        libraries.retain(|l| l.name != name);
        libraries.len() != before
    }

    // ========== TERMINATION ==========

    /// Ask running scripts to stop. Has no effect, and returns `false`,
    /// unless the terminator is enabled.
    pub fn terminate_script(&self) -> bool {
        if !self.options().terminator_enabled {
            return false;
        }
        self.terminator.store(true, Ordering::Relaxed);
        true
    }

    /// Clear a termination request so scripts can run again.
    pub fn reset_terminator(&self) {
        self.terminator.store(false, Ordering::Relaxed);
    }

    pub fn termination_handle(&self) -> TerminationHandle {
        TerminationHandle {
            flag: Arc::clone(&self.terminator),
        }
    }

    // ========== EXECUTION ==========

    /// Parse, resolve and execute `script` after the library scripts.
    ///
    /// Returns the value of the last top-level expression statement of
    /// `script`, or `Value::Void`. Syntax and resolve errors are reported
    /// before anything executes.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(&self, script: &str) -> ScriptResult<Value> {
        let options = self.options();
        if options.terminator_enabled && self.terminator.load(Ordering::Relaxed) {
            return Err(RuntimeError::Terminated.into());
        }

        let registry = self.read_registry();
        let libraries = self.libraries.read().unwrap_or_else(PoisonError::into_inner).clone();
        let arena = Bump::new();
        let program = compile(&registry, &options, &libraries, script, &arena)?;

        if !options.running_enabled {
            debug!("running disabled; skipping execution");
            return Ok(Value::Void);
        }

        debug!(
            functions = program.functions.len(),
            globals = program.globals.len(),
            "executing script"
        );
        let interpreter = Interpreter::new(&program, options.max_call_depth);
        let mut interpreter = if options.terminator_enabled {
            interpreter.with_terminator(&self.terminator)
        } else {
            interpreter
        };
        let value = interpreter.run()?;
        debug!("script finished");
        Ok(value)
    }

    /// Parse and resolve `script` against the current bindings and library
    /// scripts without executing it.
    pub fn check(&self, script: &str) -> ScriptResult<()> {
        let options = self.options();
        let registry = self.read_registry();
        let libraries = self.libraries.read().unwrap_or_else(PoisonError::into_inner).clone();
        let arena = Bump::new();
        compile(&registry, &options, &libraries, script, &arena)?;
        Ok(())
    }
}

fn compile(
    registry: &BindingRegistry,
    options: &EngineOptions,
    libraries: &[LibraryScript],
    source: &str,
    arena: &Bump,
) -> ScriptResult<hostscript_compiler::ResolvedProgram> {
    let mut units = Vec::with_capacity(libraries.len());
    for library in libraries {
        let script = parse(&library.name, &library.source, arena)?;
        units.push(Unit::new(&library.name, script));
    }
    let main = parse(&options.main_script_name, source, arena)?;

    let program = Resolver::new(registry, options.resolve_options())
        .resolve(&units, Unit::new(&options.main_script_name, main))?;
    Ok(program)
}

fn parse<'ast>(name: &str, source: &str, arena: &'ast Bump) -> ScriptResult<Script<'ast>> {
    debug!(script = name, bytes = source.len(), "parsing");
    Parser::parse(source, arena).map_err(|errors| errors.with_script_name(name).into())
}
