//! Symbol resolution.
//!
//! The [`Resolver`] walks the parsed scripts of one run (library scripts
//! first, then the main script) and produces a [`ResolvedProgram`]. It works
//! in two passes:
//!
//! 1. **Hoisting**: every top-level function of every script is registered
//!    with its signature, so calls may precede definitions.
//! 2. **Resolution**: statements are resolved in order. Unqualified names
//!    look in the local scope chain first, then in the script globals, then
//!    in the [`BindingRegistry`]. Qualified names go to the registry.
//!
//! The registry is only read. Resolution stops at the first error.
//!
//! # Example
//!
//! ```
//! use bumpalo::Bump;
//! use hostscript_compiler::{ResolveOptions, Resolver, Unit};
//! use hostscript_parser::Parser;
//! use hostscript_registry::BindingRegistry;
//!
//! let arena = Bump::new();
//! let script = Parser::parse("int x = 1 + 2;", &arena).unwrap();
//! let registry = BindingRegistry::new();
//!
//! let program = Resolver::new(&registry, ResolveOptions::default())
//!     .resolve(&[], Unit::new("main script", script))
//!     .unwrap();
//! assert_eq!(program.globals.len(), 1);
//! ```

mod assignment;
mod calls;
mod expr;
mod stmt;

use bitflags::bitflags;
use hostscript_core::stack::ensure_sufficient_stack;
use hostscript_core::{ResolveError, ScriptType, Span};
use hostscript_parser::ast::{FunctionDecl, Stmt};
use hostscript_parser::Script;
use hostscript_registry::BindingRegistry;
use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::debug;

use crate::program::{ResolvedFunction, ResolvedProgram, VarRef};
use crate::scope::LocalScope;

type Result<T> = std::result::Result<T, ResolveError>;

/// Deepest expression and statement nesting the resolver accepts. Long
/// operator chains nest without parentheses, so this is looser than the
/// parser's limit.
pub const MAX_RESOLVE_DEPTH: usize = 1024;

/// Language restrictions applied during resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Type integer literals as `float`.
    pub int_literal_as_float: bool,
    /// Reject every non-`float` declaration, literal and binding.
    pub only_float: bool,
    /// The main script must be a single expression statement.
    pub only_expression: bool,
}

bitflags! {
    /// Statement context.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub(crate) struct ResolveFlags: u8 {
        const IN_LOOP = 1 << 0;
        const IN_FUNCTION = 1 << 1;
    }
}

/// One named script taking part in a run.
#[derive(Debug, Clone, Copy)]
pub struct Unit<'s, 'ast> {
    pub name: &'s str,
    pub script: Script<'ast>,
}

impl<'s, 'ast> Unit<'s, 'ast> {
    pub fn new(name: &'s str, script: Script<'ast>) -> Self {
        Self { name, script }
    }
}

/// A resolution error together with the script it occurred in.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("in {script}: {error}")]
pub struct CompileError {
    pub script: String,
    #[source]
    pub error: ResolveError,
}

impl CompileError {
    fn new(script: &str, error: ResolveError) -> Self {
        Self {
            script: script.to_string(),
            error,
        }
    }
}

/// State of the function body being resolved.
struct FunctionFrame {
    locals: LocalScope,
    return_type: ScriptType,
}

/// Resolves parsed scripts against a binding registry.
pub struct Resolver<'r> {
    registry: &'r BindingRegistry,
    options: ResolveOptions,
    /// Top-level variables of all scripts in the run.
    globals: LocalScope,
    /// Hoisted script functions, bodies filled in during resolution.
    functions: Vec<ResolvedFunction>,
    /// Script function overloads by name.
    function_names: FxHashMap<String, Vec<usize>>,
    /// Index of the next function definition reached during resolution.
    next_function: usize,
    frame: Option<FunctionFrame>,
    flags: ResolveFlags,
    depth: usize,
}

impl<'r> Resolver<'r> {
    pub fn new(registry: &'r BindingRegistry, options: ResolveOptions) -> Self {
        Self {
            registry,
            options,
            globals: LocalScope::new(),
            functions: Vec::new(),
            function_names: FxHashMap::default(),
            next_function: 0,
            frame: None,
            flags: ResolveFlags::empty(),
            depth: 0,
        }
    }

    /// Run `resolve` one nesting level deeper.
    fn nested<T>(&mut self, span: Span, resolve: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= MAX_RESOLVE_DEPTH {
            return Err(ResolveError::NestingTooDeep {
                limit: MAX_RESOLVE_DEPTH,
                span,
            });
        }
        self.depth += 1;
        let result = ensure_sufficient_stack(|| resolve(self));
        self.depth -= 1;
        result
    }

    /// Resolve the library scripts and the main script of one run.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn resolve<'s, 'ast>(
        mut self,
        libraries: &[Unit<'s, 'ast>],
        main: Unit<'s, 'ast>,
    ) -> std::result::Result<ResolvedProgram, CompileError> {
        for unit in libraries.iter().chain(std::iter::once(&main)) {
            self.hoist_functions(unit.script)
                .map_err(|e| CompileError::new(unit.name, e))?;
        }

        if self.options.only_expression {
            check_single_expression(main.script).map_err(|e| CompileError::new(main.name, e))?;
        }

        let mut library_stmts = Vec::new();
        for unit in libraries {
            let stmts = self
                .resolve_top_level(unit.script)
                .map_err(|e| CompileError::new(unit.name, e))?;
            library_stmts.extend(stmts);
        }
        let main_stmts = self
            .resolve_top_level(main.script)
            .map_err(|e| CompileError::new(main.name, e))?;

        debug!(
            script = main.name,
            libraries = libraries.len(),
            functions = self.functions.len(),
            globals = self.globals.slot_count(),
            "resolved program"
        );

        Ok(ResolvedProgram {
            functions: self.functions,
            globals: self.globals.slot_types().to_vec(),
            libraries: library_stmts,
            main: main_stmts,
        })
    }

    // ==========================================================================
    // Hoisting
    // ==========================================================================

    fn hoist_functions(&mut self, script: Script<'_>) -> Result<()> {
        for decl in script.functions() {
            let name = decl.name.name;
            let return_type = decl.return_type.to_script_type();
            self.check_only_float(&return_type, true, decl.return_type.span)?;

            let mut params = Vec::with_capacity(decl.params.len());
            for param in decl.params {
                let ty = param.ty.to_script_type();
                if contains_void(&ty) {
                    return Err(ResolveError::type_mismatch(
                        param.span,
                        format!("parameter '{}' cannot be void", param.name.name),
                    ));
                }
                self.check_only_float(&ty, false, param.span)?;
                params.push(ty);
            }

            let overloads = self.function_names.entry(name.to_string()).or_default();
            if overloads.iter().any(|&i| self.functions[i].params == params) {
                return Err(ResolveError::Redeclaration {
                    name: name.to_string(),
                    span: decl.name.span,
                });
            }
            overloads.push(self.functions.len());

            self.functions.push(ResolvedFunction {
                name: name.to_string(),
                slot_count: params.len(),
                params,
                return_type,
                body: Vec::new(),
                span: decl.span,
            });
        }
        Ok(())
    }

    // ==========================================================================
    // Functions
    // ==========================================================================

    fn resolve_function(&mut self, decl: &FunctionDecl<'_>) -> Result<()> {
        let index = self.next_function;
        self.next_function += 1;

        let (params, return_type) = match self.functions.get(index) {
            Some(func) => (func.params.clone(), func.return_type.clone()),
            None => {
                return Err(ResolveError::type_mismatch(
                    decl.span,
                    "functions must be declared at the top level",
                ));
            }
        };

        let mut locals = LocalScope::new();
        for (param, ty) in decl.params.iter().zip(params) {
            locals.declare(param.name.name, ty, param.name.span)?;
        }

        let outer_frame = self.frame.replace(FunctionFrame {
            locals,
            return_type: return_type.clone(),
        });
        let outer_flags = std::mem::replace(&mut self.flags, ResolveFlags::IN_FUNCTION);

        let body = self.resolve_stmts(decl.body.stmts);

        self.flags = outer_flags;
        let frame = std::mem::replace(&mut self.frame, outer_frame);
        let body = body?;

        if !return_type.is_void() && !crate::ReturnChecker::new().block_returns(&decl.body) {
            return Err(ResolveError::MissingReturn {
                name: decl.name.name.to_string(),
                span: decl.name.span,
            });
        }

        if let Some(func) = self.functions.get_mut(index) {
            func.body = body;
            func.slot_count = frame.map_or(func.params.len(), |f| f.locals.slot_count());
        }
        Ok(())
    }

    // ==========================================================================
    // Scopes
    // ==========================================================================

    fn scope(&self) -> &LocalScope {
        match &self.frame {
            Some(frame) => &frame.locals,
            None => &self.globals,
        }
    }

    fn scope_mut(&mut self) -> &mut LocalScope {
        match &mut self.frame {
            Some(frame) => &mut frame.locals,
            None => &mut self.globals,
        }
    }

    fn push_scope(&mut self) {
        self.scope_mut().push_scope();
    }

    fn pop_scope(&mut self) {
        self.scope_mut().pop_scope();
    }

    /// Declare a script variable in the innermost scope.
    fn declare(&mut self, name: &str, ty: ScriptType, span: Span) -> Result<VarRef> {
        let in_function = self.frame.is_some();
        let slot = self.scope_mut().declare(name, ty, span)?;
        Ok(if in_function {
            VarRef::Local(slot)
        } else {
            VarRef::Global(slot)
        })
    }

    /// Look up a script variable: the function's locals, then the globals.
    fn lookup_script_variable(&self, name: &str) -> Option<(VarRef, ScriptType)> {
        if let Some(frame) = &self.frame {
            if let Some(var) = frame.locals.get(name) {
                return Some((VarRef::Local(var.slot), var.ty.clone()));
            }
        }
        self.globals
            .get(name)
            .map(|var| (VarRef::Global(var.slot), var.ty.clone()))
    }

    fn return_type(&self) -> Option<&ScriptType> {
        self.frame.as_ref().map(|f| &f.return_type)
    }

    /// Under `only_float`, reject any type other than `float` (and `void`
    /// where `allow_void` is set).
    fn check_only_float(&self, ty: &ScriptType, allow_void: bool, span: Span) -> Result<()> {
        if !self.options.only_float || *ty == ScriptType::Float || (allow_void && ty.is_void()) {
            return Ok(());
        }
        Err(ResolveError::type_mismatch(
            span,
            format!("only 'float' values are allowed, found '{ty}'"),
        ))
    }
}

/// The main script must consist of a single expression statement.
fn check_single_expression(script: Script<'_>) -> Result<()> {
    match script.stmts() {
        [Stmt::Expr(stmt)] if stmt.expr.is_some() => Ok(()),
        [] => Err(ResolveError::ExpressionOnly { span: script.span() }),
        [Stmt::Expr(stmt), rest @ ..] if stmt.expr.is_some() => Err(ResolveError::ExpressionOnly {
            span: rest.first().map_or(script.span(), |s| s.span()),
        }),
        [first, ..] => Err(ResolveError::ExpressionOnly { span: first.span() }),
    }
}

/// Whether `ty` is `void` or an array of `void`.
fn contains_void(ty: &ScriptType) -> bool {
    match ty.element() {
        Some(element) => contains_void(element),
        None => ty.is_void(),
    }
}
