//! Tree-walking interpreter over a [`ResolvedProgram`].
//!
//! Every run gets its own global [`Frame`], and every script call its own
//! local frame. Bound variables and functions are reached through the
//! handles the resolver stored in the program.

mod eval;
mod exec;
mod frame;
mod ops;

use std::sync::atomic::{AtomicBool, Ordering};

use hostscript_compiler::{RStmt, ResolvedProgram};
use hostscript_core::stack::ensure_sufficient_stack;
use hostscript_core::{BoundFunction, ConversionError, NativeError, RuntimeError, Value};
use tracing::trace;

pub use frame::Frame;

type Result<T> = std::result::Result<T, RuntimeError>;

/// Control flow out of a statement.
#[derive(Debug, Clone, PartialEq)]
enum Flow {
    Normal,
    Break,
    Continue,
    Return(Value),
}

pub struct Interpreter<'p> {
    program: &'p ResolvedProgram,
    globals: Frame,
    depth: usize,
    max_depth: usize,
    terminator: Option<&'p AtomicBool>,
}

impl<'p> Interpreter<'p> {
    pub fn new(program: &'p ResolvedProgram, max_depth: usize) -> Self {
        Self {
            program,
            globals: Frame::with_types(&program.globals),
            depth: 0,
            max_depth,
            terminator: None,
        }
    }

    /// Poll `flag` at every loop iteration and call; a set flag ends the
    /// run with [`RuntimeError::Terminated`].
    pub fn with_terminator(mut self, flag: &'p AtomicBool) -> Self {
        self.terminator = Some(flag);
        self
    }

    /// Execute the library scripts, then the main script.
    ///
    /// Returns the value of the last top-level expression statement of the
    /// main script, or `Value::Void` if there is none.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(&mut self) -> Result<Value> {
        let program = self.program;
        let mut top = Frame::default();

        for stmt in &program.libraries {
            self.exec_top_level(stmt, &mut top)?;
        }

        let mut result = Value::Void;
        for stmt in &program.main {
            match stmt {
                RStmt::Expr(expr) => result = self.eval(expr, &mut top)?,
                stmt => self.exec_top_level(stmt, &mut top)?,
            }
        }
        Ok(result)
    }

    fn exec_top_level(&mut self, stmt: &RStmt, top: &mut Frame) -> Result<()> {
        match self.exec(stmt, top)? {
            Flow::Normal => Ok(()),
            flow => Err(RuntimeError::internal(format!("{flow:?} escaped to top level"))),
        }
    }

    fn check_terminated(&self) -> Result<()> {
        match self.terminator {
            Some(flag) if flag.load(Ordering::Relaxed) => Err(RuntimeError::Terminated),
            _ => Ok(()),
        }
    }

    fn call_script(&mut self, index: usize, args: Vec<Value>) -> Result<Value> {
        self.check_terminated()?;
        let program = self.program;
        let function = program
            .function(index)
            .ok_or_else(|| RuntimeError::internal(format!("no script function #{index}")))?;

        if self.depth >= self.max_depth {
            return Err(RuntimeError::StackOverflow { depth: self.max_depth });
        }

        let mut locals = Frame::for_call(args, function.slot_count);
        self.depth += 1;
        let flow = ensure_sufficient_stack(|| self.exec_all(&function.body, &mut locals));
        self.depth -= 1;

        match flow? {
            Flow::Return(value) => Ok(value),
            _ => Ok(Value::Void),
        }
    }

    fn call_host(&self, function: &BoundFunction, args: &[Value]) -> Result<Value> {
        self.check_terminated()?;
        trace!(function = %function.signature(), "invoking host function");

        let host_error = |cause| RuntimeError::HostInvocation {
            name: function.name().to_string(),
            cause,
        };
        let value = function.invoke(args).map_err(host_error)?;

        let return_type = function.return_type();
        if return_type.is_void() {
            return Ok(Value::Void);
        }
        let actual = value.script_type();
        value.coerce_to(return_type).ok_or_else(|| {
            host_error(NativeError::Conversion(ConversionError::TypeMismatch {
                expected: return_type.to_string(),
                actual: actual.to_string(),
            }))
        })
    }
}
