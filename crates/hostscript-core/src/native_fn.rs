//! Native function storage and call context.
//!
//! Host functions are stored type-erased behind [`NativeFn`] and receive
//! their arguments through a [`CallContext`].

use std::fmt;
use std::sync::Arc;

use crate::convert::{FromValue, IntoValue};
use crate::error::NativeError;
use crate::value::Value;

/// Trait for callable native functions.
///
/// The `call` method reads arguments from the context and may set a return
/// value. Closures of the right shape implement it automatically.
pub trait NativeCallable {
    fn call(&self, ctx: &mut CallContext<'_>) -> Result<(), NativeError>;
}

impl<F> NativeCallable for F
where
    F: Fn(&mut CallContext<'_>) -> Result<(), NativeError>,
{
    fn call(&self, ctx: &mut CallContext<'_>) -> Result<(), NativeError> {
        (self)(ctx)
    }
}

/// Type-erased native function.
///
/// The callable is shared, so cloning a `NativeFn` is cheap and every clone
/// invokes the same host code.
#[derive(Clone)]
pub struct NativeFn {
    inner: Arc<dyn NativeCallable + Send + Sync>,
}

impl NativeFn {
    pub fn new<F>(f: F) -> Self
    where
        F: NativeCallable + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    /// Create from a closure, letting the closure signature be inferred.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&mut CallContext<'_>) -> Result<(), NativeError> + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    /// Call this native function with the given context.
    pub fn call(&self, ctx: &mut CallContext<'_>) -> Result<(), NativeError> {
        self.inner.call(ctx)
    }

    /// Invoke with an argument list and return the produced value.
    pub fn invoke(&self, args: &[Value]) -> Result<Value, NativeError> {
        let mut ctx = CallContext::new(args);
        self.call(&mut ctx)?;
        Ok(ctx.take_return())
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFn").finish_non_exhaustive()
    }
}

/// Arguments and return slot for a single native call.
pub struct CallContext<'a> {
    args: &'a [Value],
    ret: Value,
}

impl<'a> CallContext<'a> {
    pub fn new(args: &'a [Value]) -> Self {
        Self {
            args,
            ret: Value::Void,
        }
    }

    pub fn arg_count(&self) -> usize {
        self.args.len()
    }

    /// Raw access to the argument values.
    pub fn args(&self) -> &[Value] {
        self.args
    }

    pub fn arg_value(&self, index: usize) -> Result<&Value, NativeError> {
        self.args
            .get(index)
            .ok_or(NativeError::ArgumentIndexOutOfBounds {
                index,
                count: self.args.len(),
            })
    }

    /// Extract argument `index` as a host type.
    pub fn arg<T: FromValue>(&self, index: usize) -> Result<T, NativeError> {
        Ok(T::from_value(self.arg_value(index)?)?)
    }

    pub fn set_return<T: IntoValue>(&mut self, value: T) {
        self.ret = value.into_value();
    }

    pub fn take_return(&mut self) -> Value {
        std::mem::take(&mut self.ret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closure_is_callable() {
        let add = NativeFn::new(|ctx: &mut CallContext<'_>| {
            let a: i64 = ctx.arg(0)?;
            let b: i64 = ctx.arg(1)?;
            ctx.set_return(a + b);
            Ok(())
        });
        assert_eq!(add.invoke(&[Value::Int(2), Value::Int(3)]), Ok(Value::Int(5)));
    }

    #[test]
    fn missing_argument_is_reported() {
        let f = NativeFn::new(|ctx: &mut CallContext<'_>| {
            let _: i64 = ctx.arg(1)?;
            Ok(())
        });
        assert_eq!(
            f.invoke(&[Value::Int(1)]),
            Err(NativeError::ArgumentIndexOutOfBounds { index: 1, count: 1 })
        );
    }

    #[test]
    fn conversion_failure_is_reported() {
        let f = NativeFn::new(|ctx: &mut CallContext<'_>| {
            let _: bool = ctx.arg(0)?;
            Ok(())
        });
        assert!(matches!(
            f.invoke(&[Value::Int(1)]),
            Err(NativeError::Conversion(_))
        ));
    }

    #[test]
    fn void_by_default() {
        let f = NativeFn::new(|_: &mut CallContext<'_>| Ok(()));
        assert_eq!(f.invoke(&[]), Ok(Value::Void));
    }

    #[test]
    fn clones_share_callable() {
        let f = NativeFn::new(|ctx: &mut CallContext<'_>| {
            ctx.set_return("hi");
            Ok(())
        });
        let g = f.clone();
        assert_eq!(g.invoke(&[]), Ok(Value::String("hi".into())));
    }
}
