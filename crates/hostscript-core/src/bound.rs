//! Host capabilities exposed to scripts.
//!
//! A [`BoundHandle`] is either a [`BoundVariable`] (typed get/set) or a
//! [`BoundFunction`] (typed parameters, return type and a [`NativeFn`]).
//! Handles built from host objects hold only `Weak` references, so the
//! engine never keeps a host object alive. Accessing a handle whose owner
//! is gone fails with [`NativeError::OwnerDropped`].
//!
//! # Example
//!
//! ```
//! use std::sync::{Arc, RwLock};
//! use hostscript_core::{BoundFunction, BoundVariable, ScriptType};
//!
//! let loop_max = Arc::new(RwLock::new(100i64));
//! let var = BoundVariable::from_cell("LOOP_MAX", &loop_max);
//! assert_eq!(var.script_type(), &ScriptType::Int);
//!
//! let output = BoundFunction::builder("output")
//!     .param(ScriptType::Int)
//!     .native(|ctx| {
//!         let value: i64 = ctx.arg(0)?;
//!         println!("{value}");
//!         Ok(())
//!     })
//!     .build()
//!     .unwrap();
//! assert_eq!(output.signature(), "output(int)");
//! ```

use std::fmt;
use std::sync::{Arc, RwLock, Weak};

use xxhash_rust::xxh64::xxh64;

use crate::convert::{FromValue, IntoValue, ScriptTyped};
use crate::error::{NativeError, RegistrationError};
use crate::native_fn::{CallContext, NativeFn};
use crate::signature::{Signature, format_params};
use crate::{ScriptType, Value};

type Getter = Arc<dyn Fn() -> Result<Value, NativeError> + Send + Sync>;
type Setter = Arc<dyn Fn(Value) -> Result<(), NativeError> + Send + Sync>;

// ============================================================================
// Variables
// ============================================================================

/// A host value readable (and optionally writable) from scripts.
#[derive(Clone)]
pub struct BoundVariable {
    name: String,
    ty: ScriptType,
    getter: Getter,
    setter: Option<Setter>,
}

impl BoundVariable {
    /// Build from raw accessors. Prefer the typed constructors.
    pub fn new<G>(name: impl Into<String>, ty: ScriptType, getter: G) -> Self
    where
        G: Fn() -> Result<Value, NativeError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            ty,
            getter: Arc::new(getter),
            setter: None,
        }
    }

    /// Attach a raw setter.
    pub fn with_setter<S>(mut self, setter: S) -> Self
    where
        S: Fn(Value) -> Result<(), NativeError> + Send + Sync + 'static,
    {
        self.setter = Some(Arc::new(setter));
        self
    }

    /// A read-only value owned by the binding itself.
    pub fn constant<T>(name: impl Into<String>, value: T) -> Self
    where
        T: IntoValue + ScriptTyped + Clone + Send + Sync + 'static,
    {
        Self::new(name, T::script_type(), move || Ok(value.clone().into_value()))
    }

    /// A read-write binding to a shared host cell.
    ///
    /// Only a `Weak` reference to the cell is kept.
    pub fn from_cell<T>(name: impl Into<String>, cell: &Arc<RwLock<T>>) -> Self
    where
        T: IntoValue + FromValue + ScriptTyped + Clone + Send + Sync + 'static,
    {
        let name = name.into();
        let weak = Arc::downgrade(cell);
        let set_name = name.clone();
        Self::read_only_cell(name, cell).with_setter(move |value| {
            let cell = upgrade(&weak, &set_name)?;
            let new_value = T::from_value(&value)?;
            let mut guard = cell.write().map_err(|_| NativeError::LockPoisoned {
                name: set_name.clone(),
            })?;
            *guard = new_value;
            Ok(())
        })
    }

    /// A read-only binding to a shared host cell.
    pub fn read_only_cell<T>(name: impl Into<String>, cell: &Arc<RwLock<T>>) -> Self
    where
        T: IntoValue + ScriptTyped + Clone + Send + Sync + 'static,
    {
        let name = name.into();
        let weak = Arc::downgrade(cell);
        let get_name = name.clone();
        Self::new(name, T::script_type(), move || {
            let cell = upgrade(&weak, &get_name)?;
            let guard = cell.read().map_err(|_| NativeError::LockPoisoned {
                name: get_name.clone(),
            })?;
            Ok(guard.clone().into_value())
        })
    }

    /// A read-only binding computed from a host object.
    pub fn accessor<O, T, G>(name: impl Into<String>, owner: &Arc<O>, get: G) -> Self
    where
        O: Send + Sync + 'static,
        T: IntoValue + ScriptTyped,
        G: Fn(&O) -> T + Send + Sync + 'static,
    {
        Self::weak_accessor(name.into(), Arc::downgrade(owner), get)
    }

    /// A read-write binding through host getter and setter functions.
    ///
    /// The setter receives `&O`; the host object provides interior
    /// mutability for the field.
    pub fn accessor_mut<O, T, G, S>(
        name: impl Into<String>,
        owner: &Arc<O>,
        get: G,
        set: S,
    ) -> Self
    where
        O: Send + Sync + 'static,
        T: IntoValue + FromValue + ScriptTyped,
        G: Fn(&O) -> T + Send + Sync + 'static,
        S: Fn(&O, T) + Send + Sync + 'static,
    {
        Self::weak_accessor_mut(name.into(), Arc::downgrade(owner), get, set)
    }

    fn weak_accessor<O, T, G>(name: String, owner: Weak<O>, get: G) -> Self
    where
        O: Send + Sync + 'static,
        T: IntoValue + ScriptTyped,
        G: Fn(&O) -> T + Send + Sync + 'static,
    {
        let get_name = name.clone();
        Self::new(name, T::script_type(), move || {
            let owner = upgrade(&owner, &get_name)?;
            Ok(get(&owner).into_value())
        })
    }

    fn weak_accessor_mut<O, T, G, S>(name: String, owner: Weak<O>, get: G, set: S) -> Self
    where
        O: Send + Sync + 'static,
        T: IntoValue + FromValue + ScriptTyped,
        G: Fn(&O) -> T + Send + Sync + 'static,
        S: Fn(&O, T) + Send + Sync + 'static,
    {
        let set_name = name.clone();
        let set_owner = owner.clone();
        Self::weak_accessor(name, owner, get).with_setter(move |value| {
            let owner = upgrade(&set_owner, &set_name)?;
            set(&owner, T::from_value(&value)?);
            Ok(())
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn script_type(&self) -> &ScriptType {
        &self.ty
    }

    pub fn is_writable(&self) -> bool {
        self.setter.is_some()
    }

    /// Read the current host value.
    pub fn get(&self) -> Result<Value, NativeError> {
        (self.getter)()
    }

    /// Write a value back to the host.
    ///
    /// Callers are expected to have rejected writes to read-only bindings
    /// earlier; this reports a host error if they did not.
    pub fn set(&self, value: Value) -> Result<(), NativeError> {
        match &self.setter {
            Some(setter) => setter(value),
            None => Err(NativeError::host(format!("'{}' is read-only", self.name))),
        }
    }

    fn renamed(mut self, name: String) -> Self {
        self.name = name;
        self
    }
}

impl fmt::Debug for BoundVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundVariable")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("writable", &self.is_writable())
            .finish_non_exhaustive()
    }
}

fn upgrade<T>(weak: &Weak<T>, name: &str) -> Result<Arc<T>, NativeError> {
    weak.upgrade().ok_or_else(|| {
        tracing::debug!(binding = name, "host owner dropped");
        NativeError::OwnerDropped {
            name: name.to_string(),
        }
    })
}

// ============================================================================
// Functions
// ============================================================================

/// A host function callable from scripts.
#[derive(Debug, Clone)]
pub struct BoundFunction {
    name: String,
    params: Vec<ScriptType>,
    return_type: ScriptType,
    native: NativeFn,
}

impl BoundFunction {
    pub fn new(
        name: impl Into<String>,
        params: Vec<ScriptType>,
        return_type: ScriptType,
        native: NativeFn,
    ) -> Self {
        Self {
            name: name.into(),
            params,
            return_type,
            native,
        }
    }

    pub fn builder(name: impl Into<String>) -> FunctionBuilder {
        FunctionBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[ScriptType] {
        &self.params
    }

    pub fn return_type(&self) -> &ScriptType {
        &self.return_type
    }

    /// `name(int, float)` form used in diagnostics.
    pub fn signature(&self) -> String {
        format!("{}({})", self.name, format_params(&self.params))
    }

    /// Identity of the parameter list, independent of the name.
    pub fn param_hash(&self) -> u64 {
        param_hash(&self.params)
    }

    /// Call the host function. Arguments must already match `params()`.
    pub fn invoke(&self, args: &[Value]) -> Result<Value, NativeError> {
        self.native.invoke(args)
    }

    fn renamed(mut self, name: String) -> Self {
        self.name = name;
        self
    }
}

/// Hash a parameter list so overloads can be compared by signature.
pub fn param_hash(params: &[ScriptType]) -> u64 {
    xxh64(format_params(params).as_bytes(), 0)
}

/// Builder for [`BoundFunction`].
#[derive(Debug)]
pub struct FunctionBuilder {
    name: String,
    params: Vec<ScriptType>,
    return_type: ScriptType,
    native: Option<NativeFn>,
}

impl FunctionBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            return_type: ScriptType::Void,
            native: None,
        }
    }

    pub fn param(mut self, ty: ScriptType) -> Self {
        self.params.push(ty);
        self
    }

    pub fn params(mut self, params: Vec<ScriptType>) -> Self {
        self.params = params;
        self
    }

    pub fn returns(mut self, ty: ScriptType) -> Self {
        self.return_type = ty;
        self
    }

    /// Use a free-standing host closure as the implementation.
    pub fn native<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut CallContext<'_>) -> Result<(), NativeError> + Send + Sync + 'static,
    {
        self.native = Some(NativeFn::from_fn(f));
        self
    }

    /// Use a method of a host object as the implementation.
    ///
    /// Only a `Weak` reference to `owner` is captured.
    pub fn method<O, F>(self, owner: &Arc<O>, f: F) -> Self
    where
        O: Send + Sync + 'static,
        F: Fn(&O, &mut CallContext<'_>) -> Result<(), NativeError> + Send + Sync + 'static,
    {
        self.weak_method(Arc::downgrade(owner), f)
    }

    fn weak_method<O, F>(mut self, owner: Weak<O>, f: F) -> Self
    where
        O: Send + Sync + 'static,
        F: Fn(&O, &mut CallContext<'_>) -> Result<(), NativeError> + Send + Sync + 'static,
    {
        let name = self.name.clone();
        self.native = Some(NativeFn::from_fn(move |ctx| {
            let owner = upgrade(&owner, &name)?;
            f(&owner, ctx)
        }));
        self
    }

    pub fn build(self) -> Result<BoundFunction, RegistrationError> {
        let native = self.native.ok_or_else(|| RegistrationError::InvalidSignature {
            signature: format!("{}({})", self.name, format_params(&self.params)),
            reason: "no implementation supplied".to_string(),
        })?;
        Ok(BoundFunction {
            name: self.name,
            params: self.params,
            return_type: self.return_type,
            native,
        })
    }
}

// ============================================================================
// Handles
// ============================================================================

/// A capability exposed from host to script.
#[derive(Debug, Clone)]
pub enum BoundHandle {
    Variable(Arc<BoundVariable>),
    Function(Arc<BoundFunction>),
}

impl BoundHandle {
    pub fn name(&self) -> &str {
        match self {
            BoundHandle::Variable(v) => v.name(),
            BoundHandle::Function(f) => f.name(),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            BoundHandle::Variable(_) => "variable",
            BoundHandle::Function(_) => "function",
        }
    }

    /// Same handle, exposed under another simple name.
    pub fn renamed(self, name: &str) -> Self {
        if self.name() == name {
            return self;
        }
        match self {
            BoundHandle::Variable(v) => {
                BoundHandle::Variable(Arc::new((*v).clone().renamed(name.to_string())))
            }
            BoundHandle::Function(f) => {
                BoundHandle::Function(Arc::new((*f).clone().renamed(name.to_string())))
            }
        }
    }
}

impl From<BoundVariable> for BoundHandle {
    fn from(v: BoundVariable) -> Self {
        BoundHandle::Variable(Arc::new(v))
    }
}

impl From<BoundFunction> for BoundHandle {
    fn from(f: BoundFunction) -> Self {
        BoundHandle::Function(Arc::new(f))
    }
}

// ============================================================================
// Host objects
// ============================================================================

/// A host type whose members can be bound under a namespace alias.
///
/// This replaces runtime reflection: the type lists its script-visible
/// fields and methods once, and every instance is bound through a `Weak`
/// reference.
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicI64, Ordering};
/// use hostscript_core::{HostObject, MemberBinder};
///
/// struct Counter {
///     total: AtomicI64,
/// }
///
/// impl HostObject for Counter {
///     fn bind_members(binder: &mut MemberBinder<Self>) {
///         binder
///             .variable("total", |c: &Counter| c.total.load(Ordering::SeqCst))
///             .function("add(int)", |c, ctx| {
///                 let n: i64 = ctx.arg(0)?;
///                 c.total.fetch_add(n, Ordering::SeqCst);
///                 Ok(())
///             });
///     }
/// }
///
/// let counter = Arc::new(Counter { total: AtomicI64::new(0) });
/// let members = MemberBinder::bind(&counter).unwrap();
/// assert_eq!(members.len(), 2);
/// ```
pub trait HostObject: Send + Sync + Sized + 'static {
    fn bind_members(binder: &mut MemberBinder<Self>);
}

/// Collects the members of one host object instance.
pub struct MemberBinder<O> {
    owner: Weak<O>,
    members: Vec<BoundHandle>,
    error: Option<RegistrationError>,
}

impl<O: Send + Sync + 'static> MemberBinder<O> {
    pub fn new(owner: &Arc<O>) -> Self {
        Self {
            owner: Arc::downgrade(owner),
            members: Vec::new(),
            error: None,
        }
    }

    /// Run the type's [`HostObject::bind_members`] for `owner`.
    pub fn bind(owner: &Arc<O>) -> Result<Vec<BoundHandle>, RegistrationError>
    where
        O: HostObject,
    {
        let mut binder = Self::new(owner);
        O::bind_members(&mut binder);
        binder.finish()
    }

    /// A read-only field.
    pub fn variable<T, G>(&mut self, name: &str, get: G) -> &mut Self
    where
        T: IntoValue + ScriptTyped,
        G: Fn(&O) -> T + Send + Sync + 'static,
    {
        let var = BoundVariable::weak_accessor(name.to_string(), self.owner.clone(), get);
        self.members.push(var.into());
        self
    }

    /// A read-write field.
    pub fn variable_mut<T, G, S>(&mut self, name: &str, get: G, set: S) -> &mut Self
    where
        T: IntoValue + FromValue + ScriptTyped,
        G: Fn(&O) -> T + Send + Sync + 'static,
        S: Fn(&O, T) + Send + Sync + 'static,
    {
        let var = BoundVariable::weak_accessor_mut(name.to_string(), self.owner.clone(), get, set);
        self.members.push(var.into());
        self
    }

    /// A method, described by a signature such as `"float scale(float)"`.
    ///
    /// A malformed signature is reported by [`finish`](Self::finish).
    pub fn function<F>(&mut self, signature: &str, f: F) -> &mut Self
    where
        F: Fn(&O, &mut CallContext<'_>) -> Result<(), NativeError> + Send + Sync + 'static,
    {
        let parsed = match Signature::parse(signature) {
            Ok(parsed) => parsed,
            Err(err) => {
                self.error.get_or_insert(err);
                return self;
            }
        };
        let built = FunctionBuilder::new(parsed.name.to_string())
            .params(parsed.params.unwrap_or_default())
            .returns(parsed.return_type.unwrap_or(ScriptType::Void))
            .weak_method(self.owner.clone(), f)
            .build();
        match built {
            Ok(function) => self.members.push(function.into()),
            Err(err) => {
                self.error.get_or_insert(err);
            }
        }
        self
    }

    pub fn finish(self) -> Result<Vec<BoundHandle>, RegistrationError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.members),
        }
    }
}
