//! Type-erased callables on both sides of the boundary.
//!
//! [`NativeFn`] wraps native code that managed code calls: callback
//! delegates and message handlers. [`ManagedFn`] wraps the managed bridge
//! functions native code calls through the entry table.

use std::fmt;
use std::sync::Arc;

use hostbridge_core::{BridgeResult, ManagedException, TypeHash};

use crate::call_frame::CallFrame;

/// Native code callable from the managed side.
pub trait NativeCallable: Send + Sync {
    fn call(&self, frame: &mut CallFrame<'_>) -> BridgeResult<()>;
}

impl<F> NativeCallable for F
where
    F: Fn(&mut CallFrame<'_>) -> BridgeResult<()> + Send + Sync,
{
    fn call(&self, frame: &mut CallFrame<'_>) -> BridgeResult<()> {
        (self)(frame)
    }
}

/// Shared native callable.
///
/// `id` is the delegate type for callbacks and the message name hash for
/// handlers.
#[derive(Clone)]
pub struct NativeFn {
    pub id: TypeHash,
    inner: Arc<dyn NativeCallable>,
}

impl NativeFn {
    pub fn new<F>(id: TypeHash, f: F) -> Self
    where
        F: Fn(&mut CallFrame<'_>) -> BridgeResult<()> + Send + Sync + 'static,
    {
        Self { id, inner: Arc::new(f) }
    }

    /// Wrap a callable that is not a closure.
    pub fn from_callable(id: TypeHash, callable: impl NativeCallable + 'static) -> Self {
        Self {
            id,
            inner: Arc::new(callable),
        }
    }

    pub fn call(&self, frame: &mut CallFrame<'_>) -> BridgeResult<()> {
        self.inner.call(frame)
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFn").field("id", &self.id).finish_non_exhaustive()
    }
}

/// A managed bridge function.
pub trait ManagedCallable: Send + Sync {
    fn call(&self, frame: &mut CallFrame<'_>) -> Result<(), ManagedException>;
}

impl<F> ManagedCallable for F
where
    F: Fn(&mut CallFrame<'_>) -> Result<(), ManagedException> + Send + Sync,
{
    fn call(&self, frame: &mut CallFrame<'_>) -> Result<(), ManagedException> {
        (self)(frame)
    }
}

/// Shared managed callable.
#[derive(Clone)]
pub struct ManagedFn {
    inner: Arc<dyn ManagedCallable>,
}

impl ManagedFn {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut CallFrame<'_>) -> Result<(), ManagedException> + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    pub fn from_callable(callable: impl ManagedCallable + 'static) -> Self {
        Self {
            inner: Arc::new(callable),
        }
    }

    pub fn call(&self, frame: &mut CallFrame<'_>) -> Result<(), ManagedException> {
        self.inner.call(frame)
    }
}

impl fmt::Debug for ManagedFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedFn").finish_non_exhaustive()
    }
}
