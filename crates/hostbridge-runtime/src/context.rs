//! The bridge context.
//!
//! A [`BridgeContext`] is created once per host load by
//! [`initialize`](BridgeContext::initialize), threaded through every
//! crossing, and consumed by [`shutdown`](BridgeContext::shutdown). There
//! is no global state: reloading the host means shutting one context down
//! and initializing another.
//!
//! ## Crossings
//!
//! | Direction         | Entry point                                   |
//! |-------------------|-----------------------------------------------|
//! | native → managed  | [`call`](BridgeContext::call), [`invoke_delegate`](BridgeContext::invoke_delegate) |
//! | managed → native  | [`invoke_native`](BridgeContext::invoke_native), [`dispatch`](BridgeContext::dispatch) |
//!
//! Every typed crossing encodes its arguments in the canonical wire layout
//! on the calling side and decodes them on the receiving side, so both
//! directions exercise the same byte agreement the generated artifacts
//! rely on. Table locks are held only while a handle is issued, resolved
//! or released, never while the callee runs.

use std::any::{Any, type_name};
use std::sync::Arc;

use hostbridge_core::{
    BindingModel, BridgeError, BridgeResult, Direction, EntryId, EntryKind, Handle, HandleError,
    ManagedException, MarshalError, TypeHash, TypeKind, TypeRef, Value,
};
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

use crate::call_frame::{CallFrame, CallSite};
use crate::entry_table::ManagedEntryTable;
use crate::exception::{self, CallScope};
use crate::handle_table::{Acquired, HandleTable, ReleasePolicy};
use crate::host::{ManagedHost, ObjectId, PinnedObject};
use crate::marshal::wire;
use crate::native_fn::NativeFn;
use crate::thread_guard::ThreadGuard;

/// Runtime knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BridgeOptions {
    /// Policy for managed objects held by native code.
    pub managed_policy: ReleasePolicy,
    /// Policy for native objects held by managed code.
    pub native_policy: ReleasePolicy,
}

/// Live handle counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BridgeStats {
    pub managed_handles: usize,
    pub native_handles: usize,
    pub handlers: usize,
}

/// What [`BridgeContext::shutdown`] released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShutdownReport {
    pub managed_released: usize,
    pub native_released: usize,
    pub handlers_removed: usize,
}

/// A native callback wrapped as a managed-held delegate.
struct NativeCallback {
    delegate_type: TypeHash,
    function: NativeFn,
}

type NativeObject = Arc<dyn Any + Send + Sync>;

pub struct BridgeContext {
    model: Arc<BindingModel>,
    host: Arc<dyn ManagedHost>,
    entries: ManagedEntryTable,
    managed: Mutex<HandleTable<ObjectId, PinnedObject>>,
    native: Mutex<HandleTable<usize, NativeObject>>,
    handlers: RwLock<FxHashMap<String, NativeFn>>,
    guard: ThreadGuard,
    options: BridgeOptions,
}

impl BridgeContext {
    /// Bring the bridge up on the calling thread.
    ///
    /// `entries` is the managed entry table; every id in it must belong to
    /// `model`. Entries without a managed function fail with
    /// [`MarshalError::UnboundEntry`] when called.
    pub fn initialize(
        host: Arc<dyn ManagedHost>,
        entries: ManagedEntryTable,
        model: Arc<BindingModel>,
        options: BridgeOptions,
    ) -> BridgeResult<Self> {
        let mut ids: Vec<EntryId> = entries.entries().collect();
        ids.sort();
        if let Some(unknown) = ids.into_iter().find(|id| model.entry(*id).is_none()) {
            return Err(MarshalError::UnknownEntry(unknown).into());
        }
        let unbound = model.entries().iter().filter(|e| !entries.contains(e.id)).count();
        info!(
            target: "hostbridge::runtime",
            types = model.len(),
            entries = model.entries().len(),
            bound = entries.len(),
            unbound,
            "bridge initialized"
        );
        Ok(Self {
            guard: ThreadGuard::new(host.threading()),
            host,
            entries,
            model,
            managed: Mutex::new(HandleTable::new(Direction::NativeHeldManaged, options.managed_policy)),
            native: Mutex::new(HandleTable::new(Direction::ManagedHeldNative, options.native_policy)),
            handlers: RwLock::new(FxHashMap::default()),
            options,
        })
    }

    pub fn model(&self) -> &BindingModel {
        &self.model
    }

    pub fn host(&self) -> &Arc<dyn ManagedHost> {
        &self.host
    }

    pub fn options(&self) -> BridgeOptions {
        self.options
    }

    pub fn stats(&self) -> BridgeStats {
        BridgeStats {
            managed_handles: self.managed.lock().len(),
            native_handles: self.native.lock().len(),
            handlers: self.handlers.read().len(),
        }
    }

    // ========================================================================
    // Native → managed
    // ========================================================================

    /// Call a managed entry point.
    ///
    /// `args` holds the receiver (when the entry has one) followed by the
    /// arguments; `out`/`ref` arguments are overwritten with the values the
    /// callee wrote back. Calling a release entry also releases the
    /// receiver's handle.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn call(&self, entry: EntryId, args: &mut [Value]) -> BridgeResult<Value> {
        self.guard.check("call")?;
        let model = Arc::clone(&self.model);
        let entry = model.entry(entry).ok_or(MarshalError::UnknownEntry(entry))?;
        let site = CallSite {
            symbol: &entry.symbol,
            params: &entry.params,
            returns: &entry.returns,
            has_receiver: entry.has_receiver,
        };

        if entry.kind == EntryKind::Release {
            return self.release_entry(entry.id, site, args);
        }

        let function = self
            .entries
            .get(entry.id)
            .cloned()
            .ok_or_else(|| MarshalError::UnboundEntry(entry.symbol.clone()))?;
        self.cross_into_managed(site, args, |frame| function.call(frame))
    }

    fn release_entry(&self, id: EntryId, site: CallSite<'_>, args: &mut [Value]) -> BridgeResult<Value> {
        let handle = match args.first() {
            Some(Value::Object(h)) => *h,
            Some(Value::Null) => return Err(HandleError::Null.into()),
            Some(other) => {
                return Err(MarshalError::TypeMismatch {
                    expected: "object".to_string(),
                    actual: other.type_name().to_string(),
                }
                .into());
            }
            None => {
                return Err(MarshalError::ArgumentCount {
                    entry: site.symbol.to_string(),
                    expected: 1,
                    got: 0,
                }
                .into());
            }
        };
        {
            let mut table = self.managed.lock();
            table.resolve(handle)?;
            // Other holders keep the object; only the last release finalizes
            if table.ref_count(handle).is_some_and(|count| count > 1) {
                table.release(handle)?;
                debug!(target: "hostbridge::runtime", %handle, "managed reference dropped");
                return Ok(Value::Void);
            }
        }

        // The managed finalizer runs while the handle is still live.
        let finalized = match self.entries.get(id).cloned() {
            Some(function) => self.cross_into_managed(site, args, |frame| function.call(frame)),
            None => Ok(Value::Void),
        };
        self.release(handle)?;
        finalized
    }

    /// Invoke a delegate held by native code.
    ///
    /// Managed delegates run on the host; a native callback wrapped with
    /// [`wrap_callback`](Self::wrap_callback) runs in place.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn invoke_delegate(&self, delegate: Handle, args: &mut [Value]) -> BridgeResult<Value> {
        self.guard.check("invoke_delegate")?;
        if delegate.direction == Direction::ManagedHeldNative {
            return Ok(self.invoke_native(delegate, args)?);
        }

        let (object, type_hash) = {
            let table = self.managed.lock();
            let entry = table.resolve(delegate)?;
            (entry.value.object(), entry.type_hash)
        };
        let model = Arc::clone(&self.model);
        let descriptor = model.get(type_hash).ok_or(MarshalError::UnknownType(type_hash))?;
        let signature = descriptor
            .delegate_signature()
            .ok_or_else(|| HandleError::TypeMismatch {
                handle: delegate,
                expected: "delegate".to_string(),
                actual: descriptor.name.clone(),
            })?;
        let site = CallSite {
            symbol: &descriptor.name,
            params: &signature.params,
            returns: &signature.return_type,
            has_receiver: false,
        };
        let host = Arc::clone(&self.host);
        self.cross_into_managed(site, args, |frame| host.invoke_delegate(object, frame))
    }

    fn cross_into_managed(
        &self,
        site: CallSite<'_>,
        args: &mut [Value],
        invoke: impl FnOnce(&mut CallFrame<'_>) -> Result<(), ManagedException>,
    ) -> BridgeResult<Value> {
        self.check_arity(&site, args)?;
        self.validate_args(&site, args)?;

        let request = wire::encode_request(&self.model, site.params, args)?;
        let inputs = wire::decode_request(&self.model, site.params, &request)?;

        let mut frame = CallFrame::new(self, site, inputs);
        let outcome = exception::guard_managed(site.symbol, || invoke(&mut frame));
        let (ret, outputs, acquired) = frame.into_parts();
        let scope = CallScope::new(self, acquired);
        outcome?;

        let response = wire::encode_response(&self.model, site.symbol, site.params, site.returns, &ret, &outputs)?;
        let (ret, written) = wire::decode_response(&self.model, site.params, site.returns, &response)?;
        for (index, value) in written {
            args[index] = value;
        }
        scope.commit();
        Ok(ret)
    }

    // ========================================================================
    // Managed → native
    // ========================================================================

    /// Invoke a native callback on behalf of managed code.
    ///
    /// Native errors and panics come back as a [`ManagedException`].
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn invoke_native(&self, delegate: Handle, args: &mut [Value]) -> Result<Value, ManagedException> {
        self.guard.check("invoke_native").map_err(BridgeError::from)?;
        let callback = self.resolve_native::<NativeCallback>(delegate)?;
        let model = Arc::clone(&self.model);
        let descriptor = model
            .get(callback.delegate_type)
            .ok_or(BridgeError::from(MarshalError::UnknownType(callback.delegate_type)))?;
        let signature = descriptor
            .delegate_signature()
            .ok_or(BridgeError::from(MarshalError::UnknownType(callback.delegate_type)))?;
        let site = CallSite {
            symbol: &descriptor.name,
            params: &signature.params,
            returns: &signature.return_type,
            has_receiver: false,
        };
        self.cross_into_native(site, args, &callback.function)
    }

    /// Forward a named message (e.g. `"Update"`) to its native handler.
    ///
    /// Messages nobody handles are ignored.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn dispatch(&self, message: &str, args: Vec<Value>) -> Result<(), ManagedException> {
        self.guard.check("dispatch").map_err(BridgeError::from)?;
        let Some(handler) = self.handlers.read().get(message).cloned() else {
            debug!(target: "hostbridge::runtime", message, "no handler registered");
            return Ok(());
        };
        let mut frame = CallFrame::new(self, CallSite::untyped(message), args);
        let outcome = exception::guard_native(message, || handler.call(&mut frame));
        let (_, _, acquired) = frame.into_parts();
        let scope = CallScope::new(self, acquired);
        outcome?;
        scope.commit();
        Ok(())
    }

    fn cross_into_native(
        &self,
        site: CallSite<'_>,
        args: &mut [Value],
        function: &NativeFn,
    ) -> Result<Value, ManagedException> {
        self.check_arity(&site, args)?;
        self.validate_args(&site, args)?;

        let request = wire::encode_request(&self.model, site.params, args)?;
        let inputs = wire::decode_request(&self.model, site.params, &request)?;

        let mut frame = CallFrame::new(self, site, inputs);
        let outcome = exception::guard_native(site.symbol, || function.call(&mut frame));
        let (ret, outputs, acquired) = frame.into_parts();
        let scope = CallScope::new(self, acquired);
        outcome?;

        let response = wire::encode_response(&self.model, site.symbol, site.params, site.returns, &ret, &outputs)?;
        let (ret, written) = wire::decode_response(&self.model, site.params, site.returns, &response)?;
        for (index, value) in written {
            args[index] = value;
        }
        scope.commit();
        Ok(ret)
    }

    // ========================================================================
    // Handlers and callbacks
    // ========================================================================

    /// Register the handler for a message, replacing any previous one.
    pub fn on_message<F>(&self, message: impl Into<String>, f: F) -> BridgeResult<Option<NativeFn>>
    where
        F: Fn(&mut CallFrame<'_>) -> BridgeResult<()> + Send + Sync + 'static,
    {
        self.guard.check("on_message")?;
        let message = message.into();
        let handler = NativeFn::new(TypeHash::from_name(&message), f);
        debug!(target: "hostbridge::runtime", message = %message, "handler registered");
        Ok(self.handlers.write().insert(message, handler))
    }

    pub fn remove_handler(&self, message: &str) -> BridgeResult<bool> {
        self.guard.check("remove_handler")?;
        Ok(self.handlers.write().remove(message).is_some())
    }

    /// Wrap a native closure as a delegate of type `delegate_type` that
    /// managed code can hold and invoke.
    pub fn wrap_callback<F>(&self, delegate_type: TypeHash, f: F) -> BridgeResult<Handle>
    where
        F: Fn(&mut CallFrame<'_>) -> BridgeResult<()> + Send + Sync + 'static,
    {
        self.guard.check("wrap_callback")?;
        match self.model.kind_of(delegate_type) {
            Some(TypeKind::Delegate) => {}
            Some(_) => {
                return Err(MarshalError::TypeMismatch {
                    expected: "delegate".to_string(),
                    actual: self.model.display_type(&TypeRef::Named(delegate_type)),
                }
                .into());
            }
            None => return Err(MarshalError::UnknownType(delegate_type).into()),
        }
        let callback = Arc::new(NativeCallback {
            delegate_type,
            function: NativeFn::new(delegate_type, f),
        });
        self.share_native(callback, delegate_type)
    }

    // ========================================================================
    // Handles
    // ========================================================================

    /// Issue (or look up) the handle for a native object.
    ///
    /// `type_hash` must name a class or delegate in the model.
    pub fn share_native<T: Any + Send + Sync>(&self, object: Arc<T>, type_hash: TypeHash) -> BridgeResult<Handle> {
        self.guard.check("share_native")?;
        self.handle_kind(type_hash)?;
        let key = Arc::as_ptr(&object) as *const () as usize;
        let object: NativeObject = object;
        let (handle, acquired) = self
            .native
            .lock()
            .acquire(key, type_hash, || Ok::<_, BridgeError>(object))?;
        if acquired == Acquired::New {
            debug!(target: "hostbridge::runtime", %handle, "native handle issued");
        }
        Ok(handle)
    }

    /// The native object a managed-held handle denotes.
    pub fn resolve_native<T: Any + Send + Sync>(&self, handle: Handle) -> BridgeResult<Arc<T>> {
        self.guard.check("resolve_native")?;
        let (object, type_hash) = {
            let table = self.native.lock();
            let entry = table.resolve(handle)?;
            (Arc::clone(&entry.value), entry.type_hash)
        };
        object.downcast::<T>().map_err(|_| {
            HandleError::TypeMismatch {
                handle,
                expected: type_name::<T>().to_string(),
                actual: self.model.display_type(&TypeRef::Named(type_hash)),
            }
            .into()
        })
    }

    /// Issue (or look up) the handle for a managed object, as the value
    /// that carries it across.
    pub fn share_managed(&self, object: ObjectId, type_hash: TypeHash) -> BridgeResult<Value> {
        self.guard.check("share_managed")?;
        Ok(self.acquire_managed(object, type_hash)?.0)
    }

    /// Whether `type_hash` is a delegate; anything but a delegate or an
    /// instantiable class cannot be held by handle.
    fn handle_kind(&self, type_hash: TypeHash) -> BridgeResult<bool> {
        match self.model.get(type_hash) {
            Some(ty) if ty.kind() == TypeKind::Delegate => Ok(true),
            Some(ty) if ty.has_instances() => Ok(false),
            Some(_) => Err(MarshalError::TypeMismatch {
                expected: "class or delegate".to_string(),
                actual: self.model.display_type(&TypeRef::Named(type_hash)),
            }
            .into()),
            None => Err(MarshalError::UnknownType(type_hash).into()),
        }
    }

    pub(crate) fn acquire_managed(&self, object: ObjectId, type_hash: TypeHash) -> BridgeResult<(Value, Acquired)> {
        let is_delegate = self.handle_kind(type_hash)?;
        let host = Arc::clone(&self.host);
        let (handle, acquired) = self
            .managed
            .lock()
            .acquire(object, type_hash, || PinnedObject::new(host, object))?;
        if acquired == Acquired::New {
            debug!(target: "hostbridge::runtime", %handle, %object, "managed handle issued");
        }
        let value = if is_delegate { Value::Delegate(handle) } else { Value::Object(handle) };
        Ok((value, acquired))
    }

    /// The managed object a native-held handle denotes.
    pub fn resolve_managed(&self, handle: Handle) -> BridgeResult<ObjectId> {
        self.guard.check("resolve_managed")?;
        Ok(self.managed.lock().resolve(handle)?.value.object())
    }

    /// Release a handle in whichever table issued it.
    ///
    /// Under the single-owner policy the handle becomes stale for every
    /// holder; releasing it again fails with [`HandleError::Stale`].
    pub fn release(&self, handle: Handle) -> BridgeResult<()> {
        self.guard.check("release")?;
        match handle.direction {
            Direction::NativeHeldManaged => {
                let freed = self.managed.lock().release(handle)?;
                if let Some(pin) = freed {
                    debug!(target: "hostbridge::runtime", %handle, object = %pin.object(), "managed handle released");
                }
            }
            Direction::ManagedHeldNative => {
                let freed = self.native.lock().release(handle)?;
                if freed.is_some() {
                    debug!(target: "hostbridge::runtime", %handle, "native handle released");
                }
            }
        }
        Ok(())
    }

    /// Release handles issued during a crossing that failed.
    pub(crate) fn roll_back(&self, acquired: Vec<(Handle, Acquired)>) {
        let mut freed_pins = Vec::new();
        let mut freed_native = Vec::new();
        for (handle, how) in acquired.into_iter().rev() {
            match handle.direction {
                Direction::NativeHeldManaged => {
                    let mut table = self.managed.lock();
                    match (how, table.policy()) {
                        (Acquired::New, _) => freed_pins.extend(table.force_release(handle).ok()),
                        (Acquired::Existing, ReleasePolicy::RefCounted) => {
                            freed_pins.extend(table.release(handle).ok().flatten())
                        }
                        (Acquired::Existing, ReleasePolicy::SingleOwner) => {}
                    }
                }
                Direction::ManagedHeldNative => {
                    let mut table = self.native.lock();
                    if how == Acquired::New {
                        freed_native.extend(table.force_release(handle).ok());
                    }
                }
            }
            debug!(target: "hostbridge::runtime", %handle, "handle rolled back after failed call");
        }
        // Unpin outside the table lock
        drop(freed_pins);
        drop(freed_native);
    }

    fn check_arity(&self, site: &CallSite<'_>, args: &[Value]) -> BridgeResult<()> {
        if args.len() != site.params.len() {
            return Err(MarshalError::ArgumentCount {
                entry: site.symbol.to_string(),
                expected: site.params.len(),
                got: args.len(),
            }
            .into());
        }
        if site.has_receiver
            && let Some(receiver) = args.first()
            && receiver.is_null()
        {
            return Err(HandleError::Null.into());
        }
        Ok(())
    }

    /// Check every handle argument before anything crosses.
    fn validate_args(&self, site: &CallSite<'_>, args: &[Value]) -> BridgeResult<()> {
        for (param, arg) in site.params.iter().zip(args) {
            if param.mode.reads_in() {
                self.validate_value(&param.ty, arg)?;
            }
        }
        Ok(())
    }

    fn validate_value(&self, ty: &TypeRef, value: &Value) -> BridgeResult<()> {
        match (ty, value) {
            (TypeRef::Named(expected), Value::Object(h) | Value::Delegate(h)) if !h.is_null() => {
                let actual = match h.direction {
                    Direction::NativeHeldManaged => self.managed.lock().resolve(*h)?.type_hash,
                    Direction::ManagedHeldNative => self.native.lock().resolve(*h)?.type_hash,
                };
                if !self.handle_fits(actual, *expected) {
                    return Err(HandleError::TypeMismatch {
                        handle: *h,
                        expected: self.model.display_type(ty),
                        actual: self.model.display_type(&TypeRef::Named(actual)),
                    }
                    .into());
                }
                Ok(())
            }
            (TypeRef::Array(array), Value::Array(items)) => {
                for item in &items.items {
                    self.validate_value(&array.element, item)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Classes accept subclasses; delegates accept any delegate with the
    /// same signature.
    fn handle_fits(&self, actual: TypeHash, expected: TypeHash) -> bool {
        if self.model.is_subtype(actual, expected) {
            return true;
        }
        let signature = |hash| {
            self.model
                .get(hash)
                .and_then(|t| t.delegate_signature())
                .map(|s| s.signature_hash())
        };
        matches!((signature(actual), signature(expected)), (Some(a), Some(b)) if a == b)
    }

    // ========================================================================
    // Shutdown
    // ========================================================================

    /// Release every outstanding handle and handler.
    pub fn shutdown(self) -> ShutdownReport {
        let handlers = std::mem::take(&mut *self.handlers.write());
        let native = self.native.lock().drain();
        let managed = self.managed.lock().drain();
        let report = ShutdownReport {
            managed_released: managed.len(),
            native_released: native.len(),
            handlers_removed: handlers.len(),
        };
        if report.managed_released > 0 || report.native_released > 0 {
            warn!(
                target: "hostbridge::runtime",
                managed = report.managed_released,
                native = report.native_released,
                "outstanding handles released at shutdown"
            );
        }
        drop(managed);
        drop(native);
        info!(target: "hostbridge::runtime", handlers = report.handlers_removed, "bridge shut down");
        report
    }
}

impl std::fmt::Debug for BridgeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeContext")
            .field("types", &self.model.len())
            .field("managed", &*self.managed.lock())
            .field("native", &*self.native.lock())
            .finish_non_exhaustive()
    }
}
