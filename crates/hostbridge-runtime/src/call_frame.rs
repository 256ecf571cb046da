//! The frame a callee sees for one crossing.
//!
//! Managed bridge functions, managed delegates, native callbacks and
//! message handlers all receive a [`CallFrame`]: arguments decoded from
//! the wire, storage for the return value and for `out`/`ref` write-backs,
//! and access to the [`BridgeContext`] for handle lookups.
//!
//! Argument indices exclude the receiver; use [`CallFrame::this`] and
//! friends for it.

use std::any::Any;
use std::sync::Arc;

use hostbridge_core::{
    BridgeResult, Handle, HandleError, MarshalError, ParamDescriptor, ParamMode, TypeRef, Value,
};

use crate::context::BridgeContext;
use crate::handle_table::Acquired;
use crate::host::ObjectId;
use crate::marshal::{FromValue, IntoValue};

static VOID: TypeRef = TypeRef::Void;

/// Static description of the callee.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CallSite<'s> {
    pub symbol: &'s str,
    pub params: &'s [ParamDescriptor],
    pub returns: &'s TypeRef,
    pub has_receiver: bool,
}

impl<'s> CallSite<'s> {
    /// A site with no declared signature; arguments pass through as given.
    pub fn untyped(symbol: &'s str) -> Self {
        Self {
            symbol,
            params: &[],
            returns: &VOID,
            has_receiver: false,
        }
    }

    pub fn is_typed(&self) -> bool {
        !self.params.is_empty() || !self.returns.is_void()
    }
}

pub struct CallFrame<'a> {
    ctx: &'a BridgeContext,
    site: CallSite<'a>,
    args: Vec<Value>,
    ret: Value,
    acquired: Vec<(Handle, Acquired)>,
}

impl<'a> CallFrame<'a> {
    pub(crate) fn new(ctx: &'a BridgeContext, site: CallSite<'a>, args: Vec<Value>) -> Self {
        Self {
            ctx,
            site,
            args,
            ret: Value::Void,
            acquired: Vec::new(),
        }
    }

    pub(crate) fn into_parts(self) -> (Value, Vec<Value>, Vec<(Handle, Acquired)>) {
        (self.ret, self.args, self.acquired)
    }

    pub fn context(&self) -> &'a BridgeContext {
        self.ctx
    }

    /// Symbol of the entry, delegate type or message being served.
    pub fn symbol(&self) -> &str {
        self.site.symbol
    }

    fn offset(&self) -> usize {
        usize::from(self.site.has_receiver)
    }

    /// Number of arguments, excluding the receiver.
    pub fn arg_count(&self) -> usize {
        self.args.len() - self.offset()
    }

    fn index(&self, i: usize) -> BridgeResult<usize> {
        let index = i + self.offset();
        if index >= self.args.len() {
            return Err(MarshalError::ArgumentCount {
                entry: self.site.symbol.to_string(),
                expected: i + 1,
                got: self.arg_count(),
            }
            .into());
        }
        Ok(index)
    }

    fn receiver(&self) -> BridgeResult<&Value> {
        if !self.site.has_receiver {
            return Err(MarshalError::TypeMismatch {
                expected: "receiver".to_string(),
                actual: format!("static call {}", self.site.symbol),
            }
            .into());
        }
        Ok(&self.args[0])
    }

    pub fn arg_value(&self, i: usize) -> BridgeResult<&Value> {
        let index = self.index(i)?;
        Ok(&self.args[index])
    }

    pub fn arg<T: FromValue>(&self, i: usize) -> BridgeResult<T> {
        Ok(T::from_value(self.arg_value(i)?.clone())?)
    }

    pub fn args(&self) -> &[Value] {
        &self.args[self.offset()..]
    }

    /// The receiver converted to `T` (struct receivers, class newtypes).
    pub fn this<T: FromValue>(&self) -> BridgeResult<T> {
        Ok(T::from_value(self.receiver()?.clone())?)
    }

    /// The managed object the receiver handle denotes.
    pub fn this_object(&self) -> BridgeResult<ObjectId> {
        let receiver = self.receiver()?.clone();
        self.object_of(&receiver)
    }

    /// The managed object argument `i` denotes; null is rejected.
    pub fn object(&self, i: usize) -> BridgeResult<ObjectId> {
        let value = self.arg_value(i)?.clone();
        self.object_of(&value)
    }

    fn object_of(&self, value: &Value) -> BridgeResult<ObjectId> {
        match value {
            Value::Null => Err(HandleError::Null.into()),
            Value::Object(h) | Value::Delegate(h) => self.ctx.resolve_managed(*h),
            other => Err(MarshalError::TypeMismatch {
                expected: "object".to_string(),
                actual: other.type_name().to_string(),
            }
            .into()),
        }
    }

    /// The native object argument `i` denotes.
    pub fn native<T: Any + Send + Sync>(&self, i: usize) -> BridgeResult<Arc<T>> {
        let handle = self.arg::<Handle>(i)?;
        self.ctx.resolve_native(handle)
    }

    pub fn set_return<T: IntoValue>(&mut self, value: T) {
        self.ret = value.into_value();
    }

    pub fn return_value(&self) -> &Value {
        &self.ret
    }

    /// Return a managed object, issuing a handle for it if needed.
    pub fn return_object(&mut self, object: ObjectId) -> BridgeResult<Handle> {
        let ty = self.site.returns;
        let value = self.object_value(ty, object)?;
        let handle = value.handle().unwrap_or(Handle::NULL);
        self.ret = value;
        Ok(handle)
    }

    /// Assign an `out` or `ref` argument.
    pub fn set_out<T: IntoValue>(&mut self, i: usize, value: T) -> BridgeResult<()> {
        let index = self.index(i)?;
        self.check_writable(index)?;
        self.args[index] = value.into_value();
        Ok(())
    }

    /// Assign an `out` or `ref` argument to a managed object.
    pub fn set_out_object(&mut self, i: usize, object: ObjectId) -> BridgeResult<Handle> {
        let index = self.index(i)?;
        self.check_writable(index)?;
        let params = self.site.params;
        let ty = params.get(index).map_or(&VOID, |p| &p.ty);
        let value = self.object_value(ty, object)?;
        let handle = value.handle().unwrap_or(Handle::NULL);
        self.args[index] = value;
        Ok(handle)
    }

    /// Write an updated receiver back (struct property setters).
    pub fn set_this<T: IntoValue>(&mut self, value: T) -> BridgeResult<()> {
        self.receiver()?;
        self.check_writable(0)?;
        self.args[0] = value.into_value();
        Ok(())
    }

    fn check_writable(&self, index: usize) -> BridgeResult<()> {
        match self.site.params.get(index) {
            Some(param) if param.mode != ParamMode::In => Ok(()),
            Some(param) => Err(MarshalError::TypeMismatch {
                expected: "out or ref parameter".to_string(),
                actual: format!("in parameter '{}'", param.name),
            }
            .into()),
            // Untyped frames accept any write-back
            None if !self.site.is_typed() => Ok(()),
            None => Err(MarshalError::ArgumentCount {
                entry: self.site.symbol.to_string(),
                expected: index + 1,
                got: self.site.params.len(),
            }
            .into()),
        }
    }

    fn object_value(&mut self, ty: &TypeRef, object: ObjectId) -> BridgeResult<Value> {
        let type_hash = ty.named().ok_or_else(|| MarshalError::TypeMismatch {
            expected: self.ctx.model().display_type(ty),
            actual: "object".to_string(),
        })?;
        let (value, acquired) = self.ctx.acquire_managed(object, type_hash)?;
        if let Some(handle) = value.handle() {
            self.acquired.push((handle, acquired));
        }
        Ok(value)
    }
}

impl std::fmt::Debug for CallFrame<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallFrame")
            .field("symbol", &self.site.symbol)
            .field("args", &self.args)
            .field("ret", &self.ret)
            .finish()
    }
}
