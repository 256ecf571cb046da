//! Exception interception at the boundary.
//!
//! Nothing unwinds across the boundary. A managed exception thrown while
//! serving a native-initiated call becomes a
//! [`CrossBoundaryException`](hostbridge_core::CrossBoundaryException);
//! a native error or panic while serving a managed-initiated call becomes
//! a [`ManagedException`] carrying its text. Handles issued during a call
//! that then fails are released by [`CallScope`].

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use hostbridge_core::{BridgeError, BridgeResult, Handle, ManagedException, NATIVE_EXCEPTION_TYPE};
use tracing::warn;

use crate::context::BridgeContext;
use crate::handle_table::Acquired;

/// Exception type reported when simulated managed code panics.
pub const MANAGED_PANIC_TYPE: &str = "System.Exception";

/// Unwrap a crossing result, unwinding with the error as panic payload.
///
/// Generated code compiled with the raise error policy calls this on every
/// crossing; [`catch_raised`] turns the unwind back into a value.
pub fn raise<T>(result: BridgeResult<T>) -> T {
    match result {
        Ok(value) => value,
        Err(error) => panic::panic_any(error),
    }
}

/// Run `f`, catching an error raised by [`raise`].
///
/// Any other panic keeps unwinding.
pub fn catch_raised<R>(f: impl FnOnce() -> R) -> BridgeResult<R> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => Ok(value),
        Err(payload) => match payload.downcast::<BridgeError>() {
            Ok(error) => Err(*error),
            Err(other) => panic::resume_unwind(other),
        },
    }
}

/// Best-effort text of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(error) = payload.downcast_ref::<BridgeError>() {
        error.to_string()
    } else if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Run native code serving a managed-initiated call.
pub(crate) fn guard_native(symbol: &str, f: impl FnOnce() -> BridgeResult<()>) -> Result<(), ManagedException> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(error)) => {
            warn!(target: "hostbridge::runtime", symbol, %error, "native failure translated to managed exception");
            Err(error.into())
        }
        Err(payload) => {
            let message = match payload.downcast::<BridgeError>() {
                Ok(error) => return Err((*error).into()),
                Err(payload) => panic_message(payload.as_ref()),
            };
            warn!(target: "hostbridge::runtime", symbol, %message, "native panic translated to managed exception");
            Err(ManagedException::new(NATIVE_EXCEPTION_TYPE, format!("panicked: {message}")))
        }
    }
}

/// Run managed code serving a native-initiated call.
pub(crate) fn guard_managed(
    symbol: &str,
    f: impl FnOnce() -> Result<(), ManagedException>,
) -> Result<(), ManagedException> {
    let outcome = match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(outcome) => outcome,
        Err(payload) => Err(ManagedException::new(MANAGED_PANIC_TYPE, panic_message(payload.as_ref()))),
    };
    if let Err(exception) = &outcome {
        warn!(target: "hostbridge::runtime", symbol, %exception, "managed exception intercepted at boundary");
    }
    outcome
}

/// Handles issued during one crossing.
///
/// Dropping the scope without [`commit`](Self::commit) releases them.
pub(crate) struct CallScope<'a> {
    ctx: &'a BridgeContext,
    acquired: Vec<(Handle, Acquired)>,
}

impl<'a> CallScope<'a> {
    pub fn new(ctx: &'a BridgeContext, acquired: Vec<(Handle, Acquired)>) -> Self {
        Self { ctx, acquired }
    }

    pub fn commit(mut self) {
        self.acquired.clear();
    }
}

impl Drop for CallScope<'_> {
    fn drop(&mut self) {
        if !self.acquired.is_empty() {
            self.ctx.roll_back(std::mem::take(&mut self.acquired));
        }
    }
}
