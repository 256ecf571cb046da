//! Runtime half of the bridge.
//!
//! Generated native bindings call into a [`BridgeContext`], which marshals
//! every crossing through the canonical wire layout, keeps managed objects
//! pinned behind generational handles, and intercepts exceptions in both
//! directions. The runtime depends only on the binding model from
//! `hostbridge-core`, never on reflection data.
//!
//! ## Modules
//!
//! - [`context`]: [`BridgeContext`] lifecycle and crossings
//! - [`handle_table`]: generational handle tables
//! - [`host`]: the managed host interface and pinning
//! - [`in_process`]: a simulated moving, pin-aware managed host
//! - [`marshal`]: wire layout and value conversions
//! - [`call_frame`]: what a callee sees for one crossing
//! - [`exception`]: interception and the raise policy
//!
//! ## Example
//!
//! ```ignore
//! let ctx = BridgeContext::initialize(host, entries, model, BridgeOptions::default())?;
//! let logger = Logger::new(&ctx)?;
//! logger.log(&ctx, "hello")?;
//! logger.release(&ctx)?;
//! ctx.shutdown();
//! ```

pub mod call_frame;
pub mod context;
pub mod entry_table;
pub mod exception;
pub mod handle_table;
pub mod host;
pub mod in_process;
pub mod marshal;
pub mod native_fn;
mod thread_guard;

pub use call_frame::CallFrame;
pub use context::{BridgeContext, BridgeOptions, BridgeStats, ShutdownReport};
pub use entry_table::ManagedEntryTable;
pub use exception::{MANAGED_PANIC_TYPE, catch_raised, panic_message, raise};
pub use handle_table::{Acquired, HandleTable, ReleasePolicy};
pub use host::{ManagedHost, ObjectId, PinnedObject, ThreadingContract};
pub use in_process::{CollectionStats, InProcessHost};
pub use marshal::{
    BridgeEnum, BridgeStruct, FromValue, HandleType, IntoValue, OutSlot, enum_from_value,
    enum_to_value, handle_from_value, handle_to_value, struct_from_value, struct_to_value,
};
pub use native_fn::{ManagedCallable, ManagedFn, NativeCallable, NativeFn};

pub use hostbridge_core::{
    ArrayValue, BindingModel, BridgeError, BridgeResult, CrossBoundaryException, Direction, EntryId,
    Handle, HandleError, ManagedException, MarshalError, TypeHash, TypeKind, Value,
};

/// Everything generated bindings refer to.
pub mod prelude {
    pub use crate::{
        ArrayValue, BridgeContext, BridgeEnum, BridgeError, BridgeResult, BridgeStruct, CallFrame, EntryId,
        FromValue, Handle, HandleType, IntoValue, MarshalError, OutSlot, TypeHash, TypeKind, Value,
        enum_from_value, enum_to_value, handle_from_value, handle_to_value, raise,
        struct_from_value, struct_to_value,
    };
}
