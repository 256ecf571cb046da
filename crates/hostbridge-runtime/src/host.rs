//! The managed host as seen from native code.
//!
//! The bridge never touches managed memory directly. It asks the host to
//! pin an object for as long as a handle refers to it and to invoke
//! managed delegates; everything else goes through the entry table handed
//! over at initialization.

use std::fmt;
use std::sync::Arc;

use hostbridge_core::{BridgeResult, ManagedException};

use crate::call_frame::CallFrame;

/// Identity of a managed object, stable across relocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "obj:{}", self.0)
    }
}

/// Which threads may cross the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThreadingContract {
    /// Only the thread that initialized the bridge.
    #[default]
    OwnerThread,
    /// Any thread; the host serializes access itself.
    Reentrant,
}

/// Services the managed runtime provides to the bridge.
pub trait ManagedHost: Send + Sync {
    fn threading(&self) -> ThreadingContract {
        ThreadingContract::OwnerThread
    }

    /// Keep `object` alive and in place until the matching [`unpin`](Self::unpin).
    ///
    /// Pins nest: an object pinned twice stays pinned until unpinned twice.
    fn pin(&self, object: ObjectId) -> BridgeResult<()>;

    fn unpin(&self, object: ObjectId);

    /// Invoke a managed delegate with the arguments in `frame`.
    fn invoke_delegate(&self, delegate: ObjectId, frame: &mut CallFrame<'_>) -> Result<(), ManagedException>;
}

/// A managed object pinned for the lifetime of this value.
pub struct PinnedObject {
    object: ObjectId,
    host: Arc<dyn ManagedHost>,
}

impl PinnedObject {
    pub fn new(host: Arc<dyn ManagedHost>, object: ObjectId) -> BridgeResult<Self> {
        host.pin(object)?;
        Ok(Self { object, host })
    }

    pub fn object(&self) -> ObjectId {
        self.object
    }
}

impl Drop for PinnedObject {
    fn drop(&mut self) {
        self.host.unpin(self.object);
    }
}

impl fmt::Debug for PinnedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PinnedObject").field(&self.object).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InProcessHost;

    #[test]
    fn pin_lasts_until_drop() {
        let host = InProcessHost::new();
        let object = host.alloc("Logger", ());
        let pinned = PinnedObject::new(host.clone(), object).unwrap();
        assert_eq!(host.pin_count(object), 1);
        drop(pinned);
        assert_eq!(host.pin_count(object), 0);
    }

    #[test]
    fn pinning_a_collected_object_fails() {
        let host = InProcessHost::new();
        let object = host.alloc("Logger", ());
        host.collect();
        assert!(PinnedObject::new(host.clone(), object).is_err());
    }
}
