//! A managed host simulated in-process.
//!
//! [`InProcessHost`] models the parts of a garbage-collected runtime the
//! bridge depends on: objects with identities, a moving collector that
//! reclaims unreachable objects and relocates the survivors, pins that
//! hold an object alive and in place, and delegates. Tests and benches use
//! it as the managed side of a [`BridgeContext`](crate::BridgeContext).

use std::any::Any;
use std::sync::Arc;

use hostbridge_core::{BridgeResult, HandleError, ManagedException};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::call_frame::CallFrame;
use crate::host::{ManagedHost, ObjectId, ThreadingContract};
use crate::native_fn::ManagedFn;

/// Distance between consecutive simulated addresses.
const ADDRESS_STRIDE: usize = 16;

struct HostObject {
    type_name: String,
    address: usize,
    pins: u32,
    rooted: bool,
    data: Box<dyn Any + Send>,
    delegate: Option<ManagedFn>,
}

#[derive(Default)]
struct HostState {
    next_id: u64,
    next_address: usize,
    objects: FxHashMap<ObjectId, HostObject>,
    collections: u64,
}

impl HostState {
    fn bump_address(&mut self) -> usize {
        self.next_address += ADDRESS_STRIDE;
        self.next_address
    }
}

/// Outcome of one collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CollectionStats {
    pub reclaimed: usize,
    pub relocated: usize,
    pub pinned: usize,
}

pub struct InProcessHost {
    state: Mutex<HostState>,
    threading: ThreadingContract,
}

impl InProcessHost {
    pub fn new() -> Arc<Self> {
        Self::with_threading(ThreadingContract::OwnerThread)
    }

    pub fn with_threading(threading: ThreadingContract) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(HostState::default()),
            threading,
        })
    }

    fn insert(&self, type_name: &str, data: Box<dyn Any + Send>, delegate: Option<ManagedFn>) -> ObjectId {
        let mut state = self.state.lock();
        state.next_id += 1;
        let id = ObjectId(state.next_id);
        let address = state.bump_address();
        state.objects.insert(
            id,
            HostObject {
                type_name: type_name.to_string(),
                address,
                pins: 0,
                rooted: false,
                data,
                delegate,
            },
        );
        id
    }

    /// Allocate an unrooted object; it survives a collection only while
    /// pinned or rooted.
    pub fn alloc<T: Any + Send>(&self, type_name: &str, value: T) -> ObjectId {
        self.insert(type_name, Box::new(value), None)
    }

    /// Allocate a delegate object backed by `f`.
    pub fn alloc_delegate<F>(&self, type_name: &str, f: F) -> ObjectId
    where
        F: Fn(&mut CallFrame<'_>) -> Result<(), ManagedException> + Send + Sync + 'static,
    {
        self.insert(type_name, Box::new(()), Some(ManagedFn::new(f)))
    }

    /// Keep an object reachable from managed roots.
    pub fn root(&self, object: ObjectId) {
        if let Some(obj) = self.state.lock().objects.get_mut(&object) {
            obj.rooted = true;
        }
    }

    pub fn unroot(&self, object: ObjectId) {
        if let Some(obj) = self.state.lock().objects.get_mut(&object) {
            obj.rooted = false;
        }
    }

    pub fn is_alive(&self, object: ObjectId) -> bool {
        self.state.lock().objects.contains_key(&object)
    }

    pub fn address_of(&self, object: ObjectId) -> Option<usize> {
        self.state.lock().objects.get(&object).map(|o| o.address)
    }

    pub fn pin_count(&self, object: ObjectId) -> u32 {
        self.state.lock().objects.get(&object).map_or(0, |o| o.pins)
    }

    pub fn type_name_of(&self, object: ObjectId) -> Option<String> {
        self.state.lock().objects.get(&object).map(|o| o.type_name.clone())
    }

    pub fn object_count(&self) -> usize {
        self.state.lock().objects.len()
    }

    pub fn collections(&self) -> u64 {
        self.state.lock().collections
    }

    /// Run `f` on an object's data.
    ///
    /// The host is locked while `f` runs; `f` must not call back into the
    /// host or the bridge.
    pub fn with_object<T: Any, R>(&self, object: ObjectId, f: impl FnOnce(&mut T) -> R) -> Result<R, ManagedException> {
        let mut state = self.state.lock();
        let obj = state.objects.get_mut(&object).ok_or_else(|| {
            ManagedException::new("System.NullReferenceException", format!("{object} has been collected"))
        })?;
        let type_name = obj.type_name.clone();
        let data = obj.data.downcast_mut::<T>().ok_or_else(|| {
            ManagedException::new(
                "System.InvalidCastException",
                format!("{object} is a {type_name}, not {}", std::any::type_name::<T>()),
            )
        })?;
        Ok(f(data))
    }

    /// Reclaim every object that is neither pinned nor rooted, then move
    /// the unpinned survivors.
    pub fn collect(&self) -> CollectionStats {
        let mut state = self.state.lock();
        let before = state.objects.len();
        state.objects.retain(|_, obj| obj.pins > 0 || obj.rooted);
        let mut stats = CollectionStats {
            reclaimed: before - state.objects.len(),
            ..Default::default()
        };

        let mut movable: Vec<ObjectId> = state
            .objects
            .iter()
            .filter(|(_, obj)| obj.pins == 0)
            .map(|(id, _)| *id)
            .collect();
        movable.sort();
        for id in movable {
            let address = state.bump_address();
            if let Some(obj) = state.objects.get_mut(&id) {
                obj.address = address;
                stats.relocated += 1;
            }
        }
        stats.pinned = state.objects.len() - stats.relocated;
        state.collections += 1;
        debug!(
            target: "hostbridge::runtime",
            reclaimed = stats.reclaimed,
            relocated = stats.relocated,
            pinned = stats.pinned,
            "collection finished"
        );
        stats
    }
}

impl ManagedHost for InProcessHost {
    fn threading(&self) -> ThreadingContract {
        self.threading
    }

    fn pin(&self, object: ObjectId) -> BridgeResult<()> {
        let mut state = self.state.lock();
        let obj = state
            .objects
            .get_mut(&object)
            .ok_or(HandleError::Collected { object: object.0 })?;
        obj.pins += 1;
        Ok(())
    }

    fn unpin(&self, object: ObjectId) {
        if let Some(obj) = self.state.lock().objects.get_mut(&object) {
            obj.pins = obj.pins.saturating_sub(1);
        }
    }

    fn invoke_delegate(&self, delegate: ObjectId, frame: &mut CallFrame<'_>) -> Result<(), ManagedException> {
        let function = {
            let state = self.state.lock();
            let obj = state.objects.get(&delegate).ok_or_else(|| {
                ManagedException::new("System.NullReferenceException", format!("{delegate} has been collected"))
            })?;
            obj.delegate.clone().ok_or_else(|| {
                ManagedException::new(
                    "System.InvalidCastException",
                    format!("{delegate} is a {}, not a delegate", obj.type_name),
                )
            })?
        };
        function.call(frame)
    }
}
