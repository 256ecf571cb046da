//! Generational handle tables.
//!
//! One table per direction maps handles to the object they denote. Slots
//! are reused lowest-first; every release bumps the slot's generation so a
//! handle issued before the release can never resolve again. A slot whose
//! generation is exhausted is retired instead of wrapping. Slot `0` is
//! reserved for null.

use std::collections::BTreeSet;
use std::fmt;
use std::hash::Hash;

use hostbridge_core::{Direction, Handle, HandleError, TypeHash};
use rustc_hash::FxHashMap;

const GENERATION_MASK: u32 = 0x7fff_ffff;

/// How repeated acquisitions of the same object are counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReleasePolicy {
    /// Re-acquiring is a lookup; the first release frees the slot.
    #[default]
    SingleOwner,
    /// Each acquisition adds a reference; the slot is freed at zero.
    RefCounted,
}

/// Whether an acquisition created the slot or found it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquired {
    New,
    Existing,
}

/// A live slot's payload.
pub struct Entry<K, T> {
    pub key: K,
    pub value: T,
    pub type_hash: TypeHash,
    pub ref_count: u32,
}

struct Slot<K, T> {
    generation: u32,
    entry: Option<Entry<K, T>>,
}

/// Handle table keyed by object identity `K`.
pub struct HandleTable<K, T> {
    direction: Direction,
    policy: ReleasePolicy,
    slots: Vec<Slot<K, T>>,
    free: BTreeSet<u32>,
    by_identity: FxHashMap<K, u32>,
}

impl<K: Copy + Eq + Hash, T> HandleTable<K, T> {
    pub fn new(direction: Direction, policy: ReleasePolicy) -> Self {
        Self {
            direction,
            policy,
            // Slot 0 stands for null and is never handed out
            slots: vec![Slot {
                generation: 0,
                entry: None,
            }],
            free: BTreeSet::new(),
            by_identity: FxHashMap::default(),
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn policy(&self) -> ReleasePolicy {
        self.policy
    }

    /// Number of live handles.
    pub fn len(&self) -> usize {
        self.by_identity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_identity.is_empty()
    }

    /// Number of slots ever allocated, live or free.
    pub fn capacity(&self) -> usize {
        self.slots.len() - 1
    }

    fn handle_for(&self, id: u32) -> Handle {
        Handle::new(id, self.slots[id as usize].generation, self.direction)
    }

    /// Handle currently issued for `key`, if any.
    pub fn handle_of(&self, key: &K) -> Option<Handle> {
        self.by_identity.get(key).map(|&id| self.handle_for(id))
    }

    /// Return the handle for `key`, creating a slot with `make` if the
    /// object has none yet.
    pub fn acquire<E>(
        &mut self,
        key: K,
        type_hash: TypeHash,
        make: impl FnOnce() -> Result<T, E>,
    ) -> Result<(Handle, Acquired), E>
    where
        E: From<HandleError>,
    {
        if let Some(&id) = self.by_identity.get(&key) {
            if self.policy == ReleasePolicy::RefCounted
                && let Some(entry) = self.slots[id as usize].entry.as_mut()
            {
                entry.ref_count = entry.ref_count.saturating_add(1);
            }
            return Ok((self.handle_for(id), Acquired::Existing));
        }

        let id = match self.free.first() {
            Some(&id) => id,
            None => u32::try_from(self.slots.len()).map_err(|_| HandleError::Exhausted)?,
        };
        let value = make()?;
        let entry = Entry {
            key,
            value,
            type_hash,
            ref_count: 1,
        };
        if self.free.remove(&id) {
            self.slots[id as usize].entry = Some(entry);
        } else {
            self.slots.push(Slot {
                generation: 0,
                entry: Some(entry),
            });
        }
        self.by_identity.insert(key, id);
        Ok((self.handle_for(id), Acquired::New))
    }

    /// Resolve a handle to its live entry.
    pub fn resolve(&self, handle: Handle) -> Result<&Entry<K, T>, HandleError> {
        let id = self.check(handle)?;
        self.slots[id]
            .entry
            .as_ref()
            .ok_or(HandleError::Stale { handle })
    }

    fn check(&self, handle: Handle) -> Result<usize, HandleError> {
        if handle.is_null() {
            return Err(HandleError::Null);
        }
        if handle.direction != self.direction {
            return Err(HandleError::WrongDirection {
                handle,
                expected: self.direction,
            });
        }
        let id = handle.id as usize;
        let slot = self.slots.get(id).ok_or(HandleError::Unknown { handle })?;
        if slot.generation != handle.generation || slot.entry.is_none() {
            return Err(HandleError::Stale { handle });
        }
        Ok(id)
    }

    pub fn is_live(&self, handle: Handle) -> bool {
        self.check(handle).is_ok()
    }

    pub fn ref_count(&self, handle: Handle) -> Option<u32> {
        self.resolve(handle).ok().map(|e| e.ref_count)
    }

    /// Drop one reference; returns the value once the slot is freed.
    ///
    /// Releasing an already released handle fails with
    /// [`HandleError::Stale`] and leaves the table untouched.
    pub fn release(&mut self, handle: Handle) -> Result<Option<T>, HandleError> {
        let id = self.check(handle)?;
        if self.policy == ReleasePolicy::RefCounted
            && let Some(entry) = self.slots[id].entry.as_mut()
            && entry.ref_count > 1
        {
            entry.ref_count -= 1;
            return Ok(None);
        }
        Ok(self.free_slot(id))
    }

    /// Free the slot regardless of its reference count.
    pub fn force_release(&mut self, handle: Handle) -> Result<T, HandleError> {
        let id = self.check(handle)?;
        self.free_slot(id).ok_or(HandleError::Stale { handle })
    }

    fn free_slot(&mut self, id: usize) -> Option<T> {
        let slot = &mut self.slots[id];
        let entry = slot.entry.take()?;
        self.by_identity.remove(&entry.key);
        if slot.generation < GENERATION_MASK {
            slot.generation += 1;
            self.free.insert(id as u32);
        }
        Some(entry.value)
    }

    /// Free every live slot, returning the released handles and values in
    /// slot order.
    pub fn drain(&mut self) -> Vec<(Handle, T)> {
        let live: Vec<u32> = {
            let mut ids: Vec<u32> = self.by_identity.values().copied().collect();
            ids.sort_unstable();
            ids
        };
        live.into_iter()
            .filter_map(|id| {
                let handle = self.handle_for(id);
                self.free_slot(id as usize).map(|value| (handle, value))
            })
            .collect()
    }

    /// Iterate over live handles and entries in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &Entry<K, T>)> {
        self.slots.iter().enumerate().filter_map(move |(id, slot)| {
            slot.entry
                .as_ref()
                .map(|e| (Handle::new(id as u32, slot.generation, self.direction), e))
        })
    }
}

impl<K, T> fmt::Debug for HandleTable<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleTable")
            .field("direction", &self.direction)
            .field("policy", &self.policy)
            .field("live", &self.by_identity.len())
            .field("slot_count", &(self.slots.len() - 1))
            .field("free_count", &self.free.len())
            .finish()
    }
}
