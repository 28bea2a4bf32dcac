//! Reference bridge
//!
//! Opaque host values cross to the managed side as handles and come back
//! unchanged. Nothing is copied or inspected. With interning enabled, every
//! wrap of the same host identity inside one call scope gets the same slot.

use std::cell::RefCell;

use rustc_hash::FxHashMap;

use hostbridge_sdk::{BridgeError, BridgeResult, HostHandle, HostValue, Identity, ManagedValue};

/// Slot table for interned host references.
///
/// Interned values are pinned here until the table is dropped, so an identity
/// address cannot be reused by another host value while its slot is live.
/// Views are keyed by their bytes and their element kind and order.
#[derive(Debug)]
pub struct ReferenceTable<'r> {
    next_slot: u64,
    by_identity: FxHashMap<Identity, u64>,
    pinned: FxHashMap<u64, HostValue<'r>>,
}

impl<'r> ReferenceTable<'r> {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            next_slot: 1,
            by_identity: FxHashMap::default(),
            pinned: FxHashMap::default(),
        }
    }

    /// Slot for `value`, allocating one on first sight.
    ///
    /// Primitives have no identity and are never interned.
    pub fn intern(&mut self, value: &HostValue<'r>) -> Option<u64> {
        let identity = value.identity()?;
        if let Some(&slot) = self.by_identity.get(&identity) {
            return Some(slot);
        }
        let slot = self.next_slot;
        self.next_slot += 1;
        self.by_identity.insert(identity, slot);
        self.pinned.insert(slot, value.clone());
        Some(slot)
    }

    /// Host value held in `slot`
    pub fn get(&self, slot: u64) -> Option<&HostValue<'r>> {
        self.pinned.get(&slot)
    }

    /// Release a slot
    pub fn release(&mut self, slot: u64) -> bool {
        match self.pinned.remove(&slot) {
            Some(value) => {
                if let Some(identity) = value.identity() {
                    self.by_identity.remove(&identity);
                }
                true
            }
            None => false,
        }
    }

    /// Number of live slots
    pub fn len(&self) -> usize {
        self.pinned.len()
    }

    /// Whether no slot is live
    pub fn is_empty(&self) -> bool {
        self.pinned.is_empty()
    }
}

impl Default for ReferenceTable<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Wraps host values into managed handles and back
#[derive(Debug, Default)]
pub struct ReferenceBridge<'r> {
    table: Option<RefCell<ReferenceTable<'r>>>,
}

impl<'r> ReferenceBridge<'r> {
    /// Create a bridge; `intern` enables the per-scope slot table
    pub fn new(intern: bool) -> Self {
        Self {
            table: intern.then(|| RefCell::new(ReferenceTable::new())),
        }
    }

    /// Handle for a non-null host value; `None` for `null`/`undefined`
    pub fn handle(&self, value: &HostValue<'r>) -> Option<HostHandle<'r>> {
        if value.is_nullish() {
            return None;
        }
        let slot = self
            .table
            .as_ref()
            .and_then(|table| table.borrow_mut().intern(value));
        Some(HostHandle::new(value.clone(), slot))
    }

    /// Host → managed: a handle, or `Null` for `null`/`undefined`
    pub fn wrap(&self, value: &HostValue<'r>) -> ManagedValue<'r> {
        match self.handle(value) {
            Some(handle) => ManagedValue::Ref(handle),
            None => ManagedValue::Null,
        }
    }

    /// Managed → host: the original host value; `Null` maps to `null`
    pub fn unwrap(&self, value: &ManagedValue<'r>) -> BridgeResult<HostValue<'r>> {
        match value {
            ManagedValue::Null => Ok(HostValue::Null),
            ManagedValue::Ref(handle) => Ok(self.resolve(handle)),
            other => Err(BridgeError::mismatch("ref", other.type_name())),
        }
    }

    /// Host value behind a handle
    pub fn resolve(&self, handle: &HostHandle<'r>) -> HostValue<'r> {
        handle.target().clone()
    }

    /// Number of interned slots (0 when interning is off)
    pub fn interned(&self) -> usize {
        self.table
            .as_ref()
            .map_or(0, |table| table.borrow().len())
    }
}
