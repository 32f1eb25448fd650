use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tywrap_codec::HostValue;
use tywrap_protocol::BridgeError;

/// A live instance created by `instantiate`. Implementations own whatever
/// host-native state the constructor produced and dispatch `call_method`
/// invocations against it the way the constructed function/class would.
pub trait Instance: Send {
    fn call_method(
        &mut self,
        method_name: &str,
        args: &[HostValue],
        kwargs: &[(String, HostValue)],
    ) -> Result<HostValue, BridgeError>;
}

enum Slot {
    /// Handle has been minted but the constructor has not yet completed.
    /// Only ever observed mid-`instantiate`; never exposed to a concurrent
    /// caller since the bridge processes one request at a time.
    Unborn,
    Live(Box<dyn Instance>),
    Disposed,
}

/// Handle lifecycle: `Unborn -> Live -> Disposed`. Handles are minted from a
/// monotonic counter, not derived from the instance's memory address — the
/// bridge has no stable notion of object identity to expose across the wire.
pub struct InstanceRegistry {
    next_id: AtomicU64,
    slots: HashMap<String, Slot>,
}

impl Default for InstanceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InstanceRegistry {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            slots: HashMap::new(),
        }
    }

    /// Mints a fresh handle in the `Unborn` state. The caller must follow up
    /// with [`commit`](Self::commit) or [`abandon`](Self::abandon).
    pub fn reserve(&mut self) -> String {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let handle = id.to_string();
        self.slots.insert(handle.clone(), Slot::Unborn);
        handle
    }

    /// Transitions a reserved handle to `Live` once its constructor succeeds.
    pub fn commit(&mut self, handle: &str, instance: Box<dyn Instance>) {
        self.slots.insert(handle.to_string(), Slot::Live(instance));
    }

    /// Drops a reservation whose constructor failed; the handle is never
    /// observed by a caller, so this simply removes the slot.
    pub fn abandon(&mut self, handle: &str) {
        self.slots.remove(handle);
    }

    pub fn call_method(
        &mut self,
        handle: &str,
        method_name: &str,
        args: &[HostValue],
        kwargs: &[(String, HostValue)],
    ) -> Result<HostValue, BridgeError> {
        match self.slots.get_mut(handle) {
            Some(Slot::Live(instance)) => instance.call_method(method_name, args, kwargs),
            Some(Slot::Disposed) => Err(BridgeError::InstanceHandle(handle.to_string())),
            Some(Slot::Unborn) | None => Err(BridgeError::InstanceHandle(handle.to_string())),
        }
    }

    /// Disposal is idempotent and never errors: it returns whether this call
    /// is the one that actually transitioned the handle to `Disposed`.
    /// A handle that was already disposed, never existed, or is still
    /// `Unborn` reports `false` rather than raising `InstanceHandleError` —
    /// only `call_method` treats those as a hard error.
    pub fn dispose(&mut self, handle: &str) -> bool {
        match self.slots.get(handle) {
            Some(Slot::Live(_)) => {
                self.slots.insert(handle.to_string(), Slot::Disposed);
                true
            }
            _ => false,
        }
    }

    pub fn live_count(&self) -> usize {
        self.slots
            .values()
            .filter(|slot| matches!(slot, Slot::Live(_)))
            .count()
    }
}
