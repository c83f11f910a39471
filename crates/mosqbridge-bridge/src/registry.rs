//! Handle registry: owns live handler instances keyed by opaque handles.
//!
//! The value crossing the ABI is an integer id, never a pointer; a stale
//! or fabricated handle can therefore only fail a lookup, not dangle.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::error::BridgeError;
use crate::handler::AuthHandler;

/// Opaque token identifying one live handler instance.
///
/// Zero is never issued; it doubles as the null sentinel on the wire.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(u64);

impl Handle {
    /// Raw id as transmitted across the ABI.
    #[must_use]
    pub fn as_raw(self) -> u64 {
        self.0
    }

    /// Reconstruct a handle from its raw ABI representation.
    #[must_use]
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

/// Registry of live handler instances.
///
/// `resolve` takes the read lock and may run concurrently with other
/// lookups; `register` and `retire` take the write lock, making registry
/// mutation the critical section around the init/cleanup lifecycle.
pub struct HandleRegistry {
    entries: RwLock<HashMap<u64, Arc<dyn AuthHandler>>>,
    next_id: AtomicU64,
}

impl HandleRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Store a handler under a freshly allocated handle.
    ///
    /// Fails only if the id space has been exhausted and an id would be
    /// reissued while still live, which indicates a leak upstream.
    pub fn register(&self, handler: Arc<dyn AuthHandler>) -> Result<Handle, BridgeError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut entries = self.entries.write();
        if entries.insert(id, handler).is_some() {
            return Err(BridgeError::Registration(format!(
                "handle id {id} reissued while still registered"
            )));
        }
        tracing::debug!(handle = id, live = entries.len(), "handler registered");
        Ok(Handle(id))
    }

    /// Look up the live handler for a handle.
    ///
    /// An unknown or retired handle is a host/plugin protocol violation.
    pub fn resolve(&self, handle: Handle) -> Result<Arc<dyn AuthHandler>, BridgeError> {
        self.entries
            .read()
            .get(&handle.0)
            .cloned()
            .ok_or(BridgeError::InvalidHandle(handle.0))
    }

    /// Remove a handle, releasing the registry's reference.
    ///
    /// Returns the handler so the caller can still run its cleanup hook
    /// after the entry is gone. Double retirement fails.
    pub fn retire(&self, handle: Handle) -> Result<Arc<dyn AuthHandler>, BridgeError> {
        let mut entries = self.entries.write();
        let handler = entries
            .remove(&handle.0)
            .ok_or(BridgeError::InvalidHandle(handle.0))?;
        tracing::debug!(handle = handle.0, live = entries.len(), "handler retired");
        Ok(handler)
    }

    /// Number of live handler instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether no handler instance is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Default for HandleRegistry {
    fn default() -> Self {
        Self::new()
    }
}
