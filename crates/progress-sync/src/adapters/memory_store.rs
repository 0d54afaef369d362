use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::domain::ProgressError;
use crate::ports::outbound::SessionStore;

/// In-memory slot store for unit tests.
///
/// Writes can be made to fail to exercise the storage-failure paths.
#[derive(Default)]
pub struct InMemorySessionStore {
    slots: RwLock<HashMap<String, String>>,
    fail_writes: AtomicBool,
}

impl InMemorySessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), ProgressError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ProgressError::StorageWrite("quota exceeded".to_string()));
        }
        Ok(())
    }
}

impl SessionStore for InMemorySessionStore {
    fn read_slot(&self, slot: &str) -> Result<Option<String>, ProgressError> {
        Ok(self.slots.read().get(slot).cloned())
    }

    fn write_slot(&self, slot: &str, contents: &str) -> Result<(), ProgressError> {
        self.check_writable()?;
        self.slots
            .write()
            .insert(slot.to_string(), contents.to_string());
        Ok(())
    }
}
