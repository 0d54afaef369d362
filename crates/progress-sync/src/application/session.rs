//! # Persisted Session
//!
//! Owns the cached user and its durable slot. Every successful write is
//! followed by a payload-free [`StorageChanged`] broadcast; observers re-read
//! the slot.
//!
//! Each session lifetime carries a [`SessionToken`]. A save computed under a
//! token that is no longer current (logout, or a new session) is discarded.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error};

use progress_telemetry::STORAGE_WRITE_FAILURES;

use crate::domain::{PersistedEnvelope, ProgressError, SessionToken, User};
use crate::ports::outbound::SessionStore;

/// Default capacity of the storage-changed channel.
pub const DEFAULT_SIGNAL_CAPACITY: usize = 16;

/// "The persisted slot changed" notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StorageChanged;

/// Cross-context storage-changed signal.
///
/// Every context sharing the same store should share one signal.
#[derive(Clone, Debug)]
pub struct StorageSignal {
    sender: broadcast::Sender<StorageChanged>,
}

impl StorageSignal {
    /// Create a signal with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Register an observer.
    pub fn subscribe(&self) -> broadcast::Receiver<StorageChanged> {
        self.sender.subscribe()
    }

    /// Notify every observer. Returns the number of observers reached.
    pub fn notify(&self) -> usize {
        // No receivers is not an error
        self.sender.send(StorageChanged).unwrap_or(0)
    }

    /// Number of registered observers.
    pub fn observer_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for StorageSignal {
    fn default() -> Self {
        Self::new(DEFAULT_SIGNAL_CAPACITY)
    }
}

/// Shared session generation counter.
#[derive(Clone, Debug, Default)]
pub struct SessionGeneration(Arc<AtomicU64>);

impl SessionGeneration {
    /// Start at generation 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Token of the current session lifetime.
    pub fn current(&self) -> SessionToken {
        SessionToken(self.0.load(Ordering::SeqCst))
    }

    /// Whether `token` still identifies the current session lifetime.
    pub fn is_current(&self, token: SessionToken) -> bool {
        self.current() == token
    }

    /// End the current lifetime and return the token of the next one.
    pub fn advance(&self) -> SessionToken {
        SessionToken(self.0.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

/// What happened to a save request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Written and broadcast.
    Written,
    /// Computed under a stale token; nothing changed.
    Discarded,
}

/// Cached user plus its durable, versioned slot.
pub struct PersistedSession {
    store: Arc<dyn SessionStore>,
    signal: StorageSignal,
    slot: String,
    version: u32,
    user: Option<User>,
    generation: SessionGeneration,
}

impl PersistedSession {
    /// Create an empty (anonymous) session over `slot` in `store`.
    pub fn new(
        store: Arc<dyn SessionStore>,
        signal: StorageSignal,
        slot: impl Into<String>,
        version: u32,
    ) -> Self {
        Self {
            store,
            signal,
            slot: slot.into(),
            version,
            user: None,
            generation: SessionGeneration::new(),
        }
    }

    /// Read the user persisted in the slot, if the slot holds an
    /// authenticated session.
    ///
    /// Does not change the in-memory session.
    pub fn load(&self) -> Result<Option<User>, ProgressError> {
        let contents = match self.store.read_slot(&self.slot)? {
            Some(contents) => contents,
            None => return Ok(None),
        };
        let envelope: PersistedEnvelope = serde_json::from_str(&contents)?;
        if envelope.version != self.version {
            debug!(
                "[progress] Slot version {} differs from {}, loading as-is",
                envelope.version, self.version
            );
        }
        Ok(envelope.into_user())
    }

    /// The cached user.
    pub fn current(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Token of the current session lifetime.
    pub fn token(&self) -> SessionToken {
        self.generation.current()
    }

    /// Handle to the generation counter, for checks outside the session lock.
    pub fn generation(&self) -> SessionGeneration {
        self.generation.clone()
    }

    /// Register an observer of slot changes.
    pub fn subscribe(&self) -> broadcast::Receiver<StorageChanged> {
        self.signal.subscribe()
    }

    /// Begin a new session lifetime. Saves under earlier tokens are
    /// discarded from now on.
    pub fn begin(&mut self) -> SessionToken {
        self.generation.advance()
    }

    /// Replace the cached user and persist it.
    ///
    /// The in-memory user is replaced even when the write fails; the write
    /// error is returned to the caller. The broadcast only follows a
    /// successful write.
    pub fn save(&mut self, token: SessionToken, user: User) -> Result<SaveOutcome, ProgressError> {
        if !self.generation.is_current(token) {
            debug!(
                user_id = %user.id,
                "[progress] Discarding save from ended session {:?}",
                token
            );
            return Ok(SaveOutcome::Discarded);
        }

        let envelope = PersistedEnvelope::active(user.clone(), self.version);
        self.user = Some(user);
        self.write(&envelope)?;
        Ok(SaveOutcome::Written)
    }

    /// End the session: drop the cached user, persist the logged-out
    /// envelope and broadcast.
    ///
    /// The in-memory session is cleared even when the write fails.
    pub fn clear(&mut self) -> Result<(), ProgressError> {
        self.generation.advance();
        self.user = None;
        self.write(&PersistedEnvelope::logged_out(self.version))
    }

    fn write(&self, envelope: &PersistedEnvelope) -> Result<(), ProgressError> {
        let contents = serde_json::to_string(envelope)?;
        if let Err(e) = self.store.write_slot(&self.slot, &contents) {
            STORAGE_WRITE_FAILURES.inc();
            error!("[progress] Failed to persist session slot {}: {}", self.slot, e);
            return Err(e);
        }
        self.signal.notify();
        Ok(())
    }
}
