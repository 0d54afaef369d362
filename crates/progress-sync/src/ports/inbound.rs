//! # Inbound Ports
//!
//! API trait defining what the progress session can do.

use async_trait::async_trait;

use crate::domain::{ProgressError, RegisterRequest, SessionPhase, SyncOutcome, User, UserPatch};

/// Progress session API - inbound port.
#[async_trait]
pub trait ProgressApi: Send + Sync {
    /// Authenticate and start a session.
    ///
    /// Falls back to the directory when the auth service rejects the
    /// credentials.
    async fn login(&self, email: &str, password: &str) -> Result<User, ProgressError>;

    /// Register an account and start a session for it.
    async fn register(&self, request: RegisterRequest) -> Result<User, ProgressError>;

    /// Restore the session persisted by an earlier run, if any.
    ///
    /// Returns `true` when a session was restored.
    async fn hydrate(&self) -> Result<bool, ProgressError>;

    /// Start (or replace) the session with `user`.
    async fn start(&self, user: User) -> Result<User, ProgressError>;

    /// Credit an explicitly earned XP amount.
    ///
    /// Returns `Ok(None)` without effect when no session is active.
    async fn gain(&self, amount: i64, source: &str) -> Result<Option<User>, ProgressError>;

    /// Shallow-merge `updates` into the cached user without going through
    /// the ledger.
    async fn patch(&self, updates: UserPatch) -> Result<Option<User>, ProgressError>;

    /// End the session.
    async fn logout(&self) -> Result<(), ProgressError>;

    /// Raise cached XP to the completed-task total if it is behind.
    async fn sync_completed_tasks_xp(&self) -> SyncOutcome;

    /// Raise cached XP to the completed-module total if it is behind.
    async fn sync_completed_modules_xp(&self) -> SyncOutcome;

    /// The cached user.
    async fn current_user(&self) -> Option<User>;

    /// Current session phase.
    async fn phase(&self) -> SessionPhase;
}
