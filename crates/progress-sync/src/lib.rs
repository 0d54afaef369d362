//! # Progress Sync
//!
//! Client-side cache of a user's identity and gamified progress (XP, level,
//! streak), reconciled against the remote progress service and the task and
//! module completion feeds.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Guarantees
//!
//! | Guarantee | Mechanism |
//! |-----------|-----------|
//! | Level never regresses | `XpLedger` takes `max(level, derived)` |
//! | XP never regresses on sync | Catch-up only raises, never lowers |
//! | Syncs are idempotent | Feed totals are diffed against the cache |
//! | No lost updates | One FIFO mutex around every read-modify-write |
//! | Logout is final | Session tokens discard stale saves and pushes |
//!
//! ## Module Structure
//!
//! ```text
//! progress-sync/
//! ├── domain/          # User, XpLedger, envelope, errors, invariants
//! ├── algorithms/      # Feed totals, catch-up planning
//! ├── ports/           # ProgressApi (inbound) + service/storage traits (outbound)
//! ├── application/     # SessionController, PersistedSession, ReconciliationEngine
//! ├── adapters/        # HTTP services, file/memory stores, catalog, directory
//! └── config.rs        # SyncConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use adapters::{
    FileSessionStore, HttpAuthService, HttpProgressService, InMemorySessionStore, StaticCatalog,
    StaticDirectory,
};
pub use algorithms::{apply_catch_up, module_feed_total, plan_catch_up, task_feed_total, CatchUpPlan};
pub use application::{
    BackgroundTasks, ControllerDeps, PersistedSession, ReconciliationEngine, RemoteSyncNotifier,
    SaveOutcome, SessionController, SessionGeneration, StorageChanged, StorageSignal,
};
pub use config::SyncConfig;
pub use domain::{
    FeedKind, LearningProfile, ModuleCatalogEntry, ModuleContribution, ModuleProgress,
    PersistedEnvelope, PersistedState, ProgressError, RegisterRequest, SessionPhase,
    SessionToken, SyncOutcome, TaskCompletion, User, UserPatch, UserSnapshot, XpGainReport,
    XpLedger, ENVELOPE_VERSION, MIN_LEVEL, XP_PER_LEVEL,
};
pub use ports::{
    AuthService, Catalog, Directory, MockAuthService, MockProgressService, ProgressApi,
    ProgressService, RemoteCall, SessionStore,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
