//! # Application Module
//!
//! The session controller and the services it orchestrates.

pub mod controller;
pub mod notifier;
pub mod reconciliation;
pub mod session;
pub mod tasks;

pub use controller::{ControllerDeps, SessionController};
pub use notifier::RemoteSyncNotifier;
pub use reconciliation::ReconciliationEngine;
pub use session::{
    PersistedSession, SaveOutcome, SessionGeneration, StorageChanged, StorageSignal,
    DEFAULT_SIGNAL_CAPACITY,
};
pub use tasks::BackgroundTasks;
