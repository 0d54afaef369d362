//! # Outbound Ports
//!
//! Traits for external collaborators: the remote progress service, the auth
//! service, the fallback directory, the module catalog and durable storage.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use crate::domain::{
    ModuleCatalogEntry, ModuleProgress, ProgressError, RegisterRequest, TaskCompletion, User,
    UserSnapshot, XpGainReport,
};

/// Remote progress service - outbound port.
#[async_trait]
pub trait ProgressService: Send + Sync {
    /// Idempotent create-or-update of the user record.
    async fn upsert_user(&self, snapshot: &UserSnapshot) -> Result<(), ProgressError>;

    /// Audit-style push of an explicit XP gain.
    async fn report_xp_gain(&self, report: &XpGainReport) -> Result<(), ProgressError>;

    /// Completed tasks for a user.
    async fn get_completed_tasks(&self, user_id: &str)
        -> Result<Vec<TaskCompletion>, ProgressError>;

    /// Per-module progress for a user.
    async fn get_module_progress(&self, user_id: &str)
        -> Result<Vec<ModuleProgress>, ProgressError>;
}

/// Credential service - outbound port.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Exchange credentials for a user record.
    async fn login(&self, email: &str, password: &str) -> Result<User, ProgressError>;

    /// Create an account.
    async fn register(&self, request: &RegisterRequest) -> Result<User, ProgressError>;
}

/// Fallback user table consulted when the auth service rejects a login.
pub trait Directory: Send + Sync {
    /// Find a user by email.
    fn find_by_email(&self, email: &str) -> Option<User>;
}

/// Module catalog - maps a module id to its XP reward.
pub trait Catalog: Send + Sync {
    /// Look up a module.
    fn lookup(&self, module_id: &str) -> Option<ModuleCatalogEntry>;
}

/// Durable named-slot storage shared by every context on this device.
pub trait SessionStore: Send + Sync {
    /// Read a slot's contents.
    fn read_slot(&self, slot: &str) -> Result<Option<String>, ProgressError>;

    /// Replace a slot's contents.
    fn write_slot(&self, slot: &str, contents: &str) -> Result<(), ProgressError>;
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Recorded call on [`MockProgressService`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RemoteCall {
    /// `upsert_user`
    Upsert(UserSnapshot),
    /// `report_xp_gain`
    ReportGain(XpGainReport),
    /// `get_completed_tasks`
    FetchTasks(String),
    /// `get_module_progress`
    FetchModules(String),
}

/// Scriptable in-memory progress service.
#[derive(Default)]
pub struct MockProgressService {
    tasks: Mutex<Vec<TaskCompletion>>,
    modules: Mutex<Vec<ModuleProgress>>,
    calls: Mutex<Vec<RemoteCall>>,
    fail_feeds: AtomicBool,
    fail_notifications: AtomicBool,
    feed_gate: Mutex<Option<Arc<Notify>>>,
}

impl MockProgressService {
    /// Create an empty service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the task feed.
    pub fn set_tasks(&self, tasks: Vec<TaskCompletion>) {
        *self.tasks.lock() = tasks;
    }

    /// Replace the task feed with one completion per points value.
    pub fn set_task_points(&self, points: &[u64]) {
        self.set_tasks(points.iter().map(|&p| TaskCompletion { points: p }).collect());
    }

    /// Replace the module feed.
    pub fn set_modules(&self, modules: Vec<ModuleProgress>) {
        *self.modules.lock() = modules;
    }

    /// Make both feed calls fail.
    pub fn fail_feeds(&self, fail: bool) {
        self.fail_feeds.store(fail, Ordering::SeqCst);
    }

    /// Make upsert and report calls fail.
    pub fn fail_notifications(&self, fail: bool) {
        self.fail_notifications.store(fail, Ordering::SeqCst);
    }

    /// Hold every feed call until the returned handle is notified.
    pub fn gate_feeds(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.feed_gate.lock() = Some(gate.clone());
        gate
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().clone()
    }

    /// Upserted snapshots, in order.
    pub fn upserts(&self) -> Vec<UserSnapshot> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                RemoteCall::Upsert(s) => Some(s.clone()),
                _ => None,
            })
            .collect()
    }

    /// Reported gains, in order.
    pub fn gain_reports(&self) -> Vec<XpGainReport> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                RemoteCall::ReportGain(r) => Some(r.clone()),
                _ => None,
            })
            .collect()
    }

    async fn wait_gate(&self) {
        let gate = self.feed_gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }
}

#[async_trait]
impl ProgressService for MockProgressService {
    async fn upsert_user(&self, snapshot: &UserSnapshot) -> Result<(), ProgressError> {
        self.calls.lock().push(RemoteCall::Upsert(snapshot.clone()));
        if self.fail_notifications.load(Ordering::SeqCst) {
            return Err(ProgressError::RemoteNotify("Mock failure".to_string()));
        }
        Ok(())
    }

    async fn report_xp_gain(&self, report: &XpGainReport) -> Result<(), ProgressError> {
        self.calls.lock().push(RemoteCall::ReportGain(report.clone()));
        if self.fail_notifications.load(Ordering::SeqCst) {
            return Err(ProgressError::RemoteNotify("Mock failure".to_string()));
        }
        Ok(())
    }

    async fn get_completed_tasks(
        &self,
        user_id: &str,
    ) -> Result<Vec<TaskCompletion>, ProgressError> {
        self.calls.lock().push(RemoteCall::FetchTasks(user_id.to_string()));
        self.wait_gate().await;
        if self.fail_feeds.load(Ordering::SeqCst) {
            return Err(ProgressError::FeedFetch("Mock failure".to_string()));
        }
        Ok(self.tasks.lock().clone())
    }

    async fn get_module_progress(
        &self,
        user_id: &str,
    ) -> Result<Vec<ModuleProgress>, ProgressError> {
        self.calls.lock().push(RemoteCall::FetchModules(user_id.to_string()));
        self.wait_gate().await;
        if self.fail_feeds.load(Ordering::SeqCst) {
            return Err(ProgressError::FeedFetch("Mock failure".to_string()));
        }
        Ok(self.modules.lock().clone())
    }
}

/// Auth service that accepts a fixed set of email/password pairs.
#[derive(Default)]
pub struct MockAuthService {
    accounts: Mutex<HashMap<String, (String, User)>>,
    reject_registration: Mutex<Option<String>>,
    unreachable: AtomicBool,
}

impl MockAuthService {
    /// Create a service with no accounts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an account.
    pub fn with_account(self, password: &str, user: User) -> Self {
        self.accounts
            .lock()
            .insert(user.email.clone(), (password.to_string(), user));
        self
    }

    /// Reject every registration with `reason`.
    pub fn reject_registrations(&self, reason: &str) {
        *self.reject_registration.lock() = Some(reason.to_string());
    }

    /// Fail every login as if the service could not be reached.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }
}

#[async_trait]
impl AuthService for MockAuthService {
    async fn login(&self, email: &str, password: &str) -> Result<User, ProgressError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(ProgressError::AuthUnavailable("Mock unreachable".to_string()));
        }
        match self.accounts.lock().get(email) {
            Some((expected, user)) if expected == password => Ok(user.clone()),
            _ => Err(ProgressError::AuthFailure),
        }
    }

    async fn register(&self, request: &RegisterRequest) -> Result<User, ProgressError> {
        if let Some(reason) = self.reject_registration.lock().clone() {
            return Err(ProgressError::RegistrationFailure(reason));
        }

        let id = format!("user-{}", self.accounts.lock().len() + 1);
        let mut user = User::new(
            id,
            request.email.clone(),
            request.first_name.clone(),
            request.last_name.clone(),
        );
        user.employee_id = request.employee_id.clone();
        user.role = request.role.clone();

        self.accounts
            .lock()
            .insert(request.email.clone(), (request.password.clone(), user.clone()));
        Ok(user)
    }
}
