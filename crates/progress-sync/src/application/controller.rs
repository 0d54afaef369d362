//! # Session Controller
//!
//! Application service orchestrating the session: start (login, register,
//! hydrate), explicit XP gains, patches, logout and catch-up syncs.
//!
//! All read-modify-write of the cached user goes through one FIFO mutex
//! around [`PersistedSession`]. Remote calls other than the feed fetch are
//! detached into a bounded [`BackgroundTasks`] set.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use progress_telemetry::{xp_source_label, XP_GAINED};

use super::notifier::RemoteSyncNotifier;
use super::reconciliation::ReconciliationEngine;
use super::session::{
    PersistedSession, SaveOutcome, SessionGeneration, StorageChanged, StorageSignal,
};
use super::tasks::BackgroundTasks;
use crate::config::SyncConfig;
use crate::domain::{
    FeedKind, ProgressError, RegisterRequest, SessionPhase, SessionToken, SyncOutcome, User,
    UserPatch, XpGainReport, XpLedger,
};
use crate::ports::inbound::ProgressApi;
use crate::ports::outbound::{AuthService, Catalog, Directory, ProgressService, SessionStore};

/// Collaborators injected into [`SessionController::create`].
pub struct ControllerDeps {
    /// Durable slot storage.
    pub store: Arc<dyn SessionStore>,
    /// Storage-changed signal shared with every context using `store`.
    pub signal: StorageSignal,
    /// Remote progress service.
    pub progress: Arc<dyn ProgressService>,
    /// Module catalog.
    pub catalog: Arc<dyn Catalog>,
    /// Credential service.
    pub auth: Arc<dyn AuthService>,
    /// Login fallback table.
    pub directory: Arc<dyn Directory>,
}

/// Session Controller - the single owner of the cached user.
///
/// Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: SyncConfig,
    session: Mutex<PersistedSession>,
    generation: SessionGeneration,
    signal: StorageSignal,
    engine: ReconciliationEngine,
    notifier: RemoteSyncNotifier,
    auth: Arc<dyn AuthService>,
    directory: Arc<dyn Directory>,
    tasks: Arc<BackgroundTasks>,
}

impl SessionController {
    /// Create an anonymous session controller.
    pub fn create(config: SyncConfig, deps: ControllerDeps) -> Self {
        let session = PersistedSession::new(
            deps.store,
            deps.signal.clone(),
            config.storage_slot.clone(),
            config.storage_version,
        );
        let generation = session.generation();
        let tasks = Arc::new(BackgroundTasks::new(config.max_background_tasks));
        let notifier =
            RemoteSyncNotifier::new(deps.progress.clone(), tasks.clone(), generation.clone());
        let engine = ReconciliationEngine::new(deps.progress, deps.catalog);

        debug!(
            "[progress] Session controller created (slot {})",
            config.storage_slot
        );

        Self {
            inner: Arc::new(ControllerInner {
                config,
                session: Mutex::new(session),
                generation,
                signal: deps.signal,
                engine,
                notifier,
                auth: deps.auth,
                directory: deps.directory,
                tasks,
            }),
        }
    }

    /// Stop accepting background work and wait for work already in flight.
    pub async fn dispose(&self) {
        self.inner.tasks.close();
        self.inner.tasks.wait_idle().await;
        debug!("[progress] Session controller disposed");
    }

    /// Wait until every detached remote call and scheduled sync has finished.
    pub async fn wait_idle(&self) {
        self.inner.tasks.wait_idle().await;
    }

    /// Register an observer of persisted-slot changes.
    pub fn subscribe(&self) -> broadcast::Receiver<StorageChanged> {
        self.inner.signal.subscribe()
    }

    /// Token of the current session lifetime.
    pub fn token(&self) -> SessionToken {
        self.inner.generation.current()
    }

    /// Configuration in use.
    pub fn config(&self) -> &SyncConfig {
        &self.inner.config
    }

    fn schedule_start_sync(&self, token: SessionToken) {
        let controller = self.clone();
        let delay = self.inner.config.start_sync_delay();

        self.inner.tasks.spawn("start-sync", async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if !controller.inner.generation.is_current(token) {
                debug!("[progress] Session ended before start-up sync");
                return;
            }
            controller.sync(FeedKind::Tasks).await;
        });
    }

    async fn sync(&self, feed: FeedKind) -> SyncOutcome {
        self.inner
            .engine
            .run(feed, &self.inner.session, &self.inner.notifier)
            .await
    }
}

#[async_trait]
impl ProgressApi for SessionController {
    async fn login(&self, email: &str, password: &str) -> Result<User, ProgressError> {
        let user = match self.inner.auth.login(email, password).await {
            Ok(user) => user,
            Err(ProgressError::AuthFailure) => {
                debug!("[progress] Auth service rejected {}", email);
                match self.inner.directory.find_by_email(email) {
                    Some(user) => {
                        info!(user_id = %user.id, "[progress] Signed in from directory fallback");
                        user
                    }
                    None => return Err(ProgressError::AuthFailure),
                }
            }
            Err(e) => {
                warn!("[progress] Login failed for {}: {}", email, e);
                return Err(ProgressError::AuthFailure);
            }
        };
        self.start(user).await
    }

    async fn register(&self, request: RegisterRequest) -> Result<User, ProgressError> {
        let user = match self.inner.auth.register(&request).await {
            Ok(user) => user,
            Err(ProgressError::RegistrationFailure(reason)) => {
                return Err(ProgressError::RegistrationFailure(reason))
            }
            Err(e) => return Err(ProgressError::RegistrationFailure(e.to_string())),
        };
        info!(user_id = %user.id, "[progress] Registered {}", user.email);
        self.start(user).await
    }

    async fn hydrate(&self) -> Result<bool, ProgressError> {
        let loaded = self.inner.session.lock().await.load();
        match loaded {
            Ok(Some(user)) => {
                info!(user_id = %user.id, "[progress] Restoring persisted session");
                self.start(user).await?;
                Ok(true)
            }
            Ok(None) => Ok(false),
            Err(ProgressError::Serialization(e)) => {
                warn!("[progress] Ignoring unreadable session slot: {}", e);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn start(&self, user: User) -> Result<User, ProgressError> {
        let (token, saved) = {
            let mut session = self.inner.session.lock().await;
            let token = session.begin();
            let saved = session.save(token, user.clone());
            (token, saved)
        };

        info!(
            user_id = %user.id,
            level = user.level,
            current_xp = user.current_xp,
            "[progress] Session started"
        );

        self.inner.notifier.upsert(token, &user);
        self.schedule_start_sync(token);

        saved.map(|_| user)
    }

    async fn gain(&self, amount: i64, source: &str) -> Result<Option<User>, ProgressError> {
        if amount < 0 {
            return Err(ProgressError::InvalidGain(amount));
        }

        let mut session = self.inner.session.lock().await;
        let user = match session.current() {
            Some(user) => user.clone(),
            None => {
                info!("[progress] Ignoring {} XP from {}: no active session", amount, source);
                return Ok(None);
            }
        };

        let token = session.token();
        let updated = XpLedger::apply_gain(&user, amount)?;
        let saved = session.save(token, updated.clone());
        drop(session);

        if let Ok(SaveOutcome::Discarded) = saved {
            return Ok(None);
        }

        let gained = updated.current_xp - user.current_xp;
        XP_GAINED
            .with_label_values(&[xp_source_label(source)])
            .inc_by(gained as f64);
        info!(
            user_id = %updated.id,
            gained,
            new_xp = updated.current_xp,
            "[progress] Gained XP from {} (level {})",
            source,
            updated.level
        );

        let report = XpGainReport {
            user_id: updated.id.clone(),
            xp_gain: gained,
            new_xp: updated.current_xp,
            new_level: updated.level,
            source: source.to_string(),
        };
        self.inner.notifier.publish_gain(token, &updated, report);

        saved.map(|_| Some(updated))
    }

    async fn patch(&self, updates: UserPatch) -> Result<Option<User>, ProgressError> {
        let mut session = self.inner.session.lock().await;
        let user = match session.current() {
            Some(user) => user.clone(),
            None => {
                debug!("[progress] Ignoring patch: no active session");
                return Ok(None);
            }
        };

        if updates.touches_progress() {
            debug!(user_id = %user.id, "[progress] Patching progress fields outside the ledger");
        }

        let merged = updates.apply_to(&user);
        let token = session.token();
        session.save(token, merged.clone())?;
        Ok(Some(merged))
    }

    async fn logout(&self) -> Result<(), ProgressError> {
        let mut session = self.inner.session.lock().await;
        if let Some(user) = session.current() {
            info!(user_id = %user.id, "[progress] Logging out");
        }
        session.clear()
    }

    async fn sync_completed_tasks_xp(&self) -> SyncOutcome {
        self.sync(FeedKind::Tasks).await
    }

    async fn sync_completed_modules_xp(&self) -> SyncOutcome {
        self.sync(FeedKind::Modules).await
    }

    async fn current_user(&self) -> Option<User> {
        self.inner.session.lock().await.current().cloned()
    }

    async fn phase(&self) -> SessionPhase {
        if self.inner.session.lock().await.current().is_some() {
            SessionPhase::Active
        } else {
            SessionPhase::Anonymous
        }
    }
}
