//! # Remote Sync Notifier
//!
//! Best-effort push of user snapshots and gain reports to the remote
//! progress service. Every push is a detached background task; failures are
//! logged and counted, never returned.

use std::sync::Arc;
use tracing::{debug, warn};

use progress_telemetry::REMOTE_NOTIFY_FAILURES;

use super::session::SessionGeneration;
use super::tasks::BackgroundTasks;
use crate::domain::{SessionToken, User, UserSnapshot, XpGainReport};
use crate::ports::outbound::ProgressService;

/// Fire-and-forget notifier for the remote progress service.
pub struct RemoteSyncNotifier {
    progress: Arc<dyn ProgressService>,
    tasks: Arc<BackgroundTasks>,
    generation: SessionGeneration,
}

impl RemoteSyncNotifier {
    /// Create a notifier spawning onto `tasks`; pushes for a token older than
    /// `generation` are skipped.
    pub fn new(
        progress: Arc<dyn ProgressService>,
        tasks: Arc<BackgroundTasks>,
        generation: SessionGeneration,
    ) -> Self {
        Self {
            progress,
            tasks,
            generation,
        }
    }

    /// Push `user` to the remote service.
    ///
    /// Skipped when the session computed under `token` has ended by the time
    /// the task runs.
    pub fn upsert(&self, token: SessionToken, user: &User) {
        let snapshot = UserSnapshot::from(user);
        let progress = self.progress.clone();
        let generation = self.generation.clone();

        self.tasks.spawn("upsert", async move {
            if !generation.is_current(token) {
                debug!(user_id = %snapshot.id, "[progress] Session ended, skipping upsert");
                return;
            }
            push_upsert(progress.as_ref(), &snapshot).await;
        });
    }

    /// Push `user` and then the gain audit event, in that order.
    ///
    /// A failed upsert does not prevent the report.
    pub fn publish_gain(&self, token: SessionToken, user: &User, report: XpGainReport) {
        let snapshot = UserSnapshot::from(user);
        let progress = self.progress.clone();
        let generation = self.generation.clone();

        self.tasks.spawn("xp-gain", async move {
            if !generation.is_current(token) {
                debug!(user_id = %snapshot.id, "[progress] Session ended, skipping gain report");
                return;
            }
            push_upsert(progress.as_ref(), &snapshot).await;

            if let Err(e) = progress.report_xp_gain(&report).await {
                REMOTE_NOTIFY_FAILURES.with_label_values(&["report_xp_gain"]).inc();
                warn!(
                    user_id = %report.user_id,
                    "[progress] Failed to report XP gain of {}: {}",
                    report.xp_gain, e
                );
            }
        });
    }
}

async fn push_upsert(progress: &dyn ProgressService, snapshot: &UserSnapshot) {
    if let Err(e) = progress.upsert_user(snapshot).await {
        REMOTE_NOTIFY_FAILURES.with_label_values(&["upsert_user"]).inc();
        warn!(user_id = %snapshot.id, "[progress] Failed to upsert user: {}", e);
    }
}
