//! # Reconciliation Engine
//!
//! Catch-up sync of the cached XP against one completion feed.
//!
//! ## Flow
//!
//! 1. Under the session lock: snapshot the user id and session token.
//! 2. Outside the lock: fetch the feed and compute its total.
//! 3. Under the session lock again: drop the result if the session changed,
//!    otherwise diff the total against the cached XP, credit the difference
//!    through the ledger and save.
//! 4. After releasing the lock: notify the remote service.
//!
//! The feed reports a total, never a delta. Running a sync twice against an
//! unchanged feed raises XP at most once.

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use progress_telemetry::{SYNC_ABORTED, SYNC_RAISED, SYNC_UP_TO_DATE};

use super::notifier::RemoteSyncNotifier;
use super::session::{PersistedSession, SaveOutcome};
use crate::algorithms::{apply_catch_up, module_feed_total, task_feed_total};
use crate::domain::{FeedKind, ProgressError, SyncOutcome};
use crate::ports::outbound::{Catalog, ProgressService};

/// Computes feed totals and raises the cached XP when it is behind.
pub struct ReconciliationEngine {
    progress: Arc<dyn ProgressService>,
    catalog: Arc<dyn Catalog>,
}

impl ReconciliationEngine {
    /// Create an engine reading feeds from `progress` and module rewards
    /// from `catalog`.
    pub fn new(progress: Arc<dyn ProgressService>, catalog: Arc<dyn Catalog>) -> Self {
        Self { progress, catalog }
    }

    /// Fetch `feed` for `user_id` and return the XP total it implies.
    pub async fn fetch_authoritative(
        &self,
        feed: FeedKind,
        user_id: &str,
    ) -> Result<u64, ProgressError> {
        match feed {
            FeedKind::Tasks => {
                let tasks = self.progress.get_completed_tasks(user_id).await?;
                Ok(task_feed_total(&tasks))
            }
            FeedKind::Modules => {
                let progress = self.progress.get_module_progress(user_id).await?;
                let (total, contributions) = module_feed_total(&progress, self.catalog.as_ref());
                for c in &contributions {
                    debug!(
                        user_id = %user_id,
                        "[progress] Completed module {} ({}): {} XP",
                        c.module_id, c.title, c.xp_reward
                    );
                }
                Ok(total)
            }
        }
    }

    /// Run one catch-up sync of `feed` against the session.
    ///
    /// Never fails: fetch failures abort the sync and are logged and counted.
    /// A storage write failure is reported through `Raised { persisted: false }`.
    pub async fn run(
        &self,
        feed: FeedKind,
        session: &Mutex<PersistedSession>,
        notifier: &RemoteSyncNotifier,
    ) -> SyncOutcome {
        let (user_id, token) = {
            let session = session.lock().await;
            match session.current() {
                Some(user) => (user.id.clone(), session.token()),
                None => {
                    debug!("[progress] No active session, skipping {} sync", feed);
                    return SyncOutcome::Skipped;
                }
            }
        };

        let authoritative = match self.fetch_authoritative(feed, &user_id).await {
            Ok(total) => total,
            Err(e) => {
                SYNC_ABORTED.with_label_values(&[feed.as_str()]).inc();
                warn!(user_id = %user_id, feed = %feed, "[progress] Sync aborted: {}", e);
                return SyncOutcome::Aborted { feed };
            }
        };

        let mut guard = session.lock().await;
        if guard.token() != token {
            debug!(user_id = %user_id, feed = %feed, "[progress] Session changed during fetch, dropping result");
            return SyncOutcome::Skipped;
        }
        let user = match guard.current() {
            Some(user) => user.clone(),
            None => return SyncOutcome::Skipped,
        };

        let (gained, updated) = match apply_catch_up(&user, authoritative) {
            Some(raised) => raised,
            None => {
                SYNC_UP_TO_DATE.with_label_values(&[feed.as_str()]).inc();
                debug!(
                    user_id = %user_id,
                    feed = %feed,
                    "[progress] Up to date: cached {} >= feed {}",
                    user.current_xp, authoritative
                );
                return SyncOutcome::UpToDate {
                    feed,
                    cached: user.current_xp,
                    authoritative,
                };
            }
        };

        // A write failure is logged and counted by the session; memory holds the raise
        let persisted = matches!(guard.save(token, updated.clone()), Ok(SaveOutcome::Written));
        drop(guard);

        notifier.upsert(token, &updated);

        SYNC_RAISED.with_label_values(&[feed.as_str()]).inc();
        info!(
            user_id = %user_id,
            feed = %feed,
            gained,
            new_xp = updated.current_xp,
            "[progress] Raised XP to level {}",
            updated.level
        );

        SyncOutcome::Raised {
            feed,
            gained,
            new_xp: updated.current_xp,
            new_level: updated.level,
            persisted,
        }
    }
}
