//! # Integration Test Flows
//!
//! Session controller wired to a file-backed slot store and scripted remote
//! services.
//!
//! ## Flows Tested:
//!
//! 1. **Login → start-up sync → persist**: the task feed total lands in the slot
//! 2. **Gain racing a catch-up sync**: neither update is lost
//! 3. **Concurrent gains**: every gain is applied exactly once
//! 4. **Logout racing a catch-up sync**: the session stays ended
//! 5. **Stale feed replica**: cached XP never regresses

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    use progress_telemetry::{SYNC_ABORTED, XP_GAINED};

    use progress_sync::{
        ControllerDeps, FileSessionStore, MockAuthService, MockProgressService, ModuleProgress,
        PersistedEnvelope, ProgressApi, ProgressError, ProgressService, RemoteCall,
        SessionController, StaticCatalog, StaticDirectory, StorageSignal, SyncConfig,
        SyncOutcome, TaskCompletion, User, UserSnapshot, XpGainReport, XpLedger,
    };

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn controller_for(
        dir: &Path,
        progress: Arc<dyn ProgressService>,
        auth: MockAuthService,
    ) -> SessionController {
        SessionController::create(
            SyncConfig::for_testing(),
            ControllerDeps {
                store: Arc::new(FileSessionStore::new(dir)),
                signal: StorageSignal::default(),
                progress,
                catalog: Arc::new(StaticCatalog::default()),
                auth: Arc::new(auth),
                directory: Arc::new(StaticDirectory::with_seed_users()),
            },
        )
    }

    fn ada(xp: u64) -> User {
        User::new("u-ada", "ada@acme.com", "Ada", "Lovelace")
            .with_progress(xp, XpLedger::derive_level(xp))
    }

    fn read_slot(dir: &Path) -> PersistedEnvelope {
        let raw = std::fs::read_to_string(dir.join("auth-storage.json")).unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    /// Wait until the service has seen `count` task-feed fetches.
    async fn wait_for_task_fetches(service: &MockProgressService, count: usize) {
        timeout(Duration::from_secs(5), async {
            loop {
                let fetches = service
                    .calls()
                    .iter()
                    .filter(|c| matches!(c, RemoteCall::FetchTasks(_)))
                    .count();
                if fetches >= count {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("task feed was never fetched");
    }

    /// Task feed replaying a fixed sequence of totals, one per fetch.
    struct ReplayedTaskFeed {
        totals: Mutex<VecDeque<u64>>,
    }

    impl ReplayedTaskFeed {
        fn new(totals: &[u64]) -> Self {
            Self {
                totals: Mutex::new(totals.iter().copied().collect()),
            }
        }
    }

    #[async_trait]
    impl ProgressService for ReplayedTaskFeed {
        async fn upsert_user(&self, _snapshot: &UserSnapshot) -> Result<(), ProgressError> {
            Ok(())
        }

        async fn report_xp_gain(&self, _report: &XpGainReport) -> Result<(), ProgressError> {
            Ok(())
        }

        async fn get_completed_tasks(
            &self,
            _user_id: &str,
        ) -> Result<Vec<TaskCompletion>, ProgressError> {
            match self.totals.lock().pop_front() {
                Some(points) => Ok(vec![TaskCompletion { points }]),
                None => Err(ProgressError::FeedFetch("replay exhausted".into())),
            }
        }

        async fn get_module_progress(
            &self,
            _user_id: &str,
        ) -> Result<Vec<ModuleProgress>, ProgressError> {
            Ok(Vec::new())
        }
    }

    // =============================================================================
    // INTEGRATION TESTS
    // =============================================================================

    #[tokio::test]
    async fn test_login_start_sync_persists_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let service = Arc::new(MockProgressService::new());
        service.set_task_points(&[100, 150, 200]);
        let auth = MockAuthService::new().with_account("pw", ada(0));

        let controller = controller_for(dir.path(), service.clone(), auth);
        controller.login("ada@acme.com", "pw").await.unwrap();
        controller.wait_idle().await;

        let user = controller.current_user().await.unwrap();
        assert_eq!(user.current_xp, 450);
        assert_eq!(user.level, 4);
        assert_eq!(read_slot(dir.path()).into_user(), Some(user.clone()));

        // The remote service saw the start-up upsert and the post-sync upsert
        let upserts = service.upserts();
        assert_eq!(upserts.first().unwrap().current_xp, 0);
        assert_eq!(upserts.last().unwrap().current_xp, 450);

        // A fresh process restores the synced session from the slot
        controller.dispose().await;
        let restarted = controller_for(dir.path(), service.clone(), MockAuthService::new());
        assert!(restarted.hydrate().await.unwrap());
        assert_eq!(restarted.current_user().await, Some(user));
        restarted.dispose().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_gain_racing_sync_loses_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let service = Arc::new(MockProgressService::new());
        let controller = controller_for(dir.path(), service.clone(), MockAuthService::new());

        controller.start(ada(100)).await.unwrap();
        controller.wait_idle().await;

        // Cache is 40 behind the feed; a 10 XP gain lands mid-fetch
        service.set_task_points(&[140]);
        let gate = service.gate_feeds();
        let syncing = controller.clone();
        let sync = tokio::spawn(async move { syncing.sync_completed_tasks_xp().await });
        wait_for_task_fetches(&service, 2).await;

        let gained = controller.gain(10, "quiz").await.unwrap().unwrap();
        assert_eq!(gained.current_xp, 110);
        gate.notify_one();

        let outcome = sync.await.unwrap();
        assert!(matches!(outcome, SyncOutcome::Raised { gained: 30, new_xp: 140, .. }));

        controller.wait_idle().await;
        let user = controller.current_user().await.unwrap();
        assert_eq!(user.current_xp, 140);
        assert_eq!(read_slot(dir.path()).into_user().unwrap().current_xp, 140);
        assert_eq!(service.gain_reports().len(), 1);
        controller.dispose().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_gains_apply_once_each() {
        let dir = tempfile::tempdir().unwrap();
        let service = Arc::new(MockProgressService::new());
        let controller = controller_for(dir.path(), service.clone(), MockAuthService::new());
        controller.start(ada(0)).await.unwrap();
        controller.wait_idle().await;
        let task_xp_before = XP_GAINED.with_label_values(&["task"]).get();

        let mut handles = Vec::new();
        for i in 0..20 {
            let controller = controller.clone();
            handles.push(tokio::spawn(async move {
                controller.gain(5, &format!("task-{i}")).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        controller.wait_idle().await;

        let user = controller.current_user().await.unwrap();
        assert_eq!(user.current_xp, 100);
        assert_eq!(user.level, 1);
        assert_eq!(read_slot(dir.path()).into_user().unwrap().current_xp, 100);
        assert_eq!(service.gain_reports().len(), 20);

        // Every report carries a distinct, increasing running total
        let mut totals: Vec<u64> = service.gain_reports().iter().map(|r| r.new_xp).collect();
        totals.sort_unstable();
        assert_eq!(totals, (1..=20).map(|n| n * 5).collect::<Vec<_>>());

        // Twenty distinct sources share one bounded metric label
        assert!(XP_GAINED.with_label_values(&["task"]).get() >= task_xp_before + 100.0);
        controller.dispose().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_logout_racing_sync_keeps_session_ended() {
        let dir = tempfile::tempdir().unwrap();
        let service = Arc::new(MockProgressService::new());
        let controller = controller_for(dir.path(), service.clone(), MockAuthService::new());
        controller.start(ada(100)).await.unwrap();
        controller.wait_idle().await;

        service.set_task_points(&[900]);
        let gate = service.gate_feeds();
        let syncing = controller.clone();
        let sync = tokio::spawn(async move { syncing.sync_completed_tasks_xp().await });
        wait_for_task_fetches(&service, 2).await;

        controller.logout().await.unwrap();
        gate.notify_one();

        assert_eq!(sync.await.unwrap(), SyncOutcome::Skipped);
        controller.wait_idle().await;
        assert!(controller.current_user().await.is_none());
        assert_eq!(read_slot(dir.path()), PersistedEnvelope::logged_out(0));

        // No upsert carried the late feed total
        assert!(service.upserts().iter().all(|s| s.current_xp < 900));

        let restarted = controller_for(dir.path(), service.clone(), MockAuthService::new());
        assert!(!restarted.hydrate().await.unwrap());
    }

    #[tokio::test]
    async fn test_stale_feed_replica_never_regresses() {
        let dir = tempfile::tempdir().unwrap();
        let feed = Arc::new(ReplayedTaskFeed::new(&[300, 120, 300, 450]));
        let controller = controller_for(dir.path(), feed, MockAuthService::new());

        // Start-up sync consumes the first total
        controller.start(ada(0)).await.unwrap();
        controller.wait_idle().await;
        assert_eq!(controller.current_user().await.unwrap().current_xp, 300);

        let mut last = 300;
        let mut level = XpLedger::derive_level(300);
        for _ in 0..3 {
            controller.sync_completed_tasks_xp().await;
            let user = controller.current_user().await.unwrap();
            assert!(user.current_xp >= last);
            assert!(user.level >= level);
            last = user.current_xp;
            level = user.level;
        }
        assert_eq!(last, 450);

        // Exhausted feed aborts without touching the cache
        let aborted_before = SYNC_ABORTED.with_label_values(&["tasks"]).get();
        assert!(matches!(
            controller.sync_completed_tasks_xp().await,
            SyncOutcome::Aborted { .. }
        ));
        assert_eq!(controller.current_user().await.unwrap().current_xp, 450);
        assert!(SYNC_ABORTED.with_label_values(&["tasks"]).get() >= aborted_before + 1.0);
    }

    #[tokio::test]
    async fn test_directory_login_then_gain() {
        let dir = tempfile::tempdir().unwrap();
        let service = Arc::new(MockProgressService::new());
        let controller = controller_for(dir.path(), service.clone(), MockAuthService::new());

        let jane = controller.login("jane@acme.com", "whatever").await.unwrap();
        assert_eq!((jane.current_xp, jane.level), (485, 3));

        let updated = controller.gain(50, "quiz").await.unwrap().unwrap();
        assert_eq!((updated.current_xp, updated.level), (535, 4));

        controller.wait_idle().await;
        let report = service.gain_reports().pop().unwrap();
        assert_eq!(report.user_id, jane.id);
        assert_eq!((report.xp_gain, report.new_xp, report.new_level), (50, 535, 4));
        controller.dispose().await;
    }
}
