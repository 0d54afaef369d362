//! # Cross-Context Tests
//!
//! Two controllers (e.g. two windows) sharing one durable slot and one
//! storage-changed signal. Observers receive a payload-free notification and
//! re-read the slot.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    use progress_sync::{
        ControllerDeps, InMemorySessionStore, MockAuthService, MockProgressService,
        PersistedEnvelope, ProgressApi, ProgressError, SessionController, SessionStore,
        StaticCatalog, StaticDirectory, StorageChanged, StorageSignal, SyncConfig,
    };

    fn context(store: Arc<InMemorySessionStore>, signal: StorageSignal) -> SessionController {
        SessionController::create(
            SyncConfig::for_testing(),
            ControllerDeps {
                store,
                signal,
                progress: Arc::new(MockProgressService::new()),
                catalog: Arc::new(StaticCatalog::default()),
                auth: Arc::new(MockAuthService::new()),
                directory: Arc::new(StaticDirectory::with_seed_users()),
            },
        )
    }

    #[tokio::test]
    async fn test_observer_rereads_slot_after_change() {
        let store = Arc::new(InMemorySessionStore::new());
        let signal = StorageSignal::default();
        let window_a = context(store.clone(), signal.clone());
        let window_b = context(store.clone(), signal.clone());

        let mut observer = window_b.subscribe();
        let jane = window_a.login("jane@acme.com", "pw").await.unwrap();

        let changed = timeout(Duration::from_secs(1), observer.recv())
            .await
            .expect("no storage-changed notification")
            .unwrap();
        assert_eq!(changed, StorageChanged);

        assert!(window_b.hydrate().await.unwrap());
        assert_eq!(window_b.current_user().await, Some(jane));

        window_a.dispose().await;
        window_b.dispose().await;
    }

    #[tokio::test]
    async fn test_logout_in_one_context_is_visible_to_the_other() {
        let store = Arc::new(InMemorySessionStore::new());
        let signal = StorageSignal::default();
        let window_a = context(store.clone(), signal.clone());
        let window_b = context(store.clone(), signal.clone());

        window_a.login("admin@acme.com", "pw").await.unwrap();
        window_a.wait_idle().await;

        let mut observer = window_b.subscribe();
        window_a.logout().await.unwrap();
        assert_eq!(observer.try_recv().unwrap(), StorageChanged);

        let raw = store.read_slot("auth-storage").unwrap().unwrap();
        let envelope: PersistedEnvelope = serde_json::from_str(&raw).unwrap();
        assert!(envelope.into_user().is_none());
        assert!(!window_b.hydrate().await.unwrap());
    }

    #[tokio::test]
    async fn test_failed_write_is_not_broadcast() {
        let store = Arc::new(InMemorySessionStore::new());
        let signal = StorageSignal::default();
        let window = context(store.clone(), signal.clone());
        window.login("jane@acme.com", "pw").await.unwrap();
        window.wait_idle().await;

        let mut observer = signal.subscribe();
        store.set_fail_writes(true);

        let result = window.gain(20, "quiz").await;
        assert!(matches!(result, Err(ProgressError::StorageWrite(_))));
        assert!(observer.try_recv().is_err());

        // Memory kept the gain; the slot still holds the old value
        assert_eq!(window.current_user().await.unwrap().current_xp, 505);
        let raw = store.read_slot("auth-storage").unwrap().unwrap();
        let envelope: PersistedEnvelope = serde_json::from_str(&raw).unwrap();
        assert_eq!(envelope.into_user().unwrap().current_xp, 485);
        window.dispose().await;
    }
}
