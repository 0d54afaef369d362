//! # Background Tasks
//!
//! Bounded set of detached, fire-and-forget tasks (remote notifications and
//! the start-up sync). Callers never await individual tasks; tests and
//! shutdown await the whole set with [`BackgroundTasks::wait_idle`].

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::{debug, warn};

use progress_telemetry::BACKGROUND_TASKS_DROPPED;

/// Bounded set of detached tasks.
pub struct BackgroundTasks {
    /// Tasks spawned and not yet finished.
    in_flight: Arc<AtomicUsize>,
    /// Signalled whenever `in_flight` drops to zero.
    idle: Arc<Notify>,
    /// Set by `close`; no new tasks are accepted afterwards.
    closed: AtomicBool,
    /// Maximum tasks in flight.
    max: usize,
}

impl BackgroundTasks {
    /// Create a task set accepting at most `max` concurrent tasks.
    pub fn new(max: usize) -> Self {
        Self {
            in_flight: Arc::new(AtomicUsize::new(0)),
            idle: Arc::new(Notify::new()),
            closed: AtomicBool::new(false),
            max: max.max(1),
        }
    }

    /// Spawn `task` detached.
    ///
    /// Returns `false` when the set is closed, full, or there is no runtime
    /// to spawn on; the task is then dropped without running.
    pub fn spawn<F>(&self, label: &'static str, task: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.closed.load(Ordering::SeqCst) {
            debug!("[progress] Task set closed, dropping {}", label);
            return false;
        }

        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!("[progress] No runtime, dropping background task {}", label);
                BACKGROUND_TASKS_DROPPED.inc();
                return false;
            }
        };

        if self.in_flight.fetch_add(1, Ordering::SeqCst) >= self.max {
            self.release();
            warn!(
                "[progress] Background task limit ({}) reached, dropping {}",
                self.max, label
            );
            BACKGROUND_TASKS_DROPPED.inc();
            return false;
        }

        let guard = InFlight {
            in_flight: self.in_flight.clone(),
            idle: self.idle.clone(),
        };
        handle.spawn(async move {
            let _guard = guard;
            task.await;
        });
        true
    }

    /// Tasks currently in flight.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Stop accepting new tasks. Tasks already in flight keep running.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Wait until no task is in flight, including tasks spawned by tasks.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            if self.in_flight() == 0 {
                return;
            }
            notified.await;
        }
    }

    fn release(&self) {
        if self.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }
}

/// Decrements the in-flight count when a task finishes or panics.
struct InFlight {
    in_flight: Arc<AtomicUsize>,
    idle: Arc<Notify>,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if self.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }
}
