//! Prometheus metrics for progress sync.
//!
//! All metrics follow the naming convention: `px_<area>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{Counter, CounterVec, Encoder, Opts, Registry, TextEncoder};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // RECONCILIATION
    // =========================================================================

    /// Catch-up syncs that raised cached XP
    pub static ref SYNC_RAISED: CounterVec = CounterVec::new(
        Opts::new("px_sync_raised_total", "Catch-up syncs that raised cached XP"),
        &["feed"]
    ).expect("metric creation failed");

    /// Catch-up syncs where the cache already covered the feed total
    pub static ref SYNC_UP_TO_DATE: CounterVec = CounterVec::new(
        Opts::new("px_sync_up_to_date_total", "Catch-up syncs that found the cache current"),
        &["feed"]
    ).expect("metric creation failed");

    /// Catch-up syncs aborted by a feed fetch failure
    pub static ref SYNC_ABORTED: CounterVec = CounterVec::new(
        Opts::new("px_sync_aborted_total", "Catch-up syncs aborted by a feed failure"),
        &["feed"]
    ).expect("metric creation failed");

    // =========================================================================
    // XP
    // =========================================================================

    /// XP credited locally, by source kind (see [`xp_source_label`])
    pub static ref XP_GAINED: CounterVec = CounterVec::new(
        Opts::new("px_xp_gained_total", "XP credited to the cached user"),
        &["source"]
    ).expect("metric creation failed");

    // =========================================================================
    // FAILURES
    // =========================================================================

    /// Swallowed remote notification failures
    pub static ref REMOTE_NOTIFY_FAILURES: CounterVec = CounterVec::new(
        Opts::new("px_remote_notify_failures_total", "Remote notifications that failed"),
        &["call"]
    ).expect("metric creation failed");

    /// Durable storage write failures
    pub static ref STORAGE_WRITE_FAILURES: Counter = Counter::new(
        "px_storage_write_failures_total",
        "Session snapshot writes that failed"
    ).expect("metric creation failed");

    /// Background tasks dropped because the task set was full
    pub static ref BACKGROUND_TASKS_DROPPED: Counter = Counter::new(
        "px_background_tasks_dropped_total",
        "Background tasks rejected by a full task set"
    ).expect("metric creation failed");
}

/// Source kinds used as the `source` label of [`XP_GAINED`].
pub const XP_SOURCE_LABELS: [&str; 6] = ["quiz", "task", "module", "lesson", "challenge", "other"];

/// Map a caller-supplied gain source to a bounded label.
///
/// Matches on prefix, so `task-42` counts as `task`. Anything else is `other`.
pub fn xp_source_label(source: &str) -> &'static str {
    let source = source.trim().to_ascii_lowercase();
    XP_SOURCE_LABELS[..XP_SOURCE_LABELS.len() - 1]
        .iter()
        .copied()
        .find(|kind| source.starts_with(kind))
        .unwrap_or("other")
}

/// Register all collectors with the global registry.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(SYNC_RAISED.clone()),
        Box::new(SYNC_UP_TO_DATE.clone()),
        Box::new(SYNC_ABORTED.clone()),
        Box::new(XP_GAINED.clone()),
        Box::new(REMOTE_NOTIFY_FAILURES.clone()),
        Box::new(STORAGE_WRITE_FAILURES.clone()),
        Box::new(BACKGROUND_TASKS_DROPPED.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn gather_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_metrics_twice() {
        assert!(register_metrics().is_ok());
        assert!(register_metrics().is_ok());
    }

    #[test]
    fn test_counter_increment() {
        SYNC_RAISED.with_label_values(&["tasks"]).inc();
        assert!(SYNC_RAISED.with_label_values(&["tasks"]).get() >= 1.0);
    }

    #[test]
    fn test_xp_counter_accumulates() {
        let before = XP_GAINED.with_label_values(&["lesson"]).get();
        XP_GAINED.with_label_values(&["lesson"]).inc_by(50.0);
        assert!(XP_GAINED.with_label_values(&["lesson"]).get() >= before + 50.0);
    }

    #[test]
    fn test_xp_source_label_is_bounded() {
        assert_eq!(xp_source_label("quiz"), "quiz");
        assert_eq!(xp_source_label("task-17"), "task");
        assert_eq!(xp_source_label(" Module:sql "), "module");
        assert_eq!(xp_source_label("daily-bonus"), "other");
        assert_eq!(xp_source_label(""), "other");

        let labels: std::collections::HashSet<_> =
            (0..100).map(|i| xp_source_label(&format!("src-{i}"))).collect();
        assert_eq!(labels.len(), 1);
        assert!(XP_SOURCE_LABELS.contains(&xp_source_label("anything")));
    }

    #[test]
    fn test_gather_metrics_text() {
        register_metrics().unwrap();
        STORAGE_WRITE_FAILURES.inc();
        let text = gather_metrics().unwrap();
        assert!(text.contains("px_storage_write_failures_total"));
    }
}
