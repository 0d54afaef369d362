//! # Progress Telemetry
//!
//! Logging and metrics for the progress sync subsystem.
//!
//! ## Components
//!
//! - **Logging**: `tracing-subscriber` with an env filter and pretty or JSON output
//! - **Metrics**: Prometheus counters for sync outcomes and swallowed failures
//!
//! ## Usage
//!
//! ```rust,ignore
//! use progress_telemetry::{init_telemetry, TelemetryConfig};
//!
//! init_telemetry(&TelemetryConfig::from_env()).expect("telemetry");
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `PX_SERVICE_NAME` | `progress-sync` | Service name in logs |
//! | `PX_LOG_LEVEL` | `info` | Log level filter |
//! | `PX_JSON_LOGS` | `false` | JSON formatted output |
//! | `PX_CONSOLE_OUTPUT` | `true` | Emit logs at all |
//! | `PX_METRICS` | `true` | Register Prometheus collectors |

#![warn(missing_docs)]

mod config;
pub mod metrics;
mod subscriber;

pub use config::TelemetryConfig;
pub use metrics::{
    gather_metrics, register_metrics, BACKGROUND_TASKS_DROPPED, REMOTE_NOTIFY_FAILURES,
    STORAGE_WRITE_FAILURES, SYNC_ABORTED, SYNC_RAISED, SYNC_UP_TO_DATE, XP_GAINED,
    XP_SOURCE_LABELS, xp_source_label,
};
pub use subscriber::init_subscriber;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The global subscriber could not be installed.
    #[error("Failed to initialize tracing subscriber: {0}")]
    Subscriber(String),

    /// A Prometheus collector could not be registered or encoded.
    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}

/// Initialize logging and, when enabled, metrics.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    if config.metrics_enabled {
        register_metrics()?;
    }
    init_subscriber(config)
}
