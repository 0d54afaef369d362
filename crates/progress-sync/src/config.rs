//! # Progress Sync Configuration
//!
//! Configuration for the session controller and its adapters.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::domain::ENVELOPE_VERSION;

/// Progress sync configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Base URL of the remote progress service.
    pub remote_base_url: String,

    /// Name of the durable storage slot holding the session envelope.
    pub storage_slot: String,

    /// Version marker written into the envelope.
    pub storage_version: u32,

    /// Delay between session start and the first task-feed sync, so the
    /// start-up upsert is likely to land first.
    pub start_sync_delay_ms: u64,

    /// Remote request timeout in milliseconds.
    pub request_timeout_ms: u64,

    /// Maximum detached background tasks in flight.
    pub max_background_tasks: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            remote_base_url: "http://localhost:3001".to_string(),
            storage_slot: "auth-storage".to_string(),
            storage_version: ENVELOPE_VERSION,
            start_sync_delay_ms: 1000,
            request_timeout_ms: 5000,
            max_background_tasks: 64,
        }
    }
}

impl SyncConfig {
    /// Create configuration from environment variables, falling back to
    /// defaults.
    ///
    /// # Environment Variables
    ///
    /// - `PX_REMOTE_URL`: remote base URL
    /// - `PX_STORAGE_SLOT`: storage slot name
    /// - `PX_START_SYNC_DELAY_MS`: delay before the start-up sync
    /// - `PX_REQUEST_TIMEOUT_MS`: remote request timeout
    /// - `PX_MAX_BACKGROUND_TASKS`: background task bound
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            remote_base_url: env::var("PX_REMOTE_URL").unwrap_or(defaults.remote_base_url),
            storage_slot: env::var("PX_STORAGE_SLOT").unwrap_or(defaults.storage_slot),
            storage_version: defaults.storage_version,
            start_sync_delay_ms: parse_env("PX_START_SYNC_DELAY_MS")
                .unwrap_or(defaults.start_sync_delay_ms),
            request_timeout_ms: parse_env("PX_REQUEST_TIMEOUT_MS")
                .unwrap_or(defaults.request_timeout_ms),
            max_background_tasks: parse_env("PX_MAX_BACKGROUND_TASKS")
                .unwrap_or(defaults.max_background_tasks),
        }
    }

    /// Create a config for testing (no start-up delay).
    pub fn for_testing() -> Self {
        Self {
            remote_base_url: "http://127.0.0.1:9".to_string(),
            storage_slot: "auth-storage".to_string(),
            storage_version: ENVELOPE_VERSION,
            start_sync_delay_ms: 0,
            request_timeout_ms: 500,
            max_background_tasks: 16,
        }
    }

    /// Start-up sync delay.
    pub fn start_sync_delay(&self) -> Duration {
        Duration::from_millis(self.start_sync_delay_ms)
    }

    /// Remote request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
