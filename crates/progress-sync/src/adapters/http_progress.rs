//! HTTP Progress Service Adapter
//!
//! Implements the `ProgressService` port against the remote progress REST API.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::domain::{ModuleProgress, ProgressError, TaskCompletion, UserSnapshot, XpGainReport};
use crate::ports::outbound::ProgressService;

/// JSON-over-HTTP connection to the remote progress service.
pub struct HttpProgressService {
    client: Client,
    base_url: String,
}

impl HttpProgressService {
    /// Create a client for `base_url` (e.g. "http://localhost:3001").
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ProgressError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(2)))
            .build()
            .map_err(|e| ProgressError::RemoteNotify(format!("HTTP client init: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<(), ProgressError> {
        let url = self.url(path);
        debug!("[progress] POST {}", url);

        self.client
            .post(&url)
            .json(body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ProgressError::RemoteNotify(describe(&url, &e)))?;
        Ok(())
    }

    async fn get_json<R: DeserializeOwned>(&self, path: &str) -> Result<R, ProgressError> {
        let url = self.url(path);
        debug!("[progress] GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ProgressError::FeedFetch(describe(&url, &e)))?;

        response
            .json::<R>()
            .await
            .map_err(|e| ProgressError::FeedFetch(format!("{url}: undecodable body: {e}")))
    }
}

fn describe(url: &str, e: &reqwest::Error) -> String {
    if e.is_connect() {
        format!("cannot connect to {url}")
    } else if e.is_timeout() {
        format!("{url}: timed out")
    } else if let Some(status) = e.status() {
        format!("{url}: status {status}")
    } else {
        format!("{url}: {e}")
    }
}

// --- Wire types ---

#[derive(Debug, Default, Deserialize)]
struct TasksResponse {
    #[serde(default)]
    data: Option<TasksData>,
}

#[derive(Debug, Default, Deserialize)]
struct TasksData {
    #[serde(default)]
    completed_tasks: Option<Vec<WireTask>>,
}

#[derive(Debug, Deserialize)]
struct WireTask {
    #[serde(default)]
    points: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ModulesResponse {
    #[serde(default)]
    progress: Option<Vec<WireModuleProgress>>,
}

#[derive(Debug, Deserialize)]
struct WireModuleProgress {
    module_id: String,
    #[serde(default)]
    progress: f64,
}

impl TasksResponse {
    fn into_completions(self) -> Vec<TaskCompletion> {
        self.data
            .and_then(|d| d.completed_tasks)
            .unwrap_or_default()
            .into_iter()
            .map(|t| TaskCompletion {
                points: t.points.unwrap_or(0),
            })
            .collect()
    }
}

impl ModulesResponse {
    fn into_progress(self) -> Vec<ModuleProgress> {
        self.progress
            .unwrap_or_default()
            .into_iter()
            .map(|m| {
                let percent = m.progress.clamp(0.0, 100.0) as u8;
                ModuleProgress::new(m.module_id, percent)
            })
            .collect()
    }
}

#[async_trait]
impl ProgressService for HttpProgressService {
    async fn upsert_user(&self, snapshot: &UserSnapshot) -> Result<(), ProgressError> {
        self.post_json("/api/users/upsert", snapshot).await
    }

    async fn report_xp_gain(&self, report: &XpGainReport) -> Result<(), ProgressError> {
        self.post_json("/api/users/update-xp", report).await
    }

    async fn get_completed_tasks(
        &self,
        user_id: &str,
    ) -> Result<Vec<TaskCompletion>, ProgressError> {
        let response: TasksResponse = self.get_json(&format!("/api/tasks/{user_id}")).await?;
        Ok(response.into_completions())
    }

    async fn get_module_progress(
        &self,
        user_id: &str,
    ) -> Result<Vec<ModuleProgress>, ProgressError> {
        let response: ModulesResponse =
            self.get_json(&format!("/api/user-modules/{user_id}")).await?;
        Ok(response.into_progress())
    }
}
