//! HTTP Auth Service Adapter
//!
//! Implements the `AuthService` port against `POST /api/login` and
//! `POST /api/register`. Both answer `{ success, user, error }` with the user
//! in snake_case.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::domain::{ProgressError, RegisterRequest, User, MIN_LEVEL};
use crate::ports::outbound::AuthService;

/// JSON-over-HTTP connection to the auth endpoints.
pub struct HttpAuthService {
    client: Client,
    base_url: String,
}

impl HttpAuthService {
    /// Create a client for `base_url`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ProgressError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProgressError::RemoteNotify(format!("HTTP client init: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// POST `body` to `path`.
    ///
    /// Transport failures are `AuthUnavailable`. A reply that is not an auth
    /// response (any status) reads as an unsuccessful one.
    async fn post(
        &self,
        path: &str,
        body: &(impl Serialize + Sync),
    ) -> Result<AuthResponse, ProgressError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("[progress] POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| ProgressError::AuthUnavailable(format!("{url}: {e}")))?;
        let status = response.status();

        // The register endpoint reports failures in the body, whatever the status
        match response.json::<AuthResponse>().await {
            Ok(body) => Ok(body),
            Err(e) => {
                debug!("[progress] Undecodable reply from {} ({}): {}", url, status, e);
                Ok(AuthResponse::default())
            }
        }
    }
}

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct AuthResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    user: Option<WireUser>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireUser {
    id: String,
    email: String,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    employee_id: Option<String>,
    #[serde(default)]
    department: Option<String>,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    manager_name: Option<String>,
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    level: Option<u32>,
    #[serde(default)]
    current_xp: Option<u64>,
    #[serde(default)]
    streak_days: Option<u32>,
    #[serde(default)]
    intro_completed: Option<bool>,
}

impl From<WireUser> for User {
    fn from(w: WireUser) -> Self {
        let mut user = User::new(
            w.id,
            w.email,
            w.first_name.unwrap_or_default(),
            w.last_name.unwrap_or_default(),
        )
        .with_progress(w.current_xp.unwrap_or(0), w.level.unwrap_or(MIN_LEVEL));
        user.employee_id = w.employee_id.unwrap_or_default();
        user.department = w.department.unwrap_or_default();
        user.role = w.role.unwrap_or_default();
        user.manager_name = w.manager_name.unwrap_or_default();
        user.start_date = w.start_date.unwrap_or_default();
        user.streak_days = w.streak_days.unwrap_or(0);
        user.intro_completed = w.intro_completed.unwrap_or(false);
        user
    }
}

impl AuthResponse {
    fn into_user(self) -> Result<User, Option<String>> {
        match (self.success, self.user) {
            (true, Some(user)) => Ok(user.into()),
            _ => Err(self.error),
        }
    }
}

#[async_trait]
impl AuthService for HttpAuthService {
    async fn login(&self, email: &str, password: &str) -> Result<User, ProgressError> {
        self.post("/api/login", &LoginBody { email, password })
            .await?
            .into_user()
            .map_err(|_| ProgressError::AuthFailure)
    }

    async fn register(&self, request: &RegisterRequest) -> Result<User, ProgressError> {
        let response = self
            .post("/api/register", request)
            .await
            .map_err(|e| ProgressError::RegistrationFailure(e.to_string()))?;
        response.into_user().map_err(|reason| {
            ProgressError::RegistrationFailure(
                reason.unwrap_or_else(|| "Registration failed".to_string()),
            )
        })
    }
}
