//! # Domain Entities
//!
//! The cached user record and the read-only records the completion feeds
//! and the catalog report.

use serde::{Deserialize, Serialize};

use super::invariants::MIN_LEVEL;

/// Cached user record: identity plus gamified progress.
///
/// Serialized in camelCase, which is the layout of the persisted slot.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Stable user identifier.
    pub id: String,
    /// Login email.
    pub email: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Employee number.
    #[serde(default)]
    pub employee_id: String,
    /// Department name.
    #[serde(default)]
    pub department: String,
    /// Job role.
    #[serde(default)]
    pub role: String,
    /// Manager display name.
    #[serde(default)]
    pub manager_name: String,
    /// Start date, ISO 8601 (`YYYY-MM-DD`).
    #[serde(default)]
    pub start_date: String,
    /// Level, always >= 1.
    pub level: u32,
    /// Cumulative XP.
    pub current_xp: u64,
    /// Consecutive active days.
    #[serde(default)]
    pub streak_days: u32,
    /// Whether the onboarding intro was completed.
    #[serde(default)]
    pub intro_completed: bool,
}

impl User {
    /// Create a user at level 1 with no XP.
    pub fn new(
        id: impl Into<String>,
        email: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            employee_id: String::new(),
            department: String::new(),
            role: String::new(),
            manager_name: String::new(),
            start_date: String::new(),
            level: MIN_LEVEL,
            current_xp: 0,
            streak_days: 0,
            intro_completed: false,
        }
    }

    /// Replace the progress fields.
    pub fn with_progress(mut self, current_xp: u64, level: u32) -> Self {
        self.current_xp = current_xp;
        self.level = level.max(MIN_LEVEL);
        self
    }

    /// Display name, "First Last".
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Partial update for [`User`]; `None` fields are left untouched.
///
/// Applied as a shallow merge. Progress fields set here bypass the ledger.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct UserPatch {
    /// New email.
    pub email: Option<String>,
    /// New first name.
    pub first_name: Option<String>,
    /// New last name.
    pub last_name: Option<String>,
    /// New employee id.
    pub employee_id: Option<String>,
    /// New department.
    pub department: Option<String>,
    /// New role.
    pub role: Option<String>,
    /// New manager name.
    pub manager_name: Option<String>,
    /// New start date.
    pub start_date: Option<String>,
    /// Level, taken as-is.
    pub level: Option<u32>,
    /// XP total, taken as-is.
    pub current_xp: Option<u64>,
    /// Consecutive active days.
    pub streak_days: Option<u32>,
    /// Whether the intro was completed.
    pub intro_completed: Option<bool>,
}

impl UserPatch {
    /// Shallow-merge this patch over `user`. The id is never patched.
    pub fn apply_to(&self, user: &User) -> User {
        let mut merged = user.clone();
        if let Some(v) = &self.email {
            merged.email = v.clone();
        }
        if let Some(v) = &self.first_name {
            merged.first_name = v.clone();
        }
        if let Some(v) = &self.last_name {
            merged.last_name = v.clone();
        }
        if let Some(v) = &self.employee_id {
            merged.employee_id = v.clone();
        }
        if let Some(v) = &self.department {
            merged.department = v.clone();
        }
        if let Some(v) = &self.role {
            merged.role = v.clone();
        }
        if let Some(v) = &self.manager_name {
            merged.manager_name = v.clone();
        }
        if let Some(v) = &self.start_date {
            merged.start_date = v.clone();
        }
        if let Some(v) = self.level {
            merged.level = v;
        }
        if let Some(v) = self.current_xp {
            merged.current_xp = v;
        }
        if let Some(v) = self.streak_days {
            merged.streak_days = v;
        }
        if let Some(v) = self.intro_completed {
            merged.intro_completed = v;
        }
        merged
    }

    /// True when the patch touches `level` or `current_xp`.
    pub fn touches_progress(&self) -> bool {
        self.level.is_some() || self.current_xp.is_some()
    }
}

/// A completed task as reported by the task feed.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskCompletion {
    /// Points awarded for the task.
    pub points: u64,
}

/// Per-module progress as reported by the module feed.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModuleProgress {
    /// Module identifier.
    pub module_id: String,
    /// Completion percentage, 0-100.
    pub progress_percent: u8,
}

impl ModuleProgress {
    /// Create a progress record, clamping the percentage to 100.
    pub fn new(module_id: impl Into<String>, progress_percent: u8) -> Self {
        Self {
            module_id: module_id.into(),
            progress_percent: progress_percent.min(100),
        }
    }

    /// A module counts as completed at 100%.
    pub fn is_completed(&self) -> bool {
        self.progress_percent >= 100
    }
}

/// Catalog entry describing a module's XP reward.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ModuleCatalogEntry {
    /// Module identifier.
    #[serde(alias = "id")]
    pub module_id: String,
    /// XP awarded when the module is completed.
    pub xp_reward: u64,
    /// Human-readable title.
    pub title: String,
}

impl ModuleCatalogEntry {
    /// Create a catalog entry.
    pub fn new(module_id: impl Into<String>, xp_reward: u64, title: impl Into<String>) -> Self {
        Self {
            module_id: module_id.into(),
            xp_reward,
            title: title.into(),
        }
    }
}

/// Learning track chosen at registration.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum LearningProfile {
    /// Data science track.
    #[serde(rename = "Data Scientist")]
    DataScientist,
    /// Business analysis track.
    #[serde(rename = "Business Analyst")]
    BusinessAnalyst,
}

/// Fields submitted to the auth service when registering.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Account email.
    pub email: String,
    /// Chosen password.
    pub password: String,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Employee id.
    pub employee_id: String,
    /// Job role.
    pub role: String,
    /// Optional learning track.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learning_profile: Option<LearningProfile>,
}
