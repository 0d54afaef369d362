//! # Domain Value Objects
//!
//! Immutable value types for progress sync.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::entities::User;

/// Which completion feed a catch-up sync reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedKind {
    /// Completed tasks, total = sum of points.
    Tasks,
    /// Completed modules, total = sum of catalog XP rewards.
    Modules,
}

impl FeedKind {
    /// Stable label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedKind::Tasks => "tasks",
            FeedKind::Modules => "modules",
        }
    }
}

impl fmt::Display for FeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one catch-up sync. Never carries an error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Cached XP was behind and has been raised to the feed total.
    Raised {
        /// Feed that was read.
        feed: FeedKind,
        /// XP credited.
        gained: u64,
        /// XP after the sync.
        new_xp: u64,
        /// Level after the sync.
        new_level: u32,
        /// Whether the raise reached durable storage. When `false` the write
        /// failed and only memory holds the raise.
        persisted: bool,
    },
    /// Cached XP already covered the feed total.
    UpToDate {
        /// Feed that was read.
        feed: FeedKind,
        /// Cached XP.
        cached: u64,
        /// Feed total.
        authoritative: u64,
    },
    /// No session, or the session changed while the feed was in flight.
    Skipped,
    /// The feed could not be fetched.
    Aborted {
        /// Feed that failed.
        feed: FeedKind,
    },
}

impl SyncOutcome {
    /// Whether the sync changed the cached user.
    pub fn raised(&self) -> bool {
        matches!(self, SyncOutcome::Raised { .. })
    }
}

/// Active or anonymous session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    /// No user.
    Anonymous,
    /// User present and authenticated.
    Active,
}

/// Identifies one session lifetime; writes computed under an older token
/// are discarded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionToken(pub u64);

/// A module that contributed to the module feed total.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleContribution {
    /// Module identifier.
    pub module_id: String,
    /// XP it contributes (0 when not in the catalog).
    pub xp_reward: u64,
    /// Catalog title, or "Unknown Module".
    pub title: String,
}

/// Title used for completed modules the catalog does not know.
pub const UNKNOWN_MODULE_TITLE: &str = "Unknown Module";

/// User snapshot pushed to the remote progress service on upsert.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserSnapshot {
    /// User id.
    pub id: String,
    /// Email.
    pub email: String,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Job role.
    pub role: String,
    /// XP total.
    pub current_xp: u64,
    /// Level.
    pub level: u32,
    /// Streak in days.
    pub streak_days: u32,
}

impl From<&User> for UserSnapshot {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            role: user.role.clone(),
            current_xp: user.current_xp,
            level: user.level,
            streak_days: user.streak_days,
        }
    }
}

/// Audit event for an explicit XP gain.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct XpGainReport {
    /// User credited.
    pub user_id: String,
    /// XP credited by this event.
    pub xp_gain: u64,
    /// XP total after the gain.
    pub new_xp: u64,
    /// Level after the gain.
    pub new_level: u32,
    /// Caller-supplied origin of the gain.
    pub source: String,
}

/// Persisted slot contents.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PersistedEnvelope {
    /// Session state.
    pub state: PersistedState,
    /// Forward-compatibility marker; not used for migration.
    pub version: u32,
}

/// Session state inside the persisted envelope.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    /// Cached user, `null` when logged out.
    pub user: Option<User>,
    /// Authenticated flag.
    pub is_authenticated: bool,
}

impl PersistedEnvelope {
    /// Envelope for an active session.
    pub fn active(user: User, version: u32) -> Self {
        Self {
            state: PersistedState {
                user: Some(user),
                is_authenticated: true,
            },
            version,
        }
    }

    /// Envelope written on logout.
    pub fn logged_out(version: u32) -> Self {
        Self {
            state: PersistedState {
                user: None,
                is_authenticated: false,
            },
            version,
        }
    }

    /// The stored user, if the envelope describes an authenticated session.
    pub fn into_user(self) -> Option<User> {
        if self.state.is_authenticated {
            self.state.user
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_kind_labels() {
        assert_eq!(FeedKind::Tasks.as_str(), "tasks");
        assert_eq!(FeedKind::Modules.to_string(), "modules");
    }

    #[test]
    fn test_envelope_layout() {
        let user = User::new("u1", "a@b.c", "Ada", "Lovelace");
        let envelope = PersistedEnvelope::active(user, 0);
        let json = serde_json::to_value(&envelope).unwrap();

        assert_eq!(json["version"], 0);
        assert_eq!(json["state"]["isAuthenticated"], true);
        assert_eq!(json["state"]["user"]["id"], "u1");
    }

    #[test]
    fn test_envelope_unauthenticated_has_no_user() {
        let envelope: PersistedEnvelope = serde_json::from_str(
            r#"{"state":{"user":null,"isAuthenticated":false},"version":0}"#,
        )
        .unwrap();
        assert_eq!(envelope, PersistedEnvelope::logged_out(0));
        assert!(envelope.into_user().is_none());
    }

    #[test]
    fn test_snapshot_from_user() {
        let mut user = User::new("u1", "a@b.c", "Ada", "Lovelace").with_progress(535, 4);
        user.streak_days = 7;
        let snapshot = UserSnapshot::from(&user);
        assert_eq!(snapshot.current_xp, 535);
        assert_eq!(snapshot.level, 4);
        assert_eq!(snapshot.streak_days, 7);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["currentXp"], 535);
        assert_eq!(json["streakDays"], 7);
    }

    #[test]
    fn test_gain_report_wire_names() {
        let report = XpGainReport {
            user_id: "u1".into(),
            xp_gain: 50,
            new_xp: 535,
            new_level: 4,
            source: "quiz".into(),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["xpGain"], 50);
        assert_eq!(json["newLevel"], 4);
    }
}
