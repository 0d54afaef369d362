//! # Catch-up Planning
//!
//! Feeds report totals, never deltas. The gain is always the difference
//! between the feed total and the cached XP, and only when the cache is
//! behind.

use crate::domain::{User, XpLedger};

/// What a catch-up sync should do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CatchUpPlan {
    /// The cache already covers the feed total (or exceeds it).
    UpToDate {
        /// Cached XP.
        cached: u64,
        /// Feed total.
        authoritative: u64,
    },
    /// The cache is behind by `gain`.
    Raise {
        /// XP to credit.
        gain: u64,
    },
}

/// Compare cached XP against a feed total.
pub fn plan_catch_up(cached: u64, authoritative: u64) -> CatchUpPlan {
    if cached >= authoritative {
        CatchUpPlan::UpToDate {
            cached,
            authoritative,
        }
    } else {
        CatchUpPlan::Raise {
            gain: authoritative - cached,
        }
    }
}

/// Apply a plan to `user`. `None` when nothing changes.
pub fn apply_catch_up(user: &User, authoritative: u64) -> Option<(u64, User)> {
    match plan_catch_up(user.current_xp, authoritative) {
        CatchUpPlan::UpToDate { .. } => None,
        CatchUpPlan::Raise { gain } => Some((gain, XpLedger::credit(user, gain))),
    }
}
