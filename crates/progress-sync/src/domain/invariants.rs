//! # Domain Invariants
//!
//! Progress rules that must always hold.

use super::entities::User;

/// XP needed per level.
pub const XP_PER_LEVEL: u64 = 150;

/// Lowest level a user can have.
pub const MIN_LEVEL: u32 = 1;

/// Version marker written into the persisted envelope.
pub const ENVELOPE_VERSION: u32 = 0;

/// After a ledger mutation the level is the larger of the
/// previous level and the level derived from the new XP.
pub fn invariant_level_consistent(before: &User, after: &User) -> bool {
    let derived = (after.current_xp / XP_PER_LEVEL).saturating_add(1);
    let derived = u32::try_from(derived).unwrap_or(u32::MAX);
    after.level == before.level.max(derived)
}

/// Progress never goes backwards.
pub fn invariant_progress_monotonic(before: &User, after: &User) -> bool {
    after.current_xp >= before.current_xp && after.level >= before.level
}
