//! # XP Ledger
//!
//! Pure level/XP arithmetic. Every XP increase in the crate goes through
//! [`XpLedger::apply_gain`] or [`XpLedger::credit`].

use super::entities::User;
use super::errors::ProgressError;
use super::invariants::{invariant_level_consistent, invariant_progress_monotonic, XP_PER_LEVEL};

/// Level derivation and gain application.
#[derive(Clone, Copy, Debug, Default)]
pub struct XpLedger;

impl XpLedger {
    /// `floor(xp / 150) + 1`.
    pub fn derive_level(xp: u64) -> u32 {
        let level = (xp / XP_PER_LEVEL).saturating_add(1);
        u32::try_from(level).unwrap_or(u32::MAX)
    }

    /// Apply a caller-supplied gain.
    ///
    /// # Errors
    /// - `InvalidGain` if `gain` is negative; `user` is not touched.
    pub fn apply_gain(user: &User, gain: i64) -> Result<User, ProgressError> {
        let gain = u64::try_from(gain).map_err(|_| ProgressError::InvalidGain(gain))?;
        Ok(Self::credit(user, gain))
    }

    /// Credit a non-negative gain. `gain = 0` returns an identical user
    /// unless the stored level lags the derived one.
    pub fn credit(user: &User, gain: u64) -> User {
        let mut updated = user.clone();
        updated.current_xp = user.current_xp.saturating_add(gain);
        updated.level = user.level.max(Self::derive_level(updated.current_xp));

        debug_assert!(invariant_level_consistent(user, &updated));
        debug_assert!(invariant_progress_monotonic(user, &updated));
        updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn user(xp: u64, level: u32) -> User {
        User::new("u1", "jane@acme.com", "Jane", "Patel").with_progress(xp, level)
    }

    #[test]
    fn test_derive_level_boundaries() {
        assert_eq!(XpLedger::derive_level(0), 1);
        assert_eq!(XpLedger::derive_level(149), 1);
        assert_eq!(XpLedger::derive_level(150), 2);
        assert_eq!(XpLedger::derive_level(449), 3);
        assert_eq!(XpLedger::derive_level(450), 4);
    }

    #[test]
    fn test_apply_gain_crosses_level() {
        let updated = XpLedger::apply_gain(&user(485, 3), 50).unwrap();
        assert_eq!(updated.current_xp, 535);
        assert_eq!(updated.level, 4);
    }

    #[test]
    fn test_apply_gain_keeps_higher_stored_level() {
        let updated = XpLedger::apply_gain(&user(100, 12), 10).unwrap();
        assert_eq!(updated.current_xp, 110);
        assert_eq!(updated.level, 12);
    }

    #[test]
    fn test_zero_gain_is_identity() {
        let before = user(485, 4);
        let after = XpLedger::apply_gain(&before, 0).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_negative_gain_rejected() {
        let before = user(485, 3);
        let result = XpLedger::apply_gain(&before, -1);
        assert!(matches!(result, Err(ProgressError::InvalidGain(-1))));
    }

    #[test]
    fn test_credit_saturates() {
        let updated = XpLedger::credit(&user(u64::MAX - 1, 1), 10);
        assert_eq!(updated.current_xp, u64::MAX);
        assert_eq!(updated.level, u32::MAX);
    }

    proptest! {
        #[test]
        fn prop_gains_never_regress(
            start_xp in 0u64..1_000_000,
            start_level in 1u32..100,
            gains in proptest::collection::vec(0i64..10_000, 0..20),
        ) {
            let mut current = user(start_xp, start_level);
            for gain in gains {
                let next = XpLedger::apply_gain(&current, gain).unwrap();
                prop_assert!(invariant_progress_monotonic(&current, &next));
                prop_assert!(invariant_level_consistent(&current, &next));
                prop_assert_eq!(next.current_xp, current.current_xp + gain as u64);
                current = next;
            }
        }
    }
}
