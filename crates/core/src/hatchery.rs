//! Hatchery - spawn cadence with catch-up.
//!
//! The hatchery record circulates on a node's `hatchery` topic. Every
//! invocation works out how many births are owed since `epoch_start_ms`; a
//! late invocation pays all of them at once.

use rand::Rng;

use crate::types::{HATCH_RATE_SECS, LIFESPAN_MAX_SECS, LIFESPAN_MIN_SECS};

/// Hatching cadence and lifespan range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HatchRules {
    pub rate_secs: u64,
    pub lifespan_min_secs: u32,
    pub lifespan_max_secs: u32,
}

impl Default for HatchRules {
    fn default() -> Self {
        Self {
            rate_secs: HATCH_RATE_SECS,
            lifespan_min_secs: LIFESPAN_MIN_SECS,
            lifespan_max_secs: LIFESPAN_MAX_SECS,
        }
    }
}

impl HatchRules {
    /// Lifespan for a new fish, in milliseconds (used as its message timeout).
    pub fn lifespan_ms<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        let lo = self.lifespan_min_secs.min(self.lifespan_max_secs);
        let hi = self.lifespan_min_secs.max(self.lifespan_max_secs);
        rng.random_range(lo..=hi).saturating_mul(1000)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hatchery {
    pub epoch_start_ms: u64,
    pub spawn_count: u64,
}

impl Hatchery {
    pub fn new(now_ms: u64) -> Self {
        Self {
            epoch_start_ms: now_ms,
            spawn_count: 0,
        }
    }

    /// Births owed at `now_ms`, recorded as spawned.
    ///
    /// A clock earlier than the epoch restarts the epoch at `now_ms` and owes
    /// nothing.
    pub fn due(&mut self, rules: &HatchRules, now_ms: u64) -> u64 {
        if now_ms < self.epoch_start_ms {
            *self = Self::new(now_ms);
            return 0;
        }
        let elapsed_secs = (now_ms - self.epoch_start_ms) / 1000;
        let total = elapsed_secs / rules.rate_secs.max(1);
        if total <= self.spawn_count {
            return 0;
        }
        let due = total - self.spawn_count;
        self.spawn_count = total;
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const T0: u64 = 1_000_000;

    #[test]
    fn first_birth_after_one_rate_period() {
        let rules = HatchRules::default();
        let mut h = Hatchery::new(T0);
        assert_eq!(h.due(&rules, T0 + 44_999), 0);
        assert_eq!(h.due(&rules, T0 + 46_000), 1);
        assert_eq!(h.spawn_count, 1);
        assert_eq!(h.due(&rules, T0 + 47_000), 0);
    }

    #[test]
    fn late_invocation_catches_up() {
        let rules = HatchRules::default();
        let mut h = Hatchery::new(T0);
        assert_eq!(h.due(&rules, T0 + 200_000), 4);
        assert_eq!(h.spawn_count, 4);

        let mut h = Hatchery::new(T0);
        assert_eq!(h.due(&rules, T0 + 46_000), 1);
        assert_eq!(h.due(&rules, T0 + 200_000), 3);
    }

    #[test]
    fn clock_regression_restarts_the_epoch() {
        let rules = HatchRules::default();
        let mut h = Hatchery {
            epoch_start_ms: T0,
            spawn_count: 7,
        };
        assert_eq!(h.due(&rules, T0 - 1), 0);
        assert_eq!(h, Hatchery::new(T0 - 1));
    }

    #[test]
    fn lifespans_stay_in_range() {
        let rules = HatchRules::default();
        let mut rng = Pcg32::seed_from_u64(11);
        for _ in 0..500 {
            let ms = rules.lifespan_ms(&mut rng);
            assert!((120_000..=240_000).contains(&ms));
            assert_eq!(ms % 1000, 0);
        }
    }
}
