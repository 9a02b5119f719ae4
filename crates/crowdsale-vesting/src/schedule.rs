//! Four-tranche vesting schedules.
//!
//! Every vested allocation is split into `VESTING_TRANCHES` releases of
//! `DISTRIBUTION_PERCENTAGE` percent each:
//!
//!   release_k = init_time + cliff + k × period      (k = 0..=3)
//!
//! | class        | cliff      | period     |
//! |--------------|------------|------------|
//! | incentive    | 1 year     | 4 months   |
//! | privateSale  | 0          | 3 months   |
//! | company      | 3 months   | 3 months   |
//!
//! Integer arithmetic throughout; rounding dust is added to the first tranche
//! so the four amounts always sum to the allocation.

use serde::{Deserialize, Serialize};

use crowdsale_core::constants::{DISTRIBUTION_PERCENTAGE, VESTING_TRANCHES};
use crowdsale_core::params::VestingTerms;
use crowdsale_core::types::{AllocationClass, Balance, Timestamp};

/// One scheduled release.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tranche {
    /// The tranche is locked while `now < release_at`.
    pub release_at: Timestamp,
    pub amount: Balance,
}

/// The stored vesting record of one identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestingSchedule {
    pub class: AllocationClass,
    pub tranches: [Tranche; VESTING_TRANCHES],
}

/// Split `amount` into the per-tranche amounts.
pub fn tranche_amounts(amount: Balance) -> [Balance; VESTING_TRANCHES] {
    let share = amount * DISTRIBUTION_PERCENTAGE / 100;
    let mut amounts = [share; VESTING_TRANCHES];
    // Add any rounding dust to the first release so the sum is exact.
    let rest = share * (VESTING_TRANCHES as Balance - 1);
    amounts[0] = amount - rest;
    amounts
}

impl VestingSchedule {
    /// Build the schedule for an allocation made under `class`.
    pub fn build(
        class: AllocationClass,
        amount: Balance,
        init_time: Timestamp,
        terms: VestingTerms,
    ) -> Self {
        let first = init_time.saturating_add(terms.cliff_secs);
        let amounts = tranche_amounts(amount);
        let tranches = std::array::from_fn(|k| Tranche {
            release_at: first.saturating_add(terms.period_secs.saturating_mul(k as i64)),
            amount: amounts[k],
        });
        Self { class, tranches }
    }

    pub fn total(&self) -> Balance {
        self.tranches.iter().map(|t| t.amount).sum()
    }

    /// Sum of tranches whose release time is still in the future.
    /// Recomputed on every call; never cached.
    pub fn locked_at(&self, now: Timestamp) -> Balance {
        self.tranches
            .iter()
            .filter(|t| t.release_at > now)
            .map(|t| t.amount)
            .sum()
    }

    pub fn released_at(&self, now: Timestamp) -> Balance {
        self.total() - self.locked_at(now)
    }

    /// The next tranche still locked at `now`, if any.
    pub fn next_release(&self, now: Timestamp) -> Option<&Tranche> {
        self.tranches.iter().find(|t| t.release_at > now)
    }

    pub fn final_release(&self) -> Timestamp {
        self.tranches[VESTING_TRANCHES - 1].release_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crowdsale_core::constants::{
        INCENTIVE_CLIFF_SECS, INCENTIVE_PERIOD_SECS, TOKEN_FACTOR,
    };
    use crowdsale_core::params::VestingParams;

    const INIT: Timestamp = 1_540_000_000;

    fn incentive() -> VestingTerms {
        VestingParams::default().incentive
    }

    #[test]
    fn tranches_sum_to_allocation() {
        for amount in [0, 1, 3, 4, 7, 999_999, 1_000_001, 265_000_000 * TOKEN_FACTOR + 3] {
            let total: Balance = tranche_amounts(amount).iter().sum();
            assert_eq!(total, amount, "tranches of {amount} must sum exactly");
        }
    }

    #[test]
    fn dust_goes_to_first_tranche() {
        assert_eq!(tranche_amounts(10), [4, 2, 2, 2]);
    }

    #[test]
    fn incentive_schedule_matches_terms() {
        let amount = 1_000_000 * TOKEN_FACTOR;
        let s = VestingSchedule::build(AllocationClass::Incentive, amount, INIT, incentive());
        assert_eq!(s.tranches[0].release_at, INIT + INCENTIVE_CLIFF_SECS);
        for k in 1..VESTING_TRANCHES {
            assert_eq!(
                s.tranches[k].release_at - s.tranches[k - 1].release_at,
                INCENTIVE_PERIOD_SECS
            );
        }
        assert!(s.tranches.iter().all(|t| t.amount == 250_000 * TOKEN_FACTOR));
        assert_eq!(s.locked_at(INIT), amount);
        assert_eq!(s.locked_at(s.final_release()), 0);
        assert_eq!(s.locked_at(s.final_release() + 1), 0);
    }

    #[test]
    fn private_sale_first_tranche_is_immediate() {
        let terms = VestingParams::default().private_sale;
        let s = VestingSchedule::build(AllocationClass::PrivateSale, 400, INIT, terms);
        assert_eq!(s.tranches[0].release_at, INIT);
        assert_eq!(s.locked_at(INIT), 300);
        assert_eq!(s.locked_at(INIT - 1), 400);
    }

    #[test]
    fn lock_is_monotone_in_time() {
        let s = VestingSchedule::build(AllocationClass::Incentive, 1_234_567, INIT, incentive());
        let mut prev = s.locked_at(INIT - 1);
        let mut t = INIT - 1;
        while t <= s.final_release() + 10 {
            let locked = s.locked_at(t);
            assert!(locked <= prev, "locked amount rose at {t}");
            prev = locked;
            t += 86_400;
        }
        assert_eq!(prev, 0);
    }

    #[test]
    fn next_release_walks_tranches() {
        let s = VestingSchedule::build(AllocationClass::Incentive, 100, INIT, incentive());
        assert_eq!(s.next_release(INIT).map(|t| t.release_at), Some(s.tranches[0].release_at));
        assert_eq!(
            s.next_release(s.tranches[1].release_at).map(|t| t.release_at),
            Some(s.tranches[2].release_at)
        );
        assert!(s.next_release(s.final_release()).is_none());
    }
}
