//! Sale-phase state machine and contribution admissibility.
//!
//!   NotStarted → Presale [presale_start, presale_end] → Gap
//!             → PublicSale [public_sale_start, public_sale_end] → Closed
//!
//! Stateless: every answer is a function of the params and `now` alone.

use serde::Serialize;

use crowdsale_core::error::SaleError;
use crowdsale_core::params::SaleParams;
use crowdsale_core::types::{Balance, Tier, Timestamp};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SalePhase {
    NotStarted,
    Presale,
    Gap,
    PublicSale,
    Closed,
}

pub struct ParticipationGate<'a> {
    params: &'a SaleParams,
}

impl<'a> ParticipationGate<'a> {
    pub fn new(params: &'a SaleParams) -> Self {
        Self { params }
    }

    pub fn phase(&self, now: Timestamp) -> SalePhase {
        let p = self.params;
        if now < p.presale_start {
            SalePhase::NotStarted
        } else if now <= p.presale_end {
            SalePhase::Presale
        } else if now < p.public_sale_start {
            SalePhase::Gap
        } else if now <= p.public_sale_end {
            SalePhase::PublicSale
        } else {
            SalePhase::Closed
        }
    }

    /// Every tier unlocks at presale start; anything else reports 0.
    pub fn tier_unlock_time(&self, group: u8) -> Timestamp {
        match Tier::from_group(group) {
            Some(_) => self.params.presale_start,
            None => 0,
        }
    }

    pub fn is_unlocked(&self, group: u8, now: Timestamp) -> bool {
        Tier::from_group(group).is_some() && self.tier_unlock_time(group) <= now
    }

    /// Contribution cap of `group` at `now`, in whole tokens purchased.
    pub fn max_contribution(&self, group: u8, now: Timestamp) -> Balance {
        let Some(tier) = Tier::from_group(group) else {
            return 0;
        };
        match self.phase(now) {
            SalePhase::Presale => self.params.presale_cap(tier),
            SalePhase::PublicSale => self.params.max_contribution,
            _ => 0,
        }
    }

    /// Check whether a purchase of `purchase` base units is admissible for a
    /// payer in `group` who has already bought `prior` base units.
    ///
    /// `SaleError::CapExceeded` is the only failure that calls for a refund on
    /// the native channel.
    pub fn admit(
        &self,
        group: u8,
        now: Timestamp,
        remaining_supply: Balance,
        prior: Balance,
        purchase: Balance,
    ) -> Result<(), SaleError> {
        if Tier::from_group(group).is_none() {
            return Err(SaleError::NotWhitelisted);
        }
        if !self.is_unlocked(group, now) {
            return Err(SaleError::GroupLocked { group });
        }
        if remaining_supply == 0 {
            return Err(SaleError::SupplyExhausted);
        }
        let cap = SaleParams::to_base_units(self.max_contribution(group, now))?;
        let total = prior.checked_add(purchase).ok_or(SaleError::Overflow)?;
        if total > cap {
            return Err(SaleError::CapExceeded { total, cap });
        }
        Ok(())
    }
}
