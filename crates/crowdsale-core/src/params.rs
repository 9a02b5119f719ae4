use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::SaleError;
use crate::types::{AllocationClass, Asset, Balance, Identity, Tier, Timestamp};

/// Release timing for one allocation class: the first tranche unlocks
/// `cliff_secs` after initialisation, the rest every `period_secs` after that.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestingTerms {
    pub cliff_secs: i64,
    pub period_secs: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VestingParams {
    pub incentive: VestingTerms,
    pub private_sale: VestingTerms,
    pub company: VestingTerms,
}

impl Default for VestingParams {
    fn default() -> Self {
        Self {
            incentive: VestingTerms {
                cliff_secs: INCENTIVE_CLIFF_SECS,
                period_secs: INCENTIVE_PERIOD_SECS,
            },
            private_sale: VestingTerms {
                cliff_secs: PRIVATE_SALE_CLIFF_SECS,
                period_secs: PRIVATE_SALE_PERIOD_SECS,
            },
            company: VestingTerms {
                cliff_secs: COMPANY_CLIFF_SECS,
                period_secs: COMPANY_PERIOD_SECS,
            },
        }
    }
}

/// Accepted currencies and their exchange rates (tokens per whole unit).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrencyParams {
    pub allows_neo: bool,
    pub allows_gas: bool,
    pub allows_eth: bool,
    pub neo_rate: u128,
    pub gas_rate: u128,
    pub eth_rate: u128,
    /// Smallest bridged contribution, in wei.
    pub eth_minimum_contribution: Balance,
}

impl Default for CurrencyParams {
    fn default() -> Self {
        Self {
            allows_neo: ALLOWS_NEO,
            allows_gas: ALLOWS_GAS,
            allows_eth: ALLOWS_ETH,
            neo_rate: NEO_TO_TOKEN_RATE,
            gas_rate: GAS_TO_TOKEN_RATE,
            eth_rate: ETH_TO_TOKEN_RATE,
            eth_minimum_contribution: ETH_MINIMUM_CONTRIBUTION_WEI,
        }
    }
}

/// Complete sale configuration.
///
/// Supply and cap figures are whole tokens; the ledger scales them by
/// `TOKEN_FACTOR` when comparing against base-unit balances.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaleParams {
    pub initial_admin: Identity,
    pub kyc_middleware_key: Identity,
    pub eth_listener_key: Identity,
    pub project_account: Identity,
    pub unsold_token_fund: Identity,
    pub locked_reserve_account: Identity,

    pub max_supply: Balance,
    pub immediate_company_reserve: Balance,
    pub locked_token_allocation: Balance,

    pub max_contribution: Balance,
    /// Presale caps for tiers 1..=4, in that order.
    pub presale_tier_caps: [Balance; 4],

    pub presale_start: Timestamp,
    pub presale_end: Timestamp,
    pub public_sale_start: Timestamp,
    pub public_sale_end: Timestamp,

    pub currencies: CurrencyParams,
    pub vesting: VestingParams,

    pub whitelist_transfer_from: bool,
}

impl Default for SaleParams {
    fn default() -> Self {
        Self {
            initial_admin: Identity(INITIAL_ADMIN_ACCOUNT),
            kyc_middleware_key: Identity(KYC_MIDDLEWARE_KEY),
            eth_listener_key: Identity(ETH_CONTRIBUTION_LISTENER_KEY),
            project_account: Identity(PROJECT_ACCOUNT),
            unsold_token_fund: Identity(ADDITIONAL_COMPANY_TOKEN_FUND),
            locked_reserve_account: Identity(LOCKED_RESERVE_ACCOUNT),
            max_supply: TOKEN_MAX_SUPPLY,
            immediate_company_reserve: IMMEDIATE_COMPANY_RESERVE,
            locked_token_allocation: LOCKED_TOKEN_ALLOCATION,
            max_contribution: MAX_CONTRIBUTION,
            presale_tier_caps: [
                PRESALE_TIER_ONE,
                PRESALE_TIER_TWO,
                PRESALE_TIER_THREE,
                PRESALE_TIER_FOUR,
            ],
            presale_start: PRESALE_START_TIMESTAMP,
            presale_end: PRESALE_END_TIMESTAMP,
            public_sale_start: PUBLIC_SALE_START_TIMESTAMP,
            public_sale_end: PUBLIC_SALE_END_TIMESTAMP,
            currencies: CurrencyParams::default(),
            vesting: VestingParams::default(),
            whitelist_transfer_from: WHITELIST_TRANSFER_FROM_LISTINGS,
        }
    }
}

impl SaleParams {
    /// Parse params from JSON. Missing fields fall back to the defaults.
    pub fn from_json_str(json: &str) -> Result<Self, SaleError> {
        let params: Self =
            serde_json::from_str(json).map_err(|e| SaleError::Serialization(e.to_string()))?;
        params.validate()?;
        Ok(params)
    }

    /// Check the windows are ordered and the reserves fit under the cap.
    pub fn validate(&self) -> Result<(), SaleError> {
        if !(self.presale_start <= self.presale_end
            && self.presale_end < self.public_sale_start
            && self.public_sale_start <= self.public_sale_end)
        {
            return Err(SaleError::InvalidParams(
                "sale windows must be ordered presale_start <= presale_end < public_sale_start <= public_sale_end".into(),
            ));
        }
        let reserved = self
            .immediate_company_reserve
            .checked_add(self.locked_token_allocation)
            .ok_or(SaleError::Overflow)?;
        if reserved > self.max_supply {
            return Err(SaleError::InvalidParams(format!(
                "reserves ({reserved}) exceed max supply ({})",
                self.max_supply
            )));
        }
        if self.project_account == self.locked_reserve_account {
            return Err(SaleError::InvalidParams(
                "project account and locked reserve account must differ".into(),
            ));
        }
        if self.presale_tier_caps.iter().any(|cap| *cap > self.max_contribution) {
            return Err(SaleError::InvalidParams(
                "presale tier caps must not exceed max_contribution".into(),
            ));
        }
        for terms in [&self.vesting.incentive, &self.vesting.private_sale, &self.vesting.company] {
            if terms.cliff_secs < 0 || terms.period_secs <= 0 {
                return Err(SaleError::InvalidParams(
                    "vesting cliff must be >= 0 and period > 0".into(),
                ));
            }
        }
        let rates = &self.currencies;
        if rates.neo_rate == 0 || rates.gas_rate == 0 || rates.eth_rate == 0 {
            return Err(SaleError::InvalidParams("exchange rates must be non-zero".into()));
        }
        self.max_supply_base()?;
        Ok(())
    }

    /// Scale a whole-token figure to base units.
    pub fn to_base_units(whole: Balance) -> Result<Balance, SaleError> {
        whole.checked_mul(TOKEN_FACTOR).ok_or(SaleError::Overflow)
    }

    pub fn max_supply_base(&self) -> Result<Balance, SaleError> {
        Self::to_base_units(self.max_supply)
    }

    pub fn presale_cap(&self, tier: Tier) -> Balance {
        self.presale_tier_caps[(tier.group() - 1) as usize]
    }

    pub fn vesting_terms(&self, class: AllocationClass) -> VestingTerms {
        match class {
            AllocationClass::Incentive => self.vesting.incentive,
            AllocationClass::PrivateSale => self.vesting.private_sale,
            AllocationClass::Company => self.vesting.company,
        }
    }

    // ── Pricing ──────────────────────────────────────────────────────────────

    pub fn accepts(&self, asset: Asset) -> bool {
        match asset {
            Asset::Neo => self.currencies.allows_neo,
            Asset::Gas => self.currencies.allows_gas,
            Asset::Eth => self.currencies.allows_eth,
        }
    }

    pub fn rate(&self, asset: Asset) -> u128 {
        match asset {
            Asset::Neo => self.currencies.neo_rate,
            Asset::Gas => self.currencies.gas_rate,
            Asset::Eth => self.currencies.eth_rate,
        }
    }

    /// Raw units per whole unit of `asset`.
    pub fn asset_factor(asset: Asset) -> u128 {
        match asset {
            Asset::Neo | Asset::Gas => NATIVE_ASSET_FACTOR,
            Asset::Eth => WEI_PER_ETH,
        }
    }

    /// Token base units bought by `amount` raw units of `asset`, truncated.
    pub fn tokens_for(&self, asset: Asset, amount: Balance) -> Result<Balance, SaleError> {
        let scaled = amount
            .checked_mul(self.rate(asset))
            .and_then(|v| v.checked_mul(TOKEN_FACTOR))
            .ok_or(SaleError::Overflow)?;
        Ok(scaled / Self::asset_factor(asset))
    }

    /// Raw units of `asset` that buy `tokens` base units, truncated toward zero.
    pub fn refund_for(&self, asset: Asset, tokens: Balance) -> Result<Balance, SaleError> {
        let numerator = tokens
            .checked_mul(Self::asset_factor(asset))
            .ok_or(SaleError::Overflow)?;
        let denominator = self
            .rate(asset)
            .checked_mul(TOKEN_FACTOR)
            .ok_or(SaleError::Overflow)?;
        Ok(numerator / denominator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        SaleParams::default().validate().expect("default params must validate");
    }

    #[test]
    fn native_pricing_is_exact() {
        let p = SaleParams::default();
        // 548 NEO buys exactly the tier-1 cap.
        let tokens = p.tokens_for(Asset::Neo, 548 * NATIVE_ASSET_FACTOR).unwrap();
        assert_eq!(tokens, MAX_CONTRIBUTION * TOKEN_FACTOR);
        assert_eq!(p.refund_for(Asset::Neo, tokens).unwrap(), 548 * NATIVE_ASSET_FACTOR);
    }

    #[test]
    fn eth_pricing_truncates() {
        let p = SaleParams::default();
        let tokens = p.tokens_for(Asset::Eth, WEI_PER_ETH).unwrap();
        assert_eq!(tokens, ETH_TO_TOKEN_RATE * TOKEN_FACTOR);
        // One base unit of token is worth less than a wei-exact refund; truncates.
        let refund = p.refund_for(Asset::Eth, 1).unwrap();
        assert_eq!(refund, WEI_PER_ETH / (ETH_TO_TOKEN_RATE * TOKEN_FACTOR));
    }

    #[test]
    fn unordered_windows_rejected() {
        let mut p = SaleParams::default();
        p.public_sale_start = p.presale_end;
        assert!(matches!(p.validate(), Err(SaleError::InvalidParams(_))));
    }

    #[test]
    fn oversized_reserves_rejected() {
        let mut p = SaleParams::default();
        p.locked_token_allocation = p.max_supply;
        assert!(p.validate().is_err());
    }

    #[test]
    fn json_overrides_merge_with_defaults() {
        let p = SaleParams::from_json_str(r#"{ "max_contribution": 100000 }"#).unwrap();
        assert_eq!(p.max_contribution, 100_000);
        assert_eq!(p.presale_start, PRESALE_START_TIMESTAMP);
    }
}
