use tracing::{debug, warn};

use crowdsale_core::command::{Command, InvocationContext, Query, QueryAnswer};
use crowdsale_core::error::SaleError;
use crowdsale_core::types::Timestamp;

use crate::engine::SaleEngine;

impl SaleEngine {
    /// Run one command and collapse the outcome to success or failure.
    /// Failures leave state untouched and are logged, never raised.
    pub fn execute(&self, ctx: &InvocationContext, command: &Command) -> bool {
        match self.try_execute(ctx, command) {
            Ok(done) => {
                debug!(op = command.name(), tx_id = %ctx.tx_id, done, "command applied");
                done
            }
            Err(e @ SaleError::DuplicateTransaction(_)) => {
                debug!(op = command.name(), error = %e, "command skipped");
                false
            }
            Err(e) => {
                warn!(op = command.name(), tx_id = %ctx.tx_id, error = %e, "command rejected");
                false
            }
        }
    }

    /// Run one command. `Ok(false)` means the contribution was refunded.
    pub fn try_execute(&self, ctx: &InvocationContext, command: &Command) -> Result<bool, SaleError> {
        match command {
            Command::MintTokens { payer, neo, gas } => {
                Ok(self.mint_tokens(ctx, *payer, *neo, *gas)?.is_minted())
            }
            Command::MintTokensEth { eth_address, neo_address, wei } => {
                Ok(self.mint_tokens_eth(ctx, eth_address, *neo_address, *wei)?.is_minted())
            }
            Command::AddAddress { address, group } => {
                self.whitelist().add_address(ctx, address, *group).map(|_| true)
            }
            Command::RevokeAddress { address } => {
                self.whitelist().revoke_address(ctx, address).map(|_| true)
            }
            Command::InitSmartContract => self.initialize(ctx).map(|_| true),
            Command::AllocatePrivateSalePurchase { address, allocation, amount } => self
                .allocate_private_sale(ctx, address, *allocation, *amount)
                .map(|_| true),
            Command::LockPrivateSaleAllocation => {
                self.lock_private_sale_allocation(ctx).map(|_| true)
            }
            Command::ClaimUnsoldTokens => self.claim_unsold_tokens(ctx).map(|_| true),
            Command::UpdateAdminAddress { address } => self.update_admin(ctx, address).map(|_| true),
            Command::EnableTransferFromWhitelisting { enabled } => self
                .enable_transfer_from_whitelisting(ctx, *enabled)
                .map(|_| true),
            Command::WhitelistTransferFromAdd { address } => {
                self.whitelist_transfer_from_add(ctx, address).map(|_| true)
            }
            Command::WhitelistTransferFromRemove { address } => {
                self.whitelist_transfer_from_remove(ctx, address).map(|_| true)
            }
        }
    }

    /// Answer a read-only query at time `now`.
    pub fn query(&self, now: Timestamp, query: &Query) -> Result<QueryAnswer, SaleError> {
        if !query.allowed_before_init() {
            self.require_initialised()?;
        }
        let gate = self.gate();
        let answer = match query {
            Query::CrowdsaleStatus { address } => {
                QueryAnswer::Bool(self.whitelist().is_whitelisted(address)?)
            }
            Query::GetGroupNumber { address } => QueryAnswer::Group(self.whitelist().group_of(address)?),
            Query::GetGroupMaxContribution { group } => {
                QueryAnswer::Amount(gate.max_contribution(*group, now))
            }
            Query::GetGroupUnlockTime { group } => QueryAnswer::Time(gate.tier_unlock_time(*group)),
            Query::GroupParticipationIsUnlocked { group } => {
                QueryAnswer::Bool(gate.is_unlocked(*group, now))
            }
            Query::BalanceOf { address } => QueryAnswer::Amount(self.db.balance_of(address)?),
            Query::TotalSupply => QueryAnswer::Amount(self.db.total_supply()?),
            Query::TokensLocked { address } => {
                QueryAnswer::Amount(self.vesting().currently_locked(address, now)?)
            }
            Query::VestingSchedule { address } => QueryAnswer::Tranches(
                self.vesting()
                    .get(address)?
                    .map(|s| s.tranches.iter().map(|t| (t.release_at, t.amount)).collect())
                    .unwrap_or_default(),
            ),
            Query::ContributionOf { address } => {
                QueryAnswer::Amount(self.db.contribution_of(address)?)
            }
            Query::CrowdsaleAvailableAmount => QueryAnswer::Amount(self.remaining_supply()?),
            Query::IsPrivateSaleAllocationLocked => {
                QueryAnswer::Bool(self.db.pool_locked_at()?.is_some())
            }
            Query::IsTransferFromWhitelisted { address } => {
                QueryAnswer::Bool(self.db.is_transfer_from_whitelisted(address)?)
            }
        };
        Ok(answer)
    }
}
