use tracing::{info, warn};

use crowdsale_core::command::InvocationContext;
use crowdsale_core::error::SaleError;
use crowdsale_core::event::LedgerEvent;
use crowdsale_core::params::SaleParams;
use crowdsale_core::types::{AllocationClass, Balance, Identity, Timestamp};
use crowdsale_vesting::VestingSchedule;

use crate::db::StagedMutations;
use crate::engine::{Funding, SaleEngine};

impl SaleEngine {
    /// Current admin: the stored identity, or the configured initial admin
    /// before one has been stored.
    pub fn admin(&self) -> Result<Identity, SaleError> {
        Ok(self.db.admin()?.unwrap_or(self.params.initial_admin))
    }

    fn require_admin(&self, ctx: &InvocationContext) -> Result<(), SaleError> {
        let admin = self.admin()?;
        self.require_witness(ctx, &admin, "admin")
    }

    // ── Initialisation ────────────────────────────────────────────────────────

    /// One-time setup. Mints the immediate company reserve to the project
    /// account and the whole locked allocation to the reserve holder, so the
    /// supply counter reserves that capacity from the start.
    pub fn initialize(&self, ctx: &InvocationContext) -> Result<(), SaleError> {
        self.require_admin(ctx)?;
        if self.db.is_initialised()? {
            return Err(SaleError::AlreadyInitialised);
        }

        let p = &self.params;
        p.validate()?;
        let immediate = SaleParams::to_base_units(p.immediate_company_reserve)?;
        let locked = SaleParams::to_base_units(p.locked_token_allocation)?;
        let supply = immediate.checked_add(locked).ok_or(SaleError::Overflow)?;

        let mut staged = StagedMutations::default();
        staged.put_init_time(ctx.now)?;
        staged.put_admin(&p.initial_admin)?;
        staged.put_transfer_from_whitelisting(p.whitelist_transfer_from)?;
        staged.put_total_supply(supply)?;
        staged.put_balance(&p.project_account, immediate)?;
        staged.emit(LedgerEvent::Transfer { from: None, to: p.project_account, amount: immediate });
        staged.put_balance(&p.locked_reserve_account, locked)?;
        staged.emit(LedgerEvent::Transfer { from: None, to: p.locked_reserve_account, amount: locked });
        self.commit(staged)?;

        info!(init_time = ctx.now, total_supply = supply, "ledger initialised");
        Ok(())
    }

    // ── Private sale pool ─────────────────────────────────────────────────────

    /// Allocate `amount` whole tokens from the locked reserve to `id` under
    /// `class` vesting.
    pub fn allocate_private_sale(
        &self,
        ctx: &InvocationContext,
        id: &Identity,
        class: AllocationClass,
        amount: Balance,
    ) -> Result<VestingSchedule, SaleError> {
        let init_time = self.require_initialised()?;
        self.require_admin(ctx)?;
        if self.db.pool_locked_at()?.is_some() {
            return Err(SaleError::AllocationLocked);
        }

        let requested = SaleParams::to_base_units(amount)?;
        if requested == 0 {
            return Err(SaleError::ZeroAmount);
        }
        let allocated = self.db.pool_allocated()?;
        let cap = SaleParams::to_base_units(self.params.locked_token_allocation)?;
        let total = allocated.checked_add(requested).ok_or(SaleError::Overflow)?;
        if total > cap {
            return Err(SaleError::AllocationPoolExceeded { allocated, requested, cap });
        }

        let mut staged = StagedMutations::default();
        let schedule =
            self.stage_allocation(&mut staged, id, class, requested, init_time, Funding::Reserve)?;
        staged.put_pool_allocated(total)?;
        self.commit(staged)?;

        info!(identity = %id, %class, amount = requested, pool_allocated = total, "private sale allocation");
        Ok(schedule)
    }

    /// Close the pool for good. Locking again keeps the first timestamp.
    pub fn lock_private_sale_allocation(&self, ctx: &InvocationContext) -> Result<Timestamp, SaleError> {
        self.require_initialised()?;
        self.require_admin(ctx)?;
        if let Some(locked_at) = self.db.pool_locked_at()? {
            return Ok(locked_at);
        }

        let mut staged = StagedMutations::default();
        staged.put_pool_locked_at(ctx.now)?;
        self.commit(staged)?;
        info!(locked_at = ctx.now, "private sale allocation locked");
        Ok(ctx.now)
    }

    // ── Unsold tokens ─────────────────────────────────────────────────────────

    /// After the public sale, mint the headroom that was never sold to the
    /// company fund under company vesting. Returns the amount allocated.
    pub fn claim_unsold_tokens(&self, ctx: &InvocationContext) -> Result<Balance, SaleError> {
        let init_time = self.require_initialised()?;
        let ends_at = self.params.public_sale_end;
        if ctx.now < ends_at {
            return Err(SaleError::SaleStillOpen { ends_at });
        }
        if self.db.unsold_claimed()? {
            return Err(SaleError::UnsoldTokensAlreadyClaimed);
        }
        self.require_admin(ctx)?;

        let remaining = self.remaining_supply()?;
        let fund = self.params.unsold_token_fund;
        let mut staged = StagedMutations::default();
        if remaining > 0 {
            self.stage_allocation(
                &mut staged,
                &fund,
                AllocationClass::Company,
                remaining,
                init_time,
                Funding::Mint,
            )?;
        }
        staged.put_unsold_claimed()?;
        self.commit(staged)?;

        info!(identity = %fund, amount = remaining, "unsold tokens claimed");
        Ok(remaining)
    }

    // ── Admin key and transfer delegation ─────────────────────────────────────

    pub fn update_admin(&self, ctx: &InvocationContext, new_admin: &Identity) -> Result<(), SaleError> {
        self.require_initialised()?;
        self.require_admin(ctx)?;

        let mut staged = StagedMutations::default();
        staged.put_admin(new_admin)?;
        self.commit(staged)?;
        warn!(admin = %new_admin, "admin identity replaced");
        Ok(())
    }

    /// Toggle whether delegated transfers must come from a listed identity.
    /// Enforcement belongs to the token transfer surface.
    pub fn enable_transfer_from_whitelisting(&self, ctx: &InvocationContext, enabled: bool) -> Result<(), SaleError> {
        self.require_initialised()?;
        self.require_admin(ctx)?;

        let mut staged = StagedMutations::default();
        staged.put_transfer_from_whitelisting(enabled)?;
        self.commit(staged)?;
        info!(enabled, "transfer-from whitelisting toggled");
        Ok(())
    }

    pub fn whitelist_transfer_from_add(&self, ctx: &InvocationContext, id: &Identity) -> Result<(), SaleError> {
        self.require_initialised()?;
        self.require_admin(ctx)?;

        let mut staged = StagedMutations::default();
        staged.put_transfer_from_listing(id)?;
        self.commit(staged)?;
        info!(identity = %id, "transfer-from delegate listed");
        Ok(())
    }

    pub fn whitelist_transfer_from_remove(&self, ctx: &InvocationContext, id: &Identity) -> Result<(), SaleError> {
        self.require_initialised()?;
        self.require_admin(ctx)?;

        let mut staged = StagedMutations::default();
        staged.delete_transfer_from_listing(id);
        self.commit(staged)?;
        info!(identity = %id, "transfer-from delegate removed");
        Ok(())
    }
}
