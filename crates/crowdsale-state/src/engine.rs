use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crowdsale_core::command::InvocationContext;
use crowdsale_core::error::SaleError;
use crowdsale_core::event::{EventSink, LedgerEvent};
use crowdsale_core::params::SaleParams;
use crowdsale_core::types::{AllocationClass, Asset, Balance, CurrencyChannel, Identity, Timestamp};
use crowdsale_vesting::{VestingQuery, VestingSchedule, VestingSource};

use crate::db::{StagedMutations, StateDb};
use crate::gate::ParticipationGate;
use crate::whitelist::WhitelistRegistry;

// ── Contributions ─────────────────────────────────────────────────────────────

/// A contribution as received on one of the two currency channels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Contribution {
    /// NEO/GAS attached to the invoking transaction, in Fixed8 units.
    Native { payer: Identity, neo: Balance, gas: Balance },
    /// ETH observed and relayed by the bridge, in wei.
    Bridged { eth_address: String, recipient: Identity, wei: Balance },
}

impl Contribution {
    pub fn channel(&self) -> CurrencyChannel {
        match self {
            Contribution::Native { .. } => CurrencyChannel::Native,
            Contribution::Bridged { .. } => CurrencyChannel::Bridged,
        }
    }

    pub fn recipient(&self) -> Identity {
        match self {
            Contribution::Native { payer, .. } => *payer,
            Contribution::Bridged { recipient, .. } => *recipient,
        }
    }

    /// Amounts received per asset. NEO is consumed before GAS.
    fn legs(&self) -> Vec<(Asset, Balance)> {
        match self {
            Contribution::Native { neo, gas, .. } => vec![(Asset::Neo, *neo), (Asset::Gas, *gas)],
            Contribution::Bridged { wei, .. } => vec![(Asset::Eth, *wei)],
        }
    }

    /// The refund event paying back `amounts`, or `None` if all are zero.
    fn refund_event(&self, amounts: &[(Asset, Balance)]) -> Option<LedgerEvent> {
        let of = |asset: Asset| -> Balance {
            amounts.iter().filter(|(a, _)| *a == asset).map(|(_, v)| *v).sum()
        };
        match self {
            Contribution::Native { payer, .. } => {
                let (neo, gas) = (of(Asset::Neo), of(Asset::Gas));
                (neo > 0 || gas > 0).then(|| LedgerEvent::Refund { to: *payer, neo, gas })
            }
            Contribution::Bridged { eth_address, .. } => {
                let amount = of(Asset::Eth);
                (amount > 0).then(|| LedgerEvent::RefundEth { eth_address: eth_address.clone(), amount })
            }
        }
    }

    /// Whether `reason` sends the contribution back to the payer.
    ///
    /// Native value can only be bounced for a cap violation. Bridged value has
    /// already been received on the foreign chain, so every eligibility or
    /// phase rejection is refunded.
    fn refunds_on(&self, reason: &SaleError) -> bool {
        match self {
            Contribution::Native { .. } => matches!(reason, SaleError::CapExceeded { .. }),
            Contribution::Bridged { .. } => matches!(
                reason,
                SaleError::SaleClosed { .. }
                    | SaleError::CurrencyNotAccepted(_)
                    | SaleError::BelowMinimumContribution { .. }
                    | SaleError::NotWhitelisted
                    | SaleError::GroupLocked { .. }
                    | SaleError::SupplyExhausted
                    | SaleError::CapExceeded { .. }
                    | SaleError::ZeroAmount
            ),
        }
    }
}

/// Tokens bought after clipping to the remaining supply, plus the per-asset
/// amounts to hand back for the clipped excess.
struct Quote {
    tokens: Balance,
    refunds: Vec<(Asset, Balance)>,
}

/// Balance snapshot after a successful mint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MintReceipt {
    pub recipient: Identity,
    pub tokens: Balance,
    pub balance: Balance,
    /// Part of `balance` still held back by an earlier vested allocation.
    pub locked: Balance,
    pub spendable: Balance,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MintOutcome {
    Minted(MintReceipt),
    /// Nothing minted; the contribution was handed back through `refund`.
    Refunded { reason: SaleError, refund: Option<LedgerEvent> },
}

impl MintOutcome {
    pub fn is_minted(&self) -> bool {
        matches!(self, MintOutcome::Minted(_))
    }
}

/// Where the tokens of a vested allocation come from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Funding {
    /// Newly minted against the supply headroom.
    Mint,
    /// Moved out of the locked reserve pre-minted at initialisation.
    Reserve,
}

// ── SaleEngine ────────────────────────────────────────────────────────────────

/// The crowdsale state engine.
///
/// Every operation reads the current state, stages its writes and events, and
/// commits them in one batch. Events reach the sink only after the commit.
pub struct SaleEngine {
    pub db: Arc<StateDb>,
    pub params: SaleParams,
    sink: Arc<dyn EventSink>,
}

impl SaleEngine {
    pub fn new(db: Arc<StateDb>, params: SaleParams, sink: Arc<dyn EventSink>) -> Self {
        Self { db, params, sink }
    }

    pub fn whitelist(&self) -> WhitelistRegistry<'_> {
        WhitelistRegistry::new(&self.db, self.params.kyc_middleware_key)
    }

    pub fn gate(&self) -> ParticipationGate<'_> {
        ParticipationGate::new(&self.params)
    }

    pub fn vesting(&self) -> VestingQuery<'_, StateDb> {
        VestingQuery::new(&self.db)
    }

    /// Initialisation time, the epoch of every vesting schedule.
    pub(crate) fn require_initialised(&self) -> Result<Timestamp, SaleError> {
        self.db.init_time()?.ok_or(SaleError::NotInitialised)
    }

    pub(crate) fn require_witness(
        &self,
        ctx: &InvocationContext,
        id: &Identity,
        role: &str,
    ) -> Result<(), SaleError> {
        if ctx.is_witnessed_by(id) {
            Ok(())
        } else {
            Err(SaleError::MissingWitness(format!("{role} {id}")))
        }
    }

    pub(crate) fn commit(&self, staged: StagedMutations) -> Result<(), SaleError> {
        for event in self.db.commit(staged)? {
            self.sink.emit(&event);
        }
        Ok(())
    }

    /// `max supply − total supply`, in base units.
    pub fn remaining_supply(&self) -> Result<Balance, SaleError> {
        Ok(self.params.max_supply_base()?.saturating_sub(self.db.total_supply()?))
    }

    // ── Contribution ingress ──────────────────────────────────────────────────

    /// Process the NEO/GAS attached to the invoking transaction.
    pub fn mint_tokens(
        &self,
        ctx: &InvocationContext,
        payer: Identity,
        neo: Balance,
        gas: Balance,
    ) -> Result<MintOutcome, SaleError> {
        self.process(ctx, Contribution::Native { payer, neo, gas })
    }

    /// Process an ETH contribution relayed by the bridge.
    pub fn mint_tokens_eth(
        &self,
        ctx: &InvocationContext,
        eth_address: &str,
        recipient: Identity,
        wei: Balance,
    ) -> Result<MintOutcome, SaleError> {
        self.require_witness(ctx, &self.params.eth_listener_key, "eth listener")?;
        if wei == 0 {
            return Err(SaleError::ZeroAmount);
        }
        self.process(
            ctx,
            Contribution::Bridged { eth_address: eth_address.to_string(), recipient, wei },
        )
    }

    fn process(&self, ctx: &InvocationContext, c: Contribution) -> Result<MintOutcome, SaleError> {
        let channel = c.channel();

        // ── Duplicate check ───────────────────────────────────────────────────
        // Single slot per channel: only the most recent id is remembered.
        if self.db.last_processed(channel)?.as_ref() == Some(&ctx.tx_id) {
            debug!(tx_id = %ctx.tx_id, %channel, "duplicate contribution ignored");
            return Err(SaleError::DuplicateTransaction(ctx.tx_id.to_hex()));
        }

        self.require_initialised()?;

        match self.evaluate(ctx, &c) {
            Ok(quote) => self.mint(ctx, &c, quote),
            Err(reason) if c.refunds_on(&reason) => self.refund(&c, reason),
            Err(reason) => Err(reason),
        }
    }

    /// Phase, currency and admissibility checks. Returns the clipped purchase.
    fn evaluate(&self, ctx: &InvocationContext, c: &Contribution) -> Result<Quote, SaleError> {
        let p = &self.params;
        if ctx.now >= p.public_sale_end {
            return Err(SaleError::SaleClosed { closed_at: p.public_sale_end });
        }

        match c {
            Contribution::Native { neo, gas, .. } => {
                if *neo == 0 && *gas == 0 {
                    return Err(SaleError::ZeroAmount);
                }
                for (asset, amount) in c.legs() {
                    if amount > 0 && !p.accepts(asset) {
                        return Err(SaleError::CurrencyNotAccepted(asset.symbol()));
                    }
                }
            }
            Contribution::Bridged { wei, .. } => {
                if !p.accepts(Asset::Eth) {
                    return Err(SaleError::CurrencyNotAccepted(Asset::Eth.symbol()));
                }
                let min = p.currencies.eth_minimum_contribution;
                if *wei < min {
                    return Err(SaleError::BelowMinimumContribution { min, got: *wei });
                }
            }
        }

        let recipient = c.recipient();
        let remaining = self.remaining_supply()?;
        let quote = self.quote(c, remaining)?;
        let group = self.db.group_of(&recipient)?;
        let prior = self.db.contribution_of(&recipient)?;
        self.gate().admit(group, ctx.now, remaining, prior, quote.tokens)?;
        if quote.tokens == 0 {
            return Err(SaleError::ZeroAmount);
        }
        Ok(quote)
    }

    /// Price every leg and clip the total to `remaining`.
    fn quote(&self, c: &Contribution, remaining: Balance) -> Result<Quote, SaleError> {
        let mut available = remaining;
        let mut tokens: Balance = 0;
        let mut refunds = Vec::new();
        for (asset, amount) in c.legs() {
            let bought = self.params.tokens_for(asset, amount)?;
            let taken = bought.min(available);
            available -= taken;
            tokens += taken;
            let excess = bought - taken;
            if excess > 0 {
                refunds.push((asset, self.params.refund_for(asset, excess)?));
            }
        }
        Ok(Quote { tokens, refunds })
    }

    fn mint(&self, ctx: &InvocationContext, c: &Contribution, quote: Quote) -> Result<MintOutcome, SaleError> {
        let recipient = c.recipient();
        let tokens = quote.tokens;

        let balance = self
            .db
            .balance_of(&recipient)?
            .checked_add(tokens)
            .ok_or(SaleError::Overflow)?;
        let contributed = self
            .db
            .contribution_of(&recipient)?
            .checked_add(tokens)
            .ok_or(SaleError::Overflow)?;
        let supply = self
            .db
            .total_supply()?
            .checked_add(tokens)
            .ok_or(SaleError::Overflow)?;
        // Re-read, never create: ordinary purchases carry no vesting.
        let locked = self.vesting().currently_locked(&recipient, ctx.now)?;

        let mut staged = StagedMutations::default();
        staged.put_balance(&recipient, balance)?;
        staged.put_contribution(&recipient, contributed)?;
        staged.put_total_supply(supply)?;
        staged.put_last_processed(c.channel(), &ctx.tx_id)?;
        if let Some(refund) = c.refund_event(&quote.refunds) {
            staged.emit(refund);
        }
        staged.emit(LedgerEvent::Transfer { from: None, to: recipient, amount: tokens });
        self.commit(staged)?;

        info!(
            identity = %recipient,
            channel = %c.channel(),
            tokens,
            balance,
            total_supply = supply,
            "tokens minted"
        );
        Ok(MintOutcome::Minted(MintReceipt {
            recipient,
            tokens,
            balance,
            locked,
            spendable: balance.saturating_sub(locked),
        }))
    }

    /// Hand the whole contribution back. Ledger state is untouched: the
    /// duplicate marker keeps pointing at the last minted transaction.
    fn refund(&self, c: &Contribution, reason: SaleError) -> Result<MintOutcome, SaleError> {
        let refund = c.refund_event(&c.legs());

        let mut staged = StagedMutations::default();
        if let Some(event) = &refund {
            staged.emit(event.clone());
        }
        self.commit(staged)?;

        warn!(identity = %c.recipient(), channel = %c.channel(), %reason, "contribution refunded");
        Ok(MintOutcome::Refunded { reason, refund })
    }

    // ── Vesting allocation ────────────────────────────────────────────────────

    /// Stage a vested allocation of `amount` base units to `id`: store the
    /// four-tranche schedule (replacing any earlier one), credit the balance,
    /// and emit the transfer.
    pub(crate) fn stage_allocation(
        &self,
        staged: &mut StagedMutations,
        id: &Identity,
        class: AllocationClass,
        amount: Balance,
        init_time: Timestamp,
        funding: Funding,
    ) -> Result<VestingSchedule, SaleError> {
        let schedule = VestingSchedule::build(class, amount, init_time, self.params.vesting_terms(class));

        let from = match funding {
            Funding::Reserve => {
                let reserve = self.params.locked_reserve_account;
                if *id == reserve {
                    return Err(SaleError::ReservedIdentity(id.to_hex()));
                }
                let left = self
                    .db
                    .balance_of(&reserve)?
                    .checked_sub(amount)
                    .ok_or(SaleError::Overflow)?;
                staged.put_balance(&reserve, left)?;
                Some(reserve)
            }
            Funding::Mint => {
                let supply = self
                    .db
                    .total_supply()?
                    .checked_add(amount)
                    .ok_or(SaleError::Overflow)?;
                if supply > self.params.max_supply_base()? {
                    return Err(SaleError::SupplyExhausted);
                }
                staged.put_total_supply(supply)?;
                None
            }
        };

        if let Some(previous) = self.db.vesting_schedule(id)? {
            warn!(
                identity = %id,
                previous_class = %previous.class,
                previous_total = previous.total(),
                "replacing existing vesting schedule"
            );
        }

        let balance = self.db.balance_of(id)?.checked_add(amount).ok_or(SaleError::Overflow)?;
        staged.put_schedule(id, &schedule)?;
        staged.put_balance(id, balance)?;
        staged.emit(LedgerEvent::Transfer { from, to: *id, amount });

        debug!(
            identity = %id,
            %class,
            amount,
            first_release = schedule.tranches[0].release_at,
            "vested allocation staged"
        );
        Ok(schedule)
    }
}
