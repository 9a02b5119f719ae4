use serde::{Deserialize, Serialize};

use crate::types::{AllocationClass, Balance, Identity, Timestamp, TxId};

// ── InvocationContext ─────────────────────────────────────────────────────────

/// Facts the host supplies with every invocation. Signature checking happens
/// before the ledger sees a command; `witnesses` lists the identities whose
/// signatures the host verified.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct InvocationContext {
    /// Block time of the invocation (Unix seconds, UTC).
    pub now: Timestamp,
    /// Host transaction carrying the invocation. Used as the idempotency key.
    pub tx_id: TxId,
    #[serde(default)]
    pub witnesses: Vec<Identity>,
}

impl InvocationContext {
    pub fn new(now: Timestamp, tx_id: TxId) -> Self {
        Self { now, tx_id, witnesses: Vec::new() }
    }

    pub fn witnessed_by(mut self, id: Identity) -> Self {
        self.witnesses.push(id);
        self
    }

    /// Boolean capability check: did `id` sign this invocation?
    pub fn is_witnessed_by(&self, id: &Identity) -> bool {
        self.witnesses.contains(id)
    }
}

// ── Command ───────────────────────────────────────────────────────────────────

/// Every state-changing operation of the ledger is one of these variants.
/// Arity and argument types are checked when the command is decoded.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Command {
    // ── Contributions ────────────────────────────────────────────────────────

    /// NEO/GAS contribution attached to the invoking transaction (Fixed8 units).
    MintTokens {
        payer: Identity,
        #[serde(default)]
        neo: Balance,
        #[serde(default)]
        gas: Balance,
    },

    /// ETH contribution relayed by the bridge. Must be witnessed by the relay key.
    MintTokensEth {
        eth_address: String,
        neo_address: Identity,
        wei: Balance,
    },

    // ── KYC whitelist (witnessed by the KYC middleware key) ───────────────────

    AddAddress {
        address: Identity,
        group: u8,
    },

    RevokeAddress {
        address: Identity,
    },

    // ── Administration (witnessed by the admin) ───────────────────────────────

    InitSmartContract,

    /// Allocate `amount` whole tokens from the locked reserve with vesting.
    AllocatePrivateSalePurchase {
        address: Identity,
        allocation: AllocationClass,
        amount: Balance,
    },

    LockPrivateSaleAllocation,

    ClaimUnsoldTokens,

    UpdateAdminAddress {
        address: Identity,
    },

    EnableTransferFromWhitelisting {
        enabled: bool,
    },

    WhitelistTransferFromAdd {
        address: Identity,
    },

    WhitelistTransferFromRemove {
        address: Identity,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::MintTokens { .. } => "MintTokens",
            Command::MintTokensEth { .. } => "MintTokensEth",
            Command::AddAddress { .. } => "AddAddress",
            Command::RevokeAddress { .. } => "RevokeAddress",
            Command::InitSmartContract => "InitSmartContract",
            Command::AllocatePrivateSalePurchase { .. } => "AllocatePrivateSalePurchase",
            Command::LockPrivateSaleAllocation => "LockPrivateSaleAllocation",
            Command::ClaimUnsoldTokens => "ClaimUnsoldTokens",
            Command::UpdateAdminAddress { .. } => "UpdateAdminAddress",
            Command::EnableTransferFromWhitelisting { .. } => "EnableTransferFromWhitelisting",
            Command::WhitelistTransferFromAdd { .. } => "WhitelistTransferFromAdd",
            Command::WhitelistTransferFromRemove { .. } => "WhitelistTransferFromRemove",
        }
    }
}

// ── Query ─────────────────────────────────────────────────────────────────────

/// Read-only operations. None of them change state.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Query {
    /// Is `address` whitelisted?
    CrowdsaleStatus { address: Identity },
    GetGroupNumber { address: Identity },
    GetGroupMaxContribution { group: u8 },
    GetGroupUnlockTime { group: u8 },
    GroupParticipationIsUnlocked { group: u8 },
    BalanceOf { address: Identity },
    TotalSupply,
    TokensLocked { address: Identity },
    /// Raw `(release_at, amount)` tranches; empty without a schedule.
    VestingSchedule { address: Identity },
    ContributionOf { address: Identity },
    CrowdsaleAvailableAmount,
    IsPrivateSaleAllocationLocked,
    IsTransferFromWhitelisted { address: Identity },
}

impl Query {
    /// Whitelist lookups are answered before init as well.
    pub fn allowed_before_init(&self) -> bool {
        matches!(self, Query::CrowdsaleStatus { .. } | Query::GetGroupNumber { .. })
    }
}

/// Result of a `Query`.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum QueryAnswer {
    Bool(bool),
    Group(u8),
    Amount(Balance),
    Time(Timestamp),
    Tranches(Vec<(Timestamp, Balance)>),
}

// ── Envelope ──────────────────────────────────────────────────────────────────

/// One line of a command stream: the invocation facts plus the operation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Envelope {
    pub context: InvocationContext,
    pub command: Command,
}
