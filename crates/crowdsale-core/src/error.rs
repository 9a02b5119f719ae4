use thiserror::Error;

use crate::types::{Balance, Timestamp};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SaleError {
    // ── Lifecycle ────────────────────────────────────────────────────────────
    #[error("ledger not initialised")]
    NotInitialised,

    #[error("ledger already initialised")]
    AlreadyInitialised,

    #[error("token sale is closed (closed at {closed_at})")]
    SaleClosed { closed_at: Timestamp },

    #[error("public sale has not ended (ends at {ends_at})")]
    SaleStillOpen { ends_at: Timestamp },

    // ── Contributions ────────────────────────────────────────────────────────
    #[error("transaction {0} already processed on this channel")]
    DuplicateTransaction(String),

    #[error("contribution amount must be greater than zero")]
    ZeroAmount,

    #[error("currency {0} is not accepted by this sale")]
    CurrencyNotAccepted(&'static str),

    #[error("contribution below minimum ({min} required, got {got})")]
    BelowMinimumContribution { min: Balance, got: Balance },

    #[error("identity is not whitelisted")]
    NotWhitelisted,

    #[error("group {group} cannot participate yet")]
    GroupLocked { group: u8 },

    #[error("crowdsale supply exhausted")]
    SupplyExhausted,

    #[error("contribution cap exceeded: total {total}, cap {cap}")]
    CapExceeded { total: Balance, cap: Balance },

    #[error("arithmetic overflow")]
    Overflow,

    // ── Whitelist ────────────────────────────────────────────────────────────
    #[error("invalid whitelist group {0}: must be 1..=4")]
    InvalidGroup(u8),

    #[error("malformed identity: expected 20 bytes, got {0}")]
    MalformedIdentity(usize),

    // ── Allocation ───────────────────────────────────────────────────────────
    #[error("private sale allocation is locked")]
    AllocationLocked,

    #[error("allocation exceeds pool: allocated {allocated}, requested {requested}, cap {cap}")]
    AllocationPoolExceeded { allocated: Balance, requested: Balance, cap: Balance },

    #[error("unknown allocation class: {0}")]
    UnknownAllocationClass(String),

    #[error("identity {0} holds the locked reserve and cannot receive allocations")]
    ReservedIdentity(String),

    #[error("unsold tokens already claimed")]
    UnsoldTokensAlreadyClaimed,

    // ── Privilege ────────────────────────────────────────────────────────────
    #[error("missing required witness: {0}")]
    MissingWitness(String),

    // ── Configuration ────────────────────────────────────────────────────────
    #[error("invalid sale params: {0}")]
    InvalidParams(String),

    // ── Serialization / storage ──────────────────────────────────────────────
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("storage error: {0}")]
    Storage(String),
}
