//! crowdsale-state
//!
//! Persistent ledger state and the sale engine that mutates it: whitelist,
//! participation gate, contribution processing, vested allocation and the
//! administrative operations.

pub mod admin;
pub mod db;
pub mod dispatch;
pub mod engine;
pub mod gate;
pub mod store;
pub mod whitelist;

#[cfg(test)]
mod test_support;

pub use db::{StagedMutations, StateDb};
pub use engine::{Contribution, MintOutcome, MintReceipt, SaleEngine};
pub use gate::{ParticipationGate, SalePhase};
pub use store::{LedgerStore, MemoryStore, SledStore, WriteBatch};
pub use whitelist::WhitelistRegistry;
