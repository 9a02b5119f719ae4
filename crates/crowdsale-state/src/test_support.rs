//! Shared fixtures for the engine tests.

use std::sync::Arc;

use crowdsale_core::command::InvocationContext;
use crowdsale_core::constants::*;
use crowdsale_core::event::EventLog;
use crowdsale_core::params::SaleParams;
use crowdsale_core::types::{Balance, Identity, Timestamp, TxId};

use crate::db::StateDb;
use crate::engine::SaleEngine;

pub const ADMIN: Identity = Identity(INITIAL_ADMIN_ACCOUNT);
pub const KYC: Identity = Identity(KYC_MIDDLEWARE_KEY);
pub const RELAY: Identity = Identity(ETH_CONTRIBUTION_LISTENER_KEY);

pub const INIT_AT: Timestamp = PRESALE_START_TIMESTAMP - 86_400;
pub const PRESALE: Timestamp = PRESALE_START_TIMESTAMP + 3_600;
pub const PUBLIC: Timestamp = PUBLIC_SALE_START_TIMESTAMP + 3_600;
pub const CLOSED: Timestamp = PUBLIC_SALE_END_TIMESTAMP;

pub fn id(n: u8) -> Identity {
    Identity([n; 20])
}

pub fn tx(n: u64) -> TxId {
    let mut bytes = [0u8; 32];
    bytes[24..].copy_from_slice(&n.to_be_bytes());
    TxId(bytes)
}

pub fn ctx(now: Timestamp, n: u64) -> InvocationContext {
    InvocationContext::new(now, tx(n))
}

pub fn admin_ctx(now: Timestamp, n: u64) -> InvocationContext {
    ctx(now, n).witnessed_by(ADMIN)
}

/// Whole NEO in Fixed8 units.
pub fn neo(n: Balance) -> Balance {
    n * NATIVE_ASSET_FACTOR
}

/// Params leaving exactly 100 tokens of crowdsale headroom after init.
pub fn small_params() -> SaleParams {
    SaleParams {
        max_supply: 1_000,
        immediate_company_reserve: 100,
        locked_token_allocation: 800,
        ..SaleParams::default()
    }
}

pub fn fresh_with(params: SaleParams) -> (SaleEngine, Arc<EventLog>) {
    let log = Arc::new(EventLog::new());
    let engine = SaleEngine::new(Arc::new(StateDb::in_memory()), params, log.clone());
    (engine, log)
}

pub fn fresh() -> (SaleEngine, Arc<EventLog>) {
    fresh_with(SaleParams::default())
}

/// Engine initialised at `INIT_AT`, with the init events drained.
pub fn initialised_with(params: SaleParams) -> (SaleEngine, Arc<EventLog>) {
    let (engine, log) = fresh_with(params);
    engine.initialize(&admin_ctx(INIT_AT, 0)).expect("initialize");
    log.drain();
    (engine, log)
}

pub fn initialised() -> (SaleEngine, Arc<EventLog>) {
    initialised_with(SaleParams::default())
}

pub fn whitelist(engine: &SaleEngine, who: &Identity, group: u8) {
    engine
        .whitelist()
        .add_address(&ctx(0, 0).witnessed_by(KYC), who, group)
        .expect("whitelist");
}

/// Supply cap, balance conservation and lock coverage.
pub fn assert_invariants(engine: &SaleEngine, now: Timestamp) {
    let supply = engine.db.total_supply().unwrap();
    let max = engine.params.max_supply_base().unwrap();
    assert!(supply <= max, "total supply {supply} above max {max}");

    let balances = engine.db.balances().unwrap();
    let sum: Balance = balances.iter().map(|(_, b)| *b).sum();
    assert_eq!(sum, supply, "balances do not sum to total supply");

    for (who, balance) in balances {
        let locked = engine.vesting().currently_locked(&who, now).unwrap();
        assert!(locked <= balance, "{who} has {locked} locked but only {balance}");
    }
}
