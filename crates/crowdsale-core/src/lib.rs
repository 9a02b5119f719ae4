//! crowdsale-core
//!
//! Shared vocabulary of the crowdsale ledger: constants, sale parameters,
//! identities, commands, events and the error type.

pub mod command;
pub mod constants;
pub mod error;
pub mod event;
pub mod params;
pub mod types;

pub use command::*;
pub use constants::*;
pub use error::SaleError;
pub use event::{EventLog, EventSink, LedgerEvent};
pub use params::{CurrencyParams, SaleParams, VestingParams, VestingTerms};
pub use types::*;
