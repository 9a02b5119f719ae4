//! crowdsale-vesting
//!
//! Vesting schedule computation and the read-side query layer.
//! Allocation itself (crediting balances, storing the schedule) lives in
//! crowdsale-state's engine; this crate is pure over stored schedules and time.

pub mod query;
pub mod schedule;

pub use query::{VestingQuery, VestingSource};
pub use schedule::{tranche_amounts, Tranche, VestingSchedule};
