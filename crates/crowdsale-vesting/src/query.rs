use chrono::DateTime;

use crowdsale_core::error::SaleError;
use crowdsale_core::types::{Balance, Identity, Timestamp};

use crate::schedule::VestingSchedule;

/// Anything that can look up the stored schedule of an identity.
pub trait VestingSource {
    fn vesting_schedule(&self, id: &Identity) -> Result<Option<VestingSchedule>, SaleError>;
}

/// Query helpers for vesting schedules.
pub struct VestingQuery<'a, S: VestingSource + ?Sized> {
    source: &'a S,
}

impl<'a, S: VestingSource + ?Sized> VestingQuery<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    pub fn get(&self, id: &Identity) -> Result<Option<VestingSchedule>, SaleError> {
        self.source.vesting_schedule(id)
    }

    /// Tokens of `id` still time-locked at `now`. Zero without a schedule.
    pub fn currently_locked(&self, id: &Identity, now: Timestamp) -> Result<Balance, SaleError> {
        Ok(self
            .source
            .vesting_schedule(id)?
            .map(|s| s.locked_at(now))
            .unwrap_or(0))
    }

    /// Human-readable summary of a schedule's state.
    pub fn describe(&self, id: &Identity, now: Timestamp) -> Result<String, SaleError> {
        let Some(schedule) = self.source.vesting_schedule(id)? else {
            return Ok(format!("{} | no vesting schedule", id));
        };

        let mut lines = vec![format!(
            "{} | {} | {} base units | {} locked",
            id,
            schedule.class,
            schedule.total(),
            schedule.locked_at(now)
        )];
        for (k, t) in schedule.tranches.iter().enumerate() {
            let when = DateTime::from_timestamp(t.release_at, 0)
                .map(|d| d.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                .unwrap_or_else(|| t.release_at.to_string());
            let state = if t.release_at > now {
                let days = (t.release_at - now) / 86_400;
                format!("locked, releases in {} days", days)
            } else {
                "released".to_string()
            };
            lines.push(format!("  #{} {} {} ({})", k + 1, when, t.amount, state));
        }
        Ok(lines.join("\n"))
    }
}
