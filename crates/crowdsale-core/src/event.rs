use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::types::{Balance, Identity};

/// Notifications the ledger emits after a committed operation.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum LedgerEvent {
    /// `from: None` means newly minted.
    Transfer {
        from: Option<Identity>,
        to: Identity,
        amount: Balance,
    },
    /// Native refund in both currencies (Fixed8 units).
    Refund {
        to: Identity,
        neo: Balance,
        gas: Balance,
    },
    /// Bridged refund, paid out by the bridge on the foreign chain (wei).
    RefundEth {
        eth_address: String,
        amount: Balance,
    },
}

/// Receives events. Delivery is the host's concern.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &LedgerEvent);
}

/// Buffers events in memory until drained.
#[derive(Default)]
pub struct EventLog {
    events: Mutex<Vec<LedgerEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every buffered event, oldest first.
    pub fn drain(&self) -> Vec<LedgerEvent> {
        match self.events.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl EventSink for EventLog {
    fn emit(&self, event: &LedgerEvent) {
        match self.events.lock() {
            Ok(mut guard) => guard.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
    }
}
