use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::IDENTITY_LEN;
use crate::error::SaleError;

/// Token amount in base units (1 NOS = 100_000_000). Also used for raw
/// currency amounts (Fixed8 units, wei), which are converted explicitly.
pub type Balance = u128;

/// Unix timestamp (seconds, UTC).
pub type Timestamp = i64;

// ── Identity ─────────────────────────────────────────────────────────────────

/// 20-byte script hash identifying a participant or privileged key.
/// Hex-encoded at every serialization boundary; any other length is rejected.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity(pub [u8; IDENTITY_LEN]);

impl Identity {
    /// Build an identity from an arbitrary byte slice, checking its shape.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, SaleError> {
        let arr: [u8; IDENTITY_LEN] = bytes
            .try_into()
            .map_err(|_| SaleError::MalformedIdentity(bytes.len()))?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; IDENTITY_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, SaleError> {
        let bytes = hex::decode(s.trim_start_matches("0x"))
            .map_err(|e| SaleError::Serialization(e.to_string()))?;
        Self::from_slice(&bytes)
    }
}

impl TryFrom<String> for Identity {
    type Error = SaleError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_hex(&s)
    }
}

impl From<Identity> for String {
    fn from(id: Identity) -> Self {
        id.to_hex()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({})", &self.to_hex()[..8])
    }
}

// ── TxId ─────────────────────────────────────────────────────────────────────

/// 32-byte identifier of the host transaction carrying an invocation.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TxId(pub [u8; 32]);

impl TxId {
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, SaleError> {
        let bytes = hex::decode(s.trim_start_matches("0x"))
            .map_err(|e| SaleError::Serialization(e.to_string()))?;
        let arr: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            SaleError::Serialization(format!("tx id must be 32 bytes, got {}", bytes.len()))
        })?;
        Ok(Self(arr))
    }
}

impl TryFrom<String> for TxId {
    type Error = SaleError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_hex(&s)
    }
}

impl From<TxId> for String {
    fn from(id: TxId) -> Self {
        id.to_hex()
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxId({}…)", &self.to_hex()[..16])
    }
}

// ── Tier ─────────────────────────────────────────────────────────────────────

/// Whitelist group. Tiers differ only in their presale contribution cap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    One,
    Two,
    Three,
    Four,
}

impl Tier {
    /// Map a raw group number; 0 and anything above 4 are not a tier.
    pub fn from_group(group: u8) -> Option<Self> {
        match group {
            1 => Some(Tier::One),
            2 => Some(Tier::Two),
            3 => Some(Tier::Three),
            4 => Some(Tier::Four),
            _ => None,
        }
    }

    pub fn group(&self) -> u8 {
        match self {
            Tier::One => 1,
            Tier::Two => 2,
            Tier::Three => 3,
            Tier::Four => 4,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tier {}", self.group())
    }
}

// ── AllocationClass ──────────────────────────────────────────────────────────

/// Determines the vesting timing applied to an administrative allocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AllocationClass {
    Incentive,
    PrivateSale,
    Company,
}

impl AllocationClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            AllocationClass::Incentive => "incentive",
            AllocationClass::PrivateSale => "privateSale",
            AllocationClass::Company => "company",
        }
    }
}

impl FromStr for AllocationClass {
    type Err = SaleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "incentive" => Ok(AllocationClass::Incentive),
            "privateSale" => Ok(AllocationClass::PrivateSale),
            "company" => Ok(AllocationClass::Company),
            other => Err(SaleError::UnknownAllocationClass(other.to_string())),
        }
    }
}

impl fmt::Display for AllocationClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Currencies ───────────────────────────────────────────────────────────────

/// Ingress path of a contribution. Each channel keeps its own idempotency marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurrencyChannel {
    /// NEO/GAS attached to the invoking transaction.
    Native,
    /// ETH observed on the foreign chain and relayed by the bridge.
    Bridged,
}

impl CurrencyChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            CurrencyChannel::Native => "native",
            CurrencyChannel::Bridged => "bridged",
        }
    }
}

impl fmt::Display for CurrencyChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A currency the sale can price tokens in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Asset {
    Neo,
    Gas,
    Eth,
}

impl Asset {
    pub fn symbol(&self) -> &'static str {
        match self {
            Asset::Neo => "NEO",
            Asset::Gas => "GAS",
            Asset::Eth => "ETH",
        }
    }
}
