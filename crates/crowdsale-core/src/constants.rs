/// ─── Crowdsale Ledger Constants ─────────────────────────────────────────────
///
/// Default sale configuration. Every value here can be overridden through
/// `SaleParams`; these are the values a node uses when no params file is given.
///
/// Max supply: 375,000,000 NOS
/// Base unit:  1 NOS = 100,000,000 base units (8 decimals)

// ── Token ────────────────────────────────────────────────────────────────────

pub const TOKEN_NAME: &str = "nOS";
pub const TOKEN_SYMBOL: &str = "NOS";
pub const TOKEN_DECIMALS: u8 = 8;

/// 1 NOS expressed in base units.
pub const TOKEN_FACTOR: u128 = 100_000_000;

/// Hard cap on mintable supply, whole tokens.
pub const TOKEN_MAX_SUPPLY: u128 = 375_000_000;

/// Length of an identity (script hash) in bytes.
pub const IDENTITY_LEN: usize = 20;

// ── Reserves ─────────────────────────────────────────────────────────────────

/// Minted to the project account at initialisation, spendable immediately.
pub const IMMEDIATE_COMPANY_RESERVE: u128 = 10_000_000;

/// Angel phase 22.5M + private presale 67.5M + locked incentive 100M
/// + vested company reserve 25M + ecosystem adoption reserve 50M.
/// Reserved against the supply cap at initialisation and allocated with vesting.
pub const LOCKED_TOKEN_ALLOCATION: u128 = 265_000_000;

// ── Contribution caps (whole tokens purchased) ───────────────────────────────

/// Public sale cap per participant; also the tier-1 presale cap.
pub const MAX_CONTRIBUTION: u128 = 92_064;

pub const PRESALE_TIER_ONE: u128 = MAX_CONTRIBUTION;
pub const PRESALE_TIER_TWO: u128 = 46_704;
pub const PRESALE_TIER_THREE: u128 = 27_552;
pub const PRESALE_TIER_FOUR: u128 = 16_968;

/// Highest whitelist group number.
pub const MAX_TIER: u8 = 4;

// ── Currencies ───────────────────────────────────────────────────────────────

/// Native assets are Fixed8: 1 NEO / 1 GAS = 100,000,000 units.
pub const NATIVE_ASSET_FACTOR: u128 = 100_000_000;

/// 1 ETH in wei.
pub const WEI_PER_ETH: u128 = 1_000_000_000_000_000_000;

pub const ALLOWS_NEO: bool = true;
pub const ALLOWS_GAS: bool = false;
pub const ALLOWS_ETH: bool = true;

/// Tokens per unit of each accepted currency.
pub const NEO_TO_TOKEN_RATE: u128 = 168;
pub const GAS_TO_TOKEN_RATE: u128 = 65;
pub const ETH_TO_TOKEN_RATE: u128 = 2_066;

/// Smallest bridged contribution accepted: 0.1 ETH.
pub const ETH_MINIMUM_CONTRIBUTION_WEI: u128 = 100_000_000_000_000_000;

// ── Sale windows (Unix seconds UTC) ──────────────────────────────────────────

/// Presale opens: 2018-10-29 18:00:00 UTC. Shared unlock time of every tier.
pub const PRESALE_START_TIMESTAMP: i64 = 1_540_836_000;

/// Presale closes: 2018-11-01 17:00:00 UTC.
pub const PRESALE_END_TIMESTAMP: i64 = 1_541_091_600;

/// Public sale opens one hour after the presale closes.
pub const PUBLIC_SALE_START_TIMESTAMP: i64 = 1_541_095_200;

/// Public sale closes: 2018-11-08 18:00:00 UTC.
pub const PUBLIC_SALE_END_TIMESTAMP: i64 = 1_541_700_000;

// ── Vesting ──────────────────────────────────────────────────────────────────

/// Every vested allocation is released in this many equal tranches.
pub const VESTING_TRANCHES: usize = 4;

/// Share of the allocation released per tranche.
pub const DISTRIBUTION_PERCENTAGE: u128 = 25;

/// Incentive: first release after one year, then every four months.
pub const INCENTIVE_CLIFF_SECS: i64 = 31_536_000;
pub const INCENTIVE_PERIOD_SECS: i64 = 10_512_000;

/// Private sale: first release at initialisation, then every three months.
pub const PRIVATE_SALE_CLIFF_SECS: i64 = 0;
pub const PRIVATE_SALE_PERIOD_SECS: i64 = 7_889_400;

/// Company: first release after three months, then every three months.
pub const COMPANY_CLIFF_SECS: i64 = 7_889_400;
pub const COMPANY_PERIOD_SECS: i64 = 7_889_400;

// ── Privileged identities (script hashes) ────────────────────────────────────

/// Admin responsible for initialising the ledger.
pub const INITIAL_ADMIN_ACCOUNT: [u8; 20] = [
    172, 93, 207, 177, 41, 141, 8, 175, 19, 221, 90, 238, 233, 67, 54, 204, 47, 232, 62, 57,
];

/// Relay key of the bridge that observes ETH contributions.
pub const ETH_CONTRIBUTION_LISTENER_KEY: [u8; 20] = [
    216, 6, 188, 207, 10, 57, 209, 140, 176, 193, 128, 149, 72, 222, 4, 133, 135, 248, 79, 46,
];

/// KYC middleware allowed to maintain the whitelist.
pub const KYC_MIDDLEWARE_KEY: [u8; 20] = [
    149, 67, 119, 140, 241, 7, 126, 51, 16, 168, 205, 237, 225, 161, 64, 117, 68, 101, 182, 197,
];

/// Receives the immediate company reserve at initialisation.
pub const PROJECT_ACCOUNT: [u8; 20] = [
    163, 78, 249, 186, 149, 73, 242, 165, 255, 174, 25, 102, 234, 143, 189, 222, 71, 131, 159, 32,
];

/// Receives unsold tokens after the public sale, under company vesting.
pub const ADDITIONAL_COMPANY_TOKEN_FUND: [u8; 20] = [
    249, 85, 33, 169, 71, 161, 147, 205, 102, 214, 123, 138, 241, 93, 53, 1, 184, 112, 172, 1,
];

/// Holds the unallocated part of the locked token allocation.
pub const LOCKED_RESERVE_ACCOUNT: [u8; 20] = [
    0x4c, 0x4f, 0x43, 0x4b, 0x45, 0x44, 0x2d, 0x52, 0x45, 0x53, 0x45, 0x52, 0x56, 0x45, 0x2d,
    0x50, 0x4f, 0x4f, 0x4c, 0x00,
];

/// Whether TransferFrom delegates must be whitelisted (enforced by the token surface).
pub const WHITELIST_TRANSFER_FROM_LISTINGS: bool = true;
