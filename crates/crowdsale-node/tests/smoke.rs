//! End-to-end smoke test for crowdsale-node.
//!
//! Runs the real binary against a fresh data directory: pipes a command
//! stream through `apply`, then reads the persisted state back with `query`,
//! `status` and `schedule`.
//!
//! Run with:
//!   cargo test -p crowdsale-node --test smoke

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use serde_json::{json, Value};

use crowdsale_core::constants::*;
use crowdsale_core::types::Identity;

// ── Helpers ───────────────────────────────────────────────────────────────────

struct DataDir(PathBuf);

impl DataDir {
    fn new(name: &str) -> Self {
        let dir = std::env::temp_dir().join(format!("crowdsale_e2e_{}_{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        Self(dir)
    }
}

impl Drop for DataDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

fn node(data_dir: &Path, args: &[&str], stdin: Option<&str>) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_crowdsale-node"))
        .arg("--data-dir")
        .arg(data_dir)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("failed to spawn crowdsale-node");
    {
        let mut pipe = child.stdin.take().expect("stdin");
        if let Some(input) = stdin {
            pipe.write_all(input.as_bytes()).expect("write stdin");
        }
    }
    let out = child.wait_with_output().expect("wait for crowdsale-node");
    assert!(out.status.success(), "crowdsale-node {args:?} exited with {}", out.status);
    out
}

fn hex_id(bytes: [u8; 20]) -> String {
    Identity(bytes).to_hex()
}

fn tx_id(n: u8) -> String {
    let mut bytes = [0u8; 32];
    bytes[31] = n;
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn envelope(now: i64, n: u8, witnesses: &[[u8; 20]], command: Value) -> String {
    let witnesses: Vec<String> = witnesses.iter().map(|w| hex_id(*w)).collect();
    json!({
        "context": { "now": now, "tx_id": tx_id(n), "witnesses": witnesses },
        "command": command,
    })
    .to_string()
}

/// The first key of an externally tagged event, e.g. "transfer".
fn event_kind(event: &Value) -> &str {
    event.as_object().and_then(|o| o.keys().next()).map(String::as_str).unwrap_or("")
}

// ── Smoke test ────────────────────────────────────────────────────────────────

#[test]
fn smoke_presale_contributions() {
    let dir = DataDir::new("presale");
    let init_at = PRESALE_START_TIMESTAMP - 86_400;
    let presale = PRESALE_START_TIMESTAMP + 3_600;
    let payer = [0x11u8; 20];

    let script = [
        envelope(init_at, 1, &[INITIAL_ADMIN_ACCOUNT], json!("InitSmartContract")),
        envelope(
            init_at,
            2,
            &[KYC_MIDDLEWARE_KEY],
            json!({ "AddAddress": { "address": hex_id(payer), "group": 1 } }),
        ),
        envelope(
            presale,
            3,
            &[],
            json!({ "MintTokens": { "payer": hex_id(payer), "neo": 548 * NATIVE_ASSET_FACTOR as u64 } }),
        ),
        // Redelivery of the same transaction.
        envelope(
            presale,
            3,
            &[],
            json!({ "MintTokens": { "payer": hex_id(payer), "neo": 548 * NATIVE_ASSET_FACTOR as u64 } }),
        ),
        // One more unit goes over the tier-1 cap.
        envelope(presale, 4, &[], json!({ "MintTokens": { "payer": hex_id(payer), "neo": 1 } })),
        // Identity of the wrong length.
        envelope(presale, 6, &[KYC_MIDDLEWARE_KEY], json!({ "RevokeAddress": { "address": "1122" } })),
        // Bridged contribution without the relay witness.
        envelope(
            presale,
            5,
            &[],
            json!({ "MintTokensEth": { "eth_address": "0xabc", "neo_address": hex_id(payer), "wei": 1_000_000_000_000_000_000u64 } }),
        ),
        String::new(),
    ]
    .join("\n");

    let out = node(&dir.0, &["apply"], Some(&script));
    let results: Vec<Value> = String::from_utf8(out.stdout)
        .expect("utf8 stdout")
        .lines()
        .map(|l| serde_json::from_str(l).expect("result JSON"))
        .collect();
    assert_eq!(results.len(), 7);

    let ok: Vec<bool> = results.iter().map(|r| r["ok"].as_bool().unwrap()).collect();
    assert_eq!(ok, vec![true, true, true, false, false, false, false]);

    // Init mints the immediate reserve and the locked reserve.
    assert_eq!(results[0]["op"], "InitSmartContract");
    assert_eq!(results[0]["events"].as_array().unwrap().len(), 2);

    // The capped purchase mints exactly 92,064 tokens.
    let minted = &results[2]["events"][0];
    assert_eq!(event_kind(minted), "transfer");
    assert_eq!(
        minted["transfer"]["amount"].as_u64().unwrap() as u128,
        PRESALE_TIER_ONE * TOKEN_FACTOR
    );

    assert!(results[3]["events"].as_array().unwrap().is_empty());
    let refund = &results[4]["events"][0];
    assert_eq!(event_kind(refund), "refund");
    assert_eq!(refund["refund"]["neo"], 1);
    let error = results[5]["error"].as_str().expect("decode error");
    assert!(error.contains("malformed identity"), "unexpected error: {error}");
    assert!(results[5]["op"].is_null());
    assert!(results[6]["events"].as_array().unwrap().is_empty());

    // ── Read the persisted state back ─────────────────────────────────────────
    let query = json!({ "BalanceOf": { "address": hex_id(payer) } }).to_string();
    let out = node(&dir.0, &["query", &query, "--now", &presale.to_string()], None);
    let balance: u64 = String::from_utf8(out.stdout).unwrap().trim().parse().unwrap();
    assert_eq!(balance as u128, PRESALE_TIER_ONE * TOKEN_FACTOR);

    let out = node(&dir.0, &["status", "--now", &presale.to_string()], None);
    let status: Value = serde_json::from_slice(&out.stdout).expect("status JSON");
    assert_eq!(status["phase"], "presale");
    assert_eq!(status["initialised"], true);

    let out = node(&dir.0, &["schedule", &hex_id(payer), "--now", &presale.to_string()], None);
    assert!(String::from_utf8(out.stdout).unwrap().contains("no vesting schedule"));
}

#[test]
fn smoke_private_sale_schedule() {
    let dir = DataDir::new("private_sale");
    let init_at = PRESALE_START_TIMESTAMP - 86_400;
    let investor = [0x22u8; 20];

    let script = [
        envelope(init_at, 1, &[INITIAL_ADMIN_ACCOUNT], json!("InitSmartContract")),
        envelope(
            init_at,
            2,
            &[INITIAL_ADMIN_ACCOUNT],
            json!({ "AllocatePrivateSalePurchase": {
                "address": hex_id(investor),
                "allocation": "incentive",
                "amount": 1_000_000,
            } }),
        ),
        envelope(init_at, 3, &[INITIAL_ADMIN_ACCOUNT], json!("LockPrivateSaleAllocation")),
        envelope(
            init_at,
            4,
            &[INITIAL_ADMIN_ACCOUNT],
            json!({ "AllocatePrivateSalePurchase": {
                "address": hex_id(investor),
                "allocation": "company",
                "amount": 1,
            } }),
        ),
    ]
    .join("\n");

    let out = node(&dir.0, &["apply"], Some(&script));
    let ok: Vec<bool> = String::from_utf8(out.stdout)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str::<Value>(l).unwrap()["ok"].as_bool().unwrap())
        .collect();
    assert_eq!(ok, vec![true, true, true, false]);

    let locked = json!({ "TokensLocked": { "address": hex_id(investor) } }).to_string();
    let out = node(&dir.0, &["query", &locked, "--now", &init_at.to_string()], None);
    let amount: u64 = String::from_utf8(out.stdout).unwrap().trim().parse().unwrap();
    assert_eq!(amount as u128, 1_000_000 * TOKEN_FACTOR);

    let out = node(&dir.0, &["schedule", &hex_id(investor), "--now", &init_at.to_string()], None);
    let text = String::from_utf8(out.stdout).unwrap();
    assert_eq!(text.lines().count(), 5);
    assert!(text.contains("incentive"));
}
