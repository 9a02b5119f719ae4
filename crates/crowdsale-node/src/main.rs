//! crowdsale-node: runs the crowdsale ledger over a persistent store.
//!
//! Startup sequence:
//!   1. Load sale params (`--params`, or the built-in defaults)
//!   2. Open the state database
//!   3. Run the subcommand: apply a command stream, answer a query,
//!      describe a vesting schedule, or print the sale status

use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};

use crowdsale_core::{Envelope, EventLog, Identity, LedgerEvent, Query, SaleParams, Timestamp};
use crowdsale_state::{SaleEngine, SalePhase, StateDb};
use crowdsale_vesting::VestingQuery;

#[derive(Parser, Debug)]
#[command(
    name = "crowdsale-node",
    version,
    about = "Crowdsale ledger: tiered contributions, capped supply and vesting"
)]
struct Args {
    /// Directory for the persistent state database.
    #[arg(long, default_value = "~/.crowdsale/data")]
    data_dir: PathBuf,

    /// Path to sale params JSON. Missing fields take the built-in defaults.
    #[arg(long)]
    params: Option<PathBuf>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Apply newline-delimited JSON envelopes, printing one result per line.
    Apply {
        /// Read envelopes from this file instead of stdin.
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Answer one query given as JSON, e.g. '{"BalanceOf":{"address":"…"}}'.
    Query {
        json: String,
        /// Evaluation time (Unix seconds). Defaults to the current time.
        #[arg(long)]
        now: Option<Timestamp>,
    },
    /// Describe the vesting schedule of an identity.
    Schedule {
        address: String,
        #[arg(long)]
        now: Option<Timestamp>,
    },
    /// Print the sale phase and supply figures.
    Status {
        #[arg(long)]
        now: Option<Timestamp>,
    },
}

/// One output line of `apply`.
#[derive(Serialize)]
struct ApplyResult {
    line: usize,
    op: Option<&'static str>,
    tx_id: Option<String>,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    events: Vec<LedgerEvent>,
}

#[derive(Serialize)]
struct Status {
    now: Timestamp,
    phase: SalePhase,
    initialised: bool,
    total_supply: String,
    remaining_supply: String,
    unsold_claimed: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,crowdsale=debug")),
        )
        .init();

    let args = Args::parse();
    info!("crowdsale node starting");

    // ── Params ────────────────────────────────────────────────────────────────
    let params = load_params(args.params.as_deref())?;

    // ── State database ────────────────────────────────────────────────────────
    let data_dir = expand_tilde(&args.data_dir);
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating data dir {}", data_dir.display()))?;
    let db = Arc::new(StateDb::open(&data_dir).context("opening state database")?);

    let log = Arc::new(EventLog::new());
    let engine = SaleEngine::new(Arc::clone(&db), params, log.clone());

    match args.command {
        Cmd::Apply { input } => {
            let reader: Box<dyn BufRead> = match &input {
                Some(path) => Box::new(BufReader::new(
                    std::fs::File::open(path)
                        .with_context(|| format!("opening {}", path.display()))?,
                )),
                None => Box::new(BufReader::new(std::io::stdin())),
            };
            apply_stream(&engine, &log, reader)?;
        }
        Cmd::Query { json, now } => {
            let query: Query = serde_json::from_str(&json).context("parsing query JSON")?;
            let answer = engine
                .query(now.unwrap_or_else(current_time), &query)
                .context("answering query")?;
            println!("{}", serde_json::to_string(&answer)?);
        }
        Cmd::Schedule { address, now } => {
            let id = Identity::from_hex(&address).context("parsing identity")?;
            let text = VestingQuery::new(&*db)
                .describe(&id, now.unwrap_or_else(current_time))
                .context("reading vesting schedule")?;
            println!("{text}");
        }
        Cmd::Status { now } => {
            let now = now.unwrap_or_else(current_time);
            let status = Status {
                now,
                phase: engine.gate().phase(now),
                initialised: db.is_initialised()?,
                total_supply: db.total_supply()?.to_string(),
                remaining_supply: engine.remaining_supply()?.to_string(),
                unsold_claimed: db.unsold_claimed()?,
            };
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }

    db.flush().context("flushing state database")?;
    Ok(())
}

/// Apply every envelope in `reader` in order. Lines that fail to decode are
/// reported as failed and skipped; blank lines are ignored.
fn apply_stream(engine: &SaleEngine, log: &EventLog, reader: impl BufRead) -> anyhow::Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let (mut applied, mut failed) = (0usize, 0usize);

    for (idx, line) in reader.lines().enumerate() {
        let line = line.context("reading command stream")?;
        if line.trim().is_empty() {
            continue;
        }
        let result = match serde_json::from_str::<Envelope>(&line) {
            Ok(env) => {
                let ok = engine.execute(&env.context, &env.command);
                ApplyResult {
                    line: idx + 1,
                    op: Some(env.command.name()),
                    tx_id: Some(env.context.tx_id.to_hex()),
                    ok,
                    error: None,
                    events: log.drain(),
                }
            }
            Err(e) => {
                warn!(line = idx + 1, error = %e, "malformed envelope");
                ApplyResult {
                    line: idx + 1,
                    op: None,
                    tx_id: None,
                    ok: false,
                    error: Some(e.to_string()),
                    events: Vec::new(),
                }
            }
        };
        if result.ok {
            applied += 1;
        } else {
            failed += 1;
        }
        writeln!(out, "{}", serde_json::to_string(&result)?)?;
    }

    info!(applied, failed, "command stream finished");
    Ok(())
}

fn load_params(path: Option<&Path>) -> anyhow::Result<SaleParams> {
    let Some(p) = path else {
        info!("no --params given, using built-in sale params");
        return Ok(SaleParams::default());
    };
    let json = std::fs::read_to_string(p)
        .with_context(|| format!("reading sale params from {}", p.display()))?;
    SaleParams::from_json_str(&json).context("parsing sale params JSON")
}

fn current_time() -> Timestamp {
    chrono::Utc::now().timestamp()
}

/// Expand a leading `~` to the user's home directory (`HOME` or `USERPROFILE`).
fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
            return PathBuf::from(home).join(stripped);
        }
    }
    path.to_path_buf()
}
