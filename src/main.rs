use anyhow::Result;
use clap::Parser;
use orders_migrate::{
    config::SinkPlan,
    process,
    sink::{self, SinkOutcome},
    source::{self, Located},
};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

/// Migrate a 거래내역서 CSV export into the `orders` table.
#[derive(Parser, Debug)]
#[command(name = "orders-migrate")]
struct Args {
    /// CSV path relative to the project root, e.g. "거래내역서/data.csv"
    #[arg(long)]
    file: Option<String>,

    /// Print header, column map and the first skipped rows of each kind
    #[arg(long)]
    debug: bool,

    /// Project root; input paths and the JSON fallbacks are relative to it
    #[arg(long, default_value = ".")]
    root: PathBuf,
}

/// Raised for this crate only, so HTTP/TLS internals stay quiet.
const DEBUG_DIRECTIVE: &str = "orders_migrate=debug";

/// `RUST_LOG` (or `info`), with `--debug` layered on top.
fn log_filter(rust_log: Option<&str>, debug: bool) -> Result<EnvFilter> {
    let mut filter = match rust_log {
        Some(directives) => EnvFilter::try_new(directives)?,
        None => EnvFilter::new("info"),
    };
    if debug {
        filter = filter.add_directive(DEBUG_DIRECTIVE.parse()?);
    }
    Ok(filter)
}

fn main() -> Result<()> {
    let args = Args::parse();

    // ─── 1) init logging ─────────────────────────────────────────────
    let env = log_filter(std::env::var("RUST_LOG").ok().as_deref(), args.debug)?;
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_target(false)
        .init();

    // ─── 2) resolve the sink once, before touching the input ──────────
    if let Err(e) = dotenv::dotenv() {
        info!("no .env loaded: {}", e);
    }
    let plan = SinkPlan::from_env();
    info!(?plan, "sink plan");

    // ─── 3) locate input ─────────────────────────────────────────────
    let csv_path = match source::locate_source(&args.root, args.file.as_deref()) {
        Located::Found(path) => path,
        Located::Missing(path) => {
            warn!("CSV not found: {}", path.display());
            info!("usage: orders-migrate [--file \"거래내역서/data.csv\"] [--debug]");
            return Ok(());
        }
    };
    info!("using CSV: {}", csv_path.display());

    // ─── 4) parse + normalize ────────────────────────────────────────
    let load = process::load_ledger(&csv_path)?;
    if load.records.is_empty() {
        warn!("no data to insert; check CSV columns");
        return Ok(());
    }

    // ─── 5) sink ─────────────────────────────────────────────────────
    match sink::run_sink(&plan, &load.records, &args.root)? {
        SinkOutcome::Uploaded {
            inserted,
            total_rows,
        } => info!(inserted, total_rows, "all done"),
        SinkOutcome::Sampled(path) | SinkOutcome::Exported(path) => {
            info!(path = %path.display(), "all done (local file only)")
        }
    }
    Ok(())
}
