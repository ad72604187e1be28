// src/sink/mod.rs

use anyhow::{Context, Result};
use serde::Serialize;
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};
use tracing::{error, info, instrument, warn};

use crate::config::{RemoteConfig, SinkPlan, KEY_VARS, URL_VAR};
use crate::schema::OrderRecord;

#[cfg(feature = "remote")]
pub mod supabase;

/// Remote table the records are inserted into.
pub const ORDERS_TABLE: &str = "orders";
/// Records per insert request.
pub const BATCH_SIZE: usize = 100;
/// Records written to the sample file when credentials are missing.
pub const SAMPLE_SIZE: usize = 5;
/// Rows read back after the upload.
pub const VERIFY_LIMIT: usize = 5;

pub const SAMPLE_FILE: &str = "orders_sample.json";
pub const EXPORT_FILE: &str = "orders_export.json";

/// The operations the uploader needs from a remote table.
pub trait OrderTable {
    fn insert(&mut self, batch: &[OrderRecord]) -> Result<()>;

    /// Most recent rows by date, newest first.
    fn latest(&mut self, limit: usize) -> Result<Vec<serde_json::Value>>;

    /// Exact number of rows in the table.
    fn count(&mut self) -> Result<u64>;
}

/// What the sink ended up doing.
#[derive(Debug, Clone, PartialEq)]
pub enum SinkOutcome {
    Uploaded { inserted: usize, total_rows: u64 },
    Sampled(PathBuf),
    Exported(PathBuf),
}

/// Carry out `plan` for `records`; local files are written under `root`.
#[instrument(level = "info", skip(plan, records, root), fields(records = records.len()))]
pub fn run_sink(plan: &SinkPlan, records: &[OrderRecord], root: &Path) -> Result<SinkOutcome> {
    match plan {
        SinkPlan::ExportAll => {
            let path = root.join(EXPORT_FILE);
            write_json(&path, records)?;
            info!(path = %path.display(), "remote client not built in; saved export");
            info!("rebuild with `--features remote` and set credentials to upload");
            Ok(SinkOutcome::Exported(path))
        }
        SinkPlan::SampleOnly => {
            let path = root.join(SAMPLE_FILE);
            write_sample(&path, records)?;
            Ok(SinkOutcome::Sampled(path))
        }
        SinkPlan::Upload(cfg) => upload_remote(cfg, records),
    }
}

#[cfg(feature = "remote")]
fn upload_remote(cfg: &RemoteConfig, records: &[OrderRecord]) -> Result<SinkOutcome> {
    let mut table = supabase::SupabaseTable::connect(cfg, ORDERS_TABLE)?;
    upload_and_verify(&mut table, records)
}

#[cfg(not(feature = "remote"))]
fn upload_remote(_cfg: &RemoteConfig, _records: &[OrderRecord]) -> Result<SinkOutcome> {
    anyhow::bail!("upload requested but the remote client is not built in")
}

fn write_sample(path: &Path, records: &[OrderRecord]) -> Result<()> {
    warn!(
        "set {} and {} (or {}) in .env or the environment",
        URL_VAR, KEY_VARS[0], KEY_VARS[1]
    );
    info!("sample .env:");
    info!("  {}=https://xxx.supabase.co", URL_VAR);
    info!("  {}=eyJ...", KEY_VARS[0]);

    let sample = &records[..records.len().min(SAMPLE_SIZE)];
    write_json(path, sample)?;
    info!(
        path = %path.display(),
        rows = sample.len(),
        "wrote sample; run again after setting the environment"
    );
    Ok(())
}

/// Insert every record in batches, then read back the newest rows and the row count.
/// Any remote error is logged and returned; batches already sent stay in the table.
pub fn upload_and_verify<T: OrderTable>(table: &mut T, records: &[OrderRecord]) -> Result<SinkOutcome> {
    let result = upload_then_read_back(table, records);
    if let Err(e) = &result {
        error!(error = %format!("{:#}", e), "upload failed");
    }
    result
}

fn upload_then_read_back<T: OrderTable>(table: &mut T, records: &[OrderRecord]) -> Result<SinkOutcome> {
    let inserted = upload_in_batches(table, records)?;
    info!(inserted, "done");

    let latest = table.latest(VERIFY_LIMIT).context("verify read")?;
    info!(rows = ?latest, "verify (latest {})", VERIFY_LIMIT);

    let total_rows = table.count().context("row count")?;
    info!(total_rows, "total count");

    Ok(SinkOutcome::Uploaded {
        inserted,
        total_rows,
    })
}

/// Submit `records` in [`BATCH_SIZE`] chunks, in order. Returns the number inserted.
pub fn upload_in_batches<T: OrderTable>(table: &mut T, records: &[OrderRecord]) -> Result<usize> {
    let total = records.len();
    let mut inserted = 0;
    for batch in records.chunks(BATCH_SIZE) {
        table
            .insert(batch)
            .with_context(|| format!("inserting rows {}..{}", inserted, inserted + batch.len()))?;
        inserted += batch.len();
        info!("inserted {} / {}", inserted, total);
    }
    Ok(inserted)
}

/// Pretty-printed UTF-8 JSON array, non-ASCII kept as-is.
pub fn write_json<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, rows)
        .with_context(|| format!("writing {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("flushing {}", path.display()))?;
    Ok(())
}
