use anyhow::{Context, Result};
use clap::Parser;
use csv::ReaderBuilder;
use orders_migrate::{
    process::header::clean_header,
    source::{self, locate::LEDGER_DIR},
};
use std::path::PathBuf;

/// Dump the header row and first data row of a ledger CSV with column indices,
/// to work out the column mapping for a new export format.
#[derive(Parser, Debug)]
#[command(name = "inspect-headers")]
struct Args {
    /// Ledger CSV (default: 거래내역서/거래내역서 커서용.csv)
    path: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let path = args.path.unwrap_or_else(|| {
        PathBuf::from(LEDGER_DIR).join(source::locate::DEFAULT_CANDIDATES[0])
    });

    let encoding = source::detect_encoding(&path);
    let text = source::read_to_string(&path, encoding)?;
    println!("Encoding: {}", encoding);

    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut records = rdr.records();

    let header = records
        .next()
        .context("file has no header row")?
        .context("CSV parse error in header row")?;
    for (i, cell) in header.iter().take(25).enumerate() {
        println!("{:>3} {:?}", i, clean_header(cell));
    }

    let Some(first) = records.next() else {
        println!("(no data rows)");
        return Ok(());
    };
    let first = first.context("CSV parse error in first data row")?;
    println!("First row len: {}", first.len());
    for (i, cell) in first.iter().take(20).enumerate() {
        let shown: String = cell.chars().take(50).collect();
        println!("{:>3} {:?}", i, shown);
    }

    Ok(())
}
