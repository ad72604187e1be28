// src/process/mod.rs
use anyhow::{Context, Result};
use csv::ReaderBuilder;
use std::path::Path;
use tracing::{debug, info, instrument};

pub mod date_parser;
pub mod header;
pub mod utils;

use crate::schema::OrderRecord;
use crate::source::{detect_encoding, read_to_string};
use date_parser::parse_order_date;
use header::{ColumnMap, Field};
use utils::{clean_str, parse_amount, parse_quantity};

/// Rows shorter than this are never ledger rows.
pub const MIN_COLUMNS: usize = 14;

/// Skipped rows printed per category when debug logging is on.
const SKIP_SAMPLES: usize = 2;

/// Why a data row was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    TooShort,
    NoDate,
    NoAmount,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SkipCounts {
    pub too_short: usize,
    pub no_date: usize,
    pub no_amount: usize,
}

impl SkipCounts {
    fn bump(&mut self, reason: SkipReason) -> usize {
        let slot = match reason {
            SkipReason::TooShort => &mut self.too_short,
            SkipReason::NoDate => &mut self.no_date,
            SkipReason::NoAmount => &mut self.no_amount,
        };
        *slot += 1;
        *slot
    }

    pub fn total(&self) -> usize {
        self.too_short + self.no_date + self.no_amount
    }
}

/// Result of scanning one ledger file.
#[derive(Debug)]
pub struct LedgerLoad {
    pub header: Vec<String>,
    pub columns: ColumnMap,
    pub records: Vec<OrderRecord>,
    pub skipped: SkipCounts,
    /// The first few dropped rows of each kind, in file order.
    pub skip_samples: Vec<(SkipReason, Vec<String>)>,
}

/// Detect the encoding of `path`, decode it and normalize every data row.
#[instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub fn load_ledger<P: AsRef<Path>>(path: P) -> Result<LedgerLoad> {
    let path = path.as_ref();
    let encoding = detect_encoding(path);
    info!(%encoding, "using encoding");

    let text = read_to_string(path, encoding)?;
    parse_ledger(&text).with_context(|| format!("parsing {}", path.display()))
}

/// Normalize already-decoded CSV text. The first record is the header.
pub fn parse_ledger(text: &str) -> Result<LedgerLoad> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut rows = rdr.records();

    let header: Vec<String> = match rows.next() {
        Some(first) => first
            .context("CSV parse error in header row")?
            .iter()
            .map(|cell| header::clean_header(cell).to_string())
            .collect(),
        None => Vec::new(),
    };

    let columns = ColumnMap::from_header(&header);
    debug!(header = ?&header[..header.len().min(16)], "header");
    debug!(columns = ?columns.indices, source = ?columns.source, "column map");

    let mut records = Vec::new();
    let mut skipped = SkipCounts::default();
    let mut skip_samples = Vec::new();

    for (idx, result) in rows.enumerate() {
        let record = result.with_context(|| format!("CSV parse error at record {}", idx + 1))?;
        let row: Vec<String> = record.iter().map(str::to_string).collect();

        match normalize_row(&columns, &row) {
            Ok(order) => records.push(order),
            Err(reason) => {
                if skipped.bump(reason) <= SKIP_SAMPLES {
                    log_skip(&columns, &row, reason);
                    skip_samples.push((reason, row));
                }
            }
        }
    }

    info!(
        parsed = records.len(),
        too_short = skipped.too_short,
        no_date = skipped.no_date,
        no_amount = skipped.no_amount,
        "parsed rows"
    );

    Ok(LedgerLoad {
        header,
        columns,
        records,
        skipped,
        skip_samples,
    })
}

/// Turn one raw row into an [`OrderRecord`], or say why it was dropped.
pub fn normalize_row(columns: &ColumnMap, row: &[String]) -> Result<OrderRecord, SkipReason> {
    if row.len() < MIN_COLUMNS {
        return Err(SkipReason::TooShort);
    }
    let get = |field| columns.get(row, field);

    let date = parse_order_date(get(Field::Year), get(Field::Month), get(Field::DateText))
        .ok_or(SkipReason::NoDate)?;

    let price = parse_amount(get(Field::Price));
    let cost = parse_amount(get(Field::Cost));
    let profit = parse_amount(get(Field::Profit));
    if price.is_none() && cost.is_none() && profit.is_none() {
        return Err(SkipReason::NoAmount);
    }

    Ok(OrderRecord {
        date,
        client: clean_str(get(Field::Client)),
        branch: clean_str(get(Field::Branch)),
        item: clean_str(get(Field::Item)),
        recipient: clean_str(get(Field::Recipient)),
        provider: clean_str(get(Field::Provider)),
        partner: clean_str(get(Field::Partner)),
        location: clean_str(get(Field::Location)),
        price,
        cost,
        profit,
        notes: clean_str(get(Field::Notes)),
        quantity: parse_quantity(get(Field::Quantity)),
    })
}

fn log_skip(columns: &ColumnMap, row: &[String], reason: SkipReason) {
    let get = |field| columns.get(row, field);
    match reason {
        SkipReason::TooShort => {
            debug!(len = row.len(), row = ?&row[..row.len().min(8)], "skip (len<14)")
        }
        SkipReason::NoDate => debug!(
            year = get(Field::Year),
            month = get(Field::Month),
            date = get(Field::DateText),
            "skip (no date)"
        ),
        SkipReason::NoAmount => debug!(
            price = get(Field::Price),
            cost = get(Field::Cost),
            profit = get(Field::Profit),
            "skip (no price/cost/profit)"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use encoding_rs::EUC_KR;
    use header::MappingSource;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    const HEADER: &str =
        "번호,연도,월,거래처,배송일,발주처,수주화원,품목,받는이,특이사항,지점명,발송장소,수량,판매가,발주가,수익";

    fn init_test_logging() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,orders_migrate::process=debug")),
            )
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    #[test]
    fn test_one_valid_one_invalid_row() -> Result<()> {
        init_test_logging();
        let csv = format!(
            "{HEADER}\n\
             1,2024,3,한빛상사,15,꽃길,장미화원,축하화환,김민수,오전 배송,강남점,서울 강남구,1,\"85,000\",\"60,000\",\"25,000\"\n\
             2,,,한빛상사,,꽃길,장미화원,근조화환,이영희,,강남점,서울 강남구,1,\"90,000\",,\n"
        );

        let load = parse_ledger(&csv)?;
        assert_eq!(load.columns.source, MappingSource::Header);
        assert_eq!(load.records.len(), 1);
        assert_eq!(load.skipped.no_date, 1);

        let r = &load.records[0];
        assert_eq!(r.date, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert_eq!(r.client.as_deref(), Some("한빛상사"));
        assert_eq!(r.provider.as_deref(), Some("꽃길"));
        assert_eq!(r.partner.as_deref(), Some("장미화원"));
        assert_eq!(r.item.as_deref(), Some("축하화환"));
        assert_eq!(r.recipient.as_deref(), Some("김민수"));
        assert_eq!(r.notes.as_deref(), Some("오전 배송"));
        assert_eq!(r.branch.as_deref(), Some("강남점"));
        assert_eq!(r.location.as_deref(), Some("서울 강남구"));
        assert_eq!(r.price, Some(85000.0));
        assert_eq!(r.cost, Some(60000.0));
        assert_eq!(r.profit, Some(25000.0));
        assert_eq!(r.quantity, 1);
        Ok(())
    }

    #[test]
    fn test_skip_categories() -> Result<()> {
        let csv = format!(
            "{HEADER}\n\
             1,2024,3,한빛상사,15\n\
             2,2024,4,한빛상사,31,,,,,,,,1,100,,\n\
             3,2024,4,한빛상사,30,,,,,,,,1,-,,\n\
             4,2024,4,한빛상사,4/30,,,,,,,,2.5,,(3000),\n"
        );

        let load = parse_ledger(&csv)?;
        assert_eq!(
            load.skipped,
            SkipCounts {
                too_short: 1,
                no_date: 1,
                no_amount: 1
            }
        );
        assert_eq!(load.records.len(), 1);
        let r = &load.records[0];
        assert_eq!(r.date, NaiveDate::from_ymd_opt(2024, 4, 30).unwrap());
        assert_eq!(r.price, None);
        assert_eq!(r.cost, Some(-3000.0));
        assert_eq!(r.quantity, 1);
        assert_eq!(r.branch, None);
        Ok(())
    }

    #[test]
    fn test_date_alias_header() -> Result<()> {
        let csv = "거래처,일자,품목,판매가,a,b,c,d,e,f,g,h,i,j\n\
                   한빛상사,2024-05-01,꽃다발,\"30,000\",,,,,,,,,,\n";
        let load = parse_ledger(csv)?;
        assert_eq!(load.columns.source, MappingSource::Header);
        assert_eq!(load.records.len(), 1);
        assert_eq!(
            load.records[0].date,
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
        );
        assert_eq!(load.records[0].price, Some(30000.0));
        Ok(())
    }

    #[test]
    fn test_positional_fallback() -> Result<()> {
        let csv = "c0,c1,c2,c3,c4,c5,c6,c7,c8,c9,c10,c11,c12,c13,c14,c15\n\
                   7,2024,6,푸른농원,6/3,발주처A,화원B,관엽식물,박지성,,본점,,3.0,\"120,000\",\"80,000\",\"40,000\"\n";
        let load = parse_ledger(csv)?;
        assert_eq!(load.columns.source, MappingSource::Positional);
        assert_eq!(load.records.len(), 1);

        let r = &load.records[0];
        assert_eq!(r.date, NaiveDate::from_ymd_opt(2024, 6, 3).unwrap());
        assert_eq!(r.client.as_deref(), Some("푸른농원"));
        assert_eq!(r.branch.as_deref(), Some("본점"));
        assert_eq!(r.location.as_deref(), Some("본점"));
        assert_eq!(r.quantity, 3);
        assert_eq!(r.profit, Some(40000.0));
        Ok(())
    }

    #[test]
    fn test_empty_input() -> Result<()> {
        let load = parse_ledger("")?;
        assert!(load.header.is_empty());
        assert!(load.records.is_empty());
        Ok(())
    }

    #[test]
    fn test_load_cp949_file() -> Result<()> {
        let csv = format!(
            "{HEADER}\n1,2024,3,한빛상사,2024/03/09,,,,,,,,1,\"1,234,567\",,\n"
        );
        let (bytes, _, _) = EUC_KR.encode(&csv);
        let mut tmp = NamedTempFile::new()?;
        tmp.write_all(&bytes)?;
        tmp.flush()?;

        let load = load_ledger(tmp.path())?;
        assert_eq!(load.header[3], "거래처");
        assert_eq!(load.records.len(), 1);
        assert_eq!(load.records[0].price, Some(1234567.0));
        assert_eq!(
            load.records[0].date,
            NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
        );
        Ok(())
    }

    /// Shares a byte buffer with the fmt layer so a test can read what was logged.
    #[derive(Clone, Default)]
    struct CapturedLogs(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    fn ledger_with_three_of_each_skip() -> String {
        format!(
            "{HEADER}\n\
             1,2024,3,짧은행\n\
             2,2024,3,짧은행\n\
             3,2024,3,짧은행\n\
             4,,,한빛상사,,,,,,,,,1,100,,\n\
             5,2024,,한빛상사,7,,,,,,,,1,100,,\n\
             6,2024,2,한빛상사,30,,,,,,,,1,100,,\n\
             7,2024,3,한빛상사,15,,,,,,,,1,100,,\n"
        )
    }

    #[test]
    fn test_skip_samples_capped_per_kind() -> Result<()> {
        let load = parse_ledger(&ledger_with_three_of_each_skip())?;
        assert_eq!(load.records.len(), 1);
        assert_eq!(load.skipped.too_short, 3);
        assert_eq!(load.skipped.no_date, 3);

        let kinds: Vec<SkipReason> = load.skip_samples.iter().map(|(r, _)| *r).collect();
        assert_eq!(
            kinds,
            vec![
                SkipReason::TooShort,
                SkipReason::TooShort,
                SkipReason::NoDate,
                SkipReason::NoDate
            ]
        );
        assert_eq!(load.skip_samples[0].1[0], "1");
        assert_eq!(load.skip_samples[3].1[0], "5");
        Ok(())
    }

    #[test]
    fn test_debug_output() -> Result<()> {
        let logs = CapturedLogs::default();
        let subscriber = FmtSubscriber::builder()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer({
                let logs = logs.clone();
                move || logs.clone()
            })
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            parse_ledger(&ledger_with_three_of_each_skip())
        })?;

        let text = logs.text();
        assert_eq!(text.matches("skip (len<14)").count(), 2);
        assert_eq!(text.matches("skip (no date)").count(), 2);
        assert_eq!(text.matches("column map").count(), 1);
        assert!(text.contains("거래처"));
        Ok(())
    }
}
