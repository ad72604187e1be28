// src/process/header.rs

use std::collections::BTreeMap;
use tracing::info;

/// Canonical ledger fields a column can be mapped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Year,
    Month,
    Client,
    DateText,
    Provider,
    Partner,
    Location,
    Branch,
    Recipient,
    Item,
    Notes,
    Quantity,
    Price,
    Cost,
    Profit,
}

/// Korean header labels and the field each one names. `DateText` has two labels.
pub static HEADER_ALIASES: &[(&str, Field)] = &[
    ("연도", Field::Year),
    ("월", Field::Month),
    ("거래처", Field::Client),
    ("배송일", Field::DateText),
    ("일자", Field::DateText),
    ("발주처", Field::Provider),
    ("수주화원", Field::Partner),
    ("발송장소", Field::Location),
    ("지점명", Field::Branch),
    ("받는이", Field::Recipient),
    ("품목", Field::Item),
    ("특이사항", Field::Notes),
    ("수량", Field::Quantity),
    ("판매가", Field::Price),
    ("발주가", Field::Cost),
    ("수익", Field::Profit),
];

/// Column layout of the legacy export, 연도 in column 1 through 수익 in column 15.
/// Branch and location share column 10.
pub static POSITIONAL_FALLBACK: &[(Field, usize)] = &[
    (Field::Year, 1),
    (Field::Month, 2),
    (Field::Client, 3),
    (Field::DateText, 4),
    (Field::Provider, 5),
    (Field::Partner, 6),
    (Field::Item, 7),
    (Field::Recipient, 8),
    (Field::Notes, 9),
    (Field::Branch, 10),
    (Field::Location, 10),
    (Field::Quantity, 12),
    (Field::Price, 13),
    (Field::Cost, 14),
    (Field::Profit, 15),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingSource {
    Header,
    Positional,
}

/// Field → column index table for one ledger file.
#[derive(Debug, Clone)]
pub struct ColumnMap {
    pub indices: BTreeMap<Field, usize>,
    pub source: MappingSource,
}

impl ColumnMap {
    /// Build the map from the raw header row, falling back to the legacy layout
    /// when the client or date column cannot be found by name.
    pub fn from_header(header: &[String]) -> Self {
        let mut indices = BTreeMap::new();
        for (i, cell) in header.iter().enumerate() {
            let label = clean_header(cell);
            for (alias, field) in HEADER_ALIASES {
                if label == *alias {
                    // later columns override earlier ones
                    indices.insert(*field, i);
                }
            }
        }

        if indices.contains_key(&Field::Client) && indices.contains_key(&Field::DateText) {
            return Self {
                indices,
                source: MappingSource::Header,
            };
        }

        info!("using default column order (연도, 월, 거래처, 배송일, ... → 1, 2, 3, 4, ...)");
        Self::positional()
    }

    pub fn positional() -> Self {
        Self {
            indices: POSITIONAL_FALLBACK.iter().copied().collect(),
            source: MappingSource::Positional,
        }
    }

    pub fn index_of(&self, field: Field) -> Option<usize> {
        self.indices.get(&field).copied()
    }

    /// Trimmed cell text for `field`; empty when unmapped or past the row end.
    pub fn get<'a>(&self, row: &'a [String], field: Field) -> &'a str {
        self.index_of(field)
            .and_then(|i| row.get(i))
            .map(|s| s.trim())
            .unwrap_or("")
    }
}

/// Trim a header cell and drop a leading byte-order mark.
pub fn clean_header(raw: &str) -> &str {
    raw.trim().trim_start_matches('\u{feff}').trim()
}
