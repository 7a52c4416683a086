use std::fs;
use std::path::Path;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::DataLoadError;
use super::symbol::SymbolId;

/// One known combination. `left`/`right` keep the dataset order, which the
/// asset store encodes in its paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairRecord {
    pub left: SymbolId,
    pub right: SymbolId,
    pub date: String,
}

impl PairRecord {
    pub fn involves(&self, id: &SymbolId) -> bool {
        &self.left == id || &self.right == id
    }

    /// The other side of the pair, if `id` is one of its sides.
    pub fn partner_of(&self, id: &SymbolId) -> Option<&SymbolId> {
        if &self.left == id {
            Some(&self.right)
        } else if &self.right == id {
            Some(&self.left)
        } else {
            None
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawPairRow {
    emoji1: String,
    emoji2: String,
    date: RawDate,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawDate {
    Text(String),
    Number(u64),
}

impl RawDate {
    fn into_string(self) -> String {
        match self {
            RawDate::Text(s) => s.trim().to_string(),
            RawDate::Number(n) => n.to_string(),
        }
    }
}

/// Read-only table of pair records in dataset order.
#[derive(Debug, Clone, Default)]
pub struct PairTable {
    records: Vec<PairRecord>,
}

impl PairTable {
    pub fn new(records: Vec<PairRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[PairRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn is_asset_date(date: &str) -> bool {
    date.len() == 8 && date.bytes().all(|b| b.is_ascii_digit())
}

/// Reads a JSON array of `{"emoji1", "emoji2", "date"}` rows.
pub fn load_pair_table(path: impl AsRef<Path>) -> Result<PairTable, DataLoadError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| DataLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_pair_table(path, &content)
}

pub fn parse_pair_table(path: &Path, content: &str) -> Result<PairTable, DataLoadError> {
    let rows: Vec<RawPairRow> = serde_json::from_str(content).map_err(|source| DataLoadError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let schema_error = |row: usize, reason: String| DataLoadError::Schema {
        path: path.to_path_buf(),
        row,
        reason,
    };

    let mut records = Vec::with_capacity(rows.len());
    for (row, raw) in rows.into_iter().enumerate() {
        let left = SymbolId::parse(&raw.emoji1).map_err(|e| schema_error(row, format!("emoji1: {}", e)))?;
        let right = SymbolId::parse(&raw.emoji2).map_err(|e| schema_error(row, format!("emoji2: {}", e)))?;
        let date = raw.date.into_string();
        if !is_asset_date(&date) {
            return Err(schema_error(row, format!("date '{}' is not YYYYMMDD", date)));
        }
        records.push(PairRecord { left, right, date });
    }

    debug!("Loaded {} pair records from {:?}", records.len(), path);
    Ok(PairTable::new(records))
}
