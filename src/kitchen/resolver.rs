use std::collections::{HashMap, HashSet};
use serde::Serialize;

use crate::dataset::{PairRecord, PairTable, SymbolId};

/// Outcome of looking up two selections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CompositeResult {
    Found(PairRecord),
    NotFound,
}

impl CompositeResult {
    pub fn is_found(&self) -> bool {
        matches!(self, CompositeResult::Found(_))
    }
}

/// Unordered key: (a, b) and (b, a) map to the same entry.
fn pair_key(a: &SymbolId, b: &SymbolId) -> (SymbolId, SymbolId) {
    if a <= b {
        (a.clone(), b.clone())
    } else {
        (b.clone(), a.clone())
    }
}

/// Symmetric lookup over the pair table. Both indexes are built once at load
/// and never change afterwards.
#[derive(Debug)]
pub struct PairResolver {
    table: PairTable,
    by_pair: HashMap<(SymbolId, SymbolId), usize>,
    partners: HashMap<SymbolId, Vec<SymbolId>>,
}

impl PairResolver {
    pub fn new(table: PairTable) -> Self {
        let mut by_pair = HashMap::with_capacity(table.len());
        let mut partners: HashMap<SymbolId, Vec<SymbolId>> = HashMap::new();
        let mut seen: HashSet<(SymbolId, SymbolId)> = HashSet::with_capacity(table.len() * 2);

        for (idx, record) in table.records().iter().enumerate() {
            // First record in dataset order wins.
            by_pair.entry(pair_key(&record.left, &record.right)).or_insert(idx);

            for (from, to) in [(&record.left, &record.right), (&record.right, &record.left)] {
                if seen.insert((from.clone(), to.clone())) {
                    partners.entry(from.clone()).or_default().push(to.clone());
                }
            }
        }

        Self { table, by_pair, partners }
    }

    pub fn table(&self) -> &PairTable {
        &self.table
    }

    pub fn resolve_pair(&self, a: &SymbolId, b: &SymbolId) -> CompositeResult {
        match self.by_pair.get(&pair_key(a, b)) {
            Some(&idx) => CompositeResult::Found(self.table.records()[idx].clone()),
            None => CompositeResult::NotFound,
        }
    }

    /// Every identifier that has a record with `id`, in first-appearance order.
    pub fn compatible_partners(&self, id: &SymbolId) -> &[SymbolId] {
        self.partners.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_partners(&self, id: &SymbolId) -> bool {
        self.partners.contains_key(id)
    }

    /// Number of distinct unordered pairs in the table.
    pub fn distinct_pairs(&self) -> usize {
        self.by_pair.len()
    }
}
