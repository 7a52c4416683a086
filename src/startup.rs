use serde::Serialize;
use tracing::{info, warn};
use anyhow::{Context, Result};

use crate::config::ServerConfig;
use crate::dataset::{Dataset, SymbolId};
use crate::kitchen::{has_catalogued_partner, PairResolver};

/// Findings from a dataset check. Warnings never stop the daemon.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetReport {
    pub catalogue_size: usize,
    pub pair_records: usize,
    pub distinct_pairs: usize,
    pub symbols_with_partners: usize,
    pub duplicate_symbols: Vec<SymbolId>,
    pub uncatalogued_symbols: Vec<SymbolId>,
    pub fingerprint: String,
}

pub struct StartupValidator {
    dataset: Dataset,
}

impl StartupValidator {
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let dataset = Dataset::load(&config.catalogue_path(), &config.pairs_path())
            .context("Dataset failed to load")?;
        Ok(Self { dataset })
    }

    /// Hands the validated dataset on, so the daemon serves exactly what was checked.
    pub fn into_dataset(self) -> Dataset {
        self.dataset
    }

    pub fn validate_and_start(&self) -> Result<DatasetReport> {
        info!("🔍 Starting dataset validation");

        info!("Step 1: Checking catalogue...");
        let duplicate_symbols = self.dataset.catalogue.duplicates();
        if !duplicate_symbols.is_empty() {
            warn!("Catalogue lists {} symbols more than once", duplicate_symbols.len());
        }
        info!("✅ {} catalogue entries", self.dataset.catalogue.len());

        info!("Step 2: Cross-checking pair table...");
        let uncatalogued_symbols = self.uncatalogued_symbols();
        if !uncatalogued_symbols.is_empty() {
            warn!(
                "{} symbols appear in pairs but not in the catalogue",
                uncatalogued_symbols.len()
            );
        }

        let resolver = PairResolver::new(self.dataset.table.clone());
        let symbols_with_partners = self
            .dataset
            .catalogue
            .ids()
            .iter()
            .filter(|id| has_catalogued_partner(&self.dataset.catalogue, &resolver, id))
            .count();
        if symbols_with_partners == 0 {
            warn!("No catalogue symbol has a combination; random picks will fail");
        }
        info!("✅ {} pair records checked", self.dataset.table.len());

        info!("🎉 Validation complete (dataset {})", self.dataset.fingerprint);
        Ok(DatasetReport {
            catalogue_size: self.dataset.catalogue.len(),
            pair_records: self.dataset.table.len(),
            distinct_pairs: resolver.distinct_pairs(),
            symbols_with_partners,
            duplicate_symbols,
            uncatalogued_symbols,
            fingerprint: self.dataset.fingerprint.clone(),
        })
    }

    fn uncatalogued_symbols(&self) -> Vec<SymbolId> {
        let mut missing: Vec<SymbolId> = Vec::new();
        for record in self.dataset.table.records() {
            for id in [&record.left, &record.right] {
                if !self.dataset.catalogue.contains(id) && !missing.contains(id) {
                    missing.push(id.clone());
                }
            }
        }
        missing
    }
}
