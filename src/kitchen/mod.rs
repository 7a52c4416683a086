pub mod resolver;
pub mod locator;
pub mod probe;
pub mod selection;
pub mod share;
pub mod view;

pub use resolver::*;
pub use locator::*;
pub use probe::*;
pub use selection::*;
pub use share::*;
pub use view::*;

use std::sync::Arc;
use std::time::Duration;
use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::config::ServerConfig;
use crate::dataset::{Catalogue, Dataset, PairTable, SymbolId};

/// Everything sessions share: catalogue, pair index, locators and the probe.
/// Nothing here is written after construction.
pub struct Kitchen {
    catalogue: Catalogue,
    resolver: PairResolver,
    locator: AssetLocator,
    probe: Arc<dyn AssetProbe>,
}

impl Kitchen {
    pub fn new(catalogue: Catalogue, table: PairTable, locator: AssetLocator, probe: Arc<dyn AssetProbe>) -> Self {
        Self {
            catalogue,
            resolver: PairResolver::new(table),
            locator,
            probe,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        let dataset = Dataset::load(&config.catalogue_path(), &config.pairs_path())
            .context("Failed to load dataset")?;
        Self::from_dataset(config, dataset)
    }

    /// Builds the shared state around an already loaded dataset.
    pub fn from_dataset(config: &ServerConfig, dataset: Dataset) -> Result<Self> {
        let probe: Arc<dyn AssetProbe> = if config.probe_assets {
            let timeout = Duration::from_millis(config.probe_timeout_ms);
            Arc::new(CachedProbe::new(HttpProbe::new(timeout).context("Failed to build HTTP probe")?))
        } else {
            Arc::new(TrustDataset)
        };

        info!(
            "Kitchen ready: {} symbols, {} pair records (dataset {})",
            dataset.catalogue.len(),
            dataset.table.len(),
            dataset.fingerprint
        );
        Ok(Self::new(
            dataset.catalogue,
            dataset.table,
            AssetLocator::new(&config.composite_host, &config.glyph_host),
            probe,
        ))
    }

    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    pub fn resolver(&self) -> &PairResolver {
        &self.resolver
    }

    pub fn locator(&self) -> &AssetLocator {
        &self.locator
    }

    fn require_known(&self, id: &SymbolId) -> Result<(), SelectionError> {
        if self.catalogue.contains(id) {
            Ok(())
        } else {
            Err(SelectionError::UnknownSymbol(id.clone()))
        }
    }

    pub fn select(&self, selection: &mut Selection, id: SymbolId) -> Result<(), SelectionError> {
        self.require_known(&id)?;
        selection.select(id);
        Ok(())
    }

    pub fn pick_random(&self, selection: &mut Selection) -> Result<(), SelectionError> {
        selection.pick_random(&self.catalogue, &self.resolver, &mut rand::rng())
    }

    pub fn partners(&self, id: &SymbolId) -> &[SymbolId] {
        self.resolver.compatible_partners(id)
    }

    /// Decodes a share link, rejecting identifiers outside the catalogue.
    pub fn open_link(&self, link: &str) -> Result<Selection, SelectionError> {
        let selection = decode_selection(link)?;
        for id in selection.picks() {
            self.require_known(id)?;
        }
        Ok(selection)
    }

    /// Looks up a complete selection and confirms the composite image.
    pub async fn resolve(&self, selection: &Selection) -> ResultView {
        let (a, b) = match selection.pair() {
            Some(pair) => pair,
            None => return ResultView::Unresolved,
        };

        let record = match self.resolver.resolve_pair(a, b) {
            CompositeResult::Found(record) => record,
            CompositeResult::NotFound => {
                debug!("No combination for {} + {}", a, b);
                return ResultView::NoCombination { reason: MissReason::NotFound };
            }
        };

        let image = self.locator.build_asset_locator(&record);
        if !self.probe.asset_exists(&image).await {
            return ResultView::NoCombination { reason: MissReason::AssetUnavailable };
        }

        ResultView::Composite {
            image,
            date: record.date,
            left: record.left,
            right: record.right,
        }
    }

    pub async fn view(&self, selection: &Selection) -> ViewModel {
        let result = self.resolve(selection).await;
        ViewModel::render(selection, &self.locator, result)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::dataset::PairRecord;

    pub fn id(raw: &str) -> SymbolId {
        SymbolId::parse(raw).unwrap()
    }

    /// Catalogue `1f600, 1f602, 1f605` with the single pair `1f600 + 1f602`.
    pub fn sample_kitchen(probe: Arc<dyn AssetProbe>) -> Kitchen {
        Kitchen::new(
            Catalogue::new(vec![id("1f600"), id("1f602"), id("1f605")]),
            PairTable::new(vec![PairRecord {
                left: id("1f600"),
                right: id("1f602"),
                date: "20210831".into(),
            }]),
            AssetLocator::default(),
            probe,
        )
    }
}
