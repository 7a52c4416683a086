use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::debug;

use super::error::DataLoadError;
use super::symbol::SymbolId;

/// Ordered grid of selectable symbols, fixed for the process lifetime.
#[derive(Debug, Clone)]
pub struct Catalogue {
    ids: Vec<SymbolId>,
    members: HashSet<SymbolId>,
}

impl Catalogue {
    pub fn new(ids: Vec<SymbolId>) -> Self {
        let members = ids.iter().cloned().collect();
        Self { ids, members }
    }

    pub fn ids(&self) -> &[SymbolId] {
        &self.ids
    }

    pub fn contains(&self, id: &SymbolId) -> bool {
        self.members.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Entries that appear more than once, in first-duplicate order.
    pub fn duplicates(&self) -> Vec<SymbolId> {
        let mut seen = HashSet::new();
        let mut dups = Vec::new();
        for id in &self.ids {
            if !seen.insert(id) && !dups.contains(id) {
                dups.push(id.clone());
            }
        }
        dups
    }
}

/// Reads a JSON array of identifier strings.
pub fn load_catalogue(path: impl AsRef<Path>) -> Result<Catalogue, DataLoadError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| DataLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_catalogue(path, &content)
}

/// Parses catalogue text already read from `path`.
pub fn parse_catalogue(path: &Path, content: &str) -> Result<Catalogue, DataLoadError> {
    let raw: Vec<String> = serde_json::from_str(content).map_err(|source| DataLoadError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    if raw.is_empty() {
        return Err(DataLoadError::EmptyCatalogue(path.to_path_buf()));
    }

    let mut ids = Vec::with_capacity(raw.len());
    for (row, entry) in raw.iter().enumerate() {
        let id = SymbolId::parse(entry).map_err(|e| DataLoadError::Schema {
            path: path.to_path_buf(),
            row,
            reason: e.to_string(),
        })?;
        ids.push(id);
    }

    debug!("Loaded {} catalogue entries from {:?}", ids.len(), path);
    Ok(Catalogue::new(ids))
}
