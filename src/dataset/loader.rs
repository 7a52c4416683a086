use std::fs;
use std::path::Path;
use sha2::{Digest, Sha256};

use super::catalogue::{parse_catalogue, Catalogue};
use super::error::DataLoadError;
use super::pairs::{parse_pair_table, PairTable};

/// Both dataset files, read once and parsed. The fingerprint covers exactly
/// the bytes that were parsed.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub catalogue: Catalogue,
    pub table: PairTable,
    pub fingerprint: String,
}

fn read_source(path: &Path) -> Result<String, DataLoadError> {
    fs::read_to_string(path).map_err(|source| DataLoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

impl Dataset {
    pub fn load(catalogue_path: &Path, pairs_path: &Path) -> Result<Self, DataLoadError> {
        let catalogue_text = read_source(catalogue_path)?;
        let pairs_text = read_source(pairs_path)?;

        let catalogue = parse_catalogue(catalogue_path, &catalogue_text)?;
        let table = parse_pair_table(pairs_path, &pairs_text)?;

        // SHA-256 over both sources, truncated like a short commit id
        let mut hasher = Sha256::new();
        hasher.update(catalogue_text.as_bytes());
        hasher.update(pairs_text.as_bytes());
        let fingerprint = hex::encode(&hasher.finalize()[..16]);

        Ok(Self { catalogue, table, fingerprint })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_pair(dir: &Path, points: &str, matches: &str) -> (std::path::PathBuf, std::path::PathBuf) {
        let catalogue = dir.join("points.json");
        let pairs = dir.join("matches.json");
        fs::write(&catalogue, points).unwrap();
        fs::write(&pairs, matches).unwrap();
        (catalogue, pairs)
    }

    #[test]
    fn loads_both_sources_and_fingerprints_them() {
        let dir = tempfile::tempdir().unwrap();
        let (catalogue, pairs) = write_pair(
            dir.path(),
            r#"["1f600", "1f602"]"#,
            r#"[{"emoji1": "1f600", "emoji2": "1f602", "date": 20210831}]"#,
        );

        let dataset = Dataset::load(&catalogue, &pairs).unwrap();
        assert_eq!(dataset.catalogue.len(), 2);
        assert_eq!(dataset.table.len(), 1);
        assert_eq!(dataset.fingerprint.len(), 32);

        let again = Dataset::load(&catalogue, &pairs).unwrap();
        assert_eq!(again.fingerprint, dataset.fingerprint);
    }

    #[test]
    fn either_missing_source_fails() {
        let dir = tempfile::tempdir().unwrap();
        let (catalogue, pairs) = write_pair(dir.path(), r#"["1f600"]"#, "[]");
        fs::remove_file(&pairs).unwrap();

        let err = Dataset::load(&catalogue, &pairs).unwrap_err();
        assert!(matches!(err, DataLoadError::Io { path, .. } if path == pairs));
    }
}
