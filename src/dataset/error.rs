use std::path::PathBuf;

/// Fatal at startup: the daemon cannot serve without its catalogue and pair table.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed JSON in {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("schema error in {path:?} at row {row}: {reason}")]
    Schema {
        path: PathBuf,
        row: usize,
        reason: String,
    },
    #[error("catalogue {0:?} is empty")]
    EmptyCatalogue(PathBuf),
}
