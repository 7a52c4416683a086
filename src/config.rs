use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};

use crate::kitchen::{DEFAULT_COMPOSITE_HOST, DEFAULT_GLYPH_HOST};

pub const KITCHEN_PORT: u16 = 24180;
pub const DEFAULT_CONFIG_FILE: &str = "kitchen.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub data_directory: PathBuf,
    pub catalogue_file: String,
    pub pairs_file: String,
    pub listen_address: String,
    pub status_address: String,
    pub composite_host: String,
    pub glyph_host: String,
    pub probe_assets: bool,
    pub probe_timeout_ms: u64,
    pub log_filter: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            data_directory: PathBuf::from("./data"),
            catalogue_file: "points.json".to_string(),
            pairs_file: "matches.json".to_string(),
            listen_address: format!("0.0.0.0:{}", KITCHEN_PORT),
            status_address: format!("0.0.0.0:{}", KITCHEN_PORT + 1),
            composite_host: DEFAULT_COMPOSITE_HOST.to_string(),
            glyph_host: DEFAULT_GLYPH_HOST.to_string(),
            probe_assets: true,
            probe_timeout_ms: 2000,
            log_filter: "kitchend=info".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn load_or_create(config_path: Option<&str>) -> Result<Self> {
        let config_file = config_path.unwrap_or(DEFAULT_CONFIG_FILE);

        if Path::new(config_file).exists() {
            let content = std::fs::read_to_string(config_file)
                .with_context(|| format!("Failed to read config {}", config_file))?;
            let config: ServerConfig = toml::from_str(&content)
                .with_context(|| format!("Invalid config {}", config_file))?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save(config_file)?;
            Ok(config)
        }
    }

    pub fn save(&self, config_path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn catalogue_path(&self) -> PathBuf {
        self.data_directory.join(&self.catalogue_file)
    }

    pub fn pairs_path(&self) -> PathBuf {
        self.data_directory.join(&self.pairs_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_defaults_then_reads_them_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kitchen.toml");
        let path = path.to_str().unwrap();

        let created = ServerConfig::load_or_create(Some(path)).unwrap();
        assert!(Path::new(path).exists());
        assert_eq!(created.listen_address, "0.0.0.0:24180");

        let loaded = ServerConfig::load_or_create(Some(path)).unwrap();
        assert_eq!(loaded.status_address, "0.0.0.0:24181");
        assert!(loaded.probe_assets);
    }

    #[test]
    fn partial_files_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kitchen.toml");
        std::fs::write(&path, "data_directory = \"/srv/kitchen\"\nprobe_assets = false\n").unwrap();

        let config = ServerConfig::load_or_create(path.to_str()).unwrap();
        assert!(!config.probe_assets);
        assert_eq!(config.catalogue_path(), PathBuf::from("/srv/kitchen/points.json"));
        assert_eq!(config.pairs_path(), PathBuf::from("/srv/kitchen/matches.json"));
        assert_eq!(config.probe_timeout_ms, 2000);
    }
}
