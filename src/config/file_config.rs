use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    pub store: Option<StoreFileConfig>,
}

/// The `[store]` table.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct StoreFileConfig {
    /// Connection string, same syntax as `--db`.
    pub connection: Option<String>,
    pub max_connections: Option<u32>,
    pub connect_timeout_ms: Option<u64>,
    /// Deadline applied to every store call, 0 for none.
    pub call_timeout_ms: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
