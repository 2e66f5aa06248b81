use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Settings for a gndmap process, read from TOML. Every field has a default.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GndConfig {
    pub dataset: DatasetConfig,
    pub aggregation: AggregationConfig,
    pub refresh: RefreshConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DatasetConfig {
    /// Division polygons: `.geojson`, `.json`, gzipped `.gz`, or `.shp`.
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AggregationConfig {
    pub parallel: bool,
    pub chunk_size: usize,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RefreshConfig {
    /// Where run progress is saved between invocations.
    pub checkpoint: Option<PathBuf>,
    /// Maximum records to process per invocation.
    pub batch_limit: Option<usize>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self { path: PathBuf::from("public/gnd.geojson") }
    }
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self { parallel: true, chunk_size: 4096 }
    }
}

impl GndConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: GndConfig = toml::from_str(content)?;
        anyhow::ensure!(config.aggregation.chunk_size > 0, "[aggregation] chunk_size must be positive");
        Ok(config)
    }
}
