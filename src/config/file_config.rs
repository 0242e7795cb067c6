use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub db_dir: Option<String>,
    pub port: Option<u16>,
    pub logging_level: Option<String>,
    pub response_cache_age_sec: Option<usize>,
    pub frontend_dir_path: Option<String>,
    pub event_retention_days: Option<u64>,
    pub prune_interval_hours: Option<u64>,
    pub read_pool_size: Option<usize>,

    pub ranking: Option<RankingConfig>,
}

/// `[ranking]` table: query defaults.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct RankingConfig {
    pub default_radius_miles: Option<f64>,
    pub default_window_days: Option<f64>,
    pub default_track_limit: Option<usize>,
    pub per_cell_track_limit: Option<usize>,
    pub per_cell_genre_limit: Option<usize>,
    pub allowed_divisions: Option<Vec<u32>>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
