use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub db_path: Option<String>,
    pub data_dir: Option<String>,

    pub generator: Option<GeneratorFileConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct GeneratorFileConfig {
    pub num_songs: Option<usize>,
    pub num_log_entries: Option<usize>,
    pub seed: Option<u64>,
    /// Share of events written with a non-playback page (Home, Login, ...).
    pub non_song_page_ratio: Option<f64>,
    /// Timestamp of the first event, epoch milliseconds. Defaults to now.
    pub start_time_ms: Option<i64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
