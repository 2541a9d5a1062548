//! Common test infrastructure
//!
//! `TestPipeline` owns a temporary directory holding the fixture tree and the
//! warehouse file, and runs the stages against it the way the binaries do.

use sparkify_etl::config::{AppConfig, CliConfig, FileConfig, GeneratorFileConfig};
use sparkify_etl::etl::{load_log_data, load_song_data, LogLoadStats, SongLoadStats};
use sparkify_etl::generator::{generate, GeneratedData};
use sparkify_etl::Warehouse;
use tempfile::TempDir;

pub const TEST_SEED: u64 = 20260101;
/// 2026-01-01T00:00:00Z
pub const TEST_START_MS: i64 = 1767225600000;

pub struct TestPipeline {
    pub config: AppConfig,
    _dir: TempDir,
}

impl TestPipeline {
    pub fn new(num_songs: usize, num_log_entries: usize, seed: u64) -> Self {
        let dir = TempDir::new().unwrap();
        let cli = CliConfig {
            db_path: Some(dir.path().join("sparkifydb.sqlite")),
            data_dir: Some(dir.path().join("data")),
            num_songs: Some(num_songs),
            num_log_entries: Some(num_log_entries),
            seed: Some(seed),
        };
        let file = FileConfig {
            generator: Some(GeneratorFileConfig {
                start_time_ms: Some(TEST_START_MS),
                ..Default::default()
            }),
            ..Default::default()
        };
        let config = AppConfig::resolve(&cli, Some(file)).unwrap();
        TestPipeline { config, _dir: dir }
    }

    pub fn generate(&self) -> GeneratedData {
        generate(&self.config.generator, &self.config.data_dir).unwrap()
    }

    pub fn create_tables(&self) -> Warehouse {
        let warehouse = Warehouse::open(&self.config.database).unwrap();
        warehouse.reset_schema().unwrap();
        warehouse
    }

    pub fn load(&self, warehouse: &mut Warehouse) -> (SongLoadStats, LogLoadStats) {
        warehouse.validate_schema().unwrap();
        let songs = load_song_data(warehouse, &self.config.song_data_dir()).unwrap();
        let logs = load_log_data(warehouse, &self.config.log_data_dir()).unwrap();
        (songs, logs)
    }
}
