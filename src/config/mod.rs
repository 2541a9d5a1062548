mod file_config;

pub use file_config::{FileConfig, GeneratorFileConfig};

use anyhow::{bail, Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};

pub const DEFAULT_DB_PATH: &str = "sparkifydb.sqlite";
pub const DEFAULT_DATA_DIR: &str = "data";

/// Resolves a CLI path argument against the current directory.
pub fn parse_path(s: &str) -> Result<PathBuf> {
    let path = PathBuf::from(s);
    if path.is_absolute() {
        return Ok(path);
    }
    let cwd = std::env::current_dir().context("Cannot read current directory")?;
    Ok(cwd.join(path))
}

/// Flags shared by every stage binary.
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Path to a TOML config file. Values in the file override CLI flags.
    #[arg(long, env = "SPARKIFY_CONFIG", value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Path to the SQLite warehouse database file.
    #[arg(long, env = "SPARKIFY_DB_PATH", value_parser = parse_path)]
    pub db_path: Option<PathBuf>,

    /// Directory holding the song_data/ and log_data/ fixture trees.
    #[arg(long, env = "SPARKIFY_DATA_DIR", value_parser = parse_path)]
    pub data_dir: Option<PathBuf>,
}

impl CommonArgs {
    pub fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            db_path: self.db_path.clone(),
            data_dir: self.data_dir.clone(),
            ..Default::default()
        }
    }

    pub fn load_file_config(&self) -> Result<Option<FileConfig>> {
        self.config.as_deref().map(FileConfig::load).transpose()
    }
}

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_path: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub num_songs: Option<usize>,
    pub num_log_entries: Option<usize>,
    pub seed: Option<u64>,
}

/// Connection parameters handed to each stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorSettings {
    pub num_songs: usize,
    pub num_log_entries: usize,
    pub seed: Option<u64>,
    pub non_song_page_ratio: f64,
    pub start_time_ms: Option<i64>,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            num_songs: 10,
            num_log_entries: 50,
            seed: None,
            non_song_page_ratio: 0.1,
            start_time_ms: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub data_dir: PathBuf,
    pub generator: GeneratorSettings,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_path = file
            .db_path
            .map(PathBuf::from)
            .or_else(|| cli.db_path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));
        if db_path.is_dir() {
            bail!("db_path is a directory, expected a database file: {:?}", db_path);
        }

        let data_dir = file
            .data_dir
            .map(PathBuf::from)
            .or_else(|| cli.data_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

        let defaults = GeneratorSettings::default();
        let gen_file = file.generator.unwrap_or_default();
        let generator = GeneratorSettings {
            num_songs: gen_file
                .num_songs
                .or(cli.num_songs)
                .unwrap_or(defaults.num_songs),
            num_log_entries: gen_file
                .num_log_entries
                .or(cli.num_log_entries)
                .unwrap_or(defaults.num_log_entries),
            seed: gen_file.seed.or(cli.seed),
            non_song_page_ratio: gen_file
                .non_song_page_ratio
                .unwrap_or(defaults.non_song_page_ratio),
            start_time_ms: gen_file.start_time_ms,
        };
        if !(0.0..=1.0).contains(&generator.non_song_page_ratio) {
            bail!(
                "non_song_page_ratio must be between 0 and 1, got {}",
                generator.non_song_page_ratio
            );
        }

        Ok(Self {
            database: DatabaseConfig { path: db_path },
            data_dir,
            generator,
        })
    }

    /// Loads the optional TOML file named by `args` and resolves it against `cli`.
    pub fn load(args: &CommonArgs, cli: &CliConfig) -> Result<Self> {
        let file_config = args.load_file_config()?;
        Self::resolve(cli, file_config)
    }

    pub fn song_data_dir(&self) -> PathBuf {
        self.data_dir.join("song_data")
    }

    pub fn log_data_dir(&self) -> PathBuf {
        self.data_dir.join("log_data")
    }

    pub fn db_path(&self) -> &Path {
        &self.database.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_defaults() {
        let config = AppConfig::resolve(&CliConfig::default(), None).unwrap();

        assert_eq!(config.db_path(), Path::new(DEFAULT_DB_PATH));
        assert_eq!(config.data_dir, PathBuf::from(DEFAULT_DATA_DIR));
        assert_eq!(config.generator, GeneratorSettings::default());
        assert_eq!(config.generator.num_songs, 10);
        assert_eq!(config.generator.num_log_entries, 50);
    }

    #[test]
    fn test_resolve_cli_only() {
        let cli = CliConfig {
            db_path: Some(PathBuf::from("/tmp/cli.sqlite")),
            data_dir: Some(PathBuf::from("/tmp/cli-data")),
            num_songs: Some(4),
            num_log_entries: Some(9),
            seed: Some(7),
        };

        let config = AppConfig::resolve(&cli, None).unwrap();

        assert_eq!(config.db_path(), Path::new("/tmp/cli.sqlite"));
        assert_eq!(config.data_dir, PathBuf::from("/tmp/cli-data"));
        assert_eq!(config.generator.num_songs, 4);
        assert_eq!(config.generator.num_log_entries, 9);
        assert_eq!(config.generator.seed, Some(7));
    }

    #[test]
    fn test_resolve_toml_overrides_cli() {
        let cli = CliConfig {
            db_path: Some(PathBuf::from("/should/be/overridden.sqlite")),
            data_dir: Some(PathBuf::from("/cli/data")),
            num_songs: Some(4),
            num_log_entries: Some(9),
            ..Default::default()
        };
        let file_config = FileConfig {
            db_path: Some("/toml/warehouse.sqlite".to_string()),
            generator: Some(GeneratorFileConfig {
                num_songs: Some(12),
                seed: Some(99),
                ..Default::default()
            }),
            ..Default::default()
        };

        let config = AppConfig::resolve(&cli, Some(file_config)).unwrap();

        // TOML values should override CLI
        assert_eq!(config.db_path(), Path::new("/toml/warehouse.sqlite"));
        assert_eq!(config.generator.num_songs, 12);
        assert_eq!(config.generator.seed, Some(99));
        // CLI value used when TOML doesn't specify
        assert_eq!(config.data_dir, PathBuf::from("/cli/data"));
        assert_eq!(config.generator.num_log_entries, 9);
    }

    #[test]
    fn test_resolve_rejects_directory_db_path() {
        let temp_dir = TempDir::new().unwrap();
        let cli = CliConfig {
            db_path: Some(temp_dir.path().to_path_buf()),
            ..Default::default()
        };
        let err = AppConfig::resolve(&cli, None).unwrap_err();
        assert!(err.to_string().contains("is a directory"));
    }

    #[test]
    fn test_resolve_rejects_out_of_range_ratio() {
        let file_config = FileConfig {
            generator: Some(GeneratorFileConfig {
                non_song_page_ratio: Some(1.5),
                ..Default::default()
            }),
            ..Default::default()
        };
        let err = AppConfig::resolve(&CliConfig::default(), Some(file_config)).unwrap_err();
        assert!(err.to_string().contains("non_song_page_ratio"));
    }

    #[test]
    fn test_data_dir_helpers() {
        let cli = CliConfig {
            data_dir: Some(PathBuf::from("/fixtures")),
            ..Default::default()
        };
        let config = AppConfig::resolve(&cli, None).unwrap();

        assert_eq!(config.song_data_dir(), PathBuf::from("/fixtures/song_data"));
        assert_eq!(config.log_data_dir(), PathBuf::from("/fixtures/log_data"));
    }

    #[test]
    fn test_load_reads_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("sparkify.toml");
        std::fs::write(&config_path, "data_dir = \"/from/file\"\n").unwrap();

        let args = CommonArgs {
            config: Some(config_path),
            ..Default::default()
        };
        let config = AppConfig::load(&args, &args.to_cli_config()).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/from/file"));
    }

    #[test]
    fn test_parse_path_makes_relative_paths_absolute() {
        let parsed = parse_path("data").unwrap();
        assert!(parsed.is_absolute());
        assert!(parsed.ends_with("data"));
        assert_eq!(parse_path("/abs/x").unwrap(), PathBuf::from("/abs/x"));
    }
}
