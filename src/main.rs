//! ETL stage: loads song metadata, then the event logs, into an existing
//! warehouse schema.

use anyhow::{Context, Result};
use clap::Parser;
use sparkify_etl::cli_style::get_styles;
use sparkify_etl::etl::{load_log_data, load_song_data};
use sparkify_etl::{AppConfig, CommonArgs, Warehouse};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "etl", about = "Load song and log fixtures into the warehouse")]
#[command(styles = get_styles())]
struct CliArgs {
    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> Result<()> {
    sparkify_etl::logging::init_logging()?;
    let args = CliArgs::parse();
    let config = AppConfig::load(&args.common, &args.common.to_cli_config())?;

    info!("Warehouse: {}", config.db_path().display());
    info!("Data directory: {}", config.data_dir.display());

    let mut warehouse = Warehouse::open(&config.database)?;
    warehouse.validate_schema()?;

    let song_dir = config.song_data_dir();
    let songs = load_song_data(&mut warehouse, &song_dir)
        .with_context(|| format!("Song load from {} failed", song_dir.display()))?;

    let log_dir = config.log_data_dir();
    let logs = load_log_data(&mut warehouse, &log_dir)
        .with_context(|| format!("Log load from {} failed", log_dir.display()))?;

    info!("");
    info!("Load Summary");
    info!("============");
    info!("Songs loaded: {}", songs.songs);
    info!("Artists loaded: {}", songs.artists);
    info!("Log events read: {}", logs.events_read);
    info!("Non-playback events skipped: {}", logs.events_skipped);
    info!("New time rows: {}", logs.time_rows);
    info!("User upserts: {}", logs.user_upserts);
    info!(
        "Songplays inserted: {} ({} matched to a song)",
        logs.songplays, logs.songplays_matched
    );
    Ok(())
}
