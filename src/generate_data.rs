//! Fixture stage: writes synthetic song metadata and an event log.

use anyhow::Result;
use clap::Parser;
use sparkify_etl::cli_style::get_styles;
use sparkify_etl::generator::generate;
use sparkify_etl::{AppConfig, CommonArgs};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "generate-data", about = "Generate song and log fixture files")]
#[command(styles = get_styles())]
struct CliArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Number of songs (and artists) to generate.
    #[arg(long)]
    songs: Option<usize>,

    /// Number of log events to generate.
    #[arg(long)]
    log_entries: Option<usize>,

    /// Seed for reproducible output.
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    sparkify_etl::logging::init_logging()?;
    let args = CliArgs::parse();

    let mut cli = args.common.to_cli_config();
    cli.num_songs = args.songs;
    cli.num_log_entries = args.log_entries;
    cli.seed = args.seed;
    let config = AppConfig::load(&args.common, &cli)?;

    let data = generate(&config.generator, &config.data_dir)?;
    info!(
        "Data generation complete: {} songs, {} events. You are ready to run etl.",
        data.songs.len(),
        data.events.len()
    );
    Ok(())
}
