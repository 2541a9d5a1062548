//! Schema stage: drops and recreates every warehouse table.

use anyhow::Result;
use clap::Parser;
use sparkify_etl::cli_style::get_styles;
use sparkify_etl::{AppConfig, CommonArgs, Warehouse};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "create-tables", about = "Reset the warehouse schema (destroys existing data)")]
#[command(styles = get_styles())]
struct CliArgs {
    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> Result<()> {
    sparkify_etl::logging::init_logging()?;
    let args = CliArgs::parse();
    let config = AppConfig::load(&args.common, &args.common.to_cli_config())?;

    if config.db_path().exists() {
        warn!(
            "Existing warehouse {} will be wiped",
            config.db_path().display()
        );
    }

    let warehouse = Warehouse::open(&config.database)?;
    warehouse.reset_schema()?;
    warehouse.validate_schema()?;

    info!("Tables created in {}", config.db_path().display());
    Ok(())
}
