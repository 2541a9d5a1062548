//! Verification stage: row counts and how many plays found their song.

use anyhow::Result;
use clap::Parser;
use sparkify_etl::cli_style::{
    get_styles, print_key_value, print_key_value_highlight, print_section_footer,
    print_section_header, print_success, print_warning,
};
use sparkify_etl::reporting::Reports;
use sparkify_etl::{AppConfig, CommonArgs, Warehouse};

#[derive(Parser, Debug)]
#[command(name = "verify", about = "Check row counts and song matching of a load")]
#[command(styles = get_styles())]
struct CliArgs {
    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> Result<()> {
    sparkify_etl::logging::init_logging()?;
    let args = CliArgs::parse();
    let config = AppConfig::load(&args.common, &args.common.to_cli_config())?;

    let warehouse = Warehouse::open_read_only(&config.database)?;
    warehouse.validate_schema()?;
    let reports = Reports::new(&warehouse);

    print_section_header("Row counts");
    for (table, count) in reports.table_counts()? {
        print_key_value(table, &count.to_string());
    }
    print_section_footer();

    let summary = reports.match_summary()?;
    print_section_header("Song matching");
    print_key_value("Songplays", &summary.total_songplays.to_string());
    print_key_value_highlight(
        "Matched (song_id not null)",
        &summary.matched_songplays.to_string(),
    );
    print_key_value("Unmatched", &summary.unmatched_songplays().to_string());
    print_section_footer();

    if summary.matched_songplays > 0 {
        print_success("Songplays are being matched to songs");
    } else {
        print_warning(
            "No songplay matched a song. Expected only if the events name unknown songs",
        );
    }
    Ok(())
}
