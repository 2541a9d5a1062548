//! Reporting stage: prints the top-N dashboards of a loaded warehouse.

use anyhow::Result;
use clap::Parser;
use sparkify_etl::cli_style::{
    get_styles, print_empty_list, print_section_footer, print_section_header, TableBuilder,
};
use sparkify_etl::reporting::{Reports, REPORT_LIMIT};
use sparkify_etl::{AppConfig, CommonArgs, Warehouse};

#[derive(Parser, Debug)]
#[command(name = "analytics", about = "Print aggregate reports of the warehouse")]
#[command(styles = get_styles())]
struct CliArgs {
    #[command(flatten)]
    common: CommonArgs,
}

fn print_table(title: &str, table: &TableBuilder) {
    print_section_header(title);
    if table.is_empty() {
        print_empty_list("No rows");
    } else {
        table.print();
    }
    print_section_footer();
}

fn main() -> Result<()> {
    sparkify_etl::logging::init_logging()?;
    let args = CliArgs::parse();
    let config = AppConfig::load(&args.common, &args.common.to_cli_config())?;

    let warehouse = Warehouse::open_read_only(&config.database)?;
    warehouse.validate_schema()?;
    let reports = Reports::new(&warehouse);

    let mut songs = TableBuilder::new(vec!["Title", "Plays"]).align_right(1);
    for row in reports.top_songs(REPORT_LIMIT)? {
        songs.add_row(vec![row.title, row.play_count.to_string()]);
    }
    print_table("Top 5 played songs", &songs);

    let mut hours = TableBuilder::new(vec!["Hour", "Activity"])
        .align_right(0)
        .align_right(1);
    for row in reports.busiest_hours(REPORT_LIMIT)? {
        hours.add_row(vec![row.hour.to_string(), row.activity_count.to_string()]);
    }
    print_table("Busiest hours of the day", &hours);

    let mut levels = TableBuilder::new(vec!["Level", "Users"]).align_right(1);
    for row in reports.user_levels()? {
        levels.add_row(vec![
            row.level.to_db_str().to_string(),
            row.user_count.to_string(),
        ]);
    }
    print_table("User base (free vs paid)", &levels);

    let mut users = TableBuilder::new(vec!["First name", "Last name", "Listens"]).align_right(2);
    for row in reports.most_active_users(REPORT_LIMIT)? {
        users.add_row(vec![
            row.first_name.unwrap_or_default(),
            row.last_name.unwrap_or_default(),
            row.total_listens.to_string(),
        ]);
    }
    print_table("Most active users", &users);

    Ok(())
}
