use chrono::{Local, NaiveDate};
use clap::Subcommand;
use potatoclock_core::stats::weekly_summary;

use super::{open_store, print_json, CliResult};

#[derive(Subcommand)]
pub enum StatsAction {
    /// This week's stats, Sunday first
    Week {
        /// Any local date in the week (YYYY-MM-DD); defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

pub fn run(action: StatsAction, user: Option<&str>) -> CliResult {
    let store = open_store(user)?;

    match action {
        StatsAction::Week { date } => {
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            let summary = weekly_summary(store.sessions(), store.reviews(), &Local, date);
            print_json(&summary)?;
        }
    }
    Ok(())
}
