use chrono::{Local, NaiveDate, Utc};
use clap::Subcommand;

use potatoclock_core::{render_day, render_week, Config};

use super::{open_store, print_json, CliResult};

#[derive(Subcommand)]
pub enum TimelineAction {
    /// Planned blocks and recorded sessions for one day
    Day {
        /// Local date (YYYY-MM-DD); defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Planned blocks for the whole week
    Week,
}

pub fn run(action: TimelineAction, user: Option<&str>) -> CliResult {
    let geometry = Config::load_or_default().geometry()?;
    let store = open_store(user)?;

    match action {
        TimelineAction::Day { date } => {
            let now = Utc::now();
            let date = date.unwrap_or_else(|| now.with_timezone(&Local).date_naive());
            let day = render_day(
                &geometry,
                &Local,
                date,
                now,
                store.activities(),
                store.sessions(),
            );
            print_json(&day)?;
        }
        TimelineAction::Week => print_json(&render_week(&geometry, store.activities()))?,
    }
    Ok(())
}
