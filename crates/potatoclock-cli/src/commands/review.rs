//! Daily check-in commands.

use chrono::{Local, NaiveDate};
use clap::Subcommand;

use potatoclock_core::DailyReview;

use super::{flush, open_store, print_json, CliResult};

#[derive(Subcommand)]
pub enum ReviewAction {
    /// Record today's (or another day's) score, replacing an earlier one
    Set {
        /// Productivity score, 1-10
        score: u8,
        /// Short reflection
        #[arg(long, default_value = "")]
        reflection: String,
        /// Local date (YYYY-MM-DD); defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Show the review for a date
    Get {
        /// Local date (YYYY-MM-DD); defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// List all reviews, newest first
    List,
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn run(action: ReviewAction, user: Option<&str>) -> CliResult {
    let mut store = open_store(user)?;

    match action {
        ReviewAction::Set {
            score,
            reflection,
            date,
        } => {
            let review = DailyReview::new(date.unwrap_or_else(today), score, reflection)?;
            store.record_review(review.clone());
            flush(&mut store);
            print_json(&review)?;
        }
        ReviewAction::Get { date } => {
            let date = date.unwrap_or_else(today);
            let review = store
                .review_for(date)
                .ok_or_else(|| format!("no review for {date}"))?;
            print_json(review)?;
        }
        ReviewAction::List => {
            let mut reviews: Vec<_> = store.reviews().iter().collect();
            reviews.sort_by(|a, b| b.date.cmp(&a.date));
            print_json(&reviews)?;
        }
    }
    Ok(())
}
