//! Daily check-in: a productivity score and a short reflection per date.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub const MIN_SCORE: u8 = 1;
pub const MAX_SCORE: u8 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyReview {
    /// The date doubles as the identifier: one review per day.
    pub id: String,
    pub date: NaiveDate,
    pub score: u8,
    #[serde(default)]
    pub reflection: String,
}

impl DailyReview {
    pub fn new(
        date: NaiveDate,
        score: u8,
        reflection: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
            return Err(ValidationError::invalid(
                "score",
                format!("must be between {MIN_SCORE} and {MAX_SCORE}"),
            ));
        }
        Ok(Self {
            id: date.format("%Y-%m-%d").to_string(),
            date,
            score,
            reflection: reflection.into().trim().to_string(),
        })
    }
}
