//! Weekly summary: completed work intervals, focus minutes and the review
//! score for each day of a Sunday-first week.

use chrono::{Datelike, Duration, NaiveDate, TimeZone};
use serde::Serialize;

use crate::activity::DAYS_OF_WEEK;
use crate::review::DailyReview;
use crate::session::{Session, SessionStatus};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub day_name: &'static str,
    /// Completed work sessions.
    pub pomodoros: u32,
    /// Minutes of completed and manually logged work.
    pub focus_minutes: u32,
    pub interruptions: u32,
    pub score: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklySummary {
    pub week_start: NaiveDate,
    pub days: Vec<DaySummary>,
    pub total_pomodoros: u32,
    pub total_focus_minutes: u32,
}

/// The Sunday on or before `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}

/// Summarize the week containing `date`. Sessions are bucketed by their
/// local start date in `tz`.
pub fn weekly_summary<Tz: TimeZone>(
    sessions: &[Session],
    reviews: &[DailyReview],
    tz: &Tz,
    date: NaiveDate,
) -> WeeklySummary {
    let start = week_start(date);
    let mut days: Vec<DaySummary> = (0..7)
        .map(|offset| {
            let day = start + Duration::days(offset);
            DaySummary {
                date: day,
                day_name: DAYS_OF_WEEK[offset as usize],
                pomodoros: 0,
                focus_minutes: 0,
                interruptions: 0,
                score: reviews.iter().find(|r| r.date == day).map(|r| r.score),
            }
        })
        .collect();

    for session in sessions.iter().filter(|s| s.is_work()) {
        let local = session.start_time.with_timezone(tz).date_naive();
        let offset = (local - start).num_days();
        let Some(day) = usize::try_from(offset).ok().and_then(|i| days.get_mut(i)) else {
            continue;
        };
        match session.status {
            SessionStatus::Completed => {
                day.pomodoros += 1;
                day.focus_minutes = day.focus_minutes.saturating_add(session.duration_minutes);
            }
            SessionStatus::Manual => {
                day.focus_minutes = day.focus_minutes.saturating_add(session.duration_minutes)
            }
            SessionStatus::Interrupted => day.interruptions += 1,
        }
    }

    WeeklySummary {
        week_start: start,
        total_pomodoros: days.iter().map(|d| d.pomodoros).sum(),
        total_focus_minutes: days
            .iter()
            .fold(0u32, |total, d| total.saturating_add(d.focus_minutes)),
        days,
    }
}
