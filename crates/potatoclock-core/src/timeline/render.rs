use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Timelike, Utc};
use serde::Serialize;

use crate::activity::{Activity, CategoryStyle, DAYS_OF_WEEK};
use crate::grid::{format_clock, BlockRect, GridGeometry};
use crate::session::{Session, SessionStatus, SessionType};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockKind {
    Planned,
    Session {
        session_type: SessionType,
        status: SessionStatus,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineBlock {
    #[serde(flatten)]
    pub kind: BlockKind,
    pub id: String,
    pub title: String,
    pub start_minutes: u32,
    pub end_minutes: u32,
    pub rect: BlockRect,
    /// e.g. `9:00 AM - 10:00 AM`
    pub label: String,
    /// Category styling, for planned blocks only.
    pub style: Option<CategoryStyle>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayTimeline {
    pub date: NaiveDate,
    pub day_index: u8,
    pub blocks: Vec<TimelineBlock>,
    /// Offset of the current-time line when `now` falls on this day inside
    /// the window.
    pub now_marker: Option<f64>,
    pub is_empty: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekColumn {
    pub day_index: u8,
    pub day_name: &'static str,
    pub blocks: Vec<TimelineBlock>,
}

/// Weekday index of a date, 0 = Sunday.
pub fn day_index_of(date: NaiveDate) -> u8 {
    // num_days_from_sunday is always below 7.
    date.weekday().num_days_from_sunday() as u8
}

/// Planned activities for the weekday of `date` plus the sessions that
/// started on `date` in `tz`.
pub fn render_day<Tz: TimeZone>(
    geometry: &GridGeometry,
    tz: &Tz,
    date: NaiveDate,
    now: DateTime<Utc>,
    activities: &[Activity],
    sessions: &[Session],
) -> DayTimeline {
    let day_index = day_index_of(date);
    let mut blocks: Vec<TimelineBlock> = activities
        .iter()
        .filter(|a| a.day_index() == Some(day_index))
        .filter_map(|a| planned_block(geometry, a))
        .collect();

    let mut todays: Vec<&Session> = sessions
        .iter()
        .filter(|s| s.start_time.with_timezone(tz).date_naive() == date)
        .collect();
    todays.sort_by_key(|s| s.start_time);
    blocks.extend(todays.into_iter().filter_map(|s| session_block(geometry, tz, s)));

    let local_now = now.with_timezone(tz);
    let now_marker = (local_now.date_naive() == date)
        .then(|| minutes_of_day(&local_now))
        .filter(|m| (geometry.window_start_minutes()..geometry.window_end_minutes()).contains(m))
        .map(|m| geometry.minutes_to_offset(m, 0).top);

    DayTimeline {
        date,
        day_index,
        is_empty: blocks.is_empty(),
        blocks,
        now_marker,
    }
}

/// Planned blocks for all seven day columns, Sunday first.
pub fn render_week(geometry: &GridGeometry, activities: &[Activity]) -> Vec<WeekColumn> {
    (0u8..7)
        .map(|day_index| WeekColumn {
            day_index,
            day_name: DAYS_OF_WEEK[usize::from(day_index)],
            blocks: activities
                .iter()
                .filter(|a| a.day_index() == Some(day_index))
                .filter_map(|a| planned_block(geometry, a))
                .collect(),
        })
        .collect()
}

fn planned_block(geometry: &GridGeometry, activity: &Activity) -> Option<TimelineBlock> {
    let start = activity.start_minutes()?;
    let end = start.saturating_add(activity.duration_minutes);
    let rect = visible_rect(geometry, start, activity.duration_minutes)?;
    Some(TimelineBlock {
        kind: BlockKind::Planned,
        id: activity.id.clone(),
        title: activity.title.clone(),
        start_minutes: start,
        end_minutes: end,
        rect,
        label: range_label(start, end),
        style: Some(activity.category.style()),
    })
}

fn session_block<Tz: TimeZone>(
    geometry: &GridGeometry,
    tz: &Tz,
    session: &Session,
) -> Option<TimelineBlock> {
    let start = minutes_of_day(&session.start_time.with_timezone(tz));
    let end = start.saturating_add(session.duration_minutes);
    let rect = visible_rect(geometry, start, session.duration_minutes)?;
    Some(TimelineBlock {
        kind: BlockKind::Session {
            session_type: session.session_type,
            status: session.status,
        },
        id: session.id.clone(),
        title: session.task_title.clone(),
        start_minutes: start,
        end_minutes: end,
        rect,
        label: range_label(start, end),
        style: None,
    })
}

/// Geometry of a block, or `None` when it lies entirely outside the window.
fn visible_rect(geometry: &GridGeometry, start: u32, duration: u32) -> Option<BlockRect> {
    let rect = geometry.minutes_to_offset(start, duration);
    let outside = rect.bottom() <= 0.0 || rect.top >= geometry.column_height_px();
    (!outside).then_some(rect)
}

fn minutes_of_day<T: Timelike>(t: &T) -> u32 {
    t.hour() * 60 + t.minute()
}

fn range_label(start: u32, end: u32) -> String {
    format!("{} - {}", format_clock(start), format_clock(end))
}
