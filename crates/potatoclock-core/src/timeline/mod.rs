//! Read-only projection of activities and sessions onto day columns.
//!
//! Pairs what was planned (scheduled activities) with what happened
//! (sessions) using the same geometry as the scheduling grid.

mod render;

pub use render::{
    day_index_of, render_day, render_week, BlockKind, DayTimeline, TimelineBlock, WeekColumn,
};
