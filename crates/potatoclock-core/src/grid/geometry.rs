//! Minutes-from-midnight <-> pixel offset conversions for the weekly grid.
//!
//! Offsets are measured from the top of the visible window (the first
//! visible hour), not from the top of the column header.

use serde::Serialize;

use crate::activity::MAX_DURATION_MINUTES;
use crate::error::ValidationError;

/// Vertical position and extent of a block inside a day column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BlockRect {
    pub top: f64,
    pub height: f64,
}

impl BlockRect {
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// Visible-hours window and scale of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridGeometry {
    window_start_hour: u32,
    window_end_hour: u32,
    pixels_per_hour: f64,
    snap_minutes: u32,
    min_block_minutes: u32,
    min_height_px: f64,
    header_height_px: f64,
}

impl Default for GridGeometry {
    fn default() -> Self {
        Self {
            window_start_hour: 6,
            window_end_hour: 24,
            pixels_per_hour: 60.0,
            snap_minutes: 15,
            min_block_minutes: 30,
            min_height_px: 20.0,
            header_height_px: 40.0,
        }
    }
}

impl GridGeometry {
    pub fn new(
        window_start_hour: u32,
        window_end_hour: u32,
        pixels_per_hour: f64,
        snap_minutes: u32,
    ) -> Result<Self, ValidationError> {
        if window_start_hour >= window_end_hour || window_end_hour > 24 {
            return Err(ValidationError::invalid(
                "window",
                format!("{window_start_hour}..{window_end_hour} is not a range within 0..=24"),
            ));
        }
        if !(pixels_per_hour.is_finite() && pixels_per_hour > 0.0) {
            return Err(ValidationError::invalid("pixels_per_hour", "must be positive"));
        }
        if snap_minutes == 0 {
            return Err(ValidationError::invalid("snap_minutes", "must be positive"));
        }
        Ok(Self {
            window_start_hour,
            window_end_hour,
            pixels_per_hour,
            snap_minutes,
            ..Self::default()
        })
    }

    pub fn with_min_block_minutes(mut self, minutes: u32) -> Self {
        self.min_block_minutes = minutes;
        self
    }

    pub fn with_min_height_px(mut self, px: f64) -> Self {
        self.min_height_px = px;
        self
    }

    pub fn with_header_height_px(mut self, px: f64) -> Self {
        self.header_height_px = px;
        self
    }

    pub fn snap_minutes(&self) -> u32 {
        self.snap_minutes
    }

    pub fn pixels_per_hour(&self) -> f64 {
        self.pixels_per_hour
    }

    pub fn header_height_px(&self) -> f64 {
        self.header_height_px
    }

    pub fn min_block_minutes(&self) -> u32 {
        self.min_block_minutes
    }

    pub fn window_start_minutes(&self) -> u32 {
        self.window_start_hour * 60
    }

    pub fn window_end_minutes(&self) -> u32 {
        self.window_end_hour * 60
    }

    /// Height of the whole visible window.
    pub fn column_height_px(&self) -> f64 {
        f64::from(self.window_end_hour - self.window_start_hour) * self.pixels_per_hour
    }

    fn px_per_minute(&self) -> f64 {
        self.pixels_per_hour / 60.0
    }

    /// Snapped minutes-from-midnight for a window offset.
    ///
    /// Not clamped: offsets above the window give times before it.
    pub fn offset_to_minutes(&self, offset_px: f64) -> i64 {
        let minutes = offset_px / self.pixels_per_hour * 60.0
            + f64::from(self.window_start_minutes());
        let snap = f64::from(self.snap_minutes);
        ((minutes / snap).round() * snap) as i64
    }

    pub fn minutes_to_offset(&self, minutes: u32, duration_minutes: u32) -> BlockRect {
        let top = (f64::from(minutes) - f64::from(self.window_start_minutes())) * self.px_per_minute();
        let height = (f64::from(duration_minutes) * self.px_per_minute()).max(self.min_height_px);
        BlockRect { top, height }
    }

    /// Clamp a start time so a minimum block still fits inside the window.
    pub fn clamp_start(&self, minutes: i64) -> u32 {
        let lo = i64::from(self.window_start_minutes());
        let hi = i64::from(self.window_end_minutes())
            .saturating_sub(i64::from(self.min_block_minutes))
            .max(lo);
        // Both bounds lie in 0..=1440.
        minutes.clamp(lo, hi) as u32
    }

    /// Snapped duration after dragging a block's bottom edge by `delta_px`.
    pub fn resize_duration(&self, original_height_px: f64, delta_px: f64) -> u32 {
        let min_px = f64::from(self.min_block_minutes) * self.px_per_minute();
        let height = (original_height_px + delta_px).max(min_px);
        let minutes = height / self.pixels_per_hour * 60.0;
        let snap = f64::from(self.snap_minutes);
        let snapped = ((minutes / snap).round() * snap) as u32;
        snapped.max(self.snap_minutes).min(MAX_DURATION_MINUTES)
    }

    /// Labels for the hour marks of the visible window, e.g. `6 AM`.
    pub fn hour_labels(&self) -> Vec<String> {
        (self.window_start_hour..self.window_end_hour)
            .map(|hour| {
                let (h12, ampm) = twelve_hour(hour);
                format!("{h12} {ampm}")
            })
            .collect()
    }
}

/// `h:mm AM/PM` for minutes from midnight. 1440 renders as `12:00 AM`.
pub fn format_clock(minutes: u32) -> String {
    let (h12, ampm) = twelve_hour(minutes / 60);
    format!("{h12}:{:02} {ampm}", minutes % 60)
}

fn twelve_hour(hour: u32) -> (u32, &'static str) {
    let ampm = if (12..24).contains(&hour) { "PM" } else { "AM" };
    let h12 = match hour % 12 {
        0 => 12,
        h => h,
    };
    (h12, ampm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn defaults_match_the_visible_day() {
        let g = GridGeometry::default();
        assert_eq!(g.window_start_minutes(), 360);
        assert_eq!(g.window_end_minutes(), 1440);
        assert_eq!(g.column_height_px(), 1080.0);
    }

    #[test]
    fn offset_snaps_to_nearest_quarter() {
        let g = GridGeometry::default();
        // 10:07 is 247 minutes below 06:00.
        assert_eq!(g.offset_to_minutes(247.0), 600);
        assert_eq!(g.offset_to_minutes(0.0), 360);
        assert_eq!(g.offset_to_minutes(-30.0), 330);
    }

    #[test]
    fn minutes_to_offset_enforces_min_height() {
        let g = GridGeometry::default();
        let rect = g.minutes_to_offset(540, 60);
        assert_eq!(rect, BlockRect { top: 180.0, height: 60.0 });
        assert_eq!(g.minutes_to_offset(540, 5).height, 20.0);
        assert!(g.minutes_to_offset(300, 30).top < 0.0);
    }

    #[test]
    fn clamp_keeps_room_for_a_minimum_block() {
        let g = GridGeometry::default();
        assert_eq!(g.clamp_start(100), 360);
        assert_eq!(g.clamp_start(1500), 1410);
        assert_eq!(g.clamp_start(600), 600);
    }

    #[test]
    fn resize_up_by_forty_pixels_hits_the_minimum() {
        let g = GridGeometry::default();
        assert_eq!(g.resize_duration(60.0, -40.0), 30);
        assert_eq!(g.resize_duration(60.0, -500.0), 30);
        assert_eq!(g.resize_duration(60.0, 22.0), 75);
    }

    #[test]
    fn resize_never_exceeds_a_day() {
        let g = GridGeometry::default();
        assert_eq!(g.resize_duration(60.0, 5000.0), MAX_DURATION_MINUTES);
        assert_eq!(g.resize_duration(60.0, f64::MAX), MAX_DURATION_MINUTES);
    }

    #[test]
    fn rejects_bad_windows() {
        assert!(GridGeometry::new(10, 10, 60.0, 15).is_err());
        assert!(GridGeometry::new(6, 25, 60.0, 15).is_err());
        assert!(GridGeometry::new(6, 24, 0.0, 15).is_err());
        assert!(GridGeometry::new(6, 24, 60.0, 0).is_err());
        assert!(GridGeometry::new(0, 24, 120.0, 5).is_ok());
    }

    #[test]
    fn clock_labels() {
        assert_eq!(format_clock(0), "12:00 AM");
        assert_eq!(format_clock(545), "9:05 AM");
        assert_eq!(format_clock(720), "12:00 PM");
        assert_eq!(format_clock(1410), "11:30 PM");
        let labels = GridGeometry::default().hour_labels();
        assert_eq!(labels.len(), 18);
        assert_eq!(labels[0], "6 AM");
        assert_eq!(labels[6], "12 PM");
        assert_eq!(labels[17], "11 PM");
    }

    proptest! {
        #[test]
        fn offsets_always_snap(offset in -500.0f64..2000.0) {
            let g = GridGeometry::default();
            prop_assert_eq!(g.offset_to_minutes(offset).rem_euclid(15), 0);
        }

        #[test]
        fn round_trip_within_one_snap_unit(minutes in 360u32..1440) {
            let g = GridGeometry::default();
            let top = g.minutes_to_offset(minutes, 60).top;
            let back = g.offset_to_minutes(top);
            prop_assert!((back - i64::from(minutes)).abs() <= 15);
        }

        #[test]
        fn resize_is_snapped_and_bounded(height in 0.0f64..1500.0, delta in -1500.0f64..1500.0) {
            let g = GridGeometry::default();
            let d = g.resize_duration(height, delta);
            prop_assert_eq!(d % 15, 0);
            prop_assert!(d >= 30);
            prop_assert!(d <= MAX_DURATION_MINUTES);
        }

        #[test]
        fn clamped_starts_fit_the_window(minutes in -5000i64..5000) {
            let g = GridGeometry::default();
            let start = g.clamp_start(minutes);
            prop_assert!(start >= 360);
            prop_assert!(start + 30 <= 1440);
        }
    }
}
