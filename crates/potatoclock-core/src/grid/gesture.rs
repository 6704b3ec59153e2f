//! Pointer gesture state machine for the weekly grid.
//!
//! Transitions are pure: each takes the current state by value and returns
//! the next one. Only [`GestureState::release`] produces a [`GridCommand`],
//! and at most one per gesture. Events that make no sense in the current
//! state leave it unchanged.

use serde::Serialize;

use super::geometry::GridGeometry;
use crate::activity::Placement;

/// Where a dragged activity came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DragOrigin {
    Inbox,
    Scheduled { placement: Placement },
}

/// What the pointer was over when the button was released.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DropTarget {
    /// A day column whose top edge (header included) is at `column_top_px`.
    DayColumn { day_index: u8, column_top_px: f64 },
    Inbox,
    Outside,
}

/// Store mutation requested by a completed gesture.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum GridCommand {
    Reschedule { id: String, placement: Placement },
    Unschedule { id: String },
    Resize { id: String, duration_minutes: u32 },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GestureState {
    #[default]
    Idle,
    Dragging {
        source_id: String,
        origin: DragOrigin,
        pointer_start: (f64, f64),
        pointer_delta: (f64, f64),
    },
    Resizing {
        source_id: String,
        original_height_px: f64,
        pointer_start_y: f64,
        pointer_delta_y: f64,
    },
}

impl GestureState {
    pub fn is_idle(&self) -> bool {
        matches!(self, GestureState::Idle)
    }

    pub fn source_id(&self) -> Option<&str> {
        match self {
            GestureState::Idle => None,
            GestureState::Dragging { source_id, .. } | GestureState::Resizing { source_id, .. } => {
                Some(source_id.as_str())
            }
        }
    }

    pub fn begin_drag(self, source_id: impl Into<String>, origin: DragOrigin, pointer: (f64, f64)) -> Self {
        match self {
            GestureState::Idle => GestureState::Dragging {
                source_id: source_id.into(),
                origin,
                pointer_start: pointer,
                pointer_delta: (0.0, 0.0),
            },
            other => {
                tracing::debug!(state = ?other, "ignoring drag start during an active gesture");
                other
            }
        }
    }

    pub fn begin_resize(
        self,
        source_id: impl Into<String>,
        original_height_px: f64,
        pointer_y: f64,
    ) -> Self {
        match self {
            GestureState::Idle => GestureState::Resizing {
                source_id: source_id.into(),
                original_height_px,
                pointer_start_y: pointer_y,
                pointer_delta_y: 0.0,
            },
            other => {
                tracing::debug!(state = ?other, "ignoring resize start during an active gesture");
                other
            }
        }
    }

    /// Track the pointer. Resizing follows the vertical axis only.
    pub fn pointer_moved(self, pointer: (f64, f64)) -> Self {
        match self {
            GestureState::Idle => GestureState::Idle,
            GestureState::Dragging {
                source_id,
                origin,
                pointer_start,
                ..
            } => GestureState::Dragging {
                source_id,
                origin,
                pointer_start,
                pointer_delta: (pointer.0 - pointer_start.0, pointer.1 - pointer_start.1),
            },
            GestureState::Resizing {
                source_id,
                original_height_px,
                pointer_start_y,
                ..
            } => GestureState::Resizing {
                source_id,
                original_height_px,
                pointer_start_y,
                pointer_delta_y: pointer.1 - pointer_start_y,
            },
        }
    }

    /// End the gesture. Always returns to `Idle`.
    pub fn release(self, target: DropTarget, geometry: &GridGeometry) -> (Self, Option<GridCommand>) {
        let command = match self {
            GestureState::Idle => None,
            GestureState::Dragging {
                source_id,
                origin,
                pointer_start,
                pointer_delta,
            } => drop_command(source_id, origin, pointer_start.1 + pointer_delta.1, target, geometry),
            GestureState::Resizing {
                source_id,
                original_height_px,
                pointer_delta_y,
                ..
            } => Some(GridCommand::Resize {
                id: source_id,
                duration_minutes: geometry.resize_duration(original_height_px, pointer_delta_y),
            }),
        };
        (GestureState::Idle, command)
    }

    pub fn cancel(self) -> Self {
        GestureState::Idle
    }
}

fn drop_command(
    id: String,
    origin: DragOrigin,
    pointer_y: f64,
    target: DropTarget,
    geometry: &GridGeometry,
) -> Option<GridCommand> {
    match target {
        DropTarget::DayColumn {
            day_index,
            column_top_px,
        } => {
            let relative = pointer_y - column_top_px - geometry.header_height_px();
            let start = geometry.clamp_start(geometry.offset_to_minutes(relative));
            match Placement::new(day_index, start) {
                Ok(placement) => Some(GridCommand::Reschedule { id, placement }),
                Err(e) => {
                    tracing::debug!(error = %e, "discarding drop on invalid column");
                    None
                }
            }
        }
        DropTarget::Inbox => match origin {
            DragOrigin::Scheduled { .. } => Some(GridCommand::Unschedule { id }),
            DragOrigin::Inbox => None,
        },
        DropTarget::Outside => None,
    }
}
