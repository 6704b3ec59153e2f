//! Drives the gesture state machine against an [`ActivityStore`].
//!
//! Pointer movement only changes gesture state. The store is written once,
//! on release, with the single command the gesture produced.

use super::geometry::GridGeometry;
use super::gesture::{DragOrigin, DropTarget, GestureState, GridCommand};
use crate::activity::ActivityStore;

#[derive(Debug, Clone, Default)]
pub struct SchedulingGrid {
    geometry: GridGeometry,
    state: GestureState,
}

impl SchedulingGrid {
    pub fn new(geometry: GridGeometry) -> Self {
        Self {
            geometry,
            state: GestureState::Idle,
        }
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    pub fn state(&self) -> &GestureState {
        &self.state
    }

    /// Pick up an activity from the inbox or a day column.
    pub fn begin_drag(&mut self, store: &ActivityStore, id: &str, pointer: (f64, f64)) -> bool {
        if !self.state.is_idle() {
            return false;
        }
        let Some(activity) = store.get(id) else {
            tracing::debug!(%id, "drag started on unknown activity");
            return false;
        };
        let origin = match activity.scheduled {
            Some(placement) => DragOrigin::Scheduled { placement },
            None => DragOrigin::Inbox,
        };
        self.transition(|s| s.begin_drag(id, origin, pointer));
        true
    }

    /// Grab the bottom edge of a scheduled block. Inbox items have no
    /// edge to grab, so the grid stays idle for them.
    pub fn begin_resize(&mut self, store: &ActivityStore, id: &str, pointer_y: f64) -> bool {
        if !self.state.is_idle() {
            return false;
        }
        let Some(activity) = store.get(id) else {
            tracing::debug!(%id, "resize started on unknown activity");
            return false;
        };
        let Some(start) = activity.start_minutes() else {
            return false;
        };
        let height = self
            .geometry
            .minutes_to_offset(start, activity.duration_minutes)
            .height;
        self.transition(|s| s.begin_resize(id, height, pointer_y));
        true
    }

    pub fn pointer_moved(&mut self, pointer: (f64, f64)) {
        self.transition(|s| s.pointer_moved(pointer));
    }

    /// Finish the gesture and apply its command. Returns the command if the
    /// store accepted it.
    pub fn release(&mut self, store: &mut ActivityStore, target: DropTarget) -> Option<GridCommand> {
        let state = std::mem::take(&mut self.state);
        let (next, command) = state.release(target, &self.geometry);
        self.state = next;
        let command = command?;
        apply(store, &command).then_some(command)
    }

    pub fn cancel(&mut self) {
        self.transition(GestureState::cancel);
    }

    fn transition(&mut self, f: impl FnOnce(GestureState) -> GestureState) {
        let state = std::mem::take(&mut self.state);
        self.state = f(state);
    }
}

/// Apply one grid command to the store.
pub fn apply(store: &mut ActivityStore, command: &GridCommand) -> bool {
    let applied = match command {
        GridCommand::Reschedule { id, placement } => store.reschedule(id, *placement),
        GridCommand::Unschedule { id } => store.unschedule(id),
        GridCommand::Resize {
            id,
            duration_minutes,
        } => match store.resize(id, *duration_minutes) {
            Ok(applied) => applied,
            Err(e) => {
                tracing::debug!(%id, error = %e, "resize rejected");
                false
            }
        },
    };
    tracing::debug!(?command, applied, "grid command");
    applied
}
