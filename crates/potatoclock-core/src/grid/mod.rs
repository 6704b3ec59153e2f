//! Weekly scheduling grid: geometry, gesture state machine and the driver
//! that turns completed gestures into store mutations.

mod engine;
mod geometry;
mod gesture;

pub use engine::{apply, SchedulingGrid};
pub use geometry::{format_clock, BlockRect, GridGeometry};
pub use gesture::{DragOrigin, DropTarget, GestureState, GridCommand};
