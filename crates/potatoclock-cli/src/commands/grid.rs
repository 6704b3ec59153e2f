//! Weekly grid commands. Each command replays one pointer gesture through
//! the scheduling grid, so drops snap and clamp exactly as a drag would.

use chrono::{NaiveTime, Timelike};
use clap::Subcommand;
use serde_json::json;

use potatoclock_core::{ActivityStore, Config, DropTarget, GridCommand, SchedulingGrid};

use super::{flush, open_store, print_json, CliResult};

#[derive(Subcommand)]
pub enum GridAction {
    /// Drop an activity on a day column at a pointer offset
    Drop {
        /// Activity ID
        id: String,
        /// Weekday index (0 = Sunday)
        #[arg(long)]
        day: u8,
        /// Pointer y in pixels from the top of the column, header included
        #[arg(long, allow_negative_numbers = true)]
        y: f64,
    },
    /// Drop an activity on a day column at a clock time
    Move {
        /// Activity ID
        id: String,
        /// Weekday index (0 = Sunday)
        #[arg(long)]
        day: u8,
        /// Time of day, HH:MM
        #[arg(long, value_parser = parse_clock)]
        at: u32,
    },
    /// Drag an activity back to the inbox
    Inbox {
        /// Activity ID
        id: String,
    },
    /// Drag the bottom edge of a scheduled block
    Resize {
        /// Activity ID
        id: String,
        /// Vertical pointer movement in pixels
        #[arg(long, allow_negative_numbers = true)]
        dy: f64,
    },
    /// Hour labels of the visible window
    Hours,
}

fn parse_clock(s: &str) -> Result<u32, String> {
    let time = NaiveTime::parse_from_str(s, "%H:%M").map_err(|e| format!("{s}: {e}"))?;
    Ok(time.hour() * 60 + time.minute())
}

pub fn run(action: GridAction, user: Option<&str>) -> CliResult {
    let geometry = Config::load_or_default().geometry()?;

    if let GridAction::Hours = action {
        return print_json(&geometry.hour_labels());
    }

    let mut store = open_store(user)?;
    let mut grid = SchedulingGrid::new(geometry);
    let (id, command) = match action {
        GridAction::Drop { id, day, y } => {
            let cmd = drop_at(&mut grid, &mut store, &id, day, y);
            (id, cmd)
        }
        GridAction::Move { id, day, at } => {
            let y = grid.geometry().header_height_px() + grid.geometry().minutes_to_offset(at, 0).top;
            let cmd = drop_at(&mut grid, &mut store, &id, day, y);
            (id, cmd)
        }
        GridAction::Inbox { id } => {
            let cmd = if grid.begin_drag(&store, &id, (0.0, 0.0)) {
                grid.release(&mut store, DropTarget::Inbox)
            } else {
                None
            };
            (id, cmd)
        }
        GridAction::Resize { id, dy } => {
            let cmd = if grid.begin_resize(&store, &id, 0.0) {
                grid.pointer_moved((0.0, dy));
                grid.release(&mut store, DropTarget::Outside)
            } else {
                None
            };
            (id, cmd)
        }
        GridAction::Hours => return Ok(()),
    };

    let command: GridCommand = command.ok_or_else(|| match store.get(&id) {
        None => format!("activity not found: {id}"),
        Some(_) => format!("gesture on {id} produced no change"),
    })?;
    flush(&mut store);
    print_json(&json!({ "command": command, "activity": store.get(&id) }))
}

fn drop_at(
    grid: &mut SchedulingGrid,
    store: &mut ActivityStore,
    id: &str,
    day: u8,
    y: f64,
) -> Option<GridCommand> {
    if !grid.begin_drag(store, id, (0.0, 0.0)) {
        return None;
    }
    grid.pointer_moved((0.0, y));
    grid.release(
        store,
        DropTarget::DayColumn {
            day_index: day,
            column_top_px: 0.0,
        },
    )
}
