//! Activity management commands for CLI.

use clap::Subcommand;
use serde_json::json;
use potatoclock_core::{ActivityDraft, ActivityPatch, Category, CreateMode, TaskStatus};

use super::{flush, found, open_store, print_json, CliResult};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add one or more activities
    Add {
        /// Activity title
        title: String,
        /// work, meeting, exercise, personal or rest
        #[arg(long, default_value = "work")]
        category: Category,
        /// Duration in minutes
        #[arg(long, default_value = "60")]
        duration: u32,
        /// Number of identical inbox copies
        #[arg(long, conflicts_with = "days")]
        copies: Option<u8>,
        /// Comma-separated weekday indexes (0 = Sunday); one scheduled
        /// activity per day at 9:00 AM
        #[arg(long, value_delimiter = ',')]
        days: Vec<u8>,
    },
    /// List activities
    List {
        /// Only unscheduled activities
        #[arg(long, conflicts_with = "day")]
        inbox: bool,
        /// Only activities scheduled on this weekday (0 = Sunday)
        #[arg(long)]
        day: Option<u8>,
    },
    /// Get activity details
    Get {
        /// Activity ID
        id: String,
    },
    /// Edit an activity
    Edit {
        /// Activity ID
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        category: Option<Category>,
        /// Duration in minutes
        #[arg(long)]
        duration: Option<u32>,
        /// todo, in_progress or completed
        #[arg(long)]
        status: Option<TaskStatus>,
    },
    /// Delete an activity
    Delete {
        /// Activity ID
        id: String,
    },
}

pub fn run(action: TaskAction, user: Option<&str>) -> CliResult {
    let mut store = open_store(user)?;

    match action {
        TaskAction::Add {
            title,
            category,
            duration,
            copies,
            days,
        } => {
            let mode = match (copies, days.is_empty()) {
                (_, false) => CreateMode::Weekdays(days),
                (Some(n), true) => CreateMode::Copies(n),
                (None, true) => CreateMode::Single,
            };
            let draft = ActivityDraft {
                duration_minutes: duration,
                ..ActivityDraft::new(title, category)
            };
            let ids = store.add(&draft, &mode)?;
            flush(&mut store);
            let created: Vec<_> = ids.iter().filter_map(|id| store.get(id)).collect();
            print_json(&created)?;
        }
        TaskAction::List { inbox, day } => {
            let activities = match (inbox, day) {
                (true, _) => store.inbox(),
                (false, Some(d)) => store.scheduled_on(d),
                (false, None) => store.activities().iter().collect(),
            };
            print_json(&activities)?;
        }
        TaskAction::Get { id } => {
            let activity = store
                .get(&id)
                .ok_or_else(|| format!("activity not found: {id}"))?;
            print_json(activity)?;
        }
        TaskAction::Edit {
            id,
            title,
            category,
            duration,
            status,
        } => {
            let patch = ActivityPatch {
                title,
                category,
                duration_minutes: duration,
                status,
            };
            found(store.edit(&id, &patch)?, "activity", &id)?;
            flush(&mut store);
            if let Some(activity) = store.get(&id) {
                print_json(activity)?;
            }
        }
        TaskAction::Delete { id } => {
            found(store.remove(&id), "activity", &id)?;
            flush(&mut store);
            print_json(&json!({ "type": "activity_deleted", "id": id }))?;
        }
    }
    Ok(())
}
