//! Recorded sessions: list, backfill and delete.

use chrono::{DateTime, Local, NaiveDate, Utc};
use clap::{Subcommand, ValueEnum};
use serde_json::json;

use potatoclock_core::SessionType;

use super::{flush, found, open_store, print_json, CliResult};

#[derive(Subcommand)]
pub enum SessionAction {
    /// List sessions, newest first
    List {
        /// Only sessions that started on this local date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Backfill a session by hand
    Log {
        /// Title; defaults to the linked activity's title
        #[arg(long)]
        title: Option<String>,
        /// Linked activity ID
        #[arg(long)]
        task: Option<String>,
        #[arg(long = "type", value_enum, default_value = "work")]
        session_type: SessionTypeArg,
        /// Start time, RFC 3339
        #[arg(long)]
        start: DateTime<Utc>,
        /// End time, RFC 3339
        #[arg(long)]
        end: DateTime<Utc>,
        /// Duration in minutes; defaults to the span between start and end
        #[arg(long)]
        duration: Option<u32>,
    },
    /// Delete a session
    Delete {
        /// Session ID
        id: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum SessionTypeArg {
    Work,
    Break,
}

impl From<SessionTypeArg> for SessionType {
    fn from(t: SessionTypeArg) -> Self {
        match t {
            SessionTypeArg::Work => SessionType::Work,
            SessionTypeArg::Break => SessionType::Break,
        }
    }
}

pub fn run(action: SessionAction, user: Option<&str>) -> CliResult {
    let mut store = open_store(user)?;

    match action {
        SessionAction::List { date } => {
            let mut sessions: Vec<_> = store
                .sessions()
                .iter()
                .filter(|s| {
                    date.map_or(true, |d| s.start_time.with_timezone(&Local).date_naive() == d)
                })
                .collect();
            sessions.sort_by(|a, b| b.start_time.cmp(&a.start_time));
            print_json(&sessions)?;
        }
        SessionAction::Log {
            title,
            task,
            session_type,
            start,
            end,
            duration,
        } => {
            let id = store.log_manual_session(
                task.as_deref(),
                title.as_deref(),
                session_type.into(),
                start,
                end,
                duration,
            )?;
            flush(&mut store);
            let session = store.sessions().iter().find(|s| s.id == id);
            print_json(&session)?;
        }
        SessionAction::Delete { id } => {
            found(store.remove_session(&id), "session", &id)?;
            flush(&mut store);
            print_json(&json!({ "type": "session_deleted", "id": id }))?;
        }
    }
    Ok(())
}
