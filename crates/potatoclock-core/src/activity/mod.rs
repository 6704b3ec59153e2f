//! Activity model: the schedulable unit of work placed on the weekly grid.
//!
//! An Activity is either fully scheduled (a [`Placement`] with both day and
//! start time) or lives in the inbox. The type makes a half-placed activity
//! unrepresentable; the wire decoder maps a partial record to the inbox.

pub mod store;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ValidationError;

pub use store::{ActivityStore, Backend, FlushSummary, SessionContext};

/// Minutes represented by one estimated work interval.
pub const MINUTES_PER_POMODORO: u32 = 30;
/// Start time given to activities created for specific weekdays (09:00).
pub const DEFAULT_START_MINUTES: u32 = 9 * 60;
/// Duration of a freshly added activity.
pub const DEFAULT_DURATION_MINUTES: u32 = 60;
/// Longest activity or logged session: one full day.
pub const MAX_DURATION_MINUTES: u32 = 24 * 60;
/// Upper bound for the "copies" creation mode.
pub const MAX_COPIES: u8 = 10;

pub const DAYS_OF_WEEK: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Fixed set of activity categories. Drives styling only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Work,
    Meeting,
    Exercise,
    Personal,
    Rest,
}

/// Presentation tokens for a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryStyle {
    pub label: &'static str,
    pub background: &'static str,
    pub border: &'static str,
    pub text: &'static str,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Work,
        Category::Meeting,
        Category::Exercise,
        Category::Personal,
        Category::Rest,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Work => "work",
            Self::Meeting => "meeting",
            Self::Exercise => "exercise",
            Self::Personal => "personal",
            Self::Rest => "rest",
        }
    }

    pub fn style(&self) -> CategoryStyle {
        match self {
            Self::Work => CategoryStyle {
                label: "Work",
                background: "blue-100",
                border: "blue-300",
                text: "blue-900",
            },
            Self::Meeting => CategoryStyle {
                label: "Meeting",
                background: "purple-100",
                border: "purple-300",
                text: "purple-900",
            },
            Self::Exercise => CategoryStyle {
                label: "Exercise",
                background: "orange-100",
                border: "orange-300",
                text: "orange-900",
            },
            Self::Personal => CategoryStyle {
                label: "Personal",
                background: "green-100",
                border: "green-300",
                text: "green-900",
            },
            Self::Rest => CategoryStyle {
                label: "Rest",
                background: "gray-100",
                border: "gray-300",
                text: "gray-900",
            },
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                ValidationError::invalid(
                    "category",
                    format!("'{s}' is not one of work, meeting, exercise, personal, rest"),
                )
            })
    }
}

/// Progress state of an activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Completed,
}

impl FromStr for TaskStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "todo" => Ok(Self::Todo),
            "in_progress" => Ok(Self::InProgress),
            "completed" | "done" => Ok(Self::Completed),
            other => Err(ValidationError::invalid(
                "status",
                format!("'{other}' is not one of todo, in_progress, completed"),
            )),
        }
    }
}

/// Day column and start time of a scheduled activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    /// 0 = Sunday .. 6 = Saturday.
    pub day_index: u8,
    /// Minutes from midnight.
    pub start_minutes: u32,
}

impl Placement {
    pub fn new(day_index: u8, start_minutes: u32) -> Result<Self, ValidationError> {
        if day_index > 6 {
            return Err(ValidationError::invalid("dayIndex", "must be between 0 and 6"));
        }
        if start_minutes >= 24 * 60 {
            return Err(ValidationError::invalid(
                "startMinutes",
                "must be earlier than midnight",
            ));
        }
        Ok(Self {
            day_index,
            start_minutes,
        })
    }

    pub fn day_name(&self) -> &'static str {
        DAYS_OF_WEEK[usize::from(self.day_index.min(6))]
    }
}

/// Advisory work-interval counters. Never validated against sessions.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ProgressCounters {
    pub estimated: f64,
    pub completed: u32,
}

impl ProgressCounters {
    pub fn estimated_for(duration_minutes: u32) -> f64 {
        f64::from(duration_minutes) / f64::from(MINUTES_PER_POMODORO)
    }
}

/// A schedulable unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ActivityRecord", into = "ActivityRecord")]
pub struct Activity {
    pub id: String,
    pub title: String,
    pub category: Category,
    pub status: TaskStatus,
    pub duration_minutes: u32,
    pub scheduled: Option<Placement>,
    pub progress: ProgressCounters,
}

impl Activity {
    /// New inbox activity with a fresh id.
    pub fn new(
        title: impl Into<String>,
        category: Category,
        duration_minutes: u32,
    ) -> Result<Self, ValidationError> {
        let title = normalize_title(title.into())?;
        check_duration(duration_minutes)?;
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            title,
            category,
            status: TaskStatus::Todo,
            duration_minutes,
            scheduled: None,
            progress: ProgressCounters {
                estimated: ProgressCounters::estimated_for(duration_minutes),
                completed: 0,
            },
        })
    }

    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.scheduled = Some(placement);
        self
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled.is_some()
    }

    pub fn day_index(&self) -> Option<u8> {
        self.scheduled.map(|p| p.day_index)
    }

    pub fn start_minutes(&self) -> Option<u32> {
        self.scheduled.map(|p| p.start_minutes)
    }

    pub fn end_minutes(&self) -> Option<u32> {
        self.start_minutes().map(|s| s.saturating_add(self.duration_minutes))
    }

    /// Set the duration and recompute the derived estimate.
    pub(crate) fn set_duration(&mut self, duration_minutes: u32) {
        self.duration_minutes = duration_minutes;
        self.progress.estimated = ProgressCounters::estimated_for(duration_minutes);
    }

    /// Apply an edit patch. The activity is untouched when validation fails.
    pub fn apply(&mut self, patch: &ActivityPatch) -> Result<(), ValidationError> {
        let title = match &patch.title {
            Some(t) => Some(normalize_title(t.clone())?),
            None => None,
        };
        if let Some(d) = patch.duration_minutes {
            check_duration(d)?;
        }

        if let Some(t) = title {
            self.title = t;
        }
        if let Some(c) = patch.category {
            self.category = c;
        }
        if let Some(s) = patch.status {
            self.status = s;
        }
        if let Some(d) = patch.duration_minutes {
            self.set_duration(d);
        }
        Ok(())
    }
}

/// Field merge used by the edit dialog.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityPatch {
    pub title: Option<String>,
    pub category: Option<Category>,
    pub duration_minutes: Option<u32>,
    pub status: Option<TaskStatus>,
}

impl ActivityPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.category.is_none()
            && self.duration_minutes.is_none()
            && self.status.is_none()
    }
}

/// How many activities an add produces and where they land.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CreateMode {
    /// One activity in the inbox.
    #[default]
    Single,
    /// N identical inbox activities.
    Copies(u8),
    /// One activity per weekday, scheduled at [`DEFAULT_START_MINUTES`].
    Weekdays(Vec<u8>),
}

/// Input of the add form.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityDraft {
    pub title: String,
    pub category: Category,
    pub duration_minutes: u32,
}

impl ActivityDraft {
    pub fn new(title: impl Into<String>, category: Category) -> Self {
        Self {
            title: title.into(),
            category,
            duration_minutes: DEFAULT_DURATION_MINUTES,
        }
    }

    /// Expand the draft into the activities to insert.
    ///
    /// Weekday selection takes precedence over copies; an empty weekday
    /// list falls back to a single inbox entry.
    pub fn build(&self, mode: &CreateMode) -> Result<Vec<Activity>, ValidationError> {
        let make = || Activity::new(self.title.clone(), self.category, self.duration_minutes);
        match mode {
            CreateMode::Single => Ok(vec![make()?]),
            CreateMode::Copies(n) => {
                if *n == 0 || *n > MAX_COPIES {
                    return Err(ValidationError::invalid(
                        "copies",
                        format!("must be between 1 and {MAX_COPIES}"),
                    ));
                }
                (0..*n).map(|_| make()).collect()
            }
            CreateMode::Weekdays(days) if days.is_empty() => Ok(vec![make()?]),
            CreateMode::Weekdays(days) => {
                let mut seen = Vec::with_capacity(days.len());
                for &day in days {
                    if !seen.contains(&day) {
                        seen.push(day);
                    }
                }
                seen.into_iter()
                    .map(|day| {
                        let placement = Placement::new(day, DEFAULT_START_MINUTES)?;
                        Ok(make()?.with_placement(placement))
                    })
                    .collect()
            }
        }
    }
}

fn normalize_title(title: String) -> Result<String, ValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    Ok(trimmed.to_string())
}

fn check_duration(duration_minutes: u32) -> Result<(), ValidationError> {
    if duration_minutes == 0 {
        return Err(ValidationError::invalid("duration", "must be positive"));
    }
    if duration_minutes > MAX_DURATION_MINUTES {
        return Err(ValidationError::invalid(
            "duration",
            format!("must be at most {MAX_DURATION_MINUTES} minutes"),
        ));
    }
    Ok(())
}

/// JSON wire shape of an activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActivityRecord {
    id: String,
    title: String,
    #[serde(default)]
    category: Category,
    #[serde(default)]
    status: TaskStatus,
    duration: u32,
    #[serde(default)]
    start_minutes: Option<u32>,
    #[serde(default)]
    day_index: Option<u8>,
    #[serde(default)]
    estimated_pomodoros: Option<f64>,
    #[serde(default)]
    completed_pomodoros: u32,
}

impl From<ActivityRecord> for Activity {
    fn from(r: ActivityRecord) -> Self {
        let scheduled = match (r.day_index, r.start_minutes) {
            (Some(day_index), Some(start_minutes)) => Some(Placement {
                day_index,
                start_minutes,
            }),
            (None, None) => None,
            (day, start) => {
                tracing::warn!(
                    id = %r.id,
                    ?day,
                    ?start,
                    "partial placement in stored activity, moving it to the inbox"
                );
                None
            }
        };
        Activity {
            progress: ProgressCounters {
                estimated: r
                    .estimated_pomodoros
                    .unwrap_or_else(|| ProgressCounters::estimated_for(r.duration)),
                completed: r.completed_pomodoros,
            },
            id: r.id,
            title: r.title,
            category: r.category,
            status: r.status,
            duration_minutes: r.duration,
            scheduled,
        }
    }
}

impl From<Activity> for ActivityRecord {
    fn from(a: Activity) -> Self {
        ActivityRecord {
            id: a.id,
            title: a.title,
            category: a.category,
            status: a.status,
            duration: a.duration_minutes,
            start_minutes: a.scheduled.map(|p| p.start_minutes),
            day_index: a.scheduled.map(|p| p.day_index),
            estimated_pomodoros: Some(a.progress.estimated),
            completed_pomodoros: a.progress.completed,
        }
    }
}
