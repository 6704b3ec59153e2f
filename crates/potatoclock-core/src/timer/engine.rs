//! Timer engine implementation.
//!
//! A countdown over two modes, WORK and BREAK. The engine has no internal
//! thread: the caller drives it with `tick()` once per second while it is
//! running (see [`super::Ticker`]), or catches up on wall-clock time with
//! `advance_to()`.
//!
//! ## State Transitions
//!
//! ```text
//! Work/idle --start--> Work/running --complete--> Break/idle
//!     ^                    |                          |
//!     |               interrupt                    start
//!     |                    v                          v
//!     +--confirm---- awaiting reason      Break/running --complete--> Work/idle
//! ```
//!
//! The countdown does not stop at zero. Negative remaining time is
//! overtime, and `complete()` records it as elapsed time.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::activity::Activity;
use crate::error::ValidationError;
use crate::events::Event;
use crate::session::{Session, SessionSink, SessionStatus, SessionType};

/// Longest interval the duration controls allow, in minutes.
pub const MAX_DURATION_MINUTES: u32 = 180;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TimerMode {
    Work,
    Break,
}

impl TimerMode {
    pub fn session_type(self) -> SessionType {
        match self {
            TimerMode::Work => SessionType::Work,
            TimerMode::Break => SessionType::Break,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TimerMode::Work => "Work",
            TimerMode::Break => "Break",
        }
    }
}

/// `[timer]` section of the configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_work_minutes")]
    pub work_minutes: u32,
    #[serde(default = "default_break_minutes")]
    pub break_minutes: u32,
    /// Store an INTERRUPTED session when an interruption is confirmed.
    #[serde(default = "default_true")]
    pub record_interruptions: bool,
    /// One-tap work durations.
    #[serde(default = "default_presets")]
    pub presets: Vec<u32>,
}

fn default_work_minutes() -> u32 {
    25
}
fn default_break_minutes() -> u32 {
    5
}
fn default_true() -> bool {
    true
}
fn default_presets() -> Vec<u32> {
    vec![25, 50]
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            work_minutes: default_work_minutes(),
            break_minutes: default_break_minutes(),
            record_interruptions: true,
            presets: default_presets(),
        }
    }
}

impl TimerConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let in_range = |m: u32| (1..=MAX_DURATION_MINUTES).contains(&m);
        if !in_range(self.work_minutes) {
            return Err(ValidationError::invalid(
                "work_minutes",
                format!("must be between 1 and {MAX_DURATION_MINUTES}"),
            ));
        }
        if !in_range(self.break_minutes) {
            return Err(ValidationError::invalid(
                "break_minutes",
                format!("must be between 1 and {MAX_DURATION_MINUTES}"),
            ));
        }
        if let Some(bad) = self.presets.iter().find(|m| !in_range(**m)) {
            return Err(ValidationError::invalid(
                "presets",
                format!("{bad} is outside 1..={MAX_DURATION_MINUTES}"),
            ));
        }
        Ok(())
    }
}

/// What the current work interval is for.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskSelection {
    #[default]
    None,
    Planned { id: String, title: String },
    Manual { title: String },
}

impl TaskSelection {
    pub fn title(&self) -> Option<&str> {
        match self {
            TaskSelection::None => None,
            TaskSelection::Planned { title, .. } | TaskSelection::Manual { title } => {
                Some(title.as_str())
            }
        }
    }

    pub fn task_id(&self) -> Option<&str> {
        match self {
            TaskSelection::Planned { id, .. } => Some(id.as_str()),
            _ => None,
        }
    }
}

/// Core timer engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerEngine {
    mode: TimerMode,
    running: bool,
    /// Negative once in overtime.
    remaining_secs: i64,
    /// Length of the current interval.
    configured_secs: i64,
    work_secs: i64,
    break_secs: i64,
    record_interruptions: bool,
    #[serde(default)]
    selection: TaskSelection,
    #[serde(default)]
    awaiting_reason: bool,
    #[serde(default)]
    overtime_announced: bool,
    /// Wall-clock instant the countdown has been accounted up to.
    #[serde(default)]
    anchor: Option<DateTime<Utc>>,
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self::new(&TimerConfig::default())
    }
}

impl TimerEngine {
    /// Idle WORK engine with the configured durations.
    pub fn new(config: &TimerConfig) -> Self {
        let work_secs = i64::from(config.work_minutes.clamp(1, MAX_DURATION_MINUTES)) * 60;
        let break_secs = i64::from(config.break_minutes.clamp(1, MAX_DURATION_MINUTES)) * 60;
        Self {
            mode: TimerMode::Work,
            running: false,
            remaining_secs: work_secs,
            configured_secs: work_secs,
            work_secs,
            break_secs,
            record_interruptions: config.record_interruptions,
            selection: TaskSelection::None,
            awaiting_reason: false,
            overtime_announced: false,
            anchor: None,
        }
    }

    // Queries

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn remaining_secs(&self) -> i64 {
        self.remaining_secs
    }

    pub fn configured_secs(&self) -> i64 {
        self.configured_secs
    }

    pub fn selection(&self) -> &TaskSelection {
        &self.selection
    }

    pub fn is_awaiting_reason(&self) -> bool {
        self.awaiting_reason
    }

    pub fn is_overtime(&self) -> bool {
        self.remaining_secs < 0
    }

    /// Seconds past the configured duration, 0 when not in overtime.
    pub fn overtime_secs(&self) -> i64 {
        (-self.remaining_secs).max(0)
    }

    /// Whole minutes elapsed in the current interval, at least one.
    pub fn elapsed_minutes(&self) -> u32 {
        let elapsed = (self.configured_secs - self.remaining_secs).max(0);
        let minutes = (elapsed + 59) / 60;
        u32::try_from(minutes.max(1)).unwrap_or(u32::MAX)
    }

    /// `MM:SS` while counting down, `+MM:SS` in overtime.
    pub fn display(&self) -> String {
        let (sign, secs) = if self.remaining_secs < 0 {
            ("+", -self.remaining_secs)
        } else {
            ("", self.remaining_secs)
        };
        format!("{sign}{:02}:{:02}", secs / 60, secs % 60)
    }

    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            mode: self.mode,
            running: self.running,
            remaining_secs: self.remaining_secs,
            overtime_secs: self.overtime_secs(),
            display: self.display(),
            task_title: self.selection.title().map(str::to_string),
            awaiting_reason: self.awaiting_reason,
            at: Utc::now(),
        }
    }

    // Selection

    pub fn select_planned(&mut self, activity: &Activity) {
        self.selection = TaskSelection::Planned {
            id: activity.id.clone(),
            title: activity.title.clone(),
        };
    }

    /// Free-text task name. A blank name clears the selection.
    pub fn select_manual(&mut self, title: &str) {
        let title = title.trim();
        self.selection = if title.is_empty() {
            TaskSelection::None
        } else {
            TaskSelection::Manual {
                title: title.to_string(),
            }
        };
    }

    pub fn clear_selection(&mut self) {
        self.selection = TaskSelection::None;
    }

    // Commands

    /// Start or resume the countdown. A work interval needs a selection.
    pub fn start(&mut self) -> Result<Option<Event>, ValidationError> {
        if self.running {
            return Ok(None);
        }
        if self.awaiting_reason {
            return Err(ValidationError::NotPermitted {
                action: "start",
                reason: "an interruption reason is pending",
            });
        }
        if self.mode == TimerMode::Work && self.selection == TaskSelection::None {
            return Err(ValidationError::MissingSelection);
        }
        self.running = true;
        self.anchor = Some(Utc::now());
        tracing::debug!(mode = ?self.mode, remaining = self.remaining_secs, "timer started");
        Ok(Some(Event::TimerStarted {
            mode: self.mode,
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        }))
    }

    pub fn pause(&mut self) -> Option<Event> {
        if !self.running {
            return None;
        }
        self.stop();
        Some(Event::TimerPaused {
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        })
    }

    /// One second of countdown. Emits `OvertimeStarted` the first time the
    /// remaining time drops below zero.
    pub fn tick(&mut self) -> Option<Event> {
        if !self.running {
            return None;
        }
        self.remaining_secs -= 1;
        if let Some(anchor) = self.anchor {
            self.anchor = Some(anchor + Duration::seconds(1));
        }
        if self.remaining_secs < 0 && !self.overtime_announced {
            self.overtime_announced = true;
            tracing::debug!(mode = ?self.mode, "timer entered overtime");
            return Some(Event::OvertimeStarted {
                mode: self.mode,
                at: Utc::now(),
            });
        }
        None
    }

    /// Apply the whole seconds between the last accounted instant and
    /// `now` as ticks.
    pub fn advance_to(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        let Some(anchor) = self.anchor.filter(|_| self.running) else {
            return Vec::new();
        };
        let seconds = (now - anchor).num_seconds();
        (0..seconds.max(0)).filter_map(|_| self.tick()).collect()
    }

    /// Finish the current interval and record it.
    ///
    /// Work is followed by an idle break and a break by idle work.
    pub fn complete(
        &mut self,
        sink: &mut impl SessionSink,
        now: DateTime<Utc>,
    ) -> Result<Event, ValidationError> {
        if self.awaiting_reason {
            return Err(ValidationError::NotPermitted {
                action: "complete",
                reason: "an interruption reason is pending",
            });
        }
        let elapsed_minutes = self.elapsed_minutes();
        let mode = self.mode;
        let session = self.session(SessionStatus::Completed, elapsed_minutes, now);
        let session_id = session.id.clone();
        sink.append_session(session);

        let next = match mode {
            TimerMode::Work => TimerMode::Break,
            TimerMode::Break => TimerMode::Work,
        };
        self.reset_to(next);
        tracing::info!(?mode, elapsed_minutes, "interval completed");
        Ok(Event::TimerCompleted {
            session_id,
            mode,
            elapsed_minutes,
            at: now,
        })
    }

    /// Stop a work interval and wait for the reason.
    pub fn interrupt(&mut self) -> Result<Event, ValidationError> {
        if self.mode != TimerMode::Work {
            return Err(ValidationError::NotPermitted {
                action: "interrupt",
                reason: "only a work interval can be interrupted",
            });
        }
        self.stop();
        self.awaiting_reason = true;
        Ok(Event::InterruptionRequested {
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Log the reason and reset the work countdown. Records an INTERRUPTED
    /// session unless interruption recording is switched off.
    pub fn confirm_interrupt(
        &mut self,
        reason: &str,
        sink: &mut impl SessionSink,
        now: DateTime<Utc>,
    ) -> Result<Event, ValidationError> {
        if !self.awaiting_reason {
            return Err(ValidationError::NotPermitted {
                action: "confirm interruption",
                reason: "no interruption is pending",
            });
        }
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ValidationError::invalid("reason", "must not be empty"));
        }

        let session_id = if self.record_interruptions {
            let session = self
                .session(SessionStatus::Interrupted, self.elapsed_minutes(), now)
                .with_reason(reason);
            let id = session.id.clone();
            sink.append_session(session);
            Some(id)
        } else {
            None
        };
        tracing::info!(%reason, recorded = session_id.is_some(), "interruption logged");

        self.awaiting_reason = false;
        self.remaining_secs = self.work_secs;
        self.configured_secs = self.work_secs;
        self.overtime_announced = false;
        Ok(Event::InterruptionLogged {
            reason: reason.to_string(),
            session_id,
            at: now,
        })
    }

    /// Close the reason prompt. The countdown stays where it stopped.
    pub fn cancel_interrupt(&mut self) -> bool {
        std::mem::replace(&mut self.awaiting_reason, false)
    }

    /// Change the work duration by `delta_minutes`, clamped to 1..=180.
    pub fn adjust_duration(&mut self, delta_minutes: i32) -> Result<Event, ValidationError> {
        let current = i64::from(self.work_minutes());
        let target = (current + i64::from(delta_minutes)).clamp(1, i64::from(MAX_DURATION_MINUTES));
        self.set_duration(u32::try_from(target).unwrap_or(MAX_DURATION_MINUTES))
    }

    /// Set the work duration, e.g. from a preset. Clamped to 1..=180.
    pub fn set_duration(&mut self, minutes: u32) -> Result<Event, ValidationError> {
        if self.running || self.mode != TimerMode::Work {
            return Err(ValidationError::NotPermitted {
                action: "adjust duration",
                reason: "only an idle work timer can be adjusted",
            });
        }
        let minutes = minutes.clamp(1, MAX_DURATION_MINUTES);
        self.work_secs = i64::from(minutes) * 60;
        self.reset_to(TimerMode::Work);
        Ok(Event::DurationAdjusted {
            minutes,
            at: Utc::now(),
        })
    }

    pub fn switch_mode(&mut self, mode: TimerMode) -> Event {
        self.reset_to(mode);
        Event::ModeSwitched {
            mode,
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        }
    }

    fn work_minutes(&self) -> u32 {
        u32::try_from(self.work_secs / 60).unwrap_or(MAX_DURATION_MINUTES)
    }

    fn stop(&mut self) {
        self.running = false;
        self.anchor = None;
    }

    fn reset_to(&mut self, mode: TimerMode) {
        self.stop();
        self.mode = mode;
        self.awaiting_reason = false;
        self.overtime_announced = false;
        self.configured_secs = match mode {
            TimerMode::Work => self.work_secs,
            TimerMode::Break => self.break_secs,
        };
        self.remaining_secs = self.configured_secs;
    }

    fn session(&self, status: SessionStatus, elapsed_minutes: u32, now: DateTime<Utc>) -> Session {
        let (task_id, title) = match self.mode {
            TimerMode::Work => (
                self.selection.task_id().map(str::to_string),
                self.selection.title().unwrap_or(self.mode.label()).to_string(),
            ),
            TimerMode::Break => (None, self.mode.label().to_string()),
        };
        Session::from_timer(
            task_id,
            title,
            self.mode.session_type(),
            status,
            elapsed_minutes,
            now,
        )
    }
}
