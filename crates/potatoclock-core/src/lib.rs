//! # PotatoClock Core Library
//!
//! Weekly planning grid plus a focus timer that logs what actually happened.
//! The `potatoclock` CLI is a thin shell over this crate; the library itself
//! is UI-agnostic and single-threaded.
//!
//! ## Architecture
//!
//! - **Grid**: minutes <-> pixel geometry and a pure gesture state machine
//!   that turns drags and resizes into one store mutation each
//! - **Activity Store**: in-memory collections with optimistic writes,
//!   flushed to a sync adapter or to local SQLite storage
//! - **Timer Engine**: WORK/BREAK countdown with overtime that emits
//!   session records
//! - **Timeline**: read-only projection of plans and sessions for a day
//!
//! ## Key Components
//!
//! - [`ActivityStore`]: activities, sessions and reviews
//! - [`SchedulingGrid`]: gesture driver for the weekly grid
//! - [`TimerEngine`]: timer state machine
//! - [`SyncAdapter`]: durable storage contract
//! - [`Config`]: application configuration management

pub mod activity;
pub mod error;
pub mod events;
pub mod grid;
pub mod review;
pub mod session;
pub mod stats;
pub mod storage;
pub mod sync;
pub mod timeline;
pub mod timer;

pub use activity::{
    Activity, ActivityDraft, ActivityPatch, ActivityStore, Backend, Category, CreateMode,
    Placement, SessionContext, TaskStatus,
};
pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::{Event, EventBus};
pub use grid::{DropTarget, GridCommand, GridGeometry, SchedulingGrid};
pub use review::DailyReview;
pub use session::{Session, SessionSink, SessionStatus, SessionType};
pub use storage::{Config, Database, LocalStore};
pub use sync::{MemoryAdapter, SqliteAdapter, SyncAdapter, SyncError};
pub use timeline::{render_day, render_week, DayTimeline};
pub use timer::{Ticker, TimerConfig, TimerEngine, TimerMode};
