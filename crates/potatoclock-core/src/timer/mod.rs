mod engine;
mod ticker;

pub use engine::{TaskSelection, TimerConfig, TimerEngine, TimerMode, MAX_DURATION_MINUTES};
pub use ticker::{Ticker, TICK_PERIOD};
