use chrono::Utc;
use clap::{Subcommand, ValueEnum};
use potatoclock_core::storage::Database;
use potatoclock_core::timer::TICK_PERIOD;
use potatoclock_core::{Config, Ticker, TimerEngine, TimerMode};

use super::{flush, open_store, print_json, CliResult};

const ENGINE_KEY: &str = "timer_engine";

#[derive(Subcommand)]
pub enum TimerAction {
    /// Print current timer state as JSON
    Status,
    /// Choose what the next work interval is for
    Select {
        /// Planned activity ID
        #[arg(long, conflicts_with = "title")]
        task: Option<String>,
        /// Free-text task name; blank clears the selection
        #[arg(long)]
        title: Option<String>,
    },
    /// Start or resume the countdown
    Start {
        /// Planned activity ID
        #[arg(long, conflicts_with = "title")]
        task: Option<String>,
        /// Free-text task name
        #[arg(long)]
        title: Option<String>,
    },
    /// Pause the countdown
    Pause,
    /// Run the countdown in the foreground until it reaches zero
    Run {
        /// Record the interval once the countdown reaches zero
        #[arg(long)]
        complete: bool,
    },
    /// Finish the current interval and record it
    Complete,
    /// Stop a work interval; confirm with `timer reason`
    Interrupt,
    /// Log the reason for a pending interruption
    Reason {
        /// What interrupted the interval
        reason: String,
    },
    /// Dismiss a pending interruption without logging it
    CancelInterrupt,
    /// Switch to an idle work or break countdown
    Mode { mode: ModeArg },
    /// Set the work duration in minutes (1-180)
    Duration { minutes: u32 },
    /// Add or subtract minutes from the work duration
    Adjust {
        #[arg(allow_negative_numbers = true)]
        delta: i32,
    },
    /// Reset to an idle work countdown with the configured durations
    Reset,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ModeArg {
    Work,
    Break,
}

impl From<ModeArg> for TimerMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Work => TimerMode::Work,
            ModeArg::Break => TimerMode::Break,
        }
    }
}

fn load_engine(db: &Database, config: &Config) -> TimerEngine {
    if let Ok(Some(json)) = db.kv_get(ENGINE_KEY) {
        match serde_json::from_str::<TimerEngine>(&json) {
            Ok(engine) => return engine,
            Err(e) => tracing::warn!(error = %e, "discarding unreadable timer state"),
        }
    }
    TimerEngine::new(&config.timer)
}

fn save_engine(db: &Database, engine: &TimerEngine) -> CliResult {
    let json = serde_json::to_string(engine)?;
    db.kv_set(ENGINE_KEY, &json)?;
    Ok(())
}

fn select(
    engine: &mut TimerEngine,
    user: Option<&str>,
    task: Option<String>,
    title: Option<String>,
) -> CliResult {
    match (task, title) {
        (Some(id), _) => {
            let store = open_store(user)?;
            let activity = store
                .get(&id)
                .ok_or_else(|| format!("activity not found: {id}"))?;
            engine.select_planned(activity);
        }
        (None, Some(title)) => engine.select_manual(&title),
        (None, None) => {}
    }
    Ok(())
}

pub fn run(action: TimerAction, user: Option<&str>) -> CliResult {
    let config = Config::load_or_default();
    let db = Database::open()?;
    let mut engine = load_engine(&db, &config);

    // Account for the time that passed since the last command.
    let mut events = engine.advance_to(Utc::now());

    match action {
        TimerAction::Status => {}
        TimerAction::Select { task, title } => {
            if task.is_none() && title.is_none() {
                engine.clear_selection();
            }
            select(&mut engine, user, task, title)?;
        }
        TimerAction::Start { task, title } => {
            select(&mut engine, user, task, title)?;
            events.extend(engine.start()?);
        }
        TimerAction::Pause => events.extend(engine.pause()),
        TimerAction::Run { complete } => {
            events.extend(engine.start()?);
            save_engine(&db, &engine)?;
            run_foreground(&mut engine)?;
            if complete {
                let mut store = open_store(user)?;
                events.push(engine.complete(&mut store, Utc::now())?);
                flush(&mut store);
            } else {
                events.extend(engine.pause());
            }
        }
        TimerAction::Complete => {
            let mut store = open_store(user)?;
            events.push(engine.complete(&mut store, Utc::now())?);
            flush(&mut store);
        }
        TimerAction::Interrupt => events.push(engine.interrupt()?),
        TimerAction::Reason { reason } => {
            let mut store = open_store(user)?;
            events.push(engine.confirm_interrupt(&reason, &mut store, Utc::now())?);
            flush(&mut store);
        }
        TimerAction::CancelInterrupt => {
            if !engine.cancel_interrupt() {
                return Err("no interruption is pending".into());
            }
        }
        TimerAction::Mode { mode } => events.push(engine.switch_mode(mode.into())),
        TimerAction::Duration { minutes } => events.push(engine.set_duration(minutes)?),
        TimerAction::Adjust { delta } => events.push(engine.adjust_duration(delta)?),
        TimerAction::Reset => engine = TimerEngine::new(&config.timer),
    }

    events.push(engine.snapshot());
    save_engine(&db, &engine)?;
    print_json(&events)
}

/// Tick once per second until the countdown reaches zero.
fn run_foreground(engine: &mut TimerEngine) -> CliResult {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    runtime.block_on(async {
        let mut ticker = Ticker::new();
        let mut ticks = ticker.arm(TICK_PERIOD);
        while engine.remaining_secs() > 0 && ticks.recv().await.is_some() {
            engine.tick();
            eprintln!("{}", engine.display());
        }
        ticker.disarm();
    });
    Ok(())
}
