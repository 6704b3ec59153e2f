use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "potatoclock", version, about = "PotatoClock weekly planner and focus timer")]
struct Cli {
    /// Signed-in user; activities sync through the shared document store
    #[arg(long, global = true, env = "POTATOCLOCK_USER")]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Activity management
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Weekly grid gestures
    Grid {
        #[command(subcommand)]
        action: commands::grid::GridAction,
    },
    /// Timer control
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Recorded focus sessions
    Session {
        #[command(subcommand)]
        action: commands::session::SessionAction,
    },
    /// Day and week views
    Timeline {
        #[command(subcommand)]
        action: commands::timeline::TimelineAction,
    },
    /// Daily check-in
    Review {
        #[command(subcommand)]
        action: commands::review::ReviewAction,
    },
    /// Session statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_env("POTATOCLOCK_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let user = cli.user.as_deref();
    let result = match cli.command {
        Commands::Task { action } => commands::task::run(action, user),
        Commands::Grid { action } => commands::grid::run(action, user),
        Commands::Timer { action } => commands::timer::run(action, user),
        Commands::Session { action } => commands::session::run(action, user),
        Commands::Timeline { action } => commands::timeline::run(action, user),
        Commands::Review { action } => commands::review::run(action, user),
        Commands::Stats { action } => commands::stats::run(action, user),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
