//! Subcommand handlers. Each run opens the store, applies one action,
//! flushes queued writes and prints JSON to stdout.

pub mod config;
pub mod grid;
pub mod review;
pub mod session;
pub mod stats;
pub mod task;
pub mod timeline;
pub mod timer;

use serde::Serialize;

use potatoclock_core::storage::{self, Database, LocalStore};
use potatoclock_core::{ActivityStore, Backend, Config, SessionContext, SqliteAdapter};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Shared document store used by signed-in users.
const REMOTE_DB: &str = "remote.db";

/// Open the store for `user`, or for the configured `sync.user`.
/// Without either the store is anonymous and device-local.
pub fn open_store(user: Option<&str>) -> Result<ActivityStore, Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let uid = user.map(str::to_string).or(config.sync.user);
    let local = LocalStore::new(Database::open()?);

    let store = match uid {
        Some(uid) => {
            let remote = Database::open_at(&storage::data_dir()?.join(REMOTE_DB))?;
            ActivityStore::new(
                SessionContext::user(uid),
                Backend::Remote {
                    adapter: Box::new(SqliteAdapter::new(remote)),
                    fallback: local,
                },
            )
        }
        None => ActivityStore::new(SessionContext::Anonymous, Backend::Local(local)),
    };
    if store.is_offline() {
        eprintln!("warning: sync unavailable, using data stored on this device");
    }
    Ok(store)
}

/// Write queued changes. Failures are reported but do not fail the command.
pub fn flush(store: &mut ActivityStore) {
    let summary = store.flush();
    if summary.failed > 0 {
        eprintln!(
            "warning: {} change(s) could not be saved ({} saved)",
            summary.failed, summary.persisted
        );
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// `Ok` when the id resolved, otherwise a not-found error.
pub fn found(hit: bool, what: &str, id: &str) -> CliResult {
    if hit {
        Ok(())
    } else {
        Err(format!("{what} not found: {id}").into())
    }
}
