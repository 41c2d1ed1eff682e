//! Local day-log catalog for the Verdant greenhouse gateway.
//!
//! This crate persists the backups of the gateway's per-day telemetry logs,
//! plus a small table of serialized cache entries (last live snapshot, known
//! remote file index) under stable keys, enabling offline display.
//!
//! # Example
//!
//! ```no_run
//! use verdant_store::Store;
//!
//! let store = Store::open_default()?;
//! for log in store.list_logs()? {
//!     println!("{} complete: {}", log.file_name, log.is_complete);
//! }
//! # Ok::<(), verdant_store::Error>(())
//! ```

mod error;
mod models;
mod schema;
mod store;

pub use error::{Error, Result};
pub use models::LocalBackupLog;
pub use store::{Store, FILE_INDEX_CACHE_KEY, SNAPSHOT_CACHE_KEY};

/// Default database path following platform conventions.
///
/// - Linux: `~/.local/share/verdant/catalog.db`
/// - macOS: `~/Library/Application Support/verdant/catalog.db`
/// - Windows: `C:\Users\<user>\AppData\Local\verdant\catalog.db`
pub fn default_db_path() -> std::path::PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("verdant")
        .join("catalog.db")
}
