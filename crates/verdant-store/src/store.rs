//! Main store implementation.

use std::path::Path;

use rusqlite::{Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use time::OffsetDateTime;
use tracing::{debug, info};

use verdant_types::{day_log_complete, ZoneTelemetry};

use crate::error::{Error, Result};
use crate::models::LocalBackupLog;

/// Stable cache key for the last aggregated live snapshot.
pub const SNAPSHOT_CACHE_KEY: &str = "aggregated_snapshot";

/// Stable cache key for the last known remote file index.
pub const FILE_INDEX_CACHE_KEY: &str = "known_remote_files";

/// SQLite-backed catalog of day-log backups and serialized cache entries.
///
/// The store is the sole owner of persisted log data. All catalog mutations
/// are read-modify-write against the single connection; concurrent engine
/// components share the store behind one lock (see `verdant_core::SharedStore`)
/// so updates cannot be lost to a stale second copy.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open or create a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| Error::CreateDirectory {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }

        info!("Opening catalog at {}", path.display());
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;

        crate::schema::initialize(&conn)?;

        Ok(Self { conn })
    }

    /// Open the default database location.
    pub fn open_default() -> Result<Self> {
        Self::open(crate::default_db_path())
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        crate::schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    // === Day-log catalog ===

    /// All catalog entries, ordered by file name.
    pub fn list_logs(&self) -> Result<Vec<LocalBackupLog>> {
        let mut stmt = self.conn.prepare(
            "SELECT file_name, data, is_complete, is_synced_to_cloud, last_downloaded
             FROM backup_logs ORDER BY file_name",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, bool>(2)?,
                row.get::<_, bool>(3)?,
                row.get::<_, i64>(4)?,
            ))
        })?;

        let mut logs = Vec::new();
        for row in rows {
            logs.push(Self::decode_log(row?)?);
        }
        Ok(logs)
    }

    /// One catalog entry by file name.
    pub fn get_log(&self, file_name: &str) -> Result<Option<LocalBackupLog>> {
        let mut stmt = self.conn.prepare(
            "SELECT file_name, data, is_complete, is_synced_to_cloud, last_downloaded
             FROM backup_logs WHERE file_name = ?",
        )?;

        let row = stmt
            .query_row([file_name], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, bool>(2)?,
                    row.get::<_, bool>(3)?,
                    row.get::<_, i64>(4)?,
                ))
            })
            .optional()?;

        row.map(Self::decode_log).transpose()
    }

    /// Entries not yet confirmed uploaded to the cloud.
    pub fn unsynced_logs(&self) -> Result<Vec<LocalBackupLog>> {
        Ok(self
            .list_logs()?
            .into_iter()
            .filter(|log| !log.is_synced_to_cloud)
            .collect())
    }

    /// Create or wholesale-replace the backup of one day log.
    ///
    /// Recomputes completeness from the entries, resets the cloud-sync flag
    /// (freshly downloaded data has by definition not been uploaded), and
    /// stamps the download time.
    pub fn upsert_log(&self, file_name: &str, entries: &[ZoneTelemetry]) -> Result<LocalBackupLog> {
        let is_complete = day_log_complete(entries);
        let data = serde_json::to_string(entries)?;
        let now = OffsetDateTime::now_utc();

        self.conn.execute(
            "INSERT INTO backup_logs (file_name, data, is_complete, is_synced_to_cloud, last_downloaded)
             VALUES (?1, ?2, ?3, 0, ?4)
             ON CONFLICT(file_name) DO UPDATE SET
                data = ?2,
                is_complete = ?3,
                is_synced_to_cloud = 0,
                last_downloaded = ?4",
            rusqlite::params![file_name, data, is_complete, now.unix_timestamp()],
        )?;

        debug!(
            "Stored {} ({} entries, complete: {})",
            file_name,
            entries.len(),
            is_complete
        );

        Ok(LocalBackupLog {
            file_name: file_name.to_string(),
            data: entries.to_vec(),
            is_complete,
            is_synced_to_cloud: false,
            last_downloaded: now,
        })
    }

    /// Record a confirmed cloud upload for one log.
    ///
    /// The flag only ever moves `false -> true` here; nothing in the engine
    /// unsets it on an existing copy.
    pub fn mark_synced(&self, file_name: &str) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE backup_logs SET is_synced_to_cloud = 1 WHERE file_name = ?",
            [file_name],
        )?;

        if updated == 0 {
            return Err(Error::LogNotFound(file_name.to_string()));
        }
        Ok(())
    }

    /// Delete one catalog entry.
    pub fn remove_log(&self, file_name: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM backup_logs WHERE file_name = ?", [file_name])?;
        Ok(())
    }

    // === Serialized cache entries ===

    /// Store a serializable value under a stable key, replacing any
    /// previous value wholesale.
    pub fn put_cache<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        let now = OffsetDateTime::now_utc().unix_timestamp();

        self.conn.execute(
            "INSERT OR REPLACE INTO cache_entries (key, value, updated_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![key, json, now],
        )?;
        Ok(())
    }

    /// Read a cached value back, if present.
    pub fn get_cache<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let json: Option<String> = self
            .conn
            .query_row("SELECT value FROM cache_entries WHERE key = ?", [key], |row| {
                row.get(0)
            })
            .optional()?;

        json.map(|j| serde_json::from_str(&j).map_err(Error::from))
            .transpose()
    }

    // === Internal helpers ===

    fn decode_log(row: (String, String, bool, bool, i64)) -> Result<LocalBackupLog> {
        let (file_name, data, is_complete, is_synced_to_cloud, downloaded) = row;
        let data: Vec<ZoneTelemetry> = serde_json::from_str(&data)?;
        let last_downloaded = OffsetDateTime::from_unix_timestamp(downloaded)
            .map_err(|_| Error::InvalidTimestamp(downloaded))?;

        Ok(LocalBackupLog {
            file_name,
            data,
            is_complete,
            is_synced_to_cloud,
            last_downloaded,
        })
    }
}
