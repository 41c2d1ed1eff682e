//! Data models for the local catalog.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use verdant_types::ZoneTelemetry;

/// The locally persisted record of one gateway day log.
///
/// Created or overwritten wholesale whenever the day log is downloaded;
/// the entry sequence is never patched in place, because a redownload always
/// supersedes a provisional copy with a more complete one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalBackupLog {
    /// Gateway file name, `DDMMYY.json`.
    pub file_name: String,
    /// The day's ordered telemetry entries.
    pub data: Vec<ZoneTelemetry>,
    /// Whether the gateway had closed out this day when we downloaded it.
    pub is_complete: bool,
    /// Whether this copy has been confirmed uploaded to the cloud backup.
    pub is_synced_to_cloud: bool,
    /// When this copy was downloaded from the gateway.
    #[serde(with = "time::serde::rfc3339")]
    pub last_downloaded: OffsetDateTime,
}
