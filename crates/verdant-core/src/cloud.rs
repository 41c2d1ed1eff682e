//! Cloud backup of locally-held day logs.
//!
//! Independent of the gateway: the cloud endpoint lives on the internet,
//! so uploads typically run once the phone is back on a real network.
//! Uploads are sequential: one in flight at a time keeps the backup
//! service happy and makes "N of M succeeded" accounting exact.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, info, warn};

use verdant_store::LocalBackupLog;

use crate::error::{Failure, Result};
use crate::traits::CloudApi;
use crate::SharedStore;

/// HTTP client for the cloud backup service.
#[derive(Debug, Clone)]
pub struct CloudClient {
    http: Client,
    base_url: String,
}

impl CloudClient {
    /// Per-request timeout. The cloud end is a real server on a real
    /// network, so it gets more slack than the gateway.
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

    /// Create a new cloud client.
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(Failure::Unknown(format!(
                "base URL must start with http:// or https://, got: {base_url}"
            )));
        }

        let http = Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Failure::Unknown(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, base_url })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl CloudApi for CloudClient {
    async fn upload_log(&self, log: &LocalBackupLog) -> Result<()> {
        let url = format!("{}/history/upload", self.base_url);
        debug!("POST {url} ({})", log.file_name);

        let response = self
            .http
            .post(&url)
            .json(&json!({
                "fileName": log.file_name,
                "data": log.data,
            }))
            .send()
            .await
            .map_err(|e| Failure::from_reqwest(e, Self::REQUEST_TIMEOUT))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(Failure::from_status(status.as_u16(), message))
        }
    }
}

/// How an upload batch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Every given log was already synced; no network call was made.
    NothingPending,
    /// Every pending log was uploaded.
    Complete,
    /// Some pending logs were uploaded, some failed.
    Partial,
    /// No pending log could be uploaded.
    Failed,
}

/// Result of one upload batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReport {
    /// Logs confirmed uploaded in this batch.
    pub uploaded: usize,
    /// Logs that were pending at the start of the batch.
    pub total: usize,
    pub outcome: UploadOutcome,
}

impl UploadReport {
    /// Human-readable outcome for the caller to surface.
    ///
    /// The three end states are worded distinctly so the user can tell a
    /// clean run from a partial one from a dead cloud endpoint.
    #[must_use]
    pub fn message(&self) -> String {
        match self.outcome {
            UploadOutcome::NothingPending => "No logs pending upload".to_string(),
            UploadOutcome::Complete => "All logs synced to the cloud".to_string(),
            UploadOutcome::Partial => {
                format!("Uploaded {} of {} logs", self.uploaded, self.total)
            }
            UploadOutcome::Failed => {
                "Cloud server did not respond; try again later".to_string()
            }
        }
    }
}

/// Pushes unsynced local logs to the cloud backup service.
pub struct CloudUploader {
    cloud: Arc<dyn CloudApi>,
    store: SharedStore,
}

impl CloudUploader {
    pub fn new(cloud: Arc<dyn CloudApi>, store: SharedStore) -> Self {
        Self { cloud, store }
    }

    /// Upload every not-yet-synced log in the given set, sequentially.
    ///
    /// Each confirmed upload is marked in the store immediately, so a crash
    /// mid-batch does not re-upload already-accepted files. A failed upload
    /// leaves the log's flag untouched and the batch moves on.
    pub async fn upload_pending(&self, logs: &[LocalBackupLog]) -> UploadReport {
        let pending: Vec<&LocalBackupLog> =
            logs.iter().filter(|log| !log.is_synced_to_cloud).collect();

        if pending.is_empty() {
            debug!("no logs pending upload");
            return UploadReport {
                uploaded: 0,
                total: 0,
                outcome: UploadOutcome::NothingPending,
            };
        }

        let total = pending.len();
        let mut uploaded = 0;

        for log in pending {
            match self.cloud.upload_log(log).await {
                Ok(()) => {
                    let store = self.store.lock().await;
                    match store.mark_synced(&log.file_name) {
                        Ok(()) => {
                            uploaded += 1;
                            debug!("uploaded {}", log.file_name);
                        }
                        Err(e) => warn!("uploaded {} but failed to mark it: {e}", log.file_name),
                    }
                }
                Err(failure) => {
                    warn!("upload of {} failed: {failure}", log.file_name);
                }
            }
        }

        let outcome = if uploaded == total {
            UploadOutcome::Complete
        } else if uploaded > 0 {
            UploadOutcome::Partial
        } else {
            UploadOutcome::Failed
        };

        info!("upload batch finished: {uploaded}/{total}");
        UploadReport {
            uploaded,
            total,
            outcome,
        }
    }
}
