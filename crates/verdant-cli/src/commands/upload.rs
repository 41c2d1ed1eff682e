//! Upload command - push unsynced day logs to the cloud backup.

use std::sync::Arc;

use anyhow::{Context, Result};

use verdant_core::{CloudClient, CloudUploader, UploadOutcome};

use crate::util::Engine;

/// Execute the upload command.
///
/// The cloud endpoint is independent of the gateway; this works on any
/// network with internet access.
pub async fn cmd_upload(engine: &Engine, cloud_url: &str) -> Result<()> {
    let cloud = Arc::new(CloudClient::new(cloud_url).context("Invalid cloud URL")?);
    let uploader = CloudUploader::new(cloud, Arc::clone(&engine.store));

    let logs = engine.store.lock().await.list_logs()?;
    let report = uploader.upload_pending(&logs).await;

    println!("{}", report.message());

    if report.outcome == UploadOutcome::Failed {
        anyhow::bail!("upload failed");
    }
    Ok(())
}
