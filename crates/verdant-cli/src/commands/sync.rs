//! Sync command - reconcile gateway day logs into the local catalog.

use std::io::Write;
use std::sync::Arc;

use anyhow::Result;

use verdant_core::HistoryReconciler;

use crate::util::Engine;

/// Execute the sync command.
pub async fn cmd_sync(engine: &Engine) -> Result<()> {
    engine.require_linked().await?;

    let reconciler = HistoryReconciler::new(
        engine.gateway.clone(),
        Arc::clone(&engine.monitor),
        Arc::clone(&engine.store),
    );

    let report = reconciler
        .sync_with_progress(|percent| {
            print!("\rSyncing... {percent:>3}%");
            let _ = std::io::stdout().flush();
        })
        .await;

    if report.downloaded > 0 {
        println!();
    }
    println!("{}", report.message);

    if !report.success {
        anyhow::bail!("sync failed");
    }
    Ok(())
}
