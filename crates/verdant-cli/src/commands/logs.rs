//! Logs commands - inspect local and remote day logs.

use std::sync::Arc;

use anyhow::{Context, Result};

use verdant_core::HistoryReconciler;
use verdant_types::{LogFileName, LogStats, Metric};

use crate::util::Engine;

/// List known day logs with their local catalog state.
///
/// Works offline: when the gateway is unreachable the cached file index
/// from the last good listing is used.
pub async fn cmd_list(engine: &Engine) -> Result<()> {
    engine.monitor.check().await;

    let reconciler = HistoryReconciler::new(
        engine.gateway.clone(),
        Arc::clone(&engine.monitor),
        Arc::clone(&engine.store),
    );
    let index = reconciler.file_index().await;

    if index.is_empty() {
        println!("No day logs known (sync while linked to populate the index)");
        return Ok(());
    }

    let store = engine.store.lock().await;
    for file in index {
        let label = LogFileName::parse(&file)
            .map(|name| name.display_label())
            .unwrap_or_else(|_| file.clone());

        let state = match store.get_log(&file)? {
            Some(log) => {
                let completeness = if log.is_complete { "complete" } else { "partial" };
                let synced = if log.is_synced_to_cloud { ", synced" } else { "" };
                format!("{} entries, {completeness}{synced}", log.data.len())
            }
            None => "not downloaded".to_string(),
        };

        println!("{file}  {label}  [{state}]");
    }

    Ok(())
}

/// Print the entries of one locally held day log.
pub async fn cmd_show(engine: &Engine, file: &str) -> Result<()> {
    let file_name = LogFileName::parse(file)?.file_name();

    let store = engine.store.lock().await;
    let log = store
        .get_log(&file_name)?
        .with_context(|| format!("{file_name} is not in the local catalog; run sync first"))?;

    println!(
        "{}: {} entries, complete: {}, synced: {}",
        log.file_name,
        log.data.len(),
        log.is_complete,
        log.is_synced_to_cloud
    );

    for entry in &log.data {
        println!(
            "  {} {} {:>5.1} C {:>5.1} % {:>6.1} ppm  valve {}",
            entry.timestamp.time(),
            entry.zone,
            entry.temperature_c,
            entry.humidity_pct,
            entry.co2_ppm,
            if entry.valve_open { "open" } else { "closed" },
        );
    }

    Ok(())
}

/// Min/max/mean of one metric over a locally held day log.
pub async fn cmd_stats(engine: &Engine, file: &str, metric: Metric) -> Result<()> {
    let file_name = LogFileName::parse(file)?.file_name();

    let store = engine.store.lock().await;
    let log = store
        .get_log(&file_name)?
        .with_context(|| format!("{file_name} is not in the local catalog; run sync first"))?;

    match LogStats::compute(&log.data, metric) {
        Some(stats) => println!(
            "{metric} over {file_name}: min {:.1}, max {:.1}, mean {:.1}",
            stats.min, stats.max, stats.mean
        ),
        None => println!("{file_name} has no entries"),
    }

    Ok(())
}
