//! Live command - poll the gateway and render the dashboard.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use verdant_core::{LinkLevel, TelemetryPoller};
use verdant_types::AggregatedSnapshot;

use crate::util::{fmt_metric, Engine};

/// Execute the live command.
///
/// The poller runs on its own timer; this loop plays the UI layer's part:
/// it owns the periodic connectivity check and renders whatever the poller
/// currently holds. A zero interval is paused mode: cached data only.
pub async fn cmd_live(engine: &Engine, interval_secs: u64, count: Option<u32>) -> Result<()> {
    let interval = Duration::from_secs(interval_secs);

    let poller = TelemetryPoller::new(
        engine.gateway.clone(),
        Arc::clone(&engine.monitor),
        Arc::clone(&engine.store),
    );

    engine.monitor.check().await;
    poller.start(interval).await;

    if interval.is_zero() {
        render(engine.monitor.level().await, poller.latest().await.as_ref());
        return Ok(());
    }

    let mut ticker = tokio::time::interval(interval);
    let mut frames = 0u32;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => {}
        }

        // The check timer lives here, not in the engine.
        engine.monitor.check().await;
        render(engine.monitor.level().await, poller.latest().await.as_ref());

        frames += 1;
        if count.is_some_and(|n| frames >= n) {
            break;
        }
    }

    poller.stop();
    Ok(())
}

fn render(level: LinkLevel, snapshot: Option<&AggregatedSnapshot>) {
    println!("[{level}]");

    let Some(snapshot) = snapshot else {
        println!("  no telemetry yet (live or cached)");
        return;
    };

    println!(
        "  temp {} C | humidity {} % | co2 {} ppm | soil {} | light {} lx",
        fmt_metric(snapshot.temperature_c),
        fmt_metric(snapshot.humidity_pct),
        fmt_metric(snapshot.co2_ppm),
        fmt_metric(snapshot.soil_moisture_raw),
        fmt_metric(snapshot.lux),
    );

    for valve in snapshot.valves() {
        println!(
            "  {}: valve {}{} | {:.1} L/min | {:.1} L today",
            valve.zone,
            if valve.is_open { "open" } else { "closed" },
            if valve.is_manual { " (manual)" } else { "" },
            valve.flow_lpm,
            valve.total_liters_today,
        );
    }
}
