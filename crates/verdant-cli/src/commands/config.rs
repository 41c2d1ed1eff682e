//! Config commands - show or change the irrigation schedule.

use anyhow::Result;

use verdant_core::{with_retry, GatewayApi, RetryConfig};
use verdant_types::Zone;

use crate::util::Engine;

/// Show the irrigation schedule for both zones.
pub async fn cmd_show(engine: &Engine) -> Result<()> {
    engine.require_linked().await?;

    let config = engine.gateway.irrigation_config().await?;

    for zone in Zone::ALL {
        let z = config.zone(zone);
        println!(
            "{zone}: {} | {} L every {} h | threshold {} | next run in {} s",
            if z.active { "active" } else { "inactive" },
            z.target_volume_l,
            z.frequency_hours,
            z.moisture_threshold_raw,
            z.next_run_in_secs,
        );
        match z.last_run {
            Some(at) => println!("  last run: {at}"),
            None => println!("  last run: never"),
        }
    }

    Ok(())
}

/// Update one zone's schedule.
pub async fn cmd_set(
    engine: &Engine,
    zone: Zone,
    volume: u32,
    frequency: u32,
    threshold: u32,
) -> Result<()> {
    engine.require_linked().await?;

    // Control calls are one-shot; retrying transient AP hiccups is the
    // caller's job, so it happens here rather than in the engine.
    let confirmation = with_retry(&RetryConfig::for_control(), "set_zone_config", || {
        engine
            .gateway
            .set_zone_config(zone, volume, frequency, threshold)
    })
    .await?;

    println!("Gateway confirmed: {confirmation}");
    Ok(())
}
