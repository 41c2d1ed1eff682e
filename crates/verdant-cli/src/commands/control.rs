//! Control command - manual irrigation start/stop.

use anyhow::Result;

use verdant_core::{with_retry, GatewayApi, RetryConfig};
use verdant_types::Zone;

use crate::util::Engine;

/// Start (liters > 0) or stop (liters == 0) a manual irrigation run.
pub async fn cmd_irrigate(engine: &Engine, zone: Zone, liters: u32) -> Result<()> {
    engine.require_linked().await?;

    let confirmation = with_retry(&RetryConfig::for_control(), "trigger_irrigation", || {
        engine.gateway.trigger_irrigation(zone, liters)
    })
    .await?;

    if liters > 0 {
        println!("Irrigation started in {zone} ({liters} L)");
    } else {
        println!("Irrigation stopped in {zone}");
    }
    tracing::debug!("gateway confirmed: {confirmation}");

    Ok(())
}
