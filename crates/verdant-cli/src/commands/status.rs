//! Status command - gateway hardware health.

use anyhow::Result;

use verdant_core::GatewayApi;

use crate::util::Engine;

/// Execute the status command.
pub async fn cmd_status(engine: &Engine) -> Result<()> {
    engine.require_linked().await?;

    let status = engine.gateway.hardware_status().await?;

    println!(
        "SD card: {:.1} / {:.1} MB used ({:.1}% free)",
        status.sd_used_mb, status.sd_total_mb, status.sd_free_pct
    );
    println!("Wi-Fi RSSI: {} dBm", status.wifi_rssi_dbm);
    println!("Uptime: {}", status.uptime_display());

    Ok(())
}
