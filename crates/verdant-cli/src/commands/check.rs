//! Check command - report the three-state gateway connectivity.

use anyhow::Result;

use verdant_core::LinkLevel;

use crate::util::Engine;

/// Execute the check command.
pub async fn cmd_check(engine: &Engine) -> Result<()> {
    let state = engine.monitor.check().await;

    let verdict = match state.level() {
        LinkLevel::Linked => "linked: gateway is answering",
        LinkLevel::WifiOnly => "wifi-only: network present, gateway not answering",
        LinkLevel::Offline => "offline: no wireless network",
    };
    println!("{verdict}");

    if let Some(ssid) = &state.ssid {
        println!("  network: {ssid}");
    }
    println!("  api reachable: {}", state.api_reachable);

    Ok(())
}
