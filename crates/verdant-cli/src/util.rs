//! Shared wiring for the CLI commands.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::sync::Mutex;

use verdant_core::{
    ConnectionMonitor, GatewayClient, LinkLevel, NetworkInterface, SharedStore, WifiState,
};
use verdant_store::Store;

/// Wireless view for a CLI host.
///
/// A terminal host has no portable SSID query the way a phone does; running
/// this tool presumes the host has joined the gateway's access point (or a
/// network that routes to it), so the interface always reports attached and
/// the application-level probe decides `Linked` vs `WifiOnly`.
pub struct CliNetwork {
    ssid: Option<String>,
}

#[async_trait]
impl NetworkInterface for CliNetwork {
    async fn wifi_state(&self) -> WifiState {
        WifiState::Connected {
            ssid: self.ssid.clone(),
        }
    }
}

/// The engine components every command works against.
pub struct Engine {
    pub gateway: Arc<GatewayClient>,
    pub monitor: Arc<ConnectionMonitor>,
    pub store: SharedStore,
}

impl Engine {
    /// Wire up the gateway client, connection monitor, and local catalog.
    pub fn build(gateway_url: &str, db: Option<&Path>, ssid: Option<String>) -> Result<Self> {
        let gateway = Arc::new(GatewayClient::new(gateway_url)?);

        let store = match db {
            Some(path) => Store::open(path),
            None => Store::open_default(),
        }
        .context("Failed to open the local catalog")?;

        let monitor = Arc::new(ConnectionMonitor::new(
            gateway.clone(),
            Arc::new(CliNetwork { ssid }),
        ));

        Ok(Self {
            gateway,
            monitor,
            store: Arc::new(Mutex::new(store)),
        })
    }

    /// Probe connectivity now and require a full link.
    pub async fn require_linked(&self) -> Result<()> {
        let state = self.monitor.check().await;
        match state.level() {
            LinkLevel::Linked => Ok(()),
            LinkLevel::WifiOnly => anyhow::bail!(
                "Network is up but the gateway is not answering (wifi-only); \
                 is the gateway powered?"
            ),
            LinkLevel::Offline => anyhow::bail!("No wireless network; connect to the gateway's AP"),
        }
    }
}

/// Render an optional metric to one decimal, `--` when unavailable.
pub fn fmt_metric(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.1}"),
        None => "--".to_string(),
    }
}
