//! Trait abstractions over the gateway and cloud endpoints.
//!
//! These seams let the engine components run against the real HTTP clients
//! or the in-memory mocks in [`crate::mock`] interchangeably.

use async_trait::async_trait;

use verdant_store::LocalBackupLog;
use verdant_types::{HardwareStatus, IrrigationConfig, Zone, ZoneTelemetry};

use crate::error::Result;

/// Operations the greenhouse gateway exposes over its HTTP API.
///
/// # Example
///
/// ```ignore
/// use verdant_core::{GatewayApi, Result};
///
/// async fn print_zone_count<G: GatewayApi>(gateway: &G) -> Result<()> {
///     let zones = gateway.live_snapshot().await?;
///     println!("{} zones reporting", zones.len());
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait GatewayApi: Send + Sync {
    /// Current reading from every zone (`GET /now`).
    ///
    /// Cheap and always available; also doubles as the liveness probe.
    async fn live_snapshot(&self) -> Result<Vec<ZoneTelemetry>>;

    /// Names of the day-log files on the gateway's SD card (`GET /list`).
    async fn list_log_files(&self) -> Result<Vec<String>>;

    /// Full entry sequence of one day log (`GET /get?file=`).
    async fn log_file(&self, name: &str) -> Result<Vec<ZoneTelemetry>>;

    /// Irrigation schedule for both zones (`GET /get_config`).
    async fn irrigation_config(&self) -> Result<IrrigationConfig>;

    /// Update one zone's schedule (`GET /config`). Returns the gateway's
    /// confirmation string.
    async fn set_zone_config(
        &self,
        zone: Zone,
        volume_l: u32,
        frequency_hours: u32,
        threshold_raw: u32,
    ) -> Result<String>;

    /// Start (or with 0 liters, stop) a manual irrigation run
    /// (`GET /manual`). Returns the gateway's confirmation string.
    async fn trigger_irrigation(&self, zone: Zone, liters: u32) -> Result<String>;

    /// Hardware health: SD usage, RSSI, uptime (`GET /status`).
    async fn hardware_status(&self) -> Result<HardwareStatus>;
}

/// Operations the cloud backup service exposes.
#[async_trait]
pub trait CloudApi: Send + Sync {
    /// Upload one local day-log backup. 2xx means accepted.
    async fn upload_log(&self, log: &LocalBackupLog) -> Result<()>;
}
