//! In-memory mock implementations for testing.
//!
//! Everything the engine talks to has a seam: the gateway, the cloud
//! backup, the host's wireless interface, and the clock. The mocks here
//! implement those seams without any network or hardware, with failure
//! injection and call counters so tests can assert not just on results
//! but on which calls were (and were not) made.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use async_trait::async_trait;
use time::macros::datetime;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use verdant_store::LocalBackupLog;
use verdant_types::{
    HardwareStatus, IrrigationConfig, Zone, ZoneIrrigationConfig, ZoneTelemetry, READ_OK_STATUS,
};

use crate::error::{Failure, Result};
use crate::monitor::{Clock, NetworkInterface, WifiState};
use crate::traits::{CloudApi, GatewayApi};

/// A clean mid-day reading for the given zone.
#[must_use]
pub fn sample_reading(zone: Zone) -> ZoneTelemetry {
    ZoneTelemetry {
        timestamp: datetime!(2024-01-01 12:00:00 UTC),
        zone,
        status_message: READ_OK_STATUS.to_string(),
        valve_open: false,
        manual_mode: false,
        flow_lpm: 0.0,
        total_liters_today: 6.0,
        soil_moisture_raw: 1720.0,
        temperature_c: 22.0,
        humidity_pct: 58.0,
        ph: 6.6,
        co2_ppm: 430.0,
        lux: 11000.0,
        storage_free_pct: 82.0,
    }
}

/// A reading stamped inside the day's closing window, so a log ending with
/// it counts as complete.
#[must_use]
pub fn closing_reading(zone: Zone) -> ZoneTelemetry {
    ZoneTelemetry {
        timestamp: datetime!(2024-01-01 23:30:00 UTC),
        ..sample_reading(zone)
    }
}

fn default_zone_config() -> ZoneIrrigationConfig {
    ZoneIrrigationConfig {
        active: true,
        target_volume_l: 5.0,
        frequency_hours: 12.0,
        moisture_threshold_raw: 1600.0,
        last_run: None,
        next_run_in_secs: 3600,
    }
}

fn default_hardware_status() -> HardwareStatus {
    HardwareStatus {
        sd_total_mb: 512.0,
        sd_used_mb: 64.0,
        sd_free_pct: 87.5,
        wifi_rssi_dbm: -55,
        uptime_secs: 7200,
    }
}

/// A mock greenhouse gateway.
///
/// # Example
///
/// ```
/// use verdant_core::mock::{sample_reading, MockGateway};
/// use verdant_core::GatewayApi;
/// use verdant_types::Zone;
///
/// # #[tokio::main]
/// # async fn main() {
/// let gateway = MockGateway::new();
/// gateway.set_zones(vec![sample_reading(Zone::A)]).await;
///
/// let zones = gateway.live_snapshot().await.unwrap();
/// assert_eq!(zones.len(), 1);
/// assert_eq!(gateway.live_calls(), 1);
/// # }
/// ```
#[derive(Default)]
pub struct MockGateway {
    zones: RwLock<Vec<ZoneTelemetry>>,
    files: RwLock<Vec<String>>,
    logs: RwLock<HashMap<String, Vec<ZoneTelemetry>>>,
    failing_files: RwLock<HashSet<String>>,
    failure: RwLock<Option<Failure>>,
    live_calls: AtomicU32,
    list_calls: AtomicU32,
    file_calls: AtomicU32,
    control_calls: AtomicU32,
}

impl MockGateway {
    /// Create a mock gateway with two healthy zones and no log files.
    pub fn new() -> Self {
        Self {
            zones: RwLock::new(vec![sample_reading(Zone::A), sample_reading(Zone::B)]),
            ..Self::default()
        }
    }

    /// Replace the live readings returned by `/now`.
    pub async fn set_zones(&self, zones: Vec<ZoneTelemetry>) {
        *self.zones.write().await = zones;
    }

    /// Replace the file listing returned by `/list`.
    pub async fn set_files(&self, files: &[&str]) {
        *self.files.write().await = files.iter().map(|f| f.to_string()).collect();
    }

    /// Set the entries served for one log file.
    pub async fn insert_log(&self, name: &str, entries: Vec<ZoneTelemetry>) {
        self.logs.write().await.insert(name.to_string(), entries);
    }

    /// Inject a failure for every operation (or clear it with `None`).
    pub async fn set_failure(&self, failure: Option<Failure>) {
        *self.failure.write().await = failure;
    }

    /// Make one specific log file fail to download.
    pub async fn fail_file(&self, name: &str) {
        self.failing_files.write().await.insert(name.to_string());
    }

    /// Number of `/now` calls served (including probes).
    pub fn live_calls(&self) -> u32 {
        self.live_calls.load(Ordering::SeqCst)
    }

    /// Number of `/list` calls served.
    pub fn list_calls(&self) -> u32 {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Number of `/get` calls served.
    pub fn file_calls(&self) -> u32 {
        self.file_calls.load(Ordering::SeqCst)
    }

    /// Number of `/config` and `/manual` calls served.
    pub fn control_calls(&self) -> u32 {
        self.control_calls.load(Ordering::SeqCst)
    }

    async fn injected_failure(&self) -> Result<()> {
        match self.failure.read().await.clone() {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl GatewayApi for MockGateway {
    async fn live_snapshot(&self) -> Result<Vec<ZoneTelemetry>> {
        self.live_calls.fetch_add(1, Ordering::SeqCst);
        self.injected_failure().await?;
        Ok(self.zones.read().await.clone())
    }

    async fn list_log_files(&self) -> Result<Vec<String>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.injected_failure().await?;
        Ok(self.files.read().await.clone())
    }

    async fn log_file(&self, name: &str) -> Result<Vec<ZoneTelemetry>> {
        self.file_calls.fetch_add(1, Ordering::SeqCst);
        self.injected_failure().await?;

        if self.failing_files.read().await.contains(name) {
            return Err(Failure::Connection(format!("injected failure for {name}")));
        }

        self.logs
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| Failure::NotFound(name.to_string()))
    }

    async fn irrigation_config(&self) -> Result<IrrigationConfig> {
        self.injected_failure().await?;
        Ok(IrrigationConfig {
            zone_a: default_zone_config(),
            zone_b: default_zone_config(),
        })
    }

    async fn set_zone_config(
        &self,
        zone: Zone,
        volume_l: u32,
        frequency_hours: u32,
        threshold_raw: u32,
    ) -> Result<String> {
        self.control_calls.fetch_add(1, Ordering::SeqCst);
        self.injected_failure().await?;
        Ok(format!(
            "OK {} vol={volume_l} freq={frequency_hours} raw={threshold_raw}",
            zone.id()
        ))
    }

    async fn trigger_irrigation(&self, zone: Zone, liters: u32) -> Result<String> {
        self.control_calls.fetch_add(1, Ordering::SeqCst);
        self.injected_failure().await?;
        if liters == 0 {
            Ok(format!("STOP {}", zone.id()))
        } else {
            Ok(format!("RUN {} {liters}L", zone.id()))
        }
    }

    async fn hardware_status(&self) -> Result<HardwareStatus> {
        self.injected_failure().await?;
        Ok(default_hardware_status())
    }
}

/// A mock cloud backup service.
#[derive(Default)]
pub struct MockCloud {
    uploads: RwLock<Vec<String>>,
    failing_files: RwLock<HashSet<String>>,
    always_fail: AtomicBool,
}

impl MockCloud {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the upload of one specific file fail.
    pub async fn fail_file(&self, name: &str) {
        self.failing_files.write().await.insert(name.to_string());
    }

    /// Make every upload fail, as if the server were down.
    pub fn set_always_fail(&self, fail: bool) {
        self.always_fail.store(fail, Ordering::SeqCst);
    }

    /// File names accepted so far, in upload order.
    pub async fn uploads(&self) -> Vec<String> {
        self.uploads.read().await.clone()
    }
}

#[async_trait]
impl CloudApi for MockCloud {
    async fn upload_log(&self, log: &LocalBackupLog) -> Result<()> {
        if self.always_fail.load(Ordering::SeqCst) {
            return Err(Failure::Connection("cloud unreachable".to_string()));
        }
        if self.failing_files.read().await.contains(&log.file_name) {
            return Err(Failure::Server {
                status: 500,
                message: format!("injected failure for {}", log.file_name),
            });
        }

        self.uploads.write().await.push(log.file_name.clone());
        Ok(())
    }
}

/// A wireless interface pinned to a fixed (but settable) state.
pub struct StaticNetwork {
    state: RwLock<WifiState>,
}

impl StaticNetwork {
    /// An interface attached to a network.
    pub fn connected(ssid: Option<&str>) -> Self {
        Self {
            state: RwLock::new(WifiState::Connected {
                ssid: ssid.map(str::to_string),
            }),
        }
    }

    /// An interface with no wireless association.
    pub fn disconnected() -> Self {
        Self {
            state: RwLock::new(WifiState::Disconnected),
        }
    }

    /// Change the reported state.
    pub async fn set_state(&self, state: WifiState) {
        *self.state.write().await = state;
    }
}

#[async_trait]
impl NetworkInterface for StaticNetwork {
    async fn wifi_state(&self) -> WifiState {
        self.state.read().await.clone()
    }
}

/// A clock that only moves when told to.
pub struct ManualClock {
    now: StdMutex<OffsetDateTime>,
}

impl ManualClock {
    pub fn new(now: OffsetDateTime) -> Self {
        Self {
            now: StdMutex::new(now),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("manual clock lock");
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        *self.now.lock().expect("manual clock lock")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_gateway_counts_calls() {
        let gateway = MockGateway::new();

        gateway.live_snapshot().await.unwrap();
        gateway.live_snapshot().await.unwrap();
        gateway.list_log_files().await.unwrap();

        assert_eq!(gateway.live_calls(), 2);
        assert_eq!(gateway.list_calls(), 1);
        assert_eq!(gateway.file_calls(), 0);
    }

    #[tokio::test]
    async fn test_mock_gateway_failure_injection() {
        let gateway = MockGateway::new();
        gateway
            .set_failure(Some(Failure::Connection("down".into())))
            .await;
        assert!(gateway.live_snapshot().await.is_err());

        gateway.set_failure(None).await;
        assert!(gateway.live_snapshot().await.is_ok());
    }

    #[tokio::test]
    async fn test_mock_gateway_missing_log_is_not_found() {
        let gateway = MockGateway::new();
        assert!(matches!(
            gateway.log_file("999999.json").await,
            Err(Failure::NotFound(_))
        ));
    }

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::new(datetime!(2024-01-01 10:00:00 UTC));
        clock.advance(Duration::from_secs(90));
        assert_eq!(clock.now(), datetime!(2024-01-01 10:01:30 UTC));
    }
}
