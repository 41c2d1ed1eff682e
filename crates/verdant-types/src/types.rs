//! Core domain types for greenhouse gateway telemetry.

use core::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Status message the gateway firmware attaches to a zone reading that
/// completed without sensor faults. Readings with any other message carry
/// stale or partial metrics and are excluded from aggregation.
pub const READ_OK_STATUS: &str = "Lectura Exitosa";

/// An independently irrigated greenhouse zone.
///
/// Each zone has its own valve, flow meter, and sensor suite. The gateway
/// identifies zones as `"A"` and `"B"` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Zone {
    A,
    B,
}

impl Zone {
    /// All zones the gateway manages.
    pub const ALL: [Zone; 2] = [Zone::A, Zone::B];

    /// The single-letter identifier used in gateway query parameters.
    #[must_use]
    pub fn id(&self) -> &'static str {
        match self {
            Zone::A => "A",
            Zone::B => "B",
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Zone {}", self.id())
    }
}

impl FromStr for Zone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "A" | "a" => Ok(Zone::A),
            "B" | "b" => Ok(Zone::B),
            other => Err(format!("unknown zone '{other}', expected A or B")),
        }
    }
}

/// One telemetry reading from one irrigation zone.
///
/// Produced by the gateway at its sampling cadence; immutable once recorded.
/// Day logs are ordered sequences of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneTelemetry {
    /// When the gateway captured this reading.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// Which zone reported.
    pub zone: Zone,
    /// Firmware status message; [`READ_OK_STATUS`] marks a clean read.
    pub status_message: String,
    /// Whether the irrigation valve was open.
    pub valve_open: bool,
    /// Whether the valve was opened manually rather than by schedule.
    pub manual_mode: bool,
    /// Instantaneous flow rate in liters per minute.
    pub flow_lpm: f64,
    /// Cumulative liters dispensed today.
    pub total_liters_today: f64,
    /// Raw soil-moisture sensor value (ADC counts, not a percentage).
    pub soil_moisture_raw: f64,
    /// Air temperature in degrees Celsius.
    pub temperature_c: f64,
    /// Relative air humidity percentage.
    pub humidity_pct: f64,
    /// Soil pH.
    pub ph: f64,
    /// CO2 concentration in ppm.
    pub co2_ppm: f64,
    /// Illuminance in lux.
    pub lux: f64,
    /// Free space remaining on the gateway's SD card, percent.
    pub storage_free_pct: f64,
}

impl ZoneTelemetry {
    /// Whether this reading completed without sensor faults.
    #[must_use]
    pub fn is_read_ok(&self) -> bool {
        self.status_message == READ_OK_STATUS
    }
}

/// Per-zone valve and water display row, derived from a telemetry reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValveStatus {
    pub zone: Zone,
    pub is_open: bool,
    pub is_manual: bool,
    pub flow_lpm: f64,
    pub total_liters_today: f64,
    pub soil_moisture_raw: f64,
}

impl From<&ZoneTelemetry> for ValveStatus {
    fn from(reading: &ZoneTelemetry) -> Self {
        Self {
            zone: reading.zone,
            is_open: reading.valve_open,
            is_manual: reading.manual_mode,
            flow_lpm: reading.flow_lpm,
            total_liters_today: reading.total_liters_today,
            soil_moisture_raw: reading.soil_moisture_raw,
        }
    }
}

/// Aggregated view of one live poll across all zones.
///
/// Metric means are computed over zones whose status equals
/// [`READ_OK_STATUS`], rounded to one decimal. When no zone qualifies every
/// mean is `None`: unavailable is reported as absence, never as zero.
/// The raw per-zone readings are kept for valve/flow display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedSnapshot {
    pub temperature_c: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub co2_ppm: Option<f64>,
    pub soil_moisture_raw: Option<f64>,
    pub lux: Option<f64>,
    /// Raw readings this snapshot was computed from, one per zone.
    pub zones: Vec<ZoneTelemetry>,
}

impl AggregatedSnapshot {
    /// Aggregate a set of per-zone readings into a snapshot.
    #[must_use]
    pub fn from_zones(zones: Vec<ZoneTelemetry>) -> Self {
        let mean = |pick: fn(&ZoneTelemetry) -> f64| -> Option<f64> {
            let ok: Vec<f64> = zones
                .iter()
                .filter(|z| z.is_read_ok())
                .map(|z| pick(z))
                .collect();
            if ok.is_empty() {
                return None;
            }
            Some(round1(ok.iter().sum::<f64>() / ok.len() as f64))
        };

        let temperature_c = mean(|z| z.temperature_c);
        let humidity_pct = mean(|z| z.humidity_pct);
        let co2_ppm = mean(|z| z.co2_ppm);
        let soil_moisture_raw = mean(|z| z.soil_moisture_raw);
        let lux = mean(|z| z.lux);

        Self {
            temperature_c,
            humidity_pct,
            co2_ppm,
            soil_moisture_raw,
            lux,
            zones,
        }
    }

    /// Whether any zone qualified for aggregation.
    #[must_use]
    pub fn has_readings(&self) -> bool {
        self.temperature_c.is_some()
    }

    /// Per-zone valve display rows, in reading order.
    #[must_use]
    pub fn valves(&self) -> Vec<ValveStatus> {
        self.zones.iter().map(ValveStatus::from).collect()
    }
}

/// Irrigation schedule for a single zone, as reported by the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneIrrigationConfig {
    /// Whether scheduled irrigation is enabled for this zone.
    pub active: bool,
    /// Liters to dispense per scheduled run.
    pub target_volume_l: f64,
    /// Hours between scheduled runs.
    pub frequency_hours: f64,
    /// Soil-moisture raw value below which a run is allowed.
    pub moisture_threshold_raw: f64,
    /// When the last run happened, if the gateway has recorded one.
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_run: Option<OffsetDateTime>,
    /// Seconds until the next scheduled run.
    pub next_run_in_secs: u64,
}

/// Irrigation schedule for both zones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrrigationConfig {
    pub zone_a: ZoneIrrigationConfig,
    pub zone_b: ZoneIrrigationConfig,
}

impl IrrigationConfig {
    /// Configuration for one zone.
    #[must_use]
    pub fn zone(&self, zone: Zone) -> &ZoneIrrigationConfig {
        match zone {
            Zone::A => &self.zone_a,
            Zone::B => &self.zone_b,
        }
    }
}

/// Gateway hardware health: SD card usage, radio signal, uptime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HardwareStatus {
    pub sd_total_mb: f64,
    pub sd_used_mb: f64,
    pub sd_free_pct: f64,
    /// Wi-Fi signal strength in dBm (more negative = weaker).
    pub wifi_rssi_dbm: i32,
    pub uptime_secs: u64,
}

impl HardwareStatus {
    /// Uptime as a `Duration`.
    #[must_use]
    pub fn uptime(&self) -> Duration {
        Duration::from_secs(self.uptime_secs)
    }

    /// Uptime formatted as `3h 25m 10s`.
    #[must_use]
    pub fn uptime_display(&self) -> String {
        let h = self.uptime_secs / 3600;
        let m = (self.uptime_secs % 3600) / 60;
        let s = self.uptime_secs % 60;
        format!("{h}h {m}m {s}s")
    }
}

/// Round to one decimal place.
pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Fixed-shape reading used by unit tests across this crate.
#[cfg(test)]
pub(crate) fn sample_reading(zone: Zone, status: &str, temp: f64) -> ZoneTelemetry {
    ZoneTelemetry {
        timestamp: time::macros::datetime!(2024-01-01 12:00:00 UTC),
        zone,
        status_message: status.to_string(),
        valve_open: false,
        manual_mode: false,
        flow_lpm: 0.0,
        total_liters_today: 4.5,
        soil_moisture_raw: 1800.0,
        temperature_c: temp,
        humidity_pct: 60.0,
        ph: 6.5,
        co2_ppm: 420.0,
        lux: 12000.0,
        storage_free_pct: 80.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(zone: Zone, status: &str, temp: f64) -> ZoneTelemetry {
        sample_reading(zone, status, temp)
    }

    #[test]
    fn test_zone_parse_and_display() {
        assert_eq!("A".parse::<Zone>().unwrap(), Zone::A);
        assert_eq!("b".parse::<Zone>().unwrap(), Zone::B);
        assert!("C".parse::<Zone>().is_err());
        assert_eq!(Zone::A.to_string(), "Zone A");
        assert_eq!(Zone::B.id(), "B");
    }

    #[test]
    fn test_aggregation_means_over_qualifying_zones() {
        let zones = vec![
            reading(Zone::A, READ_OK_STATUS, 20.0),
            reading(Zone::B, READ_OK_STATUS, 21.5),
        ];
        let snapshot = AggregatedSnapshot::from_zones(zones);

        assert_eq!(snapshot.temperature_c, Some(20.8)); // 20.75 rounds up
        assert_eq!(snapshot.co2_ppm, Some(420.0));
        assert_eq!(snapshot.zones.len(), 2);
        assert!(snapshot.has_readings());
    }

    #[test]
    fn test_aggregation_skips_failed_zones() {
        let zones = vec![
            reading(Zone::A, READ_OK_STATUS, 18.0),
            reading(Zone::B, "Sensor desconectado", 99.0),
        ];
        let snapshot = AggregatedSnapshot::from_zones(zones);

        // Only zone A qualifies; zone B's bogus values must not leak in.
        assert_eq!(snapshot.temperature_c, Some(18.0));
        // The raw list still carries both zones for valve display.
        assert_eq!(snapshot.valves().len(), 2);
    }

    #[test]
    fn test_aggregation_with_zero_qualifying_zones_is_unavailable() {
        let zones = vec![
            reading(Zone::A, "Fallo de lectura", 0.0),
            reading(Zone::B, "Fallo de lectura", 0.0),
        ];
        let snapshot = AggregatedSnapshot::from_zones(zones);

        assert_eq!(snapshot.temperature_c, None);
        assert_eq!(snapshot.humidity_pct, None);
        assert_eq!(snapshot.co2_ppm, None);
        assert_eq!(snapshot.soil_moisture_raw, None);
        assert_eq!(snapshot.lux, None);
        assert!(!snapshot.has_readings());
    }

    #[test]
    fn test_aggregation_of_empty_input() {
        let snapshot = AggregatedSnapshot::from_zones(Vec::new());
        assert_eq!(snapshot.temperature_c, None);
        assert!(snapshot.valves().is_empty());
    }

    #[test]
    fn test_valve_status_from_reading() {
        let mut r = reading(Zone::B, READ_OK_STATUS, 20.0);
        r.valve_open = true;
        r.manual_mode = true;
        r.flow_lpm = 2.4;

        let valve = ValveStatus::from(&r);
        assert_eq!(valve.zone, Zone::B);
        assert!(valve.is_open);
        assert!(valve.is_manual);
        assert_eq!(valve.flow_lpm, 2.4);
    }

    #[test]
    fn test_uptime_display() {
        let status = HardwareStatus {
            sd_total_mb: 512.0,
            sd_used_mb: 128.0,
            sd_free_pct: 75.0,
            wifi_rssi_dbm: -61,
            uptime_secs: 3 * 3600 + 25 * 60 + 10,
        };
        assert_eq!(status.uptime_display(), "3h 25m 10s");
        assert_eq!(status.uptime(), Duration::from_secs(12310));
    }

    #[test]
    fn test_telemetry_serde_round_trip() {
        let original = reading(Zone::A, READ_OK_STATUS, 22.5);
        let json = serde_json::to_string(&original).unwrap();
        let back: ZoneTelemetry = serde_json::from_str(&json).unwrap();
        assert_eq!(original, back);
    }
}
