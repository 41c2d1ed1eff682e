//! Wire DTOs for the gateway's HTTP API.
//!
//! Field names mirror the JSON the gateway firmware emits and are fixed by
//! the device; the structs here exist to pin that contract and to map it into
//! the domain types in [`crate::types`].

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

use crate::error::{ParseError, ParseResult};
use crate::types::{
    HardwareStatus, IrrigationConfig, Zone, ZoneIrrigationConfig, ZoneTelemetry,
};

/// Parse a gateway timestamp.
///
/// The firmware emits RFC 3339 when it has an offset and a bare
/// `YYYY-MM-DDTHH:MM:SS` otherwise; the bare form is taken as UTC.
pub fn parse_timestamp(value: &str) -> ParseResult<OffsetDateTime> {
    if let Ok(ts) = OffsetDateTime::parse(value, &Rfc3339) {
        return Ok(ts);
    }

    let naive = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
    PrimitiveDateTime::parse(value, &naive)
        .map(PrimitiveDateTime::assume_utc)
        .map_err(|_| ParseError::InvalidTimestamp(value.to_string()))
}

/// One zone reading as the gateway serializes it (`GET /now`, `GET /get`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryDto {
    #[serde(rename = "TS")]
    pub ts: String,
    #[serde(rename = "Nodo_ID")]
    pub node_id: Zone,
    #[serde(rename = "Descripcion")]
    pub description: String,
    #[serde(rename = "Estado_Actuadores")]
    pub actuators: ActuatorStateDto,
    #[serde(rename = "Metricas_Agua")]
    pub water: WaterMetricsDto,
    #[serde(rename = "Metricas_Ambientales")]
    pub ambient: AmbientMetricsDto,
    #[serde(rename = "Sistema")]
    pub system: SystemDto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActuatorStateDto {
    /// 1 = valve open.
    #[serde(rename = "Valvula")]
    pub valve: u8,
    /// 1 = opened manually.
    #[serde(rename = "Manual")]
    pub manual: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaterMetricsDto {
    #[serde(rename = "Lmin")]
    pub flow_lpm: f64,
    #[serde(rename = "Total_L")]
    pub total_liters: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmbientMetricsDto {
    #[serde(rename = "Suelo_RAW")]
    pub soil_raw: f64,
    #[serde(rename = "Temp_C")]
    pub temperature_c: f64,
    #[serde(rename = "Hum_Pct")]
    pub humidity_pct: f64,
    #[serde(rename = "pH")]
    pub ph: f64,
    #[serde(rename = "CO2")]
    pub co2_ppm: f64,
    #[serde(rename = "Lux")]
    pub lux: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemDto {
    #[serde(rename = "Memoria_SD_Pct")]
    pub sd_free_pct: f64,
}

impl TelemetryDto {
    /// Map into the domain reading. Fails only on an unparseable timestamp.
    pub fn into_domain(self) -> ParseResult<ZoneTelemetry> {
        Ok(ZoneTelemetry {
            timestamp: parse_timestamp(&self.ts)?,
            zone: self.node_id,
            status_message: self.description,
            valve_open: self.actuators.valve == 1,
            manual_mode: self.actuators.manual == 1,
            flow_lpm: self.water.flow_lpm,
            total_liters_today: self.water.total_liters,
            soil_moisture_raw: self.ambient.soil_raw,
            temperature_c: self.ambient.temperature_c,
            humidity_pct: self.ambient.humidity_pct,
            ph: self.ambient.ph,
            co2_ppm: self.ambient.co2_ppm,
            lux: self.ambient.lux,
            storage_free_pct: self.system.sd_free_pct,
        })
    }
}

/// Response of `GET /list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListFilesDto {
    pub files: Vec<String>,
}

/// Per-zone block in the `GET /get_config` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneConfigDto {
    pub activa: bool,
    pub vol: f64,
    pub freq: f64,
    pub umbral: f64,
    /// Timestamp of the last run, or the literal `"N/A"`.
    pub ultimo: String,
    pub sig_en_seg: u64,
}

impl ZoneConfigDto {
    fn into_domain(self) -> ZoneIrrigationConfig {
        let last_run = if self.ultimo == "N/A" {
            None
        } else {
            parse_timestamp(&self.ultimo).ok()
        };
        ZoneIrrigationConfig {
            active: self.activa,
            target_volume_l: self.vol,
            frequency_hours: self.freq,
            moisture_threshold_raw: self.umbral,
            last_run,
            next_run_in_secs: self.sig_en_seg,
        }
    }
}

/// Response of `GET /get_config`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigResponseDto {
    #[serde(rename = "A")]
    pub zone_a: ZoneConfigDto,
    #[serde(rename = "B")]
    pub zone_b: ZoneConfigDto,
}

impl ConfigResponseDto {
    pub fn into_domain(self) -> IrrigationConfig {
        IrrigationConfig {
            zone_a: self.zone_a.into_domain(),
            zone_b: self.zone_b.into_domain(),
        }
    }
}

/// Response of `GET /status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HardwareStatusDto {
    pub sd_total_mb: f64,
    pub sd_usado_mb: f64,
    pub sd_libre_pct: f64,
    pub wifi_rssi: i32,
    pub uptime_seg: u64,
}

impl HardwareStatusDto {
    pub fn into_domain(self) -> HardwareStatus {
        HardwareStatus {
            sd_total_mb: self.sd_total_mb,
            sd_used_mb: self.sd_usado_mb,
            sd_free_pct: self.sd_libre_pct,
            wifi_rssi_dbm: self.wifi_rssi,
            uptime_secs: self.uptime_seg,
        }
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;
    use crate::types::READ_OK_STATUS;

    const SAMPLE_READING: &str = r#"{
        "TS": "2024-01-02T14:30:00",
        "Nodo_ID": "A",
        "Descripcion": "Lectura Exitosa",
        "Estado_Actuadores": { "Valvula": 1, "Manual": 0 },
        "Metricas_Agua": { "Lmin": 1.8, "Total_L": 12.5 },
        "Metricas_Ambientales": {
            "Suelo_RAW": 1750,
            "Temp_C": 23.4,
            "Hum_Pct": 58.2,
            "pH": 6.4,
            "CO2": 415,
            "Lux": 10200
        },
        "Sistema": { "Memoria_SD_Pct": 81.5 }
    }"#;

    #[test]
    fn test_parse_telemetry_from_gateway_json() {
        let dto: TelemetryDto = serde_json::from_str(SAMPLE_READING).unwrap();
        let reading = dto.into_domain().unwrap();

        assert_eq!(reading.timestamp, datetime!(2024-01-02 14:30:00 UTC));
        assert_eq!(reading.zone, Zone::A);
        assert_eq!(reading.status_message, READ_OK_STATUS);
        assert!(reading.valve_open);
        assert!(!reading.manual_mode);
        assert_eq!(reading.flow_lpm, 1.8);
        assert_eq!(reading.total_liters_today, 12.5);
        assert_eq!(reading.soil_moisture_raw, 1750.0);
        assert_eq!(reading.temperature_c, 23.4);
        assert_eq!(reading.co2_ppm, 415.0);
        assert_eq!(reading.storage_free_pct, 81.5);
    }

    #[test]
    fn test_parse_timestamp_accepts_rfc3339_and_naive() {
        assert_eq!(
            parse_timestamp("2024-01-02T14:30:00Z").unwrap(),
            datetime!(2024-01-02 14:30:00 UTC)
        );
        assert_eq!(
            parse_timestamp("2024-01-02T14:30:00").unwrap(),
            datetime!(2024-01-02 14:30:00 UTC)
        );
        assert_eq!(
            parse_timestamp("not a date"),
            Err(ParseError::InvalidTimestamp("not a date".to_string()))
        );
    }

    #[test]
    fn test_parse_list_files_response() {
        let dto: ListFilesDto =
            serde_json::from_str(r#"{"files":["010124.json","020124.json"]}"#).unwrap();
        assert_eq!(dto.files, vec!["010124.json", "020124.json"]);
    }

    #[test]
    fn test_parse_config_response() {
        let json = r#"{
            "A": {"activa": true, "vol": 5, "freq": 12, "umbral": 1600,
                  "ultimo": "2024-01-01T06:00:00", "sig_en_seg": 3600},
            "B": {"activa": false, "vol": 3, "freq": 24, "umbral": 1500,
                  "ultimo": "N/A", "sig_en_seg": 0}
        }"#;
        let config = serde_json::from_str::<ConfigResponseDto>(json)
            .unwrap()
            .into_domain();

        let a = config.zone(Zone::A);
        assert!(a.active);
        assert_eq!(a.target_volume_l, 5.0);
        assert_eq!(a.last_run, Some(datetime!(2024-01-01 06:00:00 UTC)));

        let b = config.zone(Zone::B);
        assert!(!b.active);
        assert_eq!(b.last_run, None);
    }

    #[test]
    fn test_parse_hardware_status() {
        let json = r#"{"sd_total_mb": 512, "sd_usado_mb": 96.5, "sd_libre_pct": 81.2,
                       "wifi_rssi": -58, "uptime_seg": 86461}"#;
        let status = serde_json::from_str::<HardwareStatusDto>(json)
            .unwrap()
            .into_domain();

        assert_eq!(status.sd_used_mb, 96.5);
        assert_eq!(status.wifi_rssi_dbm, -58);
        assert_eq!(status.uptime_display(), "24h 1m 1s");
    }
}
