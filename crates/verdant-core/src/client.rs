//! HTTP client for the gateway's REST API.
//!
//! The gateway is an ESP32-class controller serving a fixed endpoint set on
//! its own Wi-Fi access point. Every call uses one bounded timeout and
//! resolves into the closed [`Failure`](crate::Failure) taxonomy; the
//! constrained firmware HTTP stack fails in enough creative ways that
//! callers need tags, not exception strings.
//!
//! # Example
//!
//! ```no_run
//! use verdant_core::{GatewayApi, GatewayClient};
//!
//! # async fn example() -> verdant_core::Result<()> {
//! let client = GatewayClient::new(GatewayClient::DEFAULT_BASE_URL)?;
//! let zones = client.live_snapshot().await?;
//! println!("{} zones reporting", zones.len());
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use verdant_types::wire::{
    ConfigResponseDto, HardwareStatusDto, ListFilesDto, TelemetryDto,
};
use verdant_types::{HardwareStatus, IrrigationConfig, ParseResult, Zone, ZoneTelemetry};

use crate::error::{Failure, Result};
use crate::traits::GatewayApi;

/// HTTP client for the greenhouse gateway.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: Client,
    base_url: String,
}

impl GatewayClient {
    /// The gateway's address on its own access point.
    pub const DEFAULT_BASE_URL: &'static str = "http://192.168.4.1";

    /// Fixed per-request timeout. The gateway answers in well under a
    /// second when reachable; anything slower is effectively down.
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

    /// Create a new gateway client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The gateway's base URL (e.g. `http://192.168.4.1`)
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = normalize_base_url(base_url)?;

        let http = Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Failure::Unknown(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, base_url })
    }

    /// Create a client with a custom reqwest Client.
    pub fn with_client(base_url: &str, http: Client) -> Result<Self> {
        Ok(Self {
            http,
            base_url: normalize_base_url(base_url)?,
        })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ======================================================================
    // Internal HTTP helpers
    // ======================================================================

    async fn get_response(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {url}");

        let response = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| Failure::from_reqwest(e, Self::REQUEST_TIMEOUT))?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(Failure::from_status(status.as_u16(), message))
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        self.get_response(path, query)
            .await?
            .json()
            .await
            .map_err(|e| Failure::from_reqwest(e, Self::REQUEST_TIMEOUT))
    }

    async fn get_text(&self, path: &str, query: &[(&str, String)]) -> Result<String> {
        self.get_response(path, query)
            .await?
            .text()
            .await
            .map_err(|e| Failure::from_reqwest(e, Self::REQUEST_TIMEOUT))
    }
}

#[async_trait]
impl GatewayApi for GatewayClient {
    async fn live_snapshot(&self) -> Result<Vec<ZoneTelemetry>> {
        let dtos: Vec<TelemetryDto> = self.get_json("/now", &[]).await?;
        let zones: ParseResult<Vec<ZoneTelemetry>> =
            dtos.into_iter().map(TelemetryDto::into_domain).collect();
        Ok(zones?)
    }

    async fn list_log_files(&self) -> Result<Vec<String>> {
        let listing: ListFilesDto = self.get_json("/list", &[]).await?;
        Ok(listing.files)
    }

    async fn log_file(&self, name: &str) -> Result<Vec<ZoneTelemetry>> {
        let dtos: Vec<TelemetryDto> = self
            .get_json("/get", &[("file", name.to_string())])
            .await?;
        let entries: ParseResult<Vec<ZoneTelemetry>> =
            dtos.into_iter().map(TelemetryDto::into_domain).collect();
        Ok(entries?)
    }

    async fn irrigation_config(&self) -> Result<IrrigationConfig> {
        let config: ConfigResponseDto = self.get_json("/get_config", &[]).await?;
        Ok(config.into_domain())
    }

    async fn set_zone_config(
        &self,
        zone: Zone,
        volume_l: u32,
        frequency_hours: u32,
        threshold_raw: u32,
    ) -> Result<String> {
        self.get_text(
            "/config",
            &[
                ("id", zone.id().to_string()),
                ("vol", volume_l.to_string()),
                ("freq", frequency_hours.to_string()),
                ("raw", threshold_raw.to_string()),
            ],
        )
        .await
    }

    async fn trigger_irrigation(&self, zone: Zone, liters: u32) -> Result<String> {
        self.get_text(
            "/manual",
            &[
                ("id", zone.id().to_string()),
                ("litros", liters.to_string()),
            ],
        )
        .await
    }

    async fn hardware_status(&self) -> Result<HardwareStatus> {
        let status: HardwareStatusDto = self.get_json("/status", &[]).await?;
        Ok(status.into_domain())
    }
}

/// Validate the scheme and strip a trailing slash.
fn normalize_base_url(base_url: &str) -> Result<String> {
    let base_url = base_url.trim_end_matches('/').to_string();

    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(Failure::Unknown(format!(
            "base URL must start with http:// or https://, got: {base_url}"
        )));
    }

    Ok(base_url)
}
