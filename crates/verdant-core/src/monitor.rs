//! Three-state connectivity tracking for the gateway link.
//!
//! Talking to the gateway requires two things to hold at once: the host must
//! be associated with a wireless network (the gateway runs its own access
//! point), and the gateway's HTTP API must actually answer. Either can fail
//! independently (the phone may have drifted onto another network, or the
//! gateway may have browned out while the AP radio keeps beaconing), so the
//! engine distinguishes three levels instead of a boolean.
//!
//! The monitor owns its state as an explicit instance (no ambient globals)
//! and takes the network interface and clock as injected dependencies, which
//! makes the transition logic deterministic under test.

use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use tracing::debug;

use crate::traits::GatewayApi;

/// Logical connectivity level, ordered from worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LinkLevel {
    /// Not attached to any wireless network.
    Offline,
    /// Wireless network present, but the gateway API does not answer.
    WifiOnly,
    /// Network present and the gateway answers the probe.
    Linked,
}

impl std::fmt::Display for LinkLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkLevel::Offline => write!(f, "offline"),
            LinkLevel::WifiOnly => write!(f, "wifi-only"),
            LinkLevel::Linked => write!(f, "linked"),
        }
    }
}

/// Wireless association as reported by the host platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WifiState {
    /// Not attached to any wireless network.
    Disconnected,
    /// Attached; the SSID is included when the platform exposes it.
    Connected { ssid: Option<String> },
}

/// Host-platform view of the wireless interface.
#[async_trait]
pub trait NetworkInterface: Send + Sync {
    /// Current wireless association state.
    async fn wifi_state(&self) -> WifiState;
}

/// Time source, injectable for deterministic tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Snapshot of the connectivity check result.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConnectionState {
    /// Device-level association with a wireless network.
    pub connected_to_gateway: bool,
    /// Whether the gateway answered the application-level probe.
    pub api_reachable: bool,
    /// SSID of the attached network, when the platform reports one.
    pub ssid: Option<String>,
    /// When this state was last evaluated.
    pub last_check: Option<OffsetDateTime>,
}

impl ConnectionState {
    /// The logical level this state maps to.
    #[must_use]
    pub fn level(&self) -> LinkLevel {
        match (self.connected_to_gateway, self.api_reachable) {
            (true, true) => LinkLevel::Linked,
            (true, false) => LinkLevel::WifiOnly,
            _ => LinkLevel::Offline,
        }
    }
}

/// Determines and remembers the current connectivity level.
///
/// Each [`check`](ConnectionMonitor::check) reports current truth: query the
/// wireless interface, and if attached, probe the gateway's always-available
/// live endpoint. There are no retries in here: the periodic cadence and any
/// backoff belong to the caller (typically the UI layer's check timer), and a
/// check never blocks longer than the gateway client's timeout.
pub struct ConnectionMonitor {
    gateway: Arc<dyn GatewayApi>,
    network: Arc<dyn NetworkInterface>,
    clock: Arc<dyn Clock>,
    state: RwLock<ConnectionState>,
}

impl ConnectionMonitor {
    /// Create a monitor using the system clock.
    pub fn new(gateway: Arc<dyn GatewayApi>, network: Arc<dyn NetworkInterface>) -> Self {
        Self::with_clock(gateway, network, Arc::new(SystemClock))
    }

    /// Create a monitor with an injected clock.
    pub fn with_clock(
        gateway: Arc<dyn GatewayApi>,
        network: Arc<dyn NetworkInterface>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            gateway,
            network,
            clock,
            state: RwLock::new(ConnectionState::default()),
        }
    }

    /// Evaluate connectivity now and update the remembered state.
    pub async fn check(&self) -> ConnectionState {
        let mut next = ConnectionState {
            last_check: Some(self.clock.now()),
            ..ConnectionState::default()
        };

        match self.network.wifi_state().await {
            WifiState::Disconnected => {
                debug!("no wireless network attached");
            }
            WifiState::Connected { ssid } => {
                next.connected_to_gateway = true;
                next.ssid = ssid;

                // The live endpoint is the liveness probe; the reading
                // itself is discarded here.
                match self.gateway.live_snapshot().await {
                    Ok(_) => next.api_reachable = true,
                    Err(failure) => debug!("gateway probe failed: {failure}"),
                }
            }
        }

        debug!("connectivity: {}", next.level());
        *self.state.write().await = next.clone();
        next
    }

    /// Last-known state, without probing.
    pub async fn state(&self) -> ConnectionState {
        self.state.read().await.clone()
    }

    /// Last-known level, without probing.
    pub async fn level(&self) -> LinkLevel {
        self.state.read().await.level()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use time::macros::datetime;

    use crate::error::Failure;
    use crate::mock::{ManualClock, MockGateway, StaticNetwork};

    use super::*;

    fn monitor(
        gateway: Arc<MockGateway>,
        network: Arc<StaticNetwork>,
        clock: Arc<ManualClock>,
    ) -> ConnectionMonitor {
        ConnectionMonitor::with_clock(gateway, network, clock)
    }

    #[tokio::test]
    async fn test_no_wifi_is_offline_and_skips_probe() {
        let gateway = Arc::new(MockGateway::new());
        let network = Arc::new(StaticNetwork::disconnected());
        let clock = Arc::new(ManualClock::new(datetime!(2024-01-01 10:00:00 UTC)));
        let monitor = monitor(Arc::clone(&gateway), network, clock);

        let state = monitor.check().await;

        assert_eq!(state.level(), LinkLevel::Offline);
        assert!(!state.connected_to_gateway);
        assert!(!state.api_reachable);
        assert_eq!(state.ssid, None);
        // The probe must not fire without a network.
        assert_eq!(gateway.live_calls(), 0);
    }

    #[tokio::test]
    async fn test_wifi_with_failing_probe_is_wifi_only() {
        let gateway = Arc::new(MockGateway::new());
        gateway
            .set_failure(Some(Failure::Timeout(Duration::from_secs(5))))
            .await;
        let network = Arc::new(StaticNetwork::connected(Some("GREENHOUSE_AP")));
        let clock = Arc::new(ManualClock::new(datetime!(2024-01-01 10:00:00 UTC)));
        let monitor = monitor(gateway, network, clock);

        let state = monitor.check().await;

        // Network present, application layer unreachable: not offline,
        // not linked.
        assert_eq!(state.level(), LinkLevel::WifiOnly);
        assert!(state.connected_to_gateway);
        assert!(!state.api_reachable);
        assert_eq!(state.ssid.as_deref(), Some("GREENHOUSE_AP"));
    }

    #[tokio::test]
    async fn test_successful_probe_is_linked() {
        let gateway = Arc::new(MockGateway::new());
        let network = Arc::new(StaticNetwork::connected(Some("GREENHOUSE_AP")));
        let clock = Arc::new(ManualClock::new(datetime!(2024-01-01 10:00:00 UTC)));
        let monitor = monitor(Arc::clone(&gateway), network, clock);

        let state = monitor.check().await;

        assert_eq!(state.level(), LinkLevel::Linked);
        assert_eq!(state.last_check, Some(datetime!(2024-01-01 10:00:00 UTC)));
        assert_eq!(gateway.live_calls(), 1);
        assert_eq!(monitor.level().await, LinkLevel::Linked);
    }

    #[tokio::test]
    async fn test_each_check_reports_current_truth() {
        let gateway = Arc::new(MockGateway::new());
        let network = Arc::new(StaticNetwork::connected(None));
        let clock = Arc::new(ManualClock::new(datetime!(2024-01-01 10:00:00 UTC)));
        let monitor = monitor(
            Arc::clone(&gateway),
            Arc::clone(&network),
            Arc::clone(&clock),
        );

        assert_eq!(monitor.check().await.level(), LinkLevel::Linked);

        // Gateway stops answering: next check downgrades to wifi-only.
        gateway
            .set_failure(Some(Failure::Connection("refused".into())))
            .await;
        clock.advance(Duration::from_secs(30));
        let state = monitor.check().await;
        assert_eq!(state.level(), LinkLevel::WifiOnly);
        assert_eq!(state.last_check, Some(datetime!(2024-01-01 10:00:30 UTC)));

        // Wi-Fi drops entirely: offline, and the stored state follows.
        network.set_state(WifiState::Disconnected).await;
        assert_eq!(monitor.check().await.level(), LinkLevel::Offline);
        assert_eq!(monitor.level().await, LinkLevel::Offline);
    }

    #[test]
    fn test_level_ordering() {
        assert!(LinkLevel::Offline < LinkLevel::WifiOnly);
        assert!(LinkLevel::WifiOnly < LinkLevel::Linked);
    }
}
