//! Periodic live-telemetry polling with cached fallback.
//!
//! The poller keeps the dashboard's live view fresh. Each tick fetches the
//! gateway's current readings, aggregates them, and overwrites the cached
//! baseline; when the gateway is unreachable the last good snapshot keeps
//! being served; the engine degrades rather than inventing data.

use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use verdant_store::SNAPSHOT_CACHE_KEY;
use verdant_types::AggregatedSnapshot;

use crate::monitor::{ConnectionMonitor, LinkLevel};
use crate::traits::GatewayApi;
use crate::SharedStore;

/// Polls the gateway's live endpoint on a fixed interval.
///
/// - [`start`](Self::start) with a zero interval enters *paused* mode: no
///   network activity at all, only the cached snapshot is served. Screens
///   use this when they already know there is no connectivity, instead of
///   busy-polling a dead endpoint.
/// - Ticks never overlap; a tick that would fire while the previous one is
///   still in flight is skipped.
/// - [`stop`](Self::stop) cancels the timer only. An in-flight request is
///   left to complete or time out on its own, and its result is discarded.
pub struct TelemetryPoller {
    inner: Arc<PollerInner>,
    worker: StdMutex<Option<PollWorker>>,
}

struct PollWorker {
    cancel: CancellationToken,
    _handle: JoinHandle<()>,
}

struct PollerInner {
    gateway: Arc<dyn GatewayApi>,
    monitor: Arc<ConnectionMonitor>,
    store: SharedStore,
    latest: RwLock<Option<AggregatedSnapshot>>,
}

impl TelemetryPoller {
    /// Create a poller. No polling happens until [`start`](Self::start).
    pub fn new(
        gateway: Arc<dyn GatewayApi>,
        monitor: Arc<ConnectionMonitor>,
        store: SharedStore,
    ) -> Self {
        Self {
            inner: Arc::new(PollerInner {
                gateway,
                monitor,
                store,
                latest: RwLock::new(None),
            }),
            worker: StdMutex::new(None),
        }
    }

    /// Begin periodic polling, replacing any previous schedule.
    ///
    /// A zero `interval` is paused mode: the cached snapshot is loaded and
    /// no timer is started.
    pub async fn start(&self, interval: Duration) {
        self.stop();
        self.inner.load_cached_snapshot().await;

        if interval.is_zero() {
            debug!("poller paused; serving cached snapshot only");
            return;
        }

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let inner = Arc::clone(&self.inner);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // Coalesce rather than run overlapping polls.
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                inner.poll_once(Some(&token)).await;
                if token.is_cancelled() {
                    break;
                }
            }
            debug!("poll loop stopped");
        });

        *self.worker.lock().expect("poller worker lock") = Some(PollWorker {
            cancel,
            _handle: handle,
        });
    }

    /// Cancel the poll timer. Idempotent.
    pub fn stop(&self) {
        if let Some(worker) = self.worker.lock().expect("poller worker lock").take() {
            worker.cancel.cancel();
        }
    }

    /// Whether a poll timer is currently scheduled.
    pub fn is_running(&self) -> bool {
        self.worker.lock().expect("poller worker lock").is_some()
    }

    /// Force one immediate poll and return the resulting view.
    pub async fn refetch(&self) -> Option<AggregatedSnapshot> {
        self.inner.poll_once(None).await;
        self.latest().await
    }

    /// The latest aggregated snapshot, fresh or cached.
    pub async fn latest(&self) -> Option<AggregatedSnapshot> {
        self.inner.latest.read().await.clone()
    }
}

impl Drop for TelemetryPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

impl PollerInner {
    async fn poll_once(&self, cancel: Option<&CancellationToken>) {
        // Last-known truth from the monitor; the poller never invents
        // connectivity signals of its own.
        if self.monitor.level().await < LinkLevel::WifiOnly {
            debug!("connectivity below wifi-only; skipping live poll");
            self.load_cached_snapshot().await;
            return;
        }

        let result = self.gateway.live_snapshot().await;

        if cancel.is_some_and(CancellationToken::is_cancelled) {
            debug!("poller stopped mid-flight; discarding result");
            return;
        }

        match result {
            Ok(zones) => {
                let snapshot = AggregatedSnapshot::from_zones(zones);
                {
                    let store = self.store.lock().await;
                    if let Err(e) = store.put_cache(SNAPSHOT_CACHE_KEY, &snapshot) {
                        warn!("failed to persist snapshot cache: {e}");
                    }
                }
                *self.latest.write().await = Some(snapshot);
            }
            Err(failure) => {
                warn!("live poll failed: {failure}; serving cached snapshot");
                self.load_cached_snapshot().await;
            }
        }
    }

    /// Populate the in-memory view from the persisted cache, if empty.
    async fn load_cached_snapshot(&self) {
        if self.latest.read().await.is_some() {
            return;
        }

        let cached = {
            let store = self.store.lock().await;
            store.get_cache::<AggregatedSnapshot>(SNAPSHOT_CACHE_KEY)
        };

        match cached {
            Ok(Some(snapshot)) => *self.latest.write().await = Some(snapshot),
            Ok(None) => {}
            Err(e) => warn!("failed to read snapshot cache: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::Mutex;
    use verdant_store::Store;
    use verdant_types::{Zone, READ_OK_STATUS};

    use crate::error::Failure;
    use crate::mock::{sample_reading, MockGateway, StaticNetwork};

    use super::*;

    async fn linked_setup() -> (Arc<MockGateway>, Arc<ConnectionMonitor>, SharedStore) {
        let gateway = Arc::new(MockGateway::new());
        let network = Arc::new(StaticNetwork::connected(Some("GREENHOUSE_AP")));
        let monitor = Arc::new(ConnectionMonitor::new(
            Arc::clone(&gateway) as Arc<dyn GatewayApi>,
            network,
        ));
        monitor.check().await;
        let store = Arc::new(Mutex::new(Store::open_in_memory().unwrap()));
        (gateway, monitor, store)
    }

    #[tokio::test]
    async fn test_refetch_aggregates_and_caches() {
        let (gateway, monitor, store) = linked_setup().await;
        gateway
            .set_zones(vec![
                sample_reading(Zone::A),
                sample_reading(Zone::B),
            ])
            .await;

        let poller = TelemetryPoller::new(gateway, monitor, Arc::clone(&store));
        let snapshot = poller.refetch().await.unwrap();

        assert!(snapshot.has_readings());
        assert_eq!(snapshot.zones.len(), 2);

        // The snapshot is now the persisted baseline.
        let cached: AggregatedSnapshot = store
            .lock()
            .await
            .get_cache(SNAPSHOT_CACHE_KEY)
            .unwrap()
            .unwrap();
        assert_eq!(cached, snapshot);
    }

    #[tokio::test]
    async fn test_failure_keeps_serving_last_snapshot() {
        let (gateway, monitor, store) = linked_setup().await;
        gateway.set_zones(vec![sample_reading(Zone::A)]).await;

        let poller = TelemetryPoller::new(Arc::clone(&gateway) as Arc<dyn GatewayApi>, monitor, store);
        let first = poller.refetch().await.unwrap();

        gateway
            .set_failure(Some(Failure::Connection("gateway rebooting".into())))
            .await;
        let second = poller.refetch().await.unwrap();

        // Cache is kept, not cleared.
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_offline_gate_skips_network_entirely() {
        let gateway = Arc::new(MockGateway::new());
        let network = Arc::new(StaticNetwork::disconnected());
        let monitor = Arc::new(ConnectionMonitor::new(
            Arc::clone(&gateway) as Arc<dyn GatewayApi>,
            network,
        ));
        monitor.check().await;
        let store = Arc::new(Mutex::new(Store::open_in_memory().unwrap()));

        let poller = TelemetryPoller::new(Arc::clone(&gateway) as Arc<dyn GatewayApi>, monitor, store);
        assert_eq!(poller.refetch().await, None);
        assert_eq!(gateway.live_calls(), 0);
    }

    #[tokio::test]
    async fn test_paused_mode_serves_cache_without_polling() {
        let (gateway, monitor, store) = linked_setup().await;
        let probe_calls = gateway.live_calls();

        // Seed the persisted cache as a previous session would have.
        let baseline = AggregatedSnapshot::from_zones(vec![sample_reading(Zone::A)]);
        store
            .lock()
            .await
            .put_cache(SNAPSHOT_CACHE_KEY, &baseline)
            .unwrap();

        let poller = TelemetryPoller::new(Arc::clone(&gateway) as Arc<dyn GatewayApi>, monitor, store);
        poller.start(Duration::ZERO).await;

        assert!(!poller.is_running());
        assert_eq!(poller.latest().await, Some(baseline));
        // Paused mode performs no network activity.
        assert_eq!(gateway.live_calls(), probe_calls);
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_polling_and_stop() {
        let (gateway, monitor, store) = linked_setup().await;
        gateway.set_zones(vec![sample_reading(Zone::A)]).await;
        let probe_calls = gateway.live_calls();

        let poller = TelemetryPoller::new(Arc::clone(&gateway) as Arc<dyn GatewayApi>, monitor, store);
        poller.start(Duration::from_secs(15)).await;
        assert!(poller.is_running());

        tokio::time::sleep(Duration::from_secs(46)).await;
        let polled = gateway.live_calls() - probe_calls;
        assert!(polled >= 3, "expected >= 3 polls, saw {polled}");

        poller.stop();
        assert!(!poller.is_running());
        tokio::time::sleep(Duration::from_secs(60)).await;
        let after_stop = gateway.live_calls() - probe_calls;
        // Allow at most one in-flight tick to have finished during stop.
        assert!(after_stop <= polled + 1);
    }

    #[tokio::test]
    async fn test_snapshot_with_no_qualifying_zones_stays_unavailable() {
        let (gateway, monitor, store) = linked_setup().await;
        let mut faulty = sample_reading(Zone::A);
        faulty.status_message = "Fallo de sensor".to_string();
        assert_ne!(faulty.status_message, READ_OK_STATUS);
        gateway.set_zones(vec![faulty]).await;

        let poller = TelemetryPoller::new(gateway, monitor, store);
        let snapshot = poller.refetch().await.unwrap();

        assert_eq!(snapshot.temperature_c, None);
        assert_eq!(snapshot.co2_ppm, None);
        assert_eq!(snapshot.zones.len(), 1);
    }
}
