//! Reconciliation of gateway day logs against the local catalog.
//!
//! The gateway keeps one append-only log file per calendar day on its SD
//! card. Sync diffs the gateway's listing against the local catalog and
//! downloads whatever is missing or still provisional. Downloads run
//! sequentially; the gateway's HTTP stack is single-threaded and short on
//! memory, and sequential transfers keep the per-file accounting exact.

use std::sync::Arc;

use tracing::{debug, info, warn};

use verdant_store::FILE_INDEX_CACHE_KEY;

use crate::cache::CloudOrCache;
use crate::monitor::{ConnectionMonitor, LinkLevel};
use crate::traits::GatewayApi;
use crate::SharedStore;

/// Outcome of one reconciliation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// Whether the run got as far as reconciling (a failed listing or a
    /// missing link is `false`; individual file failures are not).
    pub success: bool,
    /// Number of files actually replaced in the catalog.
    pub downloaded: usize,
    /// Human-readable outcome for the caller to surface.
    pub message: String,
}

impl SyncReport {
    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            downloaded: 0,
            message: message.into(),
        }
    }

    fn up_to_date() -> Self {
        Self {
            success: true,
            downloaded: 0,
            message: "Already up to date".to_string(),
        }
    }
}

/// Diffs the gateway's log listing against the local catalog and downloads
/// what is missing or incomplete.
pub struct HistoryReconciler {
    gateway: Arc<dyn GatewayApi>,
    monitor: Arc<ConnectionMonitor>,
    store: SharedStore,
}

impl HistoryReconciler {
    pub fn new(
        gateway: Arc<dyn GatewayApi>,
        monitor: Arc<ConnectionMonitor>,
        store: SharedStore,
    ) -> Self {
        Self {
            gateway,
            monitor,
            store,
        }
    }

    /// Reconcile once, without progress reporting.
    pub async fn sync(&self) -> SyncReport {
        self.sync_with_progress(|_| {}).await
    }

    /// Reconcile once, reporting progress as a monotonically increasing
    /// percentage after each candidate file.
    pub async fn sync_with_progress<F>(&self, mut on_progress: F) -> SyncReport
    where
        F: FnMut(u8) + Send,
    {
        if self.monitor.level().await < LinkLevel::Linked {
            return SyncReport::failed("Not linked to the gateway");
        }

        let remote_files = match self.gateway.list_log_files().await {
            Ok(files) => files,
            Err(failure) => {
                return SyncReport::failed(format!("Failed to list gateway logs: {failure}"));
            }
        };

        // A good listing also refreshes the offline file index.
        {
            let store = self.store.lock().await;
            if let Err(e) = store.put_cache(FILE_INDEX_CACHE_KEY, &remote_files) {
                warn!("failed to cache file index: {e}");
            }
        }

        let candidates = {
            let store = self.store.lock().await;
            let mut candidates = Vec::new();
            for name in remote_files {
                // Download when there is no local copy, or the local copy is
                // provisional: the gateway may have appended more samples
                // since, and the latest copy supersedes the old one either way.
                let wanted = match store.get_log(&name) {
                    Ok(Some(local)) => !local.is_complete,
                    Ok(None) => true,
                    Err(e) => {
                        warn!("failed to read catalog entry for {name}: {e}");
                        true
                    }
                };
                if wanted {
                    candidates.push(name);
                }
            }
            candidates
        };

        if candidates.is_empty() {
            debug!("no candidates; catalog is current");
            return SyncReport::up_to_date();
        }

        let total = candidates.len();
        let mut downloaded = 0;

        for (i, name) in candidates.iter().enumerate() {
            match self.gateway.log_file(name).await {
                Ok(entries) => {
                    let store = self.store.lock().await;
                    match store.upsert_log(name, &entries) {
                        Ok(log) => {
                            downloaded += 1;
                            debug!(
                                "replaced {name} ({} entries, complete: {})",
                                log.data.len(),
                                log.is_complete
                            );
                        }
                        Err(e) => warn!("failed to store {name}: {e}"),
                    }
                }
                // A single file failing is never fatal to the batch; the
                // previous local copy, if any, is retained.
                Err(failure) => warn!("download of {name} failed: {failure}; skipping"),
            }

            let percent = (((i + 1) as f64 / total as f64) * 100.0).round() as u8;
            on_progress(percent);
        }

        info!("sync finished: {downloaded}/{total} files replaced");
        SyncReport {
            success: true,
            downloaded,
            message: format!("Synced {downloaded} of {total} log files"),
        }
    }

    /// Names of day logs known to exist on the gateway.
    ///
    /// Fetches (and re-caches) the listing when linked; serves the cached
    /// index otherwise, so history pickers keep working offline.
    pub async fn file_index(&self) -> Vec<String> {
        let index: CloudOrCache<Vec<String>> =
            CloudOrCache::new(Arc::clone(&self.store), FILE_INDEX_CACHE_KEY);

        if self.monitor.level().await >= LinkLevel::Linked {
            index
                .fetch_or_cached(|| self.gateway.list_log_files())
                .await
                .unwrap_or_default()
        } else {
            index.cached().await.unwrap_or_default()
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::Mutex;
    use verdant_store::Store;
    use verdant_types::Zone;

    use crate::mock::{closing_reading, sample_reading, MockGateway, StaticNetwork};

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

    fn reconciler(
        gateway: &Arc<MockGateway>,
        monitor: &Arc<ConnectionMonitor>,
        store: &SharedStore,
    ) -> HistoryReconciler {
        HistoryReconciler::new(
            Arc::clone(gateway) as Arc<dyn GatewayApi>,
            Arc::clone(monitor),
            Arc::clone(store),
        )
    }

    #[tokio::test]
    async fn test_downloads_only_missing_files() {
        let (gateway, monitor, store) = linked_setup().await;
        gateway.set_files(&["010124.json", "020124.json"]).await;
        gateway
            .insert_log("010124.json", vec![closing_reading(Zone::A)])
            .await;
        gateway
            .insert_log("020124.json", vec![closing_reading(Zone::A)])
            .await;

        // Local catalog already holds a complete 010124.json.
        store
            .lock()
            .await
            .upsert_log("010124.json", &[closing_reading(Zone::A)])
            .unwrap();

        let report = reconciler(&gateway, &monitor, &store).sync().await;

        assert!(report.success);
        assert_eq!(report.downloaded, 1);
        assert_eq!(gateway.file_calls(), 1);
        assert!(store.lock().await.get_log("020124.json").unwrap().is_some());
    }

    #[tokio::test]
    async fn test_incomplete_local_copy_is_refetched() {
        let (gateway, monitor, store) = linked_setup().await;
        gateway.set_files(&["010124.json"]).await;
        gateway
            .insert_log(
                "010124.json",
                vec![sample_reading(Zone::A), closing_reading(Zone::A)],
            )
            .await;

        // Provisional local copy from a partial day.
        store
            .lock()
            .await
            .upsert_log("010124.json", &[sample_reading(Zone::A)])
            .unwrap();

        let report = reconciler(&gateway, &monitor, &store).sync().await;

        assert_eq!(report.downloaded, 1);
        let log = store.lock().await.get_log("010124.json").unwrap().unwrap();
        assert_eq!(log.data.len(), 2);
        assert!(log.is_complete);
    }

    #[tokio::test]
    async fn test_sync_twice_is_idempotent() {
        let (gateway, monitor, store) = linked_setup().await;
        gateway.set_files(&["010124.json"]).await;
        gateway
            .insert_log("010124.json", vec![closing_reading(Zone::A)])
            .await;

        let reconciler = reconciler(&gateway, &monitor, &store);
        assert_eq!(reconciler.sync().await.downloaded, 1);

        // No new remote data: the second run downloads nothing.
        let second = reconciler.sync().await;
        assert!(second.success);
        assert_eq!(second.downloaded, 0);
        assert_eq!(second.message, "Already up to date");
        assert_eq!(gateway.file_calls(), 1);
    }

    #[tokio::test]
    async fn test_requires_linked_and_mutates_nothing_otherwise() {
        let gateway = Arc::new(MockGateway::new());
        gateway.set_files(&["010124.json"]).await;
        let network = Arc::new(StaticNetwork::disconnected());
        let monitor = Arc::new(ConnectionMonitor::new(
            Arc::clone(&gateway) as Arc<dyn GatewayApi>,
            network,
        ));
        monitor.check().await;
        let store = Arc::new(Mutex::new(Store::open_in_memory().unwrap()));

        let report = reconciler(&gateway, &monitor, &store).sync().await;

        assert!(!report.success);
        assert_eq!(report.downloaded, 0);
        assert_eq!(gateway.list_calls(), 0);
        assert!(store.lock().await.list_logs().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_single_file_failure_skips_and_keeps_previous_copy() {
        let (gateway, monitor, store) = linked_setup().await;
        gateway.set_files(&["010124.json", "020124.json"]).await;
        gateway
            .insert_log("020124.json", vec![closing_reading(Zone::B)])
            .await;
        gateway.fail_file("010124.json").await;

        // Previous provisional copy of the failing file.
        let previous = vec![sample_reading(Zone::A)];
        store
            .lock()
            .await
            .upsert_log("010124.json", &previous)
            .unwrap();

        let report = reconciler(&gateway, &monitor, &store).sync().await;

        // The batch continued and only counted the replaced file.
        assert!(report.success);
        assert_eq!(report.downloaded, 1);

        let kept = store.lock().await.get_log("010124.json").unwrap().unwrap();
        assert_eq!(kept.data, previous);
    }

    #[tokio::test]
    async fn test_progress_is_monotone_and_reaches_100() {
        let (gateway, monitor, store) = linked_setup().await;
        gateway
            .set_files(&["010124.json", "020124.json", "030124.json"])
            .await;
        for name in ["010124.json", "020124.json", "030124.json"] {
            gateway.insert_log(name, vec![closing_reading(Zone::A)]).await;
        }

        let mut seen: Vec<u8> = Vec::new();
        reconciler(&gateway, &monitor, &store)
            .sync_with_progress(|p| seen.push(p))
            .await;

        assert_eq!(seen, vec![33, 67, 100]);
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    }

    #[tokio::test]
    async fn test_file_index_prefers_gateway_and_survives_offline() {
        let (gateway, monitor, store) = linked_setup().await;
        gateway.set_files(&["010124.json"]).await;

        let reconciler = reconciler(&gateway, &monitor, &store);
        assert_eq!(reconciler.file_index().await, vec!["010124.json"]);

        // Drop the link: the cached index keeps serving.
        let offline_monitor = Arc::new(ConnectionMonitor::new(
            Arc::clone(&gateway) as Arc<dyn GatewayApi>,
            Arc::new(StaticNetwork::disconnected()),
        ));
        offline_monitor.check().await;
        let offline = HistoryReconciler::new(
            Arc::clone(&gateway) as Arc<dyn GatewayApi>,
            offline_monitor,
            Arc::clone(&store),
        );
        let calls_before = gateway.list_calls();
        assert_eq!(offline.file_index().await, vec!["010124.json"]);
        assert_eq!(gateway.list_calls(), calls_before);
    }
}
