//! Connectivity and offline-first sync engine for the Verdant greenhouse
//! gateway.
//!
//! The gateway is an ESP32-class controller on its own Wi-Fi access point,
//! exposing a small HTTP API for live telemetry, per-day history logs, and
//! irrigation control. This crate is the client-side engine that keeps a
//! dashboard honest about that link:
//!
//! - **Connectivity**: [`ConnectionMonitor`] distinguishes three states
//!   (no network, network without a responding gateway, fully linked)
//!   because "connected to Wi-Fi" and "talking to the gateway" fail
//!   independently in the field.
//! - **Live view**: [`TelemetryPoller`] polls the gateway's current
//!   readings, aggregates them per metric, and degrades to the last cached
//!   snapshot when the link drops.
//! - **History**: [`HistoryReconciler`] diffs the gateway's day-log listing
//!   against the local catalog and downloads what is missing or still
//!   provisional.
//! - **Backup**: [`CloudUploader`] pushes unsynced local logs to a cloud
//!   service with exact partial-failure accounting.
//!
//! Every network call resolves into the closed [`Failure`] taxonomy; no
//! component panics on a transport error.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use tokio::sync::Mutex;
//! use verdant_core::{ConnectionMonitor, GatewayClient, HistoryReconciler, LinkLevel};
//! use verdant_core::monitor::{NetworkInterface, WifiState};
//!
//! # struct MyNetwork;
//! # #[async_trait::async_trait]
//! # impl NetworkInterface for MyNetwork {
//! #     async fn wifi_state(&self) -> WifiState { WifiState::Disconnected }
//! # }
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let gateway = Arc::new(GatewayClient::new(GatewayClient::DEFAULT_BASE_URL)?);
//!     let monitor = Arc::new(ConnectionMonitor::new(gateway.clone(), Arc::new(MyNetwork)));
//!
//!     if monitor.check().await.level() == LinkLevel::Linked {
//!         let store = Arc::new(Mutex::new(verdant_store::Store::open_default()?));
//!         let reconciler = HistoryReconciler::new(gateway, monitor, store);
//!         let report = reconciler.sync().await;
//!         println!("{}", report.message);
//!     }
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod client;
pub mod cloud;
pub mod error;
pub mod mock;
pub mod monitor;
pub mod poller;
pub mod reconcile;
pub mod retry;
pub mod traits;

pub use cache::CloudOrCache;
pub use client::GatewayClient;
pub use cloud::{CloudClient, CloudUploader, UploadOutcome, UploadReport};
pub use error::{Failure, Result};
pub use monitor::{
    Clock, ConnectionMonitor, ConnectionState, LinkLevel, NetworkInterface, SystemClock, WifiState,
};
pub use poller::TelemetryPoller;
pub use reconcile::{HistoryReconciler, SyncReport};
pub use retry::{with_retry, RetryConfig};
pub use traits::{CloudApi, GatewayApi};

/// Type alias for the shared local catalog.
///
/// The catalog is mutated by both the reconciler (writing downloaded logs)
/// and the uploader (flipping sync flags); sharing one store behind one lock
/// serializes those read-modify-write operations so no update is lost to a
/// stale second copy of the catalog.
pub type SharedStore = std::sync::Arc<tokio::sync::Mutex<verdant_store::Store>>;
