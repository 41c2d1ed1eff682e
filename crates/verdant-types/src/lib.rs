//! Platform-agnostic types for the Verdant greenhouse gateway.
//!
//! This crate provides the shared vocabulary used by the sync engine
//! (verdant-core) and the local catalog (verdant-store): zone telemetry,
//! aggregation, day-log naming and completeness rules, and the wire DTOs
//! the gateway firmware actually emits.
//!
//! # Example
//!
//! ```
//! use verdant_types::{AggregatedSnapshot, LogFileName};
//!
//! let name = LogFileName::parse("020124.json")?;
//! assert_eq!(name.display_label(), "2 Jan 2024");
//!
//! // No qualifying zones: metrics are unavailable, never zero.
//! let snapshot = AggregatedSnapshot::from_zones(Vec::new());
//! assert_eq!(snapshot.temperature_c, None);
//! # Ok::<(), verdant_types::ParseError>(())
//! ```

pub mod daylog;
pub mod error;
pub mod types;
pub mod wire;

pub use daylog::{day_log_complete, in_closing_window, LogFileName, LogStats, Metric};
pub use error::{ParseError, ParseResult};
pub use types::{
    AggregatedSnapshot, HardwareStatus, IrrigationConfig, ValveStatus, Zone,
    ZoneIrrigationConfig, ZoneTelemetry, READ_OK_STATUS,
};
pub use wire::{parse_timestamp, TelemetryDto};
