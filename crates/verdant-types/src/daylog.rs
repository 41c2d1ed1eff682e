//! Day-log naming, completeness, and per-metric statistics.
//!
//! The gateway appends one log file per calendar day, named by a 6-character
//! `DDMMYY` date plus `.json`. A log is *complete* once its final entry lands
//! in the day's closing window; until then the gateway is still writing it
//! and any local copy is provisional.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::macros::{format_description, time};
use time::{Date, Month, Time};

use crate::error::{ParseError, ParseResult};
use crate::types::{round1, ZoneTelemetry};

/// Start of the day's closing window.
pub const DAY_CLOSE_START: Time = time!(23:20);
/// End of the closing window, on the following calendar day.
pub const DAY_CLOSE_END: Time = time!(00:10);

/// Whether a time of day falls in the closing window (23:20–00:10).
///
/// The window wraps midnight, so the check is a disjunction rather than a
/// range test.
#[must_use]
pub fn in_closing_window(time: Time) -> bool {
    time >= DAY_CLOSE_START || time <= DAY_CLOSE_END
}

/// Whether a day log is complete.
///
/// A log is complete iff its last entry's timestamp falls in the closing
/// window. Completeness is derived from timestamps alone rather than an
/// expected sample count, so it holds under any sampling cadence.
#[must_use]
pub fn day_log_complete(entries: &[ZoneTelemetry]) -> bool {
    entries
        .last()
        .is_some_and(|entry| in_closing_window(entry.timestamp.time()))
}

/// A validated day-log file name (`DDMMYY.json`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LogFileName(Date);

impl LogFileName {
    /// Parse a file name, with or without the `.json` extension.
    pub fn parse(name: &str) -> ParseResult<Self> {
        let stem = name.strip_suffix(".json").unwrap_or(name);
        if stem.len() != 6 || !stem.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseError::InvalidLogName(name.to_string()));
        }

        let day: u8 = stem[0..2].parse().expect("digits checked above");
        let month: u8 = stem[2..4].parse().expect("digits checked above");
        let year: i32 = 2000 + stem[4..6].parse::<i32>().expect("digits checked above");

        let month =
            Month::try_from(month).map_err(|_| ParseError::InvalidLogName(name.to_string()))?;
        let date = Date::from_calendar_date(year, month, day)
            .map_err(|_| ParseError::InvalidLogName(name.to_string()))?;

        Ok(Self(date))
    }

    /// The calendar day this log covers.
    #[must_use]
    pub fn date(&self) -> Date {
        self.0
    }

    /// The on-gateway file name, `DDMMYY.json`.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!(
            "{:02}{:02}{:02}.json",
            self.0.day(),
            u8::from(self.0.month()),
            self.0.year() % 100
        )
    }

    /// Human-readable label for pickers, e.g. `2 Jan 2024`.
    #[must_use]
    pub fn display_label(&self) -> String {
        let label = format_description!("[day padding:none] [month repr:short] [year]");
        self.0
            .format(&label)
            .unwrap_or_else(|_| self.file_name())
    }
}

impl fmt::Display for LogFileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file_name())
    }
}

impl FromStr for LogFileName {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A metric that can be extracted from a telemetry reading for statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Temperature,
    AirHumidity,
    Co2,
    SoilMoisture,
    Lux,
    Ph,
    FlowRate,
}

impl Metric {
    /// Extract this metric's value from a reading.
    #[must_use]
    pub fn value(&self, reading: &ZoneTelemetry) -> f64 {
        match self {
            Metric::Temperature => reading.temperature_c,
            Metric::AirHumidity => reading.humidity_pct,
            Metric::Co2 => reading.co2_ppm,
            Metric::SoilMoisture => reading.soil_moisture_raw,
            Metric::Lux => reading.lux,
            Metric::Ph => reading.ph,
            Metric::FlowRate => reading.flow_lpm,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Metric::Temperature => "temperature",
            Metric::AirHumidity => "humidity",
            Metric::Co2 => "co2",
            Metric::SoilMoisture => "soil",
            Metric::Lux => "lux",
            Metric::Ph => "ph",
            Metric::FlowRate => "flow",
        };
        write!(f, "{name}")
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "temperature" | "temp" => Ok(Metric::Temperature),
            "humidity" => Ok(Metric::AirHumidity),
            "co2" => Ok(Metric::Co2),
            "soil" | "moisture" => Ok(Metric::SoilMoisture),
            "lux" | "light" => Ok(Metric::Lux),
            "ph" => Ok(Metric::Ph),
            "flow" => Ok(Metric::FlowRate),
            other => Err(format!("unknown metric '{other}'")),
        }
    }
}

/// Min/max/mean of one metric over a day log, rounded to one decimal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl LogStats {
    /// Compute stats over a log's entries; `None` for an empty log.
    #[must_use]
    pub fn compute(entries: &[ZoneTelemetry], metric: Metric) -> Option<Self> {
        if entries.is_empty() {
            return None;
        }

        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        for entry in entries {
            let v = metric.value(entry);
            min = min.min(v);
            max = max.max(v);
            sum += v;
        }

        Some(Self {
            min: round1(min),
            max: round1(max),
            mean: round1(sum / entries.len() as f64),
        })
    }
}
