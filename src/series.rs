//! Report series types shared by the provider client and the alert engine
//!
//! The provider returns two parallel time series per service: the number of
//! user-submitted outage reports and the provider's expected baseline. Only the
//! most recent point of each series is used when deciding whether to alert.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp type for consistent time handling across the application
pub type Timestamp = DateTime<Utc>;

/// A single sample of a provider series
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataPoint {
    /// When the sample was taken
    pub timestamp: Timestamp,
    /// Report count (or expected count for the baseline series)
    pub value: f64,
}

impl DataPoint {
    pub fn new(timestamp: Timestamp, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Report and baseline series for one service, as returned by the provider
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ServiceSeries {
    #[serde(default)]
    pub reports: Vec<DataPoint>,
    #[serde(default)]
    pub baseline: Vec<DataPoint>,
}

impl ServiceSeries {
    pub fn new(reports: Vec<DataPoint>, baseline: Vec<DataPoint>) -> Self {
        Self { reports, baseline }
    }

    /// Value of the most recent report point, 0 when the series is empty
    pub fn reports_now(&self) -> f64 {
        last_value(&self.reports)
    }

    /// Value of the most recent baseline point, 0 when the series is empty
    pub fn baseline_now(&self) -> f64 {
        last_value(&self.baseline)
    }
}

fn last_value(points: &[DataPoint]) -> f64 {
    points.last().map(|point| point.value).unwrap_or(0.0)
}

/// Format a timestamp the way it is stored and shown in alerts
///
/// Millisecond precision with a `Z` suffix, e.g. `2024-05-01T10:00:00.000Z`.
pub fn format_timestamp(timestamp: &Timestamp) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}
