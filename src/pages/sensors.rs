//! Sensor monitoring page: per-sensor table and filterable reading history.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::api::ApiClient;
use crate::cache::CacheKey;
use crate::error::FetchError;
use crate::models::SensorReading;
use crate::poller::Feed;
use crate::status::{Metric, SensorStatus, Thresholds};

use super::matches_search;

// ---

/// `GET /api/sensors` as delivered (newest first), cached under `sensor_history`
#[derive(Debug, Clone)]
pub struct SensorHistoryFeed {
    api: ApiClient,
}

impl SensorHistoryFeed {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Feed for SensorHistoryFeed {
    type Snapshot = Vec<SensorReading>;

    fn name(&self) -> &'static str {
        "sensor_history"
    }

    fn cache_key(&self) -> CacheKey {
        CacheKey::SensorHistory
    }

    async fn fetch(&self) -> Result<Vec<SensorReading>, FetchError> {
        self.api.sensors().await
    }
}

/// Status filter buttons: "All" or one category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(SensorStatus),
}

impl StatusFilter {
    pub fn admits(&self, status: SensorStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => *wanted == status,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "normal" => Ok(StatusFilter::Only(SensorStatus::Normal)),
            "warning" => Ok(StatusFilter::Only(SensorStatus::Warning)),
            "critical" => Ok(StatusFilter::Only(SensorStatus::Critical)),
            other => Err(format!("unknown status filter '{other}'")),
        }
    }
}

/// Readings whose overall status passes `filter`, in input order.
pub fn filter_readings(
    readings: &[SensorReading],
    thresholds: &Thresholds,
    filter: StatusFilter,
) -> Vec<SensorReading> {
    readings
        .iter()
        .filter(|r| filter.admits(thresholds.reading_status(r)))
        .cloned()
        .collect()
}

/// Counts shown on the filter buttons.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub all: usize,
    pub normal: usize,
    pub warning: usize,
    pub critical: usize,
}

pub fn status_counts(readings: &[SensorReading], thresholds: &Thresholds) -> StatusCounts {
    // ---
    let mut counts = StatusCounts {
        all: readings.len(),
        ..StatusCounts::default()
    };
    for r in readings {
        match thresholds.reading_status(r) {
            SensorStatus::Normal => counts.normal += 1,
            SensorStatus::Warning => counts.warning += 1,
            SensorStatus::Critical => counts.critical += 1,
        }
    }
    counts
}

/// One row of the "Active Sensors" table.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorRow {
    pub name: &'static str,
    pub value: f64,
    pub unit: &'static str,
    pub status: SensorStatus,
    pub last_updated: DateTime<Utc>,
}

/// Table rows for the newest reading in `history` (newest first).
pub fn sensor_rows(history: &[SensorReading], thresholds: &Thresholds) -> Vec<SensorRow> {
    // ---
    let Some(latest) = history.first() else {
        return Vec::new();
    };

    [
        ("Soil Moisture Sensor", Metric::SoilMoisture, latest.soil_moisture_percent, "%"),
        ("Temperature Sensor", Metric::Temperature, latest.temperature_c, "°C"),
        ("Humidity Sensor", Metric::Humidity, latest.humidity_percent, "%"),
    ]
    .into_iter()
    .map(|(name, metric, value, unit)| SensorRow {
        name,
        value,
        unit,
        status: thresholds.classify(metric, value),
        last_updated: latest.timestamp,
    })
    .collect()
}

/// Rows matching the search box and status filter.
pub fn filter_rows(rows: &[SensorRow], search: &str, filter: StatusFilter) -> Vec<SensorRow> {
    rows.iter()
        .filter(|row| matches_search(row.name, search) && filter.admits(row.status))
        .cloned()
        .collect()
}
