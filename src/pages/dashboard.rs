//! Dashboard page: headline stat cards and the most recent alerts.
//!
//! The weather card on this page is fed by [`super::weather::WeatherFeed`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::ApiClient;
use crate::cache::CacheKey;
use crate::error::FetchError;
use crate::models::{Alert, PumpStatus, SensorReading};
use crate::poller::Feed;
use crate::status::{Metric, SensorStatus, Thresholds};

use super::alerts::most_recent;

// ---

/// Latest values shown in the stat cards.
///
/// The default (all zero, pump OFF) is what a first visit shows until the
/// first successful fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub soil_moisture_percent: f64,
    pub temperature_c: f64,
    pub humidity_percent: f64,
    pub pump_status: PumpStatus,
    pub timestamp: Option<DateTime<Utc>>,
}

impl From<&SensorReading> for DashboardStats {
    fn from(r: &SensorReading) -> Self {
        Self {
            soil_moisture_percent: r.soil_moisture_percent,
            temperature_c: r.temperature_c,
            humidity_percent: r.humidity_percent,
            pump_status: r.pump_status,
            timestamp: Some(r.timestamp),
        }
    }
}

/// `GET /api/sensors`, keeping only the newest reading
#[derive(Debug, Clone)]
pub struct StatsFeed {
    api: ApiClient,
}

impl StatsFeed {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Feed for StatsFeed {
    type Snapshot = DashboardStats;

    fn name(&self) -> &'static str {
        "dashboard_stats"
    }

    fn cache_key(&self) -> CacheKey {
        CacheKey::DashboardStats
    }

    async fn fetch(&self) -> Result<DashboardStats, FetchError> {
        // Backend sends newest first
        let readings = self.api.sensors().await?;
        readings
            .first()
            .map(DashboardStats::from)
            .ok_or_else(|| FetchError::NoData("/api/sensors".to_string()))
    }
}

/// `GET /api/alerts`, keeping the few newest for the dashboard panel
#[derive(Debug, Clone)]
pub struct RecentAlertsFeed {
    api: ApiClient,
    limit: usize,
}

impl RecentAlertsFeed {
    pub const DEFAULT_LIMIT: usize = 4;

    pub fn new(api: ApiClient, limit: usize) -> Self {
        Self { api, limit }
    }
}

#[async_trait]
impl Feed for RecentAlertsFeed {
    type Snapshot = Vec<Alert>;

    fn name(&self) -> &'static str {
        "dashboard_alerts"
    }

    fn cache_key(&self) -> CacheKey {
        CacheKey::DashboardAlerts
    }

    async fn fetch(&self) -> Result<Vec<Alert>, FetchError> {
        let alerts = self.api.alerts().await?;
        Ok(most_recent(&alerts, self.limit))
    }
}

/// One headline card.
#[derive(Debug, Clone, PartialEq)]
pub struct StatCard {
    pub title: &'static str,
    pub value: String,
    /// `None` for cards without a threshold (pump)
    pub status: Option<SensorStatus>,
}

impl StatCard {
    /// True when the value is outside its normal band.
    pub fn flagged(&self) -> bool {
        matches!(self.status, Some(s) if s != SensorStatus::Normal)
    }
}

pub fn stat_cards(stats: &DashboardStats, thresholds: &Thresholds) -> Vec<StatCard> {
    // ---
    vec![
        StatCard {
            title: "Soil Moisture",
            value: format!("{:.1}%", stats.soil_moisture_percent),
            status: Some(thresholds.classify(Metric::SoilMoisture, stats.soil_moisture_percent)),
        },
        StatCard {
            title: "Temperature",
            value: format!("{:.1}°C", stats.temperature_c),
            status: Some(thresholds.classify(Metric::Temperature, stats.temperature_c)),
        },
        StatCard {
            title: "Humidity",
            value: format!("{:.1}%", stats.humidity_percent),
            status: Some(thresholds.classify(Metric::Humidity, stats.humidity_percent)),
        },
        StatCard {
            title: "Pump Status",
            value: stats.pump_status.to_string(),
            status: None,
        },
    ]
}
