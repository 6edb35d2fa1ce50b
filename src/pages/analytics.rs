//! Analytics page: chronological history, range selection, chart series and
//! CSV export.

use std::fmt::Write as _;
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};

use crate::api::ApiClient;
use crate::cache::CacheKey;
use crate::error::FetchError;
use crate::models::SensorReading;
use crate::poller::Feed;
use crate::status::Metric;

// ---

/// Fixed CSV column order.
pub const CSV_HEADER: &str =
    "timestamp,soil_moisture_percent,temperature_c,humidity_percent,pump_status";

/// `GET /api/sensors` reordered oldest first for charting, cached under
/// `analytics_data`
#[derive(Debug, Clone)]
pub struct AnalyticsFeed {
    api: ApiClient,
}

impl AnalyticsFeed {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Feed for AnalyticsFeed {
    type Snapshot = Vec<SensorReading>;

    fn name(&self) -> &'static str {
        "analytics"
    }

    fn cache_key(&self) -> CacheKey {
        CacheKey::AnalyticsData
    }

    async fn fetch(&self) -> Result<Vec<SensorReading>, FetchError> {
        let mut readings = self.api.sensors().await?;
        readings.reverse();
        Ok(readings)
    }
}

/// Date range buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRange {
    Last24Hours,
    Last7Days,
    Last30Days,
    Custom {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl DateRange {
    /// Inclusive `[start, end]` bounds relative to `now`.
    pub fn bounds(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        match *self {
            DateRange::Last24Hours => (now - Duration::hours(24), now),
            DateRange::Last7Days => (now - Duration::days(7), now),
            DateRange::Last30Days => (now - Duration::days(30), now),
            DateRange::Custom { start, end } => (start, end),
        }
    }
}

/// Readings inside `range`, in input order.
pub fn filter_by_range(
    readings: &[SensorReading],
    range: DateRange,
    now: DateTime<Utc>,
) -> Vec<SensorReading> {
    let (start, end) = range.bounds(now);
    readings
        .iter()
        .filter(|r| r.timestamp >= start && r.timestamp <= end)
        .cloned()
        .collect()
}

/// `(timestamp, value)` points for one metric's trend chart.
pub fn series(readings: &[SensorReading], metric: Metric) -> Vec<(DateTime<Utc>, f64)> {
    readings
        .iter()
        .map(|r| {
            let value = match metric {
                Metric::SoilMoisture => r.soil_moisture_percent,
                Metric::Temperature => r.temperature_c,
                Metric::Humidity => r.humidity_percent,
            };
            (r.timestamp, value)
        })
        .collect()
}

/// Min / mean / max of one series, `None` for an empty series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub min: f64,
    pub mean: f64,
    pub max: f64,
}

pub fn summarize(points: &[(DateTime<Utc>, f64)]) -> Option<Summary> {
    // ---
    if points.is_empty() {
        return None;
    }
    let (mut min, mut max, mut sum) = (f64::INFINITY, f64::NEG_INFINITY, 0.0);
    for (_, v) in points {
        min = min.min(*v);
        max = max.max(*v);
        sum += v;
    }
    Some(Summary {
        min,
        mean: sum / points.len() as f64,
        max,
    })
}

/// The `n` newest readings, newest first, for the "Recent Readings" table.
pub fn most_recent(chronological: &[SensorReading], n: usize) -> Vec<SensorReading> {
    chronological.iter().rev().take(n).cloned().collect()
}

/// Serialize the whole history (not just the visible rows) as CSV.
///
/// Rows keep input order; timestamps are RFC 3339 in UTC.
pub fn to_csv(readings: &[SensorReading]) -> String {
    // ---
    let mut out = String::with_capacity(CSV_HEADER.len() + readings.len() * 64);
    out.push_str(CSV_HEADER);
    out.push('\n');

    for r in readings {
        // Writing into a String cannot fail
        let _ = writeln!(
            out,
            "{},{},{},{},{}",
            r.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            r.soil_moisture_percent,
            r.temperature_c,
            r.humidity_percent,
            r.pump_status
        );
    }
    out
}

/// Write [`to_csv`] output to `path`, returning the number of data rows.
pub fn export_csv(readings: &[SensorReading], path: &Path) -> std::io::Result<usize> {
    std::fs::write(path, to_csv(readings))?;
    tracing::info!("Exported {} readings to {}", readings.len(), path.display());
    Ok(readings.len())
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::cache::ClientCache;
    use crate::io::{HttpResponse, MockHttpClient};
    use crate::models::PumpStatus;
    use crate::poller::ViewModel;
    use chrono::TimeZone;
    use std::sync::Arc;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 26, h, m, 0).unwrap()
    }

    fn reading(ts: DateTime<Utc>, moisture: f64, pump: PumpStatus) -> SensorReading {
        // ---
        SensorReading {
            timestamp: ts,
            soil_moisture_percent: moisture,
            temperature_c: 28.5,
            humidity_percent: 65.3,
            pump_status: pump,
        }
    }

    #[tokio::test]
    async fn test_feed_reverses_to_chronological() {
        // ---
        let mut http = MockHttpClient::new();
        http.expect_get().returning(|_| {
            Ok(HttpResponse {
                status: 200,
                body: r#"[
                    {"soil_moisture":3,"temperature":1,"humidity":1,"pump_status":"OFF","timestamp":"2025-03-26T12:20:00Z"},
                    {"soil_moisture":2,"temperature":1,"humidity":1,"pump_status":"OFF","timestamp":"2025-03-26T12:10:00Z"},
                    {"soil_moisture":1,"temperature":1,"humidity":1,"pump_status":"OFF","timestamp":"2025-03-26T12:00:00Z"}
                ]"#
                .to_string(),
            })
        });
        let api = ApiClient::new("http://farm.local", Arc::new(http));
        let vm = ViewModel::mount(AnalyticsFeed::new(api), ClientCache::in_memory());
        vm.refresh().await;

        let moisture: Vec<f64> = series(&vm.snapshot(), Metric::SoilMoisture)
            .into_iter()
            .map(|(_, v)| v)
            .collect();
        assert_eq!(moisture, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_csv_header_and_row_order() {
        // ---
        let rows = vec![
            reading(at(12, 0), 45.2, PumpStatus::Off),
            reading(at(12, 30), 43.8, PumpStatus::On),
        ];
        let csv = to_csv(&rows);
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(lines[1], "2025-03-26T12:00:00Z,45.2,28.5,65.3,OFF");
        assert_eq!(lines[2], "2025-03-26T12:30:00Z,43.8,28.5,65.3,ON");
    }

    #[test]
    fn test_export_writes_full_history() {
        // ---
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.csv");
        let rows = vec![
            reading(at(1, 0), 10.0, PumpStatus::Off),
            reading(at(2, 0), 20.0, PumpStatus::Off),
            reading(at(3, 0), 30.0, PumpStatus::Off),
        ];

        // Only one row is "visible", the export still carries all three
        let visible = most_recent(&rows, 1);
        assert_eq!(visible.len(), 1);

        assert_eq!(export_csv(&rows, &path).unwrap(), 3);
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written.lines().count(), 4);
    }

    #[test]
    fn test_range_filter() {
        // ---
        let now = at(23, 0);
        let rows = vec![
            reading(now - Duration::days(10), 1.0, PumpStatus::Off),
            reading(now - Duration::days(3), 2.0, PumpStatus::Off),
            reading(now - Duration::hours(2), 3.0, PumpStatus::Off),
        ];

        assert_eq!(filter_by_range(&rows, DateRange::Last24Hours, now).len(), 1);
        assert_eq!(filter_by_range(&rows, DateRange::Last7Days, now).len(), 2);
        assert_eq!(filter_by_range(&rows, DateRange::Last30Days, now).len(), 3);

        let custom = DateRange::Custom {
            start: now - Duration::days(4),
            end: now - Duration::days(2),
        };
        let out = filter_by_range(&rows, custom, now);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].soil_moisture_percent, 2.0);
    }

    #[test]
    fn test_most_recent_and_summary() {
        // ---
        let rows = vec![
            reading(at(1, 0), 10.0, PumpStatus::Off),
            reading(at(2, 0), 20.0, PumpStatus::Off),
            reading(at(3, 0), 60.0, PumpStatus::Off),
        ];
        let recent = most_recent(&rows, 2);
        assert_eq!(recent[0].timestamp, at(3, 0));
        assert_eq!(recent[1].timestamp, at(2, 0));

        let s = summarize(&series(&rows, Metric::SoilMoisture)).unwrap();
        assert_eq!(s.min, 10.0);
        assert_eq!(s.max, 60.0);
        assert_eq!(s.mean, 30.0);
        assert!(summarize(&[]).is_none());
    }
}
