//! Alerts page: full alert log with severity, unread and text filters.

use async_trait::async_trait;

use crate::api::ApiClient;
use crate::cache::CacheKey;
use crate::error::FetchError;
use crate::models::{Alert, AlertType};
use crate::poller::Feed;

use super::matches_search;

// ---

/// `GET /api/alerts`, cached under `alerts_log`
#[derive(Debug, Clone)]
pub struct AlertsFeed {
    api: ApiClient,
}

impl AlertsFeed {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Feed for AlertsFeed {
    type Snapshot = Vec<Alert>;

    fn name(&self) -> &'static str {
        "alerts"
    }

    fn cache_key(&self) -> CacheKey {
        CacheKey::AlertsLog
    }

    async fn fetch(&self) -> Result<Vec<Alert>, FetchError> {
        self.api.alerts().await
    }
}

/// Filter criteria for the alert list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertFilter {
    /// `None` shows every severity
    pub severity: Option<AlertType>,
    pub unread_only: bool,
    pub search: String,
}

impl AlertFilter {
    pub fn matches(&self, alert: &Alert) -> bool {
        self.severity.map_or(true, |s| alert.severity == s)
            && (!self.unread_only || !alert.read)
            && matches_search(&alert.message, &self.search)
    }
}

pub fn filter_alerts(alerts: &[Alert], filter: &AlertFilter) -> Vec<Alert> {
    alerts.iter().filter(|a| filter.matches(a)).cloned().collect()
}

/// The `n` newest alerts, newest first.
pub fn most_recent(alerts: &[Alert], n: usize) -> Vec<Alert> {
    let mut sorted = alerts.to_vec();
    sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    sorted.truncate(n);
    sorted
}

/// Per-severity totals for the summary cards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeverityCounts {
    pub all: usize,
    pub info: usize,
    pub warning: usize,
    pub critical: usize,
    pub unread: usize,
}

pub fn severity_counts(alerts: &[Alert]) -> SeverityCounts {
    // ---
    alerts.iter().fold(
        SeverityCounts {
            all: alerts.len(),
            ..SeverityCounts::default()
        },
        |mut counts, alert| {
            match alert.severity {
                AlertType::Info => counts.info += 1,
                AlertType::Warning => counts.warning += 1,
                AlertType::Critical => counts.critical += 1,
            }
            if !alert.read {
                counts.unread += 1;
            }
            counts
        },
    )
}
