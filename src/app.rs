//! Wires every page to its feed and keeps their poll handles.
//!
//! Pages are independent: each has its own timer, its own cache key and its
//! own displayed state. Two pages reading the same endpoint may briefly show
//! different snapshots.

use std::sync::Arc;

use chrono::Utc;

use crate::api::ApiClient;
use crate::cache::ClientCache;
use crate::config::Config;
use crate::io::HttpClient;
use crate::pages::alerts::{filter_alerts, AlertFilter, AlertsFeed};
use crate::pages::analytics::{AnalyticsFeed, DateRange};
use crate::pages::dashboard::{RecentAlertsFeed, StatsFeed};
use crate::pages::health::HealthFeed;
use crate::pages::irrigation::IrrigationControl;
use crate::pages::sensors::SensorHistoryFeed;
use crate::pages::weather::WeatherFeed;
use crate::poller::{start_polling, PollHandle, ViewModel};
use crate::render::{self, Style};
use crate::status::Thresholds;
use crate::weather::WeatherClient;

// ---

/// All mounted pages.
pub struct App {
    pub stats: Arc<ViewModel<StatsFeed>>,
    pub recent_alerts: Arc<ViewModel<RecentAlertsFeed>>,
    pub weather: Arc<ViewModel<WeatherFeed>>,
    pub sensors: Arc<ViewModel<SensorHistoryFeed>>,
    pub analytics: Arc<ViewModel<AnalyticsFeed>>,
    pub alerts: Arc<ViewModel<AlertsFeed>>,
    pub health: Arc<ViewModel<HealthFeed>>,
    pub irrigation: Arc<IrrigationControl>,
    pub thresholds: Thresholds,
    cache: ClientCache,
    handles: Vec<PollHandle>,
}

impl App {
    /// Mount every page, seeding each from the cache.
    pub fn mount(config: &Config, http: Arc<dyn HttpClient>, cache: ClientCache) -> Self {
        // ---
        let api = ApiClient::new(&config.api_base_url, Arc::clone(&http));
        let weather = WeatherClient::new(&config.weather_api_url, config.location, http);

        Self {
            stats: ViewModel::mount(StatsFeed::new(api.clone()), cache.clone()),
            recent_alerts: ViewModel::mount(
                RecentAlertsFeed::new(api.clone(), RecentAlertsFeed::DEFAULT_LIMIT),
                cache.clone(),
            ),
            weather: ViewModel::mount(WeatherFeed::new(weather), cache.clone()),
            sensors: ViewModel::mount(SensorHistoryFeed::new(api.clone()), cache.clone()),
            analytics: ViewModel::mount(AnalyticsFeed::new(api.clone()), cache.clone()),
            alerts: ViewModel::mount(AlertsFeed::new(api.clone()), cache.clone()),
            health: ViewModel::mount(HealthFeed::new(api.clone()), cache.clone()),
            irrigation: Arc::new(IrrigationControl::new(api, cache.clone())),
            thresholds: Thresholds::default(),
            cache,
            handles: Vec::new(),
        }
    }

    /// Start every page's timer using the configured intervals.
    pub fn start(&mut self, config: &Config) {
        // ---
        self.handles = vec![
            start_polling(Arc::clone(&self.stats), config.sensor_poll),
            start_polling(Arc::clone(&self.recent_alerts), config.alerts_poll),
            start_polling(Arc::clone(&self.weather), config.weather_poll),
            start_polling(Arc::clone(&self.sensors), config.sensor_poll),
            start_polling(Arc::clone(&self.analytics), config.analytics_poll),
            start_polling(Arc::clone(&self.alerts), config.alerts_poll),
            start_polling(Arc::clone(&self.health), config.status_poll),
        ];
    }

    /// Stop every timer and wait for them to exit.
    pub async fn stop(&mut self) {
        for handle in self.handles.drain(..) {
            handle.stop().await;
        }
    }

    pub fn running(&self) -> usize {
        self.handles.iter().filter(|h| h.is_running()).count()
    }

    /// Render the irrigation panel alone, draining queued toasts.
    pub fn render_irrigation(&self, color: bool) -> String {
        let style = Style {
            color,
            theme: self.cache.theme(),
        };
        render::irrigation(
            &self.irrigation.config(),
            &self.irrigation.take_toasts(),
            &style,
        )
    }

    /// Render every page into one screen.
    pub fn render(&self, color: bool) -> String {
        // ---
        let style = Style {
            color,
            theme: self.cache.theme(),
        };
        let alerts = self.alerts.snapshot();
        let toasts = self.irrigation.take_toasts();

        [
            render::dashboard(
                &self.stats.snapshot(),
                &self.stats.status(),
                &self.recent_alerts.snapshot(),
                &self.weather.snapshot(),
                &self.thresholds,
                &style,
            ),
            render::sensors(&self.sensors.snapshot(), &self.thresholds, &style),
            render::analytics(&self.analytics.snapshot(), DateRange::Last24Hours, Utc::now()),
            render::alerts(&alerts, &filter_alerts(&alerts, &AlertFilter::default()), &style),
            render::health(&self.health.snapshot(), &style),
            render::irrigation(&self.irrigation.config(), &toasts, &style),
        ]
        .join("\n")
    }
}
