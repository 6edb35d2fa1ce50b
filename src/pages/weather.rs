//! Weather card: current conditions cached under `dashboard_weather`.

use async_trait::async_trait;

use crate::cache::CacheKey;
use crate::error::FetchError;
use crate::poller::Feed;
use crate::weather::{WeatherClient, WeatherSnapshot};

/// Open-Meteo current conditions
#[derive(Debug, Clone)]
pub struct WeatherFeed {
    client: WeatherClient,
}

impl WeatherFeed {
    pub fn new(client: WeatherClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Feed for WeatherFeed {
    type Snapshot = WeatherSnapshot;

    fn name(&self) -> &'static str {
        "weather"
    }

    fn cache_key(&self) -> CacheKey {
        CacheKey::DashboardWeather
    }

    async fn fetch(&self) -> Result<WeatherSnapshot, FetchError> {
        self.client.current().await
    }
}
