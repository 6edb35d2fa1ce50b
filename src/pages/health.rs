//! System health panel.
//!
//! This is the only feed whose failure changes what is displayed: when the
//! backend cannot be reached, the `api` badge flips to Offline. The cached
//! snapshot is left alone.

use async_trait::async_trait;

use crate::api::ApiClient;
use crate::cache::CacheKey;
use crate::error::FetchError;
use crate::models::{Health, SystemHealth};
use crate::poller::Feed;

/// `GET /api/status`, cached under `system_status`
#[derive(Debug, Clone)]
pub struct HealthFeed {
    api: ApiClient,
}

impl HealthFeed {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Feed for HealthFeed {
    type Snapshot = SystemHealth;

    fn name(&self) -> &'static str {
        "system_status"
    }

    fn cache_key(&self) -> CacheKey {
        CacheKey::SystemStatus
    }

    async fn fetch(&self) -> Result<SystemHealth, FetchError> {
        self.api.status().await
    }

    fn on_failure(&self, displayed: &mut SystemHealth, err: &FetchError) {
        if err.is_unreachable() && displayed.api != Health::Offline {
            tracing::warn!("API marked Offline: {}", err);
            displayed.api = Health::Offline;
        }
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::cache::ClientCache;
    use crate::io::{HttpResponse, MockHttpClient};
    use crate::poller::ViewModel;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_failure_flips_api_offline_but_not_cache() {
        // ---
        let mut http = MockHttpClient::new();
        let mut calls = 0;
        http.expect_get().returning(move |_| {
            calls += 1;
            if calls == 1 {
                Ok(HttpResponse {
                    status: 200,
                    body: r#"{"database":"Online","esp32":"Online","api":"Online"}"#.to_string(),
                })
            } else {
                Err(FetchError::Transport {
                    url: "http://farm.local/api/status".to_string(),
                    message: "connection refused".to_string(),
                })
            }
        });

        let cache = ClientCache::in_memory();
        let api = ApiClient::new("http://farm.local", Arc::new(http));
        let vm = ViewModel::mount(HealthFeed::new(api), cache.clone());

        vm.refresh().await;
        assert_eq!(vm.snapshot().api, Health::Online);

        vm.refresh().await;
        let shown = vm.snapshot();
        assert_eq!(shown.api, Health::Offline);
        assert_eq!(shown.database, Health::Online);

        let cached: SystemHealth = cache.get(CacheKey::SystemStatus).unwrap();
        assert_eq!(cached.api, Health::Online);
    }
}
