//! Typed client for the irrigation backend's REST endpoints.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::error::FetchError;
use crate::io::{HttpClient, HttpResponse};
use crate::models::{Alert, IrrigationConfig, RawAlert, RawSensorReading, SensorReading, SystemHealth};

// ---

/// Backend API client; cheap to clone and share between view models.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl ApiClient {
    pub fn new(base_url: &str, http: Arc<dyn HttpClient>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `GET /api/sensors`, newest first as the backend sends it.
    pub async fn sensors(&self) -> Result<Vec<SensorReading>, FetchError> {
        let raw: Vec<RawSensorReading> = self.get_json("/api/sensors").await?;
        Ok(raw.iter().map(RawSensorReading::to_view).collect())
    }

    /// `GET /api/config`
    pub async fn config(&self) -> Result<IrrigationConfig, FetchError> {
        self.get_json("/api/config").await
    }

    /// `POST /api/config` with the full record; returns the server's echo.
    pub async fn save_config(&self, config: &IrrigationConfig) -> Result<IrrigationConfig, FetchError> {
        // ---
        let url = self.url("/api/config");
        let body = serde_json::to_string(config).map_err(|source| FetchError::Encode {
            url: url.clone(),
            source,
        })?;

        let response = self.http.post_json(&url, &body).await?;
        decode(&url, response)
    }

    /// `GET /api/alerts`
    pub async fn alerts(&self) -> Result<Vec<Alert>, FetchError> {
        let raw: Vec<RawAlert> = self.get_json("/api/alerts").await?;
        Ok(raw.iter().map(RawAlert::to_view).collect())
    }

    /// `GET /api/status`
    pub async fn status(&self) -> Result<SystemHealth, FetchError> {
        self.get_json("/api/status").await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let url = self.url(path);
        let response = self.http.get(&url).await?;
        decode(&url, response)
    }
}

/// Check the status code and parse the body.
pub(crate) fn decode<T: DeserializeOwned>(url: &str, response: HttpResponse) -> Result<T, FetchError> {
    // ---
    if !response.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: response.status,
        });
    }

    serde_json::from_str(&response.body).map_err(|source| FetchError::Decode {
        url: url.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::io::MockHttpClient;
    use crate::models::{AlertType, Health, PumpStatus};

    fn ok(body: &str) -> HttpResponse {
        HttpResponse {
            status: 200,
            body: body.to_string(),
        }
    }

    #[tokio::test]
    async fn test_sensors_maps_fields_and_keeps_order() {
        // ---
        let mut http = MockHttpClient::new();
        http.expect_get()
            .withf(|url| url == "http://farm.local/api/sensors")
            .returning(|_| {
                Ok(ok(r#"[
                    {"soil_moisture":38.7,"temperature":42.1,"humidity":65,"pump_status":"OFF","timestamp":"2025-03-26T18:50:00Z"},
                    {"soil_moisture":40.0,"temperature":30.0,"humidity":60,"pump_status":"ON","timestamp":"2025-03-26T18:45:00Z"}
                ]"#))
            });

        let api = ApiClient::new("http://farm.local/", Arc::new(http));
        let readings = api.sensors().await.unwrap();

        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].soil_moisture_percent, 38.7);
        assert_eq!(readings[1].pump_status, PumpStatus::On);
    }

    #[tokio::test]
    async fn test_non_2xx_is_status_error() {
        // ---
        let mut http = MockHttpClient::new();
        http.expect_get().returning(|_| {
            Ok(HttpResponse {
                status: 502,
                body: "bad gateway".to_string(),
            })
        });

        let api = ApiClient::new("http://farm.local", Arc::new(http));
        match api.alerts().await.unwrap_err() {
            FetchError::Status { status, url } => {
                assert_eq!(status, 502);
                assert_eq!(url, "http://farm.local/api/alerts");
            }
            other => panic!("expected FetchError::Status, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_json_is_decode_error() {
        // ---
        let mut http = MockHttpClient::new();
        http.expect_get().returning(|_| Ok(ok("<html>oops</html>")));

        let api = ApiClient::new("http://farm.local", Arc::new(http));
        let err = api.status().await.unwrap_err();
        assert!(matches!(err, FetchError::Decode { .. }));
        assert!(!err.is_unreachable());
    }

    #[tokio::test]
    async fn test_save_config_posts_full_body_and_returns_echo() {
        // ---
        let mut http = MockHttpClient::new();
        http.expect_post_json()
            .withf(|url, body| {
                let sent: serde_json::Value = serde_json::from_str(body).unwrap();
                url == "http://farm.local/api/config"
                    && sent["auto_mode"] == false
                    && sent["manual_pump_state"] == true
                    && sent["moisture_threshold"] == 40.0
            })
            .returning(|_, _| {
                Ok(ok(r#"{"auto_mode":false,"moisture_threshold":45.0,"manual_pump_state":true}"#))
            });

        let api = ApiClient::new("http://farm.local", Arc::new(http));
        let sent = IrrigationConfig {
            auto_mode: false,
            manual_pump_state: true,
            ..IrrigationConfig::default()
        };
        let echoed = api.save_config(&sent).await.unwrap();

        // The echo wins, even where it differs from what was sent
        assert_eq!(echoed.moisture_threshold_percent, 45.0);
    }

    #[tokio::test]
    async fn test_alerts_and_status_parse() {
        // ---
        let mut http = MockHttpClient::new();
        http.expect_get()
            .withf(|url| url.ends_with("/api/alerts"))
            .returning(|_| {
                Ok(ok(r#"[{"id":"a1","type":"CRITICAL","message":"Pump stalled","timestamp":"2025-01-15T14:25:00Z","read":true}]"#))
            });
        http.expect_get()
            .withf(|url| url.ends_with("/api/status"))
            .returning(|_| Ok(ok(r#"{"database":"Online","esp32":"Online","api":"Online"}"#)));

        let api = ApiClient::new("http://farm.local", Arc::new(http));
        let alerts = api.alerts().await.unwrap();
        assert_eq!(alerts[0].severity, AlertType::Critical);
        assert!(alerts[0].read);

        let health = api.status().await.unwrap();
        assert_eq!(health.esp32, Health::Online);
    }
}
