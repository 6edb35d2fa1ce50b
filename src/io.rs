//! HTTP client abstraction so view models can be tested without a network.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::FetchError;

/// Status and body of a completed HTTP exchange
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Minimal HTTP surface the dashboard needs
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Send a GET request to the given URL
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError>;

    /// Send a POST request with a JSON body
    async fn post_json(&self, url: &str, body: &str) -> Result<HttpResponse, FetchError>;
}

/// Production HTTP client using reqwest
#[derive(Debug, Clone, Default)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn with_timeout(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

fn transport(url: &str, e: reqwest::Error) -> FetchError {
    FetchError::Transport {
        url: url.to_string(),
        message: e.to_string(),
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        tracing::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| transport(url, e))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| transport(url, e))?;

        tracing::debug!("GET {} -> {} ({} bytes)", url, status, body.len());
        Ok(HttpResponse { status, body })
    }

    async fn post_json(&self, url: &str, body: &str) -> Result<HttpResponse, FetchError> {
        tracing::debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body.to_string())
            .send()
            .await
            .map_err(|e| transport(url, e))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| transport(url, e))?;

        tracing::debug!("POST {} -> {} ({} bytes)", url, status, body.len());
        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    /// Port 1 is reserved and never bound, so connections are refused.
    const UNREACHABLE_URL: &str = "http://127.0.0.1:1/api/sensors";

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        // ---
        let client = ReqwestHttpClient::default();
        let err = client.get(UNREACHABLE_URL).await.unwrap_err();

        match &err {
            FetchError::Transport { url, .. } => assert_eq!(url, UNREACHABLE_URL),
            other => panic!("expected FetchError::Transport, got {other:?}"),
        }
        assert!(err.is_unreachable());
    }

    #[test]
    fn test_success_range() {
        // ---
        let ok = HttpResponse { status: 204, body: String::new() };
        let bad = HttpResponse { status: 503, body: String::new() };
        assert!(ok.is_success());
        assert!(!bad.is_success());
    }
}
