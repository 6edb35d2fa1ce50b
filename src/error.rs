//! Error types for dashboard fetch cycles and the client cache.
//!
//! None of these are fatal. A failed fetch cycle is logged and the view model
//! keeps displaying its last-known-good snapshot.

/// Why a single fetch cycle did not produce a new snapshot.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Connection refused, DNS failure, timeout, truncated body.
    #[error("transport error on {url}: {message}")]
    Transport { url: String, message: String },

    /// The server answered with a non-2xx status.
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// The body was not the JSON shape we expected.
    #[error("malformed response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// The request body could not be serialized; nothing was sent.
    #[error("failed to encode request for {url}: {source}")]
    Encode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// No coordinates are configured for the weather lookup.
    #[error("location unavailable: {0}")]
    LocationUnavailable(String),

    /// The endpoint answered with an empty list; nothing to display.
    #[error("{0} returned no data")]
    NoData(String),
}

impl FetchError {
    /// True when the backend could not be reached or answered with an error.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, FetchError::Transport { .. } | FetchError::Status { .. })
    }
}

/// Errors raised by the client cache service.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
