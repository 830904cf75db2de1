use reqwest::{Method, StatusCode};
use thiserror::Error;

/// Failure talking to the device's REST server.
/// All variants are recovered by the poller; none of them stop the poll loop.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("could not build http client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{method} {path} returned {}: {body}", status.as_u16())]
    Status {
        status: StatusCode,
        method: Method,
        path: String,
        body: String,
    },

    #[error("unexpected response from {path}: {source}")]
    Malformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session store io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("session store is not valid json: {0}")]
    Json(#[from] serde_json::Error),
}
