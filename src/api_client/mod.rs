pub mod api_models;

use crate::config::CONFIG;
use crate::error::ApiError;
use crate::models::ContractRecord;
use api_models::{ContractList, Info, LatestMicropayment};
use reqwest::{self, Method};
use std::time::Duration;
use tracing::*;

/// Client for the REST server running on the device.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    /// Client configured from the environment.
    pub fn new() -> Result<ApiClient, ApiError> {
        Self::with_base_url(&CONFIG.api_base_url, CONFIG.request_timeout)
    }

    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<ApiClient, ApiError> {
        let user_agent = format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        let client = reqwest::ClientBuilder::new()
            .user_agent(user_agent)
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(ApiError::Client)?;
        Ok(ApiClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn get_contracts(&self) -> Result<Vec<ContractRecord>, ApiError> {
        let list: ContractList = self.get("/contract").await?;
        Ok(list.contracts.into_iter().map(ContractRecord::from).collect())
    }

    pub async fn get_info(&self) -> Result<Info, ApiError> {
        self.get("/info").await
    }

    pub async fn get_latest_micropayment(
        &self,
        agreement_id: &str,
    ) -> Result<LatestMicropayment, ApiError> {
        self.get(&format!("/agreement/{}/latestmicropayment", agreement_id))
            .await
    }
}

/// Private methods

impl ApiClient {
    async fn get<T>(&self, path: &str) -> Result<T, ApiError>
    where
        T: serde::de::DeserializeOwned,
    {
        self.request(Method::GET, path).await
    }

    async fn request<T>(&self, method: Method, path: &str) -> Result<T, ApiError>
    where
        T: serde::de::DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let response = self.client.request(method.clone(), &url).send().await?;
        let status = response.status();
        debug!("{} {} {}", status.as_u16(), method, path);
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ApiError::Status {
                status,
                method,
                path: path.to_string(),
                body,
            });
        }
        serde_json::from_str(&body).map_err(|e| {
            error!("Unable to parse response as json: {}\nbody: {}", e, body);
            ApiError::Malformed {
                path: path.to_string(),
                source: e,
            }
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use axum::{http::StatusCode, routing::get, Json, Router};
    use serde_json::json;

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client(base_url: &str) -> ApiClient {
        ApiClient::with_base_url(base_url, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_get_contracts() {
        let app = Router::new().route(
            "/contract",
            get(|| async {
                Json(json!({
                    "contracts": [
                        {"name": "SDR", "agreement_accepted_time": 1000},
                        {"name": "citygram", "current_agreement_id": "abc"}
                    ]
                }))
            }),
        );
        let base_url = serve(app).await;
        let contracts = client(&base_url).get_contracts().await.unwrap();
        assert_eq!(contracts.len(), 2);
        assert_eq!(contracts[0].name, "SDR");
        assert_eq!(contracts[0].accepted_time, 1000);
        assert_eq!(contracts[1].agreement_id, "abc");
    }

    #[tokio::test]
    async fn test_get_info_and_micropayment() {
        let app = Router::new()
            .route(
                "/info",
                get(|| async { Json(json!({"geth": {"eth_accounts": ["0xfeed"]}})) }),
            )
            .route(
                "/agreement/{id}/latestmicropayment",
                get(|| async {
                    Json(json!({"agreement_id": "abc", "payment_time": 5, "payment_value": 42}))
                }),
            );
        let base_url = serve(app).await;
        let api = client(&base_url);
        let info = api.get_info().await.unwrap();
        assert_eq!(info.account(), Some("0xfeed".to_string()));
        let payment = api.get_latest_micropayment("abc").await.unwrap();
        assert_eq!(payment.payment_value, 42);
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let app = Router::new().route(
            "/contract",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "offline") }),
        );
        let base_url = serve(app).await;
        let err = client(&base_url).get_contracts().await.unwrap_err();
        match &err {
            ApiError::Status { status, body, .. } => {
                assert_eq!(status.as_u16(), 503);
                assert_eq!(body, "offline");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(err.to_string(), "GET /contract returned 503: offline");
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let app = Router::new().route("/contract", get(|| async { "<html>not json</html>" }));
        let base_url = serve(app).await;
        let err = client(&base_url).get_contracts().await.unwrap_err();
        assert!(matches!(err, ApiError::Malformed { .. }));
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let err = client(&format!("http://{}", addr))
            .get_contracts()
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));
    }
}
