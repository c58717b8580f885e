use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::CatalogConfig;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Catalog API key is not configured")]
    MissingApiKey,
    #[error("Catalog request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Catalog login returned HTTP {0}")]
    Status(u16),
    #[error("Catalog login response contained no token")]
    MissingToken,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    apikey: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pin: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    data: Option<LoginData>,
}

#[derive(Debug, Deserialize)]
struct LoginData {
    #[serde(default)]
    token: Option<String>,
}

/// Client for the TheTVDB v4 API. Only the token exchange is used here;
/// callers take the token and talk to the catalog themselves.
#[derive(Clone)]
pub struct CatalogClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    pin: Option<String>,
}

impl CatalogClient {
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            pin: config.pin.clone(),
        })
    }

    pub async fn login(&self) -> Result<String, CatalogError> {
        let apikey = self.api_key.as_deref().ok_or(CatalogError::MissingApiKey)?;
        let url = format!("{}/login", self.base_url);

        debug!("Requesting catalog token from {}", url);

        let response = self
            .client
            .post(&url)
            .json(&LoginRequest {
                apikey,
                pin: self.pin.as_deref(),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status(status.as_u16()));
        }

        let body: LoginResponse = response.json().await?;
        body.data
            .and_then(|d| d.token)
            .filter(|t| !t.is_empty())
            .ok_or(CatalogError::MissingToken)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};

    /// Run a stand-in for the catalog API and return its base URL.
    pub(crate) async fn fake_catalog(status: StatusCode, body: Value) -> String {
        let app = Router::new().route(
            "/login",
            post(move |Json(req): Json<Value>| {
                let body = body.clone();
                async move {
                    if req["apikey"] != "test-key" {
                        return (StatusCode::UNAUTHORIZED, Json(json!({"status": "failure"})));
                    }
                    (status, Json(body))
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    pub(crate) fn client_for(base_url: &str, api_key: Option<&str>) -> CatalogClient {
        CatalogClient::new(&CatalogConfig {
            base_url: base_url.to_string(),
            api_key: api_key.map(|k| k.to_string()),
            pin: None,
            timeout: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_login() {
        let url = fake_catalog(
            StatusCode::OK,
            json!({"status": "success", "data": {"token": "abc.def"}}),
        )
        .await;
        let token = client_for(&url, Some("test-key")).login().await.unwrap();
        assert_eq!(token, "abc.def");
    }

    #[tokio::test]
    async fn test_login_missing_token() {
        let url = fake_catalog(StatusCode::OK, json!({"status": "success", "data": {}})).await;
        let err = client_for(&url, Some("test-key")).login().await.unwrap_err();
        assert!(matches!(err, CatalogError::MissingToken));
    }

    #[tokio::test]
    async fn test_login_rejected() {
        let url = fake_catalog(StatusCode::OK, json!({})).await;
        let err = client_for(&url, Some("wrong")).login().await.unwrap_err();
        assert!(matches!(err, CatalogError::Status(401)));
    }

    #[tokio::test]
    async fn test_login_without_key() {
        let err = client_for("http://127.0.0.1:9", None).login().await.unwrap_err();
        assert!(matches!(err, CatalogError::MissingApiKey));
    }
}
