//! Shared HTTP client and the transactions endpoint.

use finsight_core::{Credential, SessionContext, StoreError, Transaction};
use reqwest::header::AUTHORIZATION;
use reqwest::{RequestBuilder, StatusCode};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    /// `None` leaves every call unbounded; the transport decides when to give up.
    pub request_timeout: Option<Duration>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            request_timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not authenticated")]
    Unauthorized,
    #[error("request rejected with status {status}")]
    Rejected { status: u16 },
    #[error("transport error")]
    Transport(#[source] reqwest::Error),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) fn post(&self, path: &str) -> RequestBuilder {
        self.http.post(self.url(path))
    }

    pub(crate) fn get(&self, path: &str) -> RequestBuilder {
        self.http.get(self.url(path))
    }

    /// `GET /api/transactions` for the current session.
    pub async fn transactions(&self, session: &SessionContext) -> Result<Vec<Transaction>, ApiError> {
        let credential = session.get()?;
        let resp = with_bearer(self.get("/api/transactions"), credential.as_ref())
            .send()
            .await
            .map_err(ApiError::Transport)?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "transactions request rejected");
            return Err(ApiError::Rejected {
                status: status.as_u16(),
            });
        }

        let body = resp.text().await.map_err(ApiError::Transport)?;
        // an empty result set is serialized as `null`
        let txns: Option<Vec<Transaction>> =
            serde_json::from_str(&body).map_err(|e| ApiError::Malformed(e.to_string()))?;
        let txns = txns.unwrap_or_default();
        tracing::debug!(count = txns.len(), "fetched transactions");
        Ok(txns)
    }
}

/// Attach `Authorization: Bearer ..` when a credential exists; otherwise send without it.
pub(crate) fn with_bearer(req: RequestBuilder, credential: Option<&Credential>) -> RequestBuilder {
    match credential {
        Some(c) => req.header(AUTHORIZATION, c.bearer()),
        None => req,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let cfg = ApiConfig::new("http://localhost:8080/");
        assert_eq!(cfg.base_url, "http://localhost:8080");
        let api = ApiClient::new(&cfg).unwrap();
        assert_eq!(api.url("/api/login"), "http://localhost:8080/api/login");
    }

    #[test]
    fn test_default_has_no_timeout() {
        let cfg = ApiConfig::default();
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.request_timeout, None);
        let cfg = cfg.with_timeout(Duration::from_secs(5));
        assert_eq!(cfg.request_timeout, Some(Duration::from_secs(5)));
    }
}
