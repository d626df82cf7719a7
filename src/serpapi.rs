use reqwest::StatusCode;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Results requested per search.
pub const RESULTS_PER_PAGE: u32 = 10;

#[derive(Debug, thiserror::Error)]
pub enum SerpApiError {
    #[error("SERP API key is not configured")]
    MissingApiKey,
    #[error("Invalid SERP API key. Please check your API credentials.")]
    InvalidApiKey,
    #[error("Access denied. Your SERP API key may have insufficient permissions.")]
    AccessDenied,
    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,
    #[error("SERP API error: {0}")]
    Upstream(u16),
    #[error("Request timeout. The search service is taking too long to respond.")]
    Timeout,
    #[error("Network error: {0}")]
    Network(reqwest::Error),
    #[error("Failed to parse SERP API response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for SerpApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SerpApiError::Timeout
        } else {
            SerpApiError::Network(e)
        }
    }
}

/// Client for the Google engine of the search-results API.
#[derive(Clone, Debug)]
pub struct SerpApiClient {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: Option<Arc<String>>,
    timeout: Duration,
}

impl SerpApiClient {
    pub fn new(
        http_client: reqwest::Client,
        endpoint: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            http_client,
            endpoint: endpoint.into(),
            api_key: api_key.map(Arc::new),
            timeout,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Run one search and return the upstream JSON object unchanged.
    pub async fn search(&self, query: &str, country: &str) -> Result<Value, SerpApiError> {
        let api_key = self.api_key.as_ref().ok_or(SerpApiError::MissingApiKey)?;
        info!("Searching for: {} (gl={})", query, country);

        let num = RESULTS_PER_PAGE.to_string();
        let params = [
            ("q", query),
            ("api_key", api_key.as_str()),
            ("engine", "google"),
            ("gl", country),
            ("num", num.as_str()),
        ];

        let resp = self
            .http_client
            .get(&self.endpoint)
            .query(&params)
            .header("Accept", "application/json")
            .timeout(self.timeout)
            .send()
            .await?;

        let status = resp.status();
        debug!("SERP API responded with {}", status);
        match status {
            s if s.is_success() => {}
            StatusCode::UNAUTHORIZED => return Err(SerpApiError::InvalidApiKey),
            StatusCode::FORBIDDEN => return Err(SerpApiError::AccessDenied),
            StatusCode::TOO_MANY_REQUESTS => return Err(SerpApiError::RateLimited),
            s => return Err(SerpApiError::Upstream(s.as_u16())),
        }

        let body = resp.bytes().await?;
        let payload: Value =
            serde_json::from_slice(&body).map_err(|e| SerpApiError::Decode(e.to_string()))?;
        if !payload.is_object() {
            return Err(SerpApiError::Decode("expected a JSON object".to_string()));
        }
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_key_fails_without_network() {
        let client = SerpApiClient::new(
            reqwest::Client::new(),
            "http://127.0.0.1:9/search",
            None,
            Duration::from_secs(1),
        );
        assert!(!client.is_configured());
        let err = client.search("anything", "us").await.unwrap_err();
        assert!(matches!(err, SerpApiError::MissingApiKey));
    }

    #[test]
    fn error_messages_match_frontend_copy() {
        assert_eq!(SerpApiError::Upstream(502).to_string(), "SERP API error: 502");
        assert_eq!(
            SerpApiError::RateLimited.to_string(),
            "Rate limit exceeded. Please try again later."
        );
    }
}
