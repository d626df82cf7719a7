use crate::search_log::SearchLogError;
use crate::serpapi::SerpApiError;
use crate::types::ErrorResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tracing::error;

/// Errors surfaced to the browser as `{"error": "..."}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Search query is required")]
    EmptyQuery,
    #[error("Invalid country code")]
    InvalidCountry,
    #[error("Invalid request body: {0}")]
    InvalidBody(String),
    #[error("Invalid query string: {0}")]
    InvalidQuery(String),
    #[error(transparent)]
    Search(#[from] SerpApiError),
    #[error("Search log unavailable: {0}")]
    Storage(#[from] SearchLogError),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::EmptyQuery
            | ApiError::InvalidCountry
            | ApiError::InvalidBody(_)
            | ApiError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            ApiError::Search(e) => match e {
                SerpApiError::InvalidApiKey => StatusCode::UNAUTHORIZED,
                SerpApiError::AccessDenied => StatusCode::FORBIDDEN,
                SerpApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
                SerpApiError::Timeout => StatusCode::GATEWAY_TIMEOUT,
                SerpApiError::MissingApiKey
                | SerpApiError::Upstream(_)
                | SerpApiError::Network(_)
                | SerpApiError::Decode(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Storage(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_errors_keep_their_status() {
        let cases = [
            (SerpApiError::InvalidApiKey, StatusCode::UNAUTHORIZED),
            (SerpApiError::AccessDenied, StatusCode::FORBIDDEN),
            (SerpApiError::RateLimited, StatusCode::TOO_MANY_REQUESTS),
            (SerpApiError::Timeout, StatusCode::GATEWAY_TIMEOUT),
            (SerpApiError::Upstream(503), StatusCode::INTERNAL_SERVER_ERROR),
            (SerpApiError::MissingApiKey, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn validation_errors_are_bad_requests() {
        assert_eq!(ApiError::EmptyQuery.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::EmptyQuery.to_string(), "Search query is required");
        assert_eq!(ApiError::InvalidCountry.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::InvalidQuery("bad limit".to_string()).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn response_body_is_error_json() {
        let resp = ApiError::from(SerpApiError::RateLimited).into_response();
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error, "Rate limit exceeded. Please try again later.");
    }
}
