use crate::client_info;
use crate::error::ApiError;
use crate::format;
use crate::search_log::{SearchLog, SearchLogRecord};
use crate::types::*;
use crate::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        ConnectInfo, Query, State,
    },
    http::HeaderMap,
    response::{Html, Json},
};
use regex::Regex;
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use tracing::{error, info, warn};

const INDEX_HTML: &str = include_str!("../static/index.html");

pub const DEFAULT_LOG_LIMIT: usize = 50;
pub const MAX_LOG_LIMIT: usize = 500;

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        serpapi_configured: state.serpapi.is_configured(),
    })
}

pub async fn search_handler(
    State(state): State<Arc<AppState>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<OsintResults>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::InvalidBody(e.body_text()))?;
    if request.query.trim().is_empty() {
        return Err(ApiError::EmptyQuery);
    }
    let country = normalize_country(&request.country)?;

    let client_ip = client_info::client_ip(
        &headers,
        connect_info.map(|ConnectInfo(addr)| addr),
        state.trust_proxy_headers,
    );
    let user_agent = client_info::user_agent(&headers);
    info!("Search request from {}: {}", client_ip, request.query);

    // Stamped on arrival, before the upstream round trip.
    let mut record = SearchLogRecord::new(client_ip, user_agent, request.query.as_str(), country.as_str());

    let (outcome, ip_country) = tokio::join!(
        state.serpapi.search(&request.query, &country),
        state.geo.country_for(&record.client_ip)
    );
    record.ip_country = ip_country;

    let result = match outcome {
        Ok(raw) => {
            let results = format::format_results(&request.query, &country, raw);
            record.result_count = format::result_count(&results) as i64;
            record.total_results = format::total_results(&results);
            record.search_time = format::search_time(&results);
            info!("Search returned {} organic results", record.result_count);
            Ok(Json(results))
        }
        Err(e) => {
            let err = ApiError::from(e);
            record.status = err.status().as_u16();
            record.error = Some(err.to_string());
            Err(err)
        }
    };

    store_record(Arc::clone(&state.search_log), record).await;
    result
}

pub async fn recent_logs(
    State(state): State<Arc<AppState>>,
    params: Result<Query<LogsQuery>, QueryRejection>,
) -> Result<Json<Vec<SearchLogRecord>>, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::InvalidQuery(e.body_text()))?;
    let limit = params.limit.unwrap_or(DEFAULT_LOG_LIMIT).clamp(1, MAX_LOG_LIMIT);
    let log = Arc::clone(&state.search_log);
    let records = tokio::task::spawn_blocking(move || log.recent(limit))
        .await
        .map_err(|e| ApiError::Internal(format!("log reader panicked: {}", e)))??;
    Ok(Json(records))
}

/// Write failures are logged and never change the client's response.
async fn store_record(log: Arc<SearchLog>, record: SearchLogRecord) {
    let id = record.id.clone();
    match tokio::task::spawn_blocking(move || log.append(&record)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("Failed to write search log record {}: {}", id, e),
        Err(e) => error!("Search log writer panicked for record {}: {}", id, e),
    }
}

/// Lower-cased two-letter locale code; blank means the default `us`.
fn normalize_country(raw: &str) -> Result<String, ApiError> {
    static COUNTRY_CODE: OnceLock<Regex> = OnceLock::new();
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok("us".to_string());
    }
    let code = trimmed.to_ascii_lowercase();
    let re = COUNTRY_CODE.get_or_init(|| Regex::new(r"^[a-z]{2}$").expect("valid regex"));
    if re.is_match(&code) {
        Ok(code)
    } else {
        warn!("Rejected country code {:?}", raw);
        Err(ApiError::InvalidCountry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn country_codes_are_normalized() {
        assert_eq!(normalize_country("US").unwrap(), "us");
        assert_eq!(normalize_country(" gb ").unwrap(), "gb");
        assert_eq!(normalize_country("").unwrap(), "us");
    }

    #[test]
    fn malformed_country_codes_are_rejected() {
        for raw in ["usa", "u", "1a", "u&s"] {
            assert!(matches!(normalize_country(raw), Err(ApiError::InvalidCountry)));
        }
    }
}
