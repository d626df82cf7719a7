pub mod client_info;
pub mod config;
pub mod error;
pub mod format;
pub mod geo;
pub mod handlers;
pub mod search_log;
pub mod serpapi;
pub mod types;

use axum::{
    http::{header, request, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use config::{AllowedOrigins, Config};
use geo::GeoLocator;
use search_log::SearchLog;
use serpapi::SerpApiClient;

pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub serpapi: SerpApiClient,
    pub geo: GeoLocator,
    pub search_log: Arc<SearchLog>,
    pub trust_proxy_headers: bool,
}

impl AppState {
    pub fn new(serpapi: SerpApiClient, geo: GeoLocator, search_log: SearchLog) -> Self {
        Self {
            serpapi,
            geo,
            search_log: Arc::new(search_log),
            trust_proxy_headers: false,
        }
    }

    pub fn with_trusted_proxy_headers(mut self, trust: bool) -> Self {
        self.trust_proxy_headers = trust;
        self
    }
}

#[derive(Debug, Clone)]
pub struct RouterOptions {
    pub allowed_origins: AllowedOrigins,
    pub logs_endpoint_enabled: bool,
}

impl From<&Config> for RouterOptions {
    fn from(config: &Config) -> Self {
        Self {
            allowed_origins: config.allowed_origins.clone(),
            logs_endpoint_enabled: config.logs_endpoint_enabled,
        }
    }
}

/// Routes for the search front-end and its JSON API.
pub fn build_router(state: Arc<AppState>, options: &RouterOptions) -> Router {
    let mut router = Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health_check))
        .route("/search", post(handlers::search_handler));
    if options.logs_endpoint_enabled {
        router = router.route("/logs", get(handlers::recent_logs));
    }
    router
        .layer(cors_layer(&options.allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub fn cors_layer(origins: &AllowedOrigins) -> CorsLayer {
    match origins {
        AllowedOrigins::Any => CorsLayer::permissive(),
        AllowedOrigins::List(list) => {
            let patterns = list.clone();
            CorsLayer::new()
                .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _: &request::Parts| {
                    origin
                        .to_str()
                        .map(|o| patterns.iter().any(|p| origin_matches(p, o)))
                        .unwrap_or(false)
                }))
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([header::CONTENT_TYPE])
        }
    }
}

/// Exact match, or a `scheme://*.domain` pattern matching any subdomain.
pub fn origin_matches(pattern: &str, origin: &str) -> bool {
    if pattern == origin {
        return true;
    }
    let Some((scheme, host_pattern)) = pattern.split_once("://") else {
        return false;
    };
    let Some(suffix) = host_pattern.strip_prefix("*.") else {
        return false;
    };
    let Some(host) = origin
        .strip_prefix(scheme)
        .and_then(|rest| rest.strip_prefix("://"))
    else {
        return false;
    };
    host.len() > suffix.len() + 1
        && host.ends_with(suffix)
        && host[..host.len() - suffix.len()].ends_with('.')
}
