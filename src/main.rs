use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, warn};

use osint_search::config::Config;
use osint_search::geo::GeoLocator;
use osint_search::search_log::SearchLog;
use osint_search::serpapi::SerpApiClient;
use osint_search::{build_router, AppState, RouterOptions};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;

    info!("Starting OSINT search server");
    info!("Search API endpoint: {}", config.serpapi_url);
    info!("Search log database: {}", config.database_path.display());
    if config.serpapi_key.is_none() {
        error!("SERPAPI_API_KEY not found in environment variables; searches will fail until it is set");
    }
    if !config.geoip_enabled {
        warn!("IP geolocation disabled");
    }

    // One client for all outbound calls
    let http_client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .user_agent(concat!("osint-search/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let serpapi = SerpApiClient::new(
        http_client.clone(),
        config.serpapi_url.clone(),
        config.serpapi_key.clone(),
        config.search_timeout,
    );
    let geo = if config.geoip_enabled {
        GeoLocator::new(http_client, config.geoip_url.clone())
    } else {
        GeoLocator::disabled()
    };
    let search_log = SearchLog::open(&config.database_path)?;

    if config.logs_endpoint_enabled {
        warn!("GET /logs is enabled and exposes the search log without authentication");
    }

    let state = Arc::new(
        AppState::new(serpapi, geo, search_log)
            .with_trusted_proxy_headers(config.trust_proxy_headers),
    );
    let app = build_router(state, &RouterOptions::from(&config));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("Listening on http://{}", config.bind_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutting down");
}
