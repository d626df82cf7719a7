//! IP-to-country lookup against an ip-api.com compatible endpoint.

use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;
use tracing::{debug, warn};

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Deserialize)]
struct GeoResponse {
    status: String,
    #[serde(rename = "countryCode", default)]
    country_code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Clone, Debug)]
pub struct GeoLocator {
    http_client: reqwest::Client,
    base_url: String,
    enabled: bool,
    // Misses are cached too so a failing address is not retried per request.
    cache: moka::future::Cache<IpAddr, Option<String>>,
}

impl GeoLocator {
    pub fn new(http_client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            enabled: true,
            cache: moka::future::Cache::builder()
                .max_capacity(10_000)
                .time_to_live(Duration::from_secs(60 * 60))
                .build(),
        }
    }

    /// A locator that never performs lookups.
    pub fn disabled() -> Self {
        let mut locator = Self::new(reqwest::Client::new(), "http://localhost");
        locator.enabled = false;
        locator
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// ISO 3166-1 alpha-2 country for `ip`, or `None` when it cannot be determined.
    pub async fn country_for(&self, ip: &str) -> Option<String> {
        if !self.enabled {
            return None;
        }
        let addr: IpAddr = ip.trim().parse().ok()?;
        if !is_public(&addr) {
            debug!("Skipping geolocation for non-public address {}", addr);
            return None;
        }
        if let Some(cached) = self.cache.get(&addr).await {
            return cached;
        }
        let country = self.fetch(addr).await;
        self.cache.insert(addr, country.clone()).await;
        country
    }

    async fn fetch(&self, addr: IpAddr) -> Option<String> {
        let url = format!("{}/{}", self.base_url, addr);
        let resp = match self
            .http_client
            .get(&url)
            .query(&[("fields", "status,countryCode,message")])
            .timeout(LOOKUP_TIMEOUT)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                warn!("Geolocation request for {} failed: {}", addr, e);
                return None;
            }
        };
        if !resp.status().is_success() {
            warn!("Geolocation lookup for {} returned {}", addr, resp.status());
            return None;
        }
        match resp.json::<GeoResponse>().await {
            Ok(body) if body.status == "success" => body
                .country_code
                .map(|c| c.trim().to_ascii_uppercase())
                .filter(|c| c.len() == 2),
            Ok(body) => {
                warn!(
                    "Geolocation lookup for {} failed: {}",
                    addr,
                    body.message.unwrap_or_else(|| body.status.clone())
                );
                None
            }
            Err(e) => {
                warn!("Failed to parse geolocation response for {}: {}", addr, e);
                None
            }
        }
    }
}

/// Whether an address is routable on the public internet.
pub fn is_public(addr: &IpAddr) -> bool {
    match addr {
        IpAddr::V4(v4) => is_public_v4(v4),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => is_public_v4(&v4),
            None => is_public_v6(v6),
        },
    }
}

fn is_public_v4(ip: &Ipv4Addr) -> bool {
    let [a, b, ..] = ip.octets();
    let shared = a == 100 && (64..=127).contains(&b);
    !(ip.is_private()
        || ip.is_loopback()
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_broadcast()
        || ip.is_documentation()
        || ip.is_multicast()
        || shared
        || a == 0
        || a >= 240)
}

fn is_public_v6(ip: &Ipv6Addr) -> bool {
    let first = ip.segments()[0];
    let unique_local = (first & 0xfe00) == 0xfc00;
    let link_local = (first & 0xffc0) == 0xfe80;
    let documentation = first == 0x2001 && ip.segments()[1] == 0x0db8;
    !(ip.is_loopback()
        || ip.is_unspecified()
        || ip.is_multicast()
        || unique_local
        || link_local
        || documentation)
}
