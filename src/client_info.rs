use axum::http::{header, HeaderMap};
use std::net::{IpAddr, SocketAddr};

pub const UNKNOWN_IP: &str = "unknown";

/// Client address. With `trust_proxy` set: first `X-Forwarded-For` hop, then
/// `X-Real-IP`, then the peer. Otherwise only the peer address is used.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>, trust_proxy: bool) -> String {
    let peer_ip = || peer.map(|p| p.ip());
    if !trust_proxy {
        return peer_ip()
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| UNKNOWN_IP.to_string());
    }

    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(parse_ip);
    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_ip)
    };

    forwarded
        .or_else(real_ip)
        .or_else(peer_ip)
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| UNKNOWN_IP.to_string())
}

pub fn user_agent(headers: &HeaderMap) -> String {
    headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn parse_ip(raw: &str) -> Option<IpAddr> {
    raw.trim().parse().ok()
}
