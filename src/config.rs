use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_SERPAPI_URL: &str = "https://serpapi.com/search";
pub const DEFAULT_GEOIP_URL: &str = "http://ip-api.com/json";
pub const DEFAULT_DATABASE_PATH: &str = "search_logs.db";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:5000";
pub const DEFAULT_SEARCH_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// CORS origin policy for the browser front-end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedOrigins {
    Any,
    List(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub serpapi_key: Option<String>,
    pub serpapi_url: String,
    pub geoip_url: String,
    pub geoip_enabled: bool,
    pub database_path: PathBuf,
    pub bind_addr: SocketAddr,
    pub allowed_origins: AllowedOrigins,
    pub search_timeout: Duration,
    /// Serve the search log over `GET /logs`. Off unless explicitly enabled.
    pub logs_endpoint_enabled: bool,
    /// Take the client address from `X-Forwarded-For` / `X-Real-IP`.
    pub trust_proxy_headers: bool,
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup. Unset keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let serpapi_key = lookup("SERPAPI_API_KEY")
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        let serpapi_url = lookup("SERPAPI_URL").unwrap_or_else(|| DEFAULT_SERPAPI_URL.to_string());
        validate_url("SERPAPI_URL", &serpapi_url)?;

        let geoip_url = lookup("GEOIP_URL").unwrap_or_else(|| DEFAULT_GEOIP_URL.to_string());
        validate_url("GEOIP_URL", &geoip_url)?;

        let geoip_enabled = match lookup("GEOIP_ENABLED") {
            Some(v) => parse_bool("GEOIP_ENABLED", &v)?,
            None => true,
        };

        let logs_endpoint_enabled = match lookup("LOGS_ENDPOINT_ENABLED") {
            Some(v) => parse_bool("LOGS_ENDPOINT_ENABLED", &v)?,
            None => false,
        };

        let trust_proxy_headers = match lookup("TRUST_PROXY_HEADERS") {
            Some(v) => parse_bool("TRUST_PROXY_HEADERS", &v)?,
            None => false,
        };

        let database_path = PathBuf::from(
            lookup("DATABASE_PATH").unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string()),
        );

        let bind_raw = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.parse::<SocketAddr>().map_err(|e| ConfigError::Invalid {
            key: "BIND_ADDR",
            value: bind_raw.clone(),
            reason: e.to_string(),
        })?;

        let allowed_origins = parse_origins(
            &lookup("ALLOWED_ORIGINS").unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.to_string()),
        );

        let search_timeout = match lookup("SEARCH_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
                    key: "SEARCH_TIMEOUT_SECS",
                    value: raw.clone(),
                    reason: e.to_string(),
                })?;
                if secs == 0 {
                    return Err(ConfigError::Invalid {
                        key: "SEARCH_TIMEOUT_SECS",
                        value: raw,
                        reason: "must be greater than zero".to_string(),
                    });
                }
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_SEARCH_TIMEOUT_SECS),
        };

        Ok(Self {
            serpapi_key,
            serpapi_url,
            geoip_url,
            geoip_enabled,
            database_path,
            bind_addr,
            allowed_origins,
            search_timeout,
            logs_endpoint_enabled,
            trust_proxy_headers,
        })
    }
}

fn validate_url(key: &'static str, value: &str) -> Result<(), ConfigError> {
    url::Url::parse(value)
        .map(|_| ())
        .map_err(|e| ConfigError::Invalid {
            key,
            value: value.to_string(),
            reason: e.to_string(),
        })
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}

fn parse_origins(raw: &str) -> AllowedOrigins {
    let origins: Vec<String> = raw
        .split(',')
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .collect();
    if origins.iter().any(|o| o == "*") {
        AllowedOrigins::Any
    } else {
        AllowedOrigins::List(origins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_environment_is_empty() {
        let config = config_from(&[]).unwrap();
        assert!(config.serpapi_key.is_none());
        assert_eq!(config.serpapi_url, DEFAULT_SERPAPI_URL);
        assert_eq!(config.geoip_url, DEFAULT_GEOIP_URL);
        assert!(config.geoip_enabled);
        assert_eq!(config.database_path, PathBuf::from(DEFAULT_DATABASE_PATH));
        assert_eq!(config.bind_addr.port(), 5000);
        assert_eq!(
            config.allowed_origins,
            AllowedOrigins::List(vec!["http://localhost:5000".to_string()])
        );
        assert_eq!(config.search_timeout, Duration::from_secs(10));
        assert!(!config.logs_endpoint_enabled);
        assert!(!config.trust_proxy_headers);
    }

    #[test]
    fn log_endpoint_and_proxy_trust_are_opt_in() {
        let config = config_from(&[
            ("LOGS_ENDPOINT_ENABLED", "true"),
            ("TRUST_PROXY_HEADERS", "1"),
        ])
        .unwrap();
        assert!(config.logs_endpoint_enabled);
        assert!(config.trust_proxy_headers);
        assert!(config_from(&[("TRUST_PROXY_HEADERS", "sometimes")]).is_err());
    }

    #[test]
    fn blank_api_key_counts_as_unset() {
        let config = config_from(&[("SERPAPI_API_KEY", "   ")]).unwrap();
        assert!(config.serpapi_key.is_none());

        let config = config_from(&[("SERPAPI_API_KEY", "abc123")]).unwrap();
        assert_eq!(config.serpapi_key.as_deref(), Some("abc123"));
    }

    #[test]
    fn wildcard_origin_is_permissive() {
        let config = config_from(&[("ALLOWED_ORIGINS", "https://a.example, *")]).unwrap();
        assert_eq!(config.allowed_origins, AllowedOrigins::Any);
    }

    #[test]
    fn origin_list_is_trimmed() {
        let config =
            config_from(&[("ALLOWED_ORIGINS", " https://a.example ,https://b.example,")]).unwrap();
        assert_eq!(
            config.allowed_origins,
            AllowedOrigins::List(vec![
                "https://a.example".to_string(),
                "https://b.example".to_string()
            ])
        );
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(config_from(&[("BIND_ADDR", "not-an-addr")]).is_err());
        assert!(config_from(&[("SEARCH_TIMEOUT_SECS", "soon")]).is_err());
        assert!(config_from(&[("SEARCH_TIMEOUT_SECS", "0")]).is_err());
        assert!(config_from(&[("GEOIP_ENABLED", "maybe")]).is_err());
        assert!(config_from(&[("SERPAPI_URL", "::nope")]).is_err());
    }

    #[test]
    fn geoip_can_be_disabled() {
        let config = config_from(&[("GEOIP_ENABLED", "off")]).unwrap();
        assert!(!config.geoip_enabled);
    }
}
