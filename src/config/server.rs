use std::{
    net::{IpAddr, Ipv4Addr},
    time::Duration,
};

use http::{HeaderName, HeaderValue, Method, header};
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Request body size limit in bytes.
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,

    /// Per-request deadline in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub cors: CorsConfig,

    /// Outbound client used to fetch Google's signing keys.
    #[serde(default)]
    pub http_client: HttpClientConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
            timeout_secs: default_timeout(),
            cors: CorsConfig::default(),
            http_client: HttpClientConfig::default(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

fn default_body_limit() -> usize {
    2 * 1024 * 1024 // experience content is rich-text JSON
}

fn default_timeout() -> u64 {
    30
}

/// Cross-origin access for the portal's browser frontend.
///
/// Methods and headers are fixed to what the API uses; only origins and
/// credentials are deployment-specific.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CorsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Frontend origins, e.g. `https://alumni.college.edu`. `["*"]` allows any.
    #[serde(default)]
    pub allowed_origins: Vec<String>,

    #[serde(default)]
    pub allow_credentials: bool,

    /// Preflight cache lifetime in seconds.
    #[serde(default = "default_cors_max_age")]
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_origins: Vec::new(),
            allow_credentials: false,
            max_age_secs: default_cors_max_age(),
        }
    }
}

const CORS_METHODS: [Method; 5] = [
    Method::GET,
    Method::POST,
    Method::PATCH,
    Method::DELETE,
    Method::OPTIONS,
];

impl CorsConfig {
    /// `None` when disabled. With no origins configured every cross-origin
    /// request is refused.
    pub fn into_layer(self) -> Option<CorsLayer> {
        if !self.enabled {
            return None;
        }

        let allow_origin = if self.allowed_origins.iter().any(|o| o == "*") {
            tracing::warn!("CORS allows any origin");
            AllowOrigin::any()
        } else {
            let origins: Vec<HeaderValue> = self
                .allowed_origins
                .iter()
                .filter_map(|origin| match origin.parse() {
                    Ok(value) => Some(value),
                    Err(_) => {
                        tracing::warn!(origin = %origin, "Skipping invalid CORS origin");
                        None
                    }
                })
                .collect();
            AllowOrigin::list(origins)
        };

        let layer = CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods(CORS_METHODS.to_vec())
            .allow_headers([
                header::CONTENT_TYPE,
                header::AUTHORIZATION,
                HeaderName::from_static("x-request-id"),
            ])
            .expose_headers([HeaderName::from_static("x-request-id")])
            .max_age(Duration::from_secs(self.max_age_secs));

        Some(if self.allow_credentials {
            layer.allow_credentials(true)
        } else {
            layer
        })
    }
}

fn default_true() -> bool {
    true
}

fn default_cors_max_age() -> u64 {
    3600
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpClientConfig {
    #[serde(default = "default_client_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_client_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_client_timeout(),
            connect_timeout_secs: default_client_connect_timeout(),
        }
    }
}

impl HttpClientConfig {
    pub fn build_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .user_agent(concat!("alumni-portal/", env!("CARGO_PKG_VERSION")))
            .build()
    }
}

fn default_client_timeout() -> u64 {
    10
}

fn default_client_connect_timeout() -> u64 {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_defaults() {
        let config = ServerConfig::default();
        assert!(config.host.is_unspecified());
        assert_eq!(config.port, 8080);
        assert_eq!(config.timeout_secs, 30);
        assert!(config.cors.enabled);
        assert!(config.cors.allowed_origins.is_empty());
    }

    #[test]
    fn test_http_client_partial_override() {
        let config: HttpClientConfig = toml::from_str("timeout_secs = 3").unwrap();
        assert_eq!(config.timeout_secs, 3);
        assert_eq!(config.connect_timeout_secs, 5);
        assert!(config.build_client().is_ok());
    }

    #[test]
    fn test_cors_layer_presence() {
        let disabled = CorsConfig {
            enabled: false,
            ..Default::default()
        };
        assert!(disabled.into_layer().is_none());

        let frontend = CorsConfig {
            allowed_origins: vec!["https://alumni.college.edu".into(), "not a url\n".into()],
            allow_credentials: true,
            ..Default::default()
        };
        assert!(frontend.into_layer().is_some());
    }
}
