//! Gateway configuration types.

use std::time::Duration;

use serde::Deserialize;

use kubedeck_telemetry::DEFAULT_SIDECAR_PORT;

/// Configuration for the gateway service.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Listen address (e.g., "0.0.0.0:8080").
    #[serde(default = "GatewayConfig::default_listen_addr")]
    pub listen_addr: String,

    /// Allowed CORS origins.
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Extra hosts probed by `/statistics`, `host` or `host:port`.
    ///
    /// When empty, `/statistics` reads the container-stats agents instead.
    #[serde(default)]
    pub monitor_list: Vec<String>,

    /// Port of the hardware sidecar on every host.
    #[serde(default = "GatewayConfig::default_monitor_port")]
    pub monitor_port: u16,

    /// Maximum number of façade calls in flight.
    #[serde(default = "GatewayConfig::default_max_concurrent")]
    pub max_concurrent_requests: usize,

    /// Maximum request body size in bytes.
    #[serde(default = "GatewayConfig::default_max_body")]
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    #[serde(default = "GatewayConfig::default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl GatewayConfig {
    fn default_listen_addr() -> String {
        "0.0.0.0:8080".to_string()
    }

    const fn default_monitor_port() -> u16 {
        DEFAULT_SIDECAR_PORT
    }

    const fn default_max_concurrent() -> usize {
        32
    }

    const fn default_max_body() -> usize {
        1024 * 1024 // 1 MB
    }

    const fn default_request_timeout() -> u64 {
        60
    }

    /// Load configuration from environment variables.
    ///
    /// Supported environment variables:
    /// - `LISTEN_ADDR`
    /// - `CORS_ORIGINS`: comma-separated
    /// - `MONITOR_LIST`: comma-separated `host[:port]` entries
    /// - `MONITOR_PORT`
    /// - `MAX_CONCURRENT_REQUESTS`
    /// - `REQUEST_TIMEOUT_SECS`
    /// - `MAX_BODY_BYTES`
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("LISTEN_ADDR") {
            config.listen_addr = val;
        }
        if let Ok(val) = std::env::var("CORS_ORIGINS") {
            config.cors_origins = split_list(&val);
        }
        if let Ok(val) = std::env::var("MONITOR_LIST") {
            config.monitor_list = split_list(&val);
        }
        if let Ok(val) = std::env::var("MONITOR_PORT") {
            if let Ok(port) = val.parse() {
                config.monitor_port = port;
            }
        }
        if let Ok(val) = std::env::var("MAX_CONCURRENT_REQUESTS") {
            if let Ok(n) = val.parse::<usize>() {
                config.max_concurrent_requests = n.max(1);
            }
        }
        if let Ok(val) = std::env::var("REQUEST_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                config.request_timeout_seconds = secs;
            }
        }
        if let Ok(val) = std::env::var("MAX_BODY_BYTES") {
            if let Ok(n) = val.parse() {
                config.max_body_bytes = n;
            }
        }

        config
    }

    /// Get the request timeout as a `Duration`.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: Self::default_listen_addr(),
            cors_origins: vec!["*".to_string()],
            monitor_list: Vec::new(),
            monitor_port: Self::default_monitor_port(),
            max_concurrent_requests: Self::default_max_concurrent(),
            max_body_bytes: Self::default_max_body(),
            request_timeout_seconds: Self::default_request_timeout(),
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
