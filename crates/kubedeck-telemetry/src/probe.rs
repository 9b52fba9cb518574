//! Probe targets and the probe seam.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use kubedeck_core::NodeUsage;

use crate::error::{Result, TelemetryError};

/// A probed host with an optional explicit port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTarget {
    host: String,
    port: Option<u16>,
}

impl ProbeTarget {
    /// Parse `host`, `host:port`, `[v6]` or `[v6]:port`.
    ///
    /// A bare IPv6 address without brackets is taken as a host with no port.
    #[must_use]
    pub fn parse(address: &str) -> Self {
        let address = address.trim();

        if let Some(rest) = address.strip_prefix('[') {
            if let Some((host, tail)) = rest.split_once(']') {
                let port = tail.strip_prefix(':').and_then(|p| p.parse().ok());
                return Self {
                    host: host.to_string(),
                    port,
                };
            }
        }

        match address.rsplit_once(':') {
            Some((host, port)) if !host.contains(':') => match port.parse() {
                Ok(port) => Self {
                    host: host.to_string(),
                    port: Some(port),
                },
                Err(_) => Self {
                    host: address.to_string(),
                    port: None,
                },
            },
            _ => Self {
                host: address.to_string(),
                port: None,
            },
        }
    }

    /// Host part.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Explicit port, if any.
    #[must_use]
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// `http://host:port{path}`, using `default_port` when no port was given.
    #[must_use]
    pub fn url(&self, default_port: u16, path: &str) -> String {
        let port = self.port.unwrap_or(default_port);
        if self.host.contains(':') {
            format!("http://[{}]:{port}{path}", self.host)
        } else {
            format!("http://{}:{port}{path}", self.host)
        }
    }
}

impl fmt::Display for ProbeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.host.contains(':'), self.port) {
            (true, Some(port)) => write!(f, "[{}]:{port}", self.host),
            (false, Some(port)) => write!(f, "{}:{port}", self.host),
            _ => f.write_str(&self.host),
        }
    }
}

/// A source of hardware usage for one node.
#[async_trait]
pub trait UsageProbe: Send + Sync {
    /// Probe `address` and normalize what it reports.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::Probe`] on timeout, connection failure,
    /// non-success status or a malformed payload.
    async fn probe(&self, address: &str) -> Result<NodeUsage>;
}

/// GET `url` within `timeout` and decode the JSON body.
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    http: &reqwest::Client,
    address: &str,
    url: &str,
    timeout: Duration,
) -> Result<T> {
    let response = http
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| TelemetryError::probe(address, describe(&e, timeout)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(TelemetryError::probe(address, format!("HTTP {status}")));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| TelemetryError::probe(address, describe(&e, timeout)))?;

    serde_json::from_slice(&body)
        .map_err(|e| TelemetryError::probe(address, format!("malformed payload: {e}")))
}

fn describe(err: &reqwest::Error, timeout: Duration) -> String {
    if err.is_timeout() {
        format!("timed out after {}ms", timeout.as_millis())
    } else if err.is_connect() {
        format!("connect error: {err}")
    } else {
        format!("request failed: {err}")
    }
}

/// Round to six decimal places.
pub(crate) fn round6(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_host() {
        let target = ProbeTarget::parse("10.0.0.5");
        assert_eq!(target.host(), "10.0.0.5");
        assert_eq!(target.port(), None);
        assert_eq!(target.url(8000, "/"), "http://10.0.0.5:8000/");
    }

    #[test]
    fn explicit_port_wins() {
        let target = ProbeTarget::parse("db-1.internal:9100");
        assert_eq!(target.host(), "db-1.internal");
        assert_eq!(target.port(), Some(9100));
        assert_eq!(target.url(8000, "/"), "http://db-1.internal:9100/");
        assert_eq!(target.to_string(), "db-1.internal:9100");
    }

    #[test]
    fn ipv6_forms() {
        let bare = ProbeTarget::parse("fe80::1");
        assert_eq!(bare.host(), "fe80::1");
        assert_eq!(bare.port(), None);
        assert_eq!(bare.url(4194, "/x"), "http://[fe80::1]:4194/x");

        let bracketed = ProbeTarget::parse("[fe80::1]:9000");
        assert_eq!(bracketed.host(), "fe80::1");
        assert_eq!(bracketed.port(), Some(9000));
        assert_eq!(bracketed.to_string(), "[fe80::1]:9000");
    }

    #[test]
    fn rounds_to_six_places() {
        assert!((round6(0.123_456_789) - 0.123_457).abs() < 1e-12);
        assert!((round6(1.0 / 3.0) - 0.333_333).abs() < 1e-12);
    }
}
