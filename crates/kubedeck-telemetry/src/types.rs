//! Configuration and report types for telemetry aggregation.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use kubedeck_core::NodeUsage;

use crate::error::TelemetryError;

/// Port the hardware sidecar listens on by default.
pub const DEFAULT_SIDECAR_PORT: u16 = 8000;

/// Port the container-stats agent listens on by default.
pub const DEFAULT_CADVISOR_PORT: u16 = 4194;

/// Configuration for telemetry probes.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Timeout for one sidecar probe.
    pub probe_timeout: Duration,
    /// Timeout for one container-stats probe.
    pub cadvisor_timeout: Duration,
    /// Port of the container-stats agent.
    pub cadvisor_port: u16,
    /// Maximum number of probes in flight at once.
    pub max_concurrent_probes: usize,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            probe_timeout: Duration::from_secs(5),
            cadvisor_timeout: Duration::from_secs(10),
            cadvisor_port: DEFAULT_CADVISOR_PORT,
            max_concurrent_probes: 16,
        }
    }
}

impl TelemetryConfig {
    /// Load configuration from environment variables.
    ///
    /// Supported environment variables:
    /// - `TELEMETRY_PROBE_TIMEOUT_SECS`: sidecar probe timeout
    /// - `TELEMETRY_CADVISOR_TIMEOUT_SECS`: container-stats probe timeout
    /// - `TELEMETRY_CADVISOR_PORT`: container-stats agent port
    /// - `TELEMETRY_MAX_CONCURRENT_PROBES`: fan-out bound
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("TELEMETRY_PROBE_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                config.probe_timeout = Duration::from_secs(secs);
            }
        }
        if let Ok(val) = std::env::var("TELEMETRY_CADVISOR_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                config.cadvisor_timeout = Duration::from_secs(secs);
            }
        }
        if let Ok(val) = std::env::var("TELEMETRY_CADVISOR_PORT") {
            if let Ok(port) = val.parse() {
                config.cadvisor_port = port;
            }
        }
        if let Ok(val) = std::env::var("TELEMETRY_MAX_CONCURRENT_PROBES") {
            if let Ok(n) = val.parse::<usize>() {
                config.max_concurrent_probes = n.max(1);
            }
        }

        config
    }
}

/// A probe that did not yield usage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeFailure {
    /// Address that was probed.
    pub address: String,
    /// Why the probe failed.
    pub reason: String,
}

/// Result of one aggregation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetryReport {
    /// Usage of every node that answered.
    pub nodes: Vec<NodeUsage>,
    /// Nodes that were dropped, with the reason.
    pub failures: Vec<ProbeFailure>,
}

impl TelemetryReport {
    /// Number of probes attempted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.nodes.len() + self.failures.len()
    }

    /// A [`TelemetryError::PartialOutage`] when any probe failed.
    #[must_use]
    pub fn partial_outage(&self) -> Option<TelemetryError> {
        if self.failures.is_empty() {
            None
        } else {
            Some(TelemetryError::PartialOutage {
                failed: self.failures.len(),
                total: self.total(),
            })
        }
    }
}
