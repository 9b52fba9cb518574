//! Probe for the per-node container-stats agent (cAdvisor).
//!
//! CPU usage is derived from the two most recent cumulative samples; memory
//! and disk come from the newest sample.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use kubedeck_core::usage::ratio;
use kubedeck_core::{CpuUsage, DiskSummary, DiskUsage, MemoryUsage, NodeUsage};

use crate::error::{Result, TelemetryError};
use crate::probe::{fetch_json, round6, ProbeTarget, UsageProbe};

/// Root container path on the stats agent.
pub const CONTAINERS_PATH: &str = "/api/v1.2/containers/";

/// Root container info as returned by the stats agent.
#[derive(Debug, Deserialize)]
pub struct ContainerInfo {
    spec: ContainerSpec,
    #[serde(default)]
    stats: Vec<ContainerStats>,
}

#[derive(Debug, Deserialize)]
struct ContainerSpec {
    memory: MemorySpec,
}

#[derive(Debug, Deserialize)]
struct MemorySpec {
    limit: u64,
}

#[derive(Debug, Deserialize)]
struct ContainerStats {
    timestamp: DateTime<Utc>,
    cpu: CpuStats,
    memory: MemoryStats,
    #[serde(default)]
    filesystem: Vec<FilesystemStats>,
}

#[derive(Debug, Deserialize)]
struct CpuStats {
    usage: CpuUsageStats,
}

#[derive(Debug, Deserialize)]
struct CpuUsageStats {
    total: u64,
}

#[derive(Debug, Deserialize)]
struct MemoryStats {
    working_set: u64,
}

#[derive(Debug, Deserialize)]
struct FilesystemStats {
    device: String,
    capacity: u64,
    usage: u64,
}

impl ContainerInfo {
    /// Normalize into the shared usage schema.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::Probe`] if fewer than two samples are
    /// present or they are not in increasing time order.
    #[allow(clippy::cast_precision_loss)]
    pub fn into_usage(self, ip: &str) -> Result<NodeUsage> {
        let [.., previous, latest] = self.stats.as_slice() else {
            return Err(TelemetryError::probe(
                ip,
                format!("malformed payload: {} stats samples", self.stats.len()),
            ));
        };

        let elapsed = (latest.timestamp - previous.timestamp)
            .num_nanoseconds()
            .filter(|ns| *ns > 0)
            .ok_or_else(|| TelemetryError::probe(ip, "malformed payload: samples not increasing"))?;
        let cpu_delta = latest.cpu.usage.total.saturating_sub(previous.cpu.usage.total);
        let cpu = round6(cpu_delta as f64 / elapsed as f64);

        let limit = self.spec.memory.limit;
        let working_set = latest.memory.working_set;

        let disks = latest
            .filesystem
            .iter()
            .filter(|fs| fs.device.starts_with('/'))
            .map(|fs| DiskUsage {
                name: fs.device.clone(),
                total: fs.capacity,
                used: fs.usage,
                free: None,
                percentage: round6(ratio(fs.usage, fs.capacity)),
            })
            .collect();
        let mut disk = DiskSummary::from_disks(disks);
        disk.percentage = round6(disk.percentage);

        Ok(NodeUsage {
            ip: ip.to_string(),
            cpu: CpuUsage { percentage: cpu },
            memory: MemoryUsage {
                total: limit,
                used: working_set,
                percentage: round6(ratio(working_set, limit)),
            },
            disk,
            pods: Vec::new(),
        })
    }
}

/// Probes the container-stats agent on each node.
#[derive(Debug, Clone)]
pub struct CadvisorProbe {
    http: reqwest::Client,
    port: u16,
    timeout: Duration,
}

impl CadvisorProbe {
    /// Create a probe against `port` on each node.
    #[must_use]
    pub fn new(http: reqwest::Client, port: u16, timeout: Duration) -> Self {
        Self {
            http,
            port,
            timeout,
        }
    }
}

#[async_trait]
impl UsageProbe for CadvisorProbe {
    async fn probe(&self, address: &str) -> Result<NodeUsage> {
        let url = ProbeTarget::parse(address).url(self.port, CONTAINERS_PATH);
        let info: ContainerInfo = fetch_json(&self.http, address, &url, self.timeout).await?;
        info.into_usage(address)
    }
}
