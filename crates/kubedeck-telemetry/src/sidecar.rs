//! Probe for the per-host hardware sidecar.
//!
//! The sidecar answers `GET /` with CPU, memory and per-mount disk usage,
//! fractions already scaled to `0.0..=1.0`.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use kubedeck_core::{CpuUsage, DiskSummary, DiskUsage, MemoryUsage, NodeUsage};

use crate::error::Result;
use crate::probe::{fetch_json, ProbeTarget, UsageProbe};

/// Sidecar response body.
#[derive(Debug, Deserialize)]
pub struct SidecarPayload {
    #[serde(rename = "CPU")]
    cpu: SidecarCpu,
    #[serde(rename = "MEMORY")]
    memory: SidecarMemory,
    #[serde(rename = "DISK", default)]
    disk: BTreeMap<String, SidecarDisk>,
}

#[derive(Debug, Deserialize)]
struct SidecarCpu {
    usage: f64,
}

#[derive(Debug, Deserialize)]
struct SidecarMemory {
    total: u64,
    used: u64,
    percent: f64,
}

#[derive(Debug, Deserialize)]
struct SidecarDisk {
    total: u64,
    used: u64,
    #[serde(default)]
    free: Option<u64>,
    percent: f64,
}

impl SidecarPayload {
    /// Normalize into the shared usage schema.
    #[must_use]
    pub fn into_usage(self, ip: &str) -> NodeUsage {
        let disks = self
            .disk
            .into_iter()
            .map(|(mount, disk)| DiskUsage {
                name: mount,
                total: disk.total,
                used: disk.used,
                free: disk.free,
                percentage: disk.percent,
            })
            .collect();

        NodeUsage {
            ip: ip.to_string(),
            cpu: CpuUsage {
                percentage: self.cpu.usage,
            },
            memory: MemoryUsage {
                total: self.memory.total,
                used: self.memory.used,
                percentage: self.memory.percent,
            },
            disk: DiskSummary::from_disks(disks),
            pods: Vec::new(),
        }
    }
}

/// Probes the hardware sidecar on a fixed default port.
#[derive(Debug, Clone)]
pub struct SidecarProbe {
    http: reqwest::Client,
    port: u16,
    timeout: Duration,
}

impl SidecarProbe {
    /// Create a probe; addresses without a port use `port`.
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
impl UsageProbe for SidecarProbe {
    async fn probe(&self, address: &str) -> Result<NodeUsage> {
        let url = ProbeTarget::parse(address).url(self.port, "/");
        let payload: SidecarPayload = fetch_json(&self.http, address, &url, self.timeout).await?;
        Ok(payload.into_usage(address))
    }
}
