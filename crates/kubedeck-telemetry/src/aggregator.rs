//! Fan-out of usage probes over every known node.

use std::collections::HashSet;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use kubedeck_facade::ResourceFacade;

use crate::cadvisor::CadvisorProbe;
use crate::error::{Result, TelemetryError};
use crate::probe::UsageProbe;
use crate::sidecar::SidecarProbe;
use crate::types::{ProbeFailure, TelemetryConfig, TelemetryReport};

/// Where the addresses of cluster nodes come from.
#[async_trait]
pub trait NodeAddressSource: Send + Sync {
    /// Internal addresses of the cluster's nodes.
    ///
    /// # Errors
    ///
    /// Returns an error if the node list cannot be read.
    async fn node_addresses(&self) -> Result<Vec<String>>;
}

#[async_trait]
impl NodeAddressSource for ResourceFacade {
    async fn node_addresses(&self) -> Result<Vec<String>> {
        Ok(self.node_internal_ips().await?)
    }
}

/// A fixed address list, for hosts outside a cluster.
#[derive(Debug, Clone, Default)]
pub struct StaticAddresses(pub Vec<String>);

#[async_trait]
impl NodeAddressSource for StaticAddresses {
    async fn node_addresses(&self) -> Result<Vec<String>> {
        Ok(self.0.clone())
    }
}

/// Collects hardware usage from every node into one [`TelemetryReport`].
///
/// A failing probe never fails the aggregation; the node is dropped from
/// `nodes` and recorded in `failures`.
pub struct NodeTelemetryAggregator<'a> {
    source: &'a dyn NodeAddressSource,
    config: TelemetryConfig,
    http: reqwest::Client,
}

impl<'a> NodeTelemetryAggregator<'a> {
    /// Create an aggregator over `source`.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::Client`] if the HTTP client cannot be built.
    pub fn new(source: &'a dyn NodeAddressSource, config: TelemetryConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.probe_timeout)
            .build()
            .map_err(|e| TelemetryError::Client(e.to_string()))?;
        Ok(Self {
            source,
            config,
            http,
        })
    }

    /// The aggregator configuration.
    #[must_use]
    pub fn config(&self) -> &TelemetryConfig {
        &self.config
    }

    /// Probe the hardware sidecar on every cluster node plus `monitor_list`.
    ///
    /// Entries of `monitor_list` may carry their own `host:port`; everything
    /// else is probed on `port`.
    ///
    /// # Errors
    ///
    /// Returns an error only if the cluster node list cannot be read.
    pub async fn hard_usage(&self, monitor_list: &[String], port: u16) -> Result<TelemetryReport> {
        let cluster = self.source.node_addresses().await?;
        let addresses = union(cluster, monitor_list);
        let probe = SidecarProbe::new(self.http.clone(), port, self.config.probe_timeout);
        Ok(self.collect(&probe, addresses).await)
    }

    /// Probe the container-stats agent on every cluster node.
    ///
    /// # Errors
    ///
    /// Returns an error only if the cluster node list cannot be read.
    pub async fn node_info(&self) -> Result<TelemetryReport> {
        let addresses = union(self.source.node_addresses().await?, &[]);
        let probe = CadvisorProbe::new(
            self.http.clone(),
            self.config.cadvisor_port,
            self.config.cadvisor_timeout,
        );
        Ok(self.collect(&probe, addresses).await)
    }

    async fn collect(&self, probe: &dyn UsageProbe, addresses: Vec<String>) -> TelemetryReport {
        debug!(count = addresses.len(), "Probing nodes");

        let results: Vec<_> = stream::iter(addresses)
            .map(|address| async move {
                let result = probe.probe(&address).await;
                (address, result)
            })
            .buffer_unordered(self.config.max_concurrent_probes.max(1))
            .collect()
            .await;

        let mut report = TelemetryReport::default();
        for (address, result) in results {
            match result {
                Ok(usage) => {
                    info!(
                        ip = %usage.ip,
                        cpu = usage.cpu.percentage,
                        memory = usage.memory.percentage,
                        disk = usage.disk.percentage,
                        "Node usage"
                    );
                    report.nodes.push(usage);
                }
                Err(e) => {
                    warn!(address = %address, error = %e, "Node probe failed");
                    let reason = match e {
                        TelemetryError::Probe { reason, .. } => reason,
                        other => other.to_string(),
                    };
                    report.failures.push(ProbeFailure { address, reason });
                }
            }
        }

        report.nodes.sort_by(|a, b| a.ip.cmp(&b.ip));
        report.failures.sort_by(|a, b| a.address.cmp(&b.address));
        report
    }
}

/// Cluster addresses followed by extra hosts, first occurrence kept.
fn union(cluster: Vec<String>, extra: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    cluster
        .into_iter()
        .chain(extra.iter().cloned())
        .map(|address| address.trim().to_string())
        .filter(|address| !address.is_empty() && seen.insert(address.clone()))
        .collect()
}
