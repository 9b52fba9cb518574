//! Normalized node hardware usage.
//!
//! Every telemetry source, whatever its wire format, is converted into
//! [`NodeUsage`] before it leaves the aggregator.

use serde::{Deserialize, Serialize};

/// Hardware usage of one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeUsage {
    /// Address the node was probed at.
    pub ip: String,
    /// CPU usage.
    pub cpu: CpuUsage,
    /// Memory usage.
    pub memory: MemoryUsage,
    /// Disk usage summed across filesystems.
    pub disk: DiskSummary,
    /// Pods on the node. Always empty; kept for response compatibility.
    #[serde(default)]
    pub pods: Vec<String>,
}

/// CPU usage as a fraction of capacity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CpuUsage {
    /// Busy fraction, `0.0..=1.0` per core.
    pub percentage: f64,
}

/// Memory usage in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MemoryUsage {
    /// Total bytes.
    pub total: u64,
    /// Used bytes.
    pub used: u64,
    /// Used fraction.
    pub percentage: f64,
}

/// Disk usage summed across all counted filesystems.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskSummary {
    /// Filesystem names joined with `+`.
    pub name: String,
    /// Total bytes.
    pub total: u64,
    /// Used bytes.
    pub used: u64,
    /// `used / total`, or `0.0` when nothing was counted.
    pub percentage: f64,
    /// Per-filesystem breakdown.
    pub list: Vec<DiskUsage>,
}

/// Usage of a single filesystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskUsage {
    /// Mount point or device path.
    pub name: String,
    /// Total bytes.
    pub total: u64,
    /// Used bytes.
    pub used: u64,
    /// Free bytes, when the source reports them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub free: Option<u64>,
    /// Used fraction.
    pub percentage: f64,
}

impl DiskSummary {
    /// Sum a list of filesystems into one summary.
    #[must_use]
    pub fn from_disks(list: Vec<DiskUsage>) -> Self {
        let total: u64 = list.iter().map(|d| d.total).sum();
        let used: u64 = list.iter().map(|d| d.used).sum();
        let name = list
            .iter()
            .map(|d| d.name.as_str())
            .collect::<Vec<_>>()
            .join("+");

        Self {
            name,
            total,
            used,
            percentage: ratio(used, total),
            list,
        }
    }
}

/// `part / whole` as a float, `0.0` when `whole` is zero.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn ratio(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}
