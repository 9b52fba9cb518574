//! Types for the façade crate.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Minor version from which deployments are served under `apps/v1`.
pub const MODERN_API_MIN_MINOR: u32 = 16;

/// Minor version assumed when the cluster version cannot be determined.
pub const VERSION_FLOOR_MINOR: u32 = 9;

/// Upper bound on the size of a fetched pod log.
pub const POD_LOG_LIMIT_BYTES: i64 = 10 * 1024 * 1024;

/// Configuration for the resource façade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacadeConfig {
    /// First minor version served with the modern deployment API group.
    pub modern_api_min_minor: u32,
    /// Minor version used when the version probe yields nothing usable.
    pub version_floor_minor: u32,
    /// Shell started inside a pod for interactive exec.
    pub exec_shell: String,
    /// How long to wait for output after each exec command, in milliseconds.
    pub exec_poll_ms: u64,
}

impl Default for FacadeConfig {
    fn default() -> Self {
        Self {
            modern_api_min_minor: MODERN_API_MIN_MINOR,
            version_floor_minor: VERSION_FLOOR_MINOR,
            exec_shell: "/bin/bash".to_string(),
            exec_poll_ms: 1000,
        }
    }
}

impl FacadeConfig {
    /// Load configuration from environment variables.
    ///
    /// Supported environment variables:
    /// - `KUBEDECK_MODERN_API_MIN_MINOR`: threshold for the `apps/v1` deployment API
    /// - `KUBEDECK_VERSION_FLOOR`: minor version assumed when probing fails
    /// - `KUBEDECK_EXEC_SHELL`: shell used for interactive exec
    /// - `KUBEDECK_EXEC_POLL_MS`: per-command output wait
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("KUBEDECK_MODERN_API_MIN_MINOR") {
            if let Ok(n) = val.parse() {
                config.modern_api_min_minor = n;
            }
        }
        if let Ok(val) = std::env::var("KUBEDECK_VERSION_FLOOR") {
            if let Ok(n) = val.parse() {
                config.version_floor_minor = n;
            }
        }
        if let Ok(val) = std::env::var("KUBEDECK_EXEC_SHELL") {
            if !val.trim().is_empty() {
                config.exec_shell = val;
            }
        }
        if let Ok(val) = std::env::var("KUBEDECK_EXEC_POLL_MS") {
            if let Ok(n) = val.parse() {
                config.exec_poll_ms = n;
            }
        }

        config
    }

    /// Per-command exec output wait as a `Duration`.
    #[must_use]
    pub fn exec_poll_timeout(&self) -> Duration {
        Duration::from_millis(self.exec_poll_ms)
    }
}

/// A node as reported by `list_nodes`.
#[derive(Debug, Clone, Serialize)]
pub struct NodeSummary {
    /// Node name.
    pub name: String,
    /// Images cached on the node.
    pub image_list: Vec<String>,
    /// Canonical system info (kubelet version, OS, runtime).
    pub node_info: Value,
    /// Capacity quantities keyed by resource name.
    pub capacity: BTreeMap<String, String>,
    /// Node labels.
    pub labels: BTreeMap<String, String>,
}

/// A pod as reported by the pod listings.
#[derive(Debug, Clone, Serialize)]
pub struct PodSummary {
    /// Object name.
    pub name: String,
    /// Namespace.
    pub namespace: String,
    /// Node the pod is scheduled on.
    pub node_name: Option<String>,
    /// IP of the hosting node.
    pub host_ip: Option<String>,
    /// Pod IP.
    pub pod_ip: Option<String>,
    /// Start time as `YYYY-MM-DD HH:MM:SS`.
    pub start_time: Option<String>,
    /// Lifecycle phase.
    pub phase: Option<String>,
    /// Readiness of the first container; `true` when no statuses are reported yet.
    pub ready: bool,
    /// Restarts of the first container; `0` when no statuses are reported yet.
    pub restart_count: i32,
    /// Image of the first container status.
    pub image: Option<String>,
}

/// A daemon set as reported by the daemon set listings.
#[derive(Debug, Clone, Serialize)]
pub struct DaemonSetSummary {
    /// Object name.
    pub name: String,
    /// Namespace.
    pub namespace: String,
    /// Image of the first container.
    pub image: Option<String>,
    /// Desired count.
    pub desired: Option<i64>,
    /// Current count.
    pub current: Option<i64>,
    /// Canonical spec.
    pub template: Value,
}

/// A deployment as reported by the deployment listings.
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentSummary {
    /// Object name.
    pub name: String,
    /// Namespace.
    pub namespace: String,
    /// Image of the first container.
    pub image: Option<String>,
    /// `spec.replicas` of the deployment.
    pub replicas: Option<i64>,
    /// Desired count.
    pub desired: Option<i64>,
    /// Current count.
    pub current: Option<i64>,
    /// Canonical spec; only present for namespaced listings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<Value>,
}

/// An ingress as reported by the ingress reads and listings.
#[derive(Debug, Clone, Serialize)]
pub struct IngressSummary {
    /// Object name.
    pub name: String,
    /// Namespace.
    pub namespace: String,
    /// Ingress annotations.
    pub annotations: BTreeMap<String, String>,
    /// Canonical ingress spec.
    pub spec: Value,
}

/// Which objects the metrics API is asked about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MetricsSource {
    /// Node metrics.
    #[default]
    Nodes,
    /// Pod metrics, first container.
    Pods,
}

impl MetricsSource {
    /// API kind of the metrics object.
    #[must_use]
    pub const fn api_kind(self) -> &'static str {
        match self {
            Self::Nodes => "NodeMetrics",
            Self::Pods => "PodMetrics",
        }
    }

    /// Plural path segment in the metrics API.
    #[must_use]
    pub const fn plural(self) -> &'static str {
        match self {
            Self::Nodes => "nodes",
            Self::Pods => "pods",
        }
    }
}

/// Current CPU and memory usage of a node or pod from the metrics API.
#[derive(Debug, Clone, Serialize)]
pub struct SourceUsage {
    /// Object name.
    pub name: String,
    /// Namespace, or `"Node"` for node metrics.
    pub ns: String,
    /// CPU quantity.
    #[serde(rename = "CPU")]
    pub cpu: Option<String>,
    /// Memory quantity.
    #[serde(rename = "Memory")]
    pub memory: Option<String>,
}

/// Output captured for one command sent over an exec channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutput {
    /// The command as written to the shell.
    pub command: String,
    /// Output read after the command, stdout followed by stderr.
    pub output: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facade_config_defaults() {
        let config = FacadeConfig::default();
        assert_eq!(config.modern_api_min_minor, 16);
        assert_eq!(config.version_floor_minor, 9);
        assert_eq!(config.exec_shell, "/bin/bash");
        assert_eq!(config.exec_poll_timeout(), Duration::from_secs(1));
    }

    #[test]
    fn metrics_source_paths() {
        assert_eq!(MetricsSource::Nodes.plural(), "nodes");
        assert_eq!(MetricsSource::Pods.api_kind(), "PodMetrics");
        let parsed: MetricsSource = serde_json::from_str("\"pods\"").unwrap();
        assert_eq!(parsed, MetricsSource::Pods);
    }

    #[test]
    fn deployment_summary_omits_missing_template() {
        let summary = DeploymentSummary {
            name: "api".to_string(),
            namespace: "default".to_string(),
            image: Some("api:1.0".to_string()),
            replicas: Some(2),
            desired: Some(2),
            current: None,
            template: None,
        };
        let json = serde_json::to_value(summary).unwrap();
        assert!(json.get("template").is_none());
        assert_eq!(json["current"], Value::Null);
    }
}
