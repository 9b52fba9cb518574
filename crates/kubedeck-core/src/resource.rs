//! Resource kinds and references.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Namespace used when a caller does not name one.
pub const DEFAULT_NAMESPACE: &str = "default";

/// A managed object category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Cluster node.
    Node,
    /// Namespace.
    Namespace,
    /// Pod.
    Pod,
    /// Daemon set.
    DaemonSet,
    /// Ingress.
    Ingress,
    /// Config map.
    ConfigMap,
    /// Deployment.
    Deployment,
}

impl ResourceKind {
    /// All kinds, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Node,
        Self::Namespace,
        Self::Pod,
        Self::DaemonSet,
        Self::Ingress,
        Self::ConfigMap,
        Self::Deployment,
    ];

    /// The `kind` field the API server uses for this resource.
    #[must_use]
    pub const fn api_kind(self) -> &'static str {
        match self {
            Self::Node => "Node",
            Self::Namespace => "Namespace",
            Self::Pod => "Pod",
            Self::DaemonSet => "DaemonSet",
            Self::Ingress => "Ingress",
            Self::ConfigMap => "ConfigMap",
            Self::Deployment => "Deployment",
        }
    }

    /// The plural path segment used in API URLs.
    #[must_use]
    pub const fn plural(self) -> &'static str {
        match self {
            Self::Node => "nodes",
            Self::Namespace => "namespaces",
            Self::Pod => "pods",
            Self::DaemonSet => "daemonsets",
            Self::Ingress => "ingresses",
            Self::ConfigMap => "configmaps",
            Self::Deployment => "deployments",
        }
    }

    /// Short lowercase name, as used in logs and error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Namespace => "namespace",
            Self::Pod => "pod",
            Self::DaemonSet => "daemonset",
            Self::Ingress => "ingress",
            Self::ConfigMap => "configmap",
            Self::Deployment => "deployment",
        }
    }

    /// Whether objects of this kind live inside a namespace.
    #[must_use]
    pub const fn is_namespaced(self) -> bool {
        !matches!(self, Self::Node | Self::Namespace)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == lowered || kind.plural() == lowered)
            .ok_or_else(|| CoreError::UnknownKind(s.to_string()))
    }
}

/// Identity of one cluster object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceRef {
    /// Object kind.
    pub kind: ResourceKind,
    /// Namespace; ignored for cluster-scoped kinds.
    pub namespace: String,
    /// Object name.
    pub name: String,
}

impl ResourceRef {
    /// Reference an object in the default namespace.
    #[must_use]
    pub fn new(kind: ResourceKind, name: impl Into<String>) -> Self {
        Self::namespaced(kind, DEFAULT_NAMESPACE, name)
    }

    /// Reference an object in an explicit namespace.
    #[must_use]
    pub fn namespaced(
        kind: ResourceKind,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.kind.is_namespaced() {
            write!(f, "{} {}/{}", self.kind, self.namespace, self.name)
        } else {
            write!(f, "{} {}", self.kind, self.name)
        }
    }
}
