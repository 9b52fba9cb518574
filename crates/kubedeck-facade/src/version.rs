//! Control-plane version probing and API surface selection.
//!
//! Resource kinds move between API groups as the control plane evolves.
//! [`SurfaceTable`] is an ordered list of `(kind, minor range) → surface`
//! rules; the first matching rule wins and everything else falls back to the
//! legacy surface. [`VersionResolver`] feeds it the minor version reported by
//! the cluster, degrading to a configured floor when the probe yields nothing.

use std::fmt;
use std::ops::RangeFrom;

use k8s_openapi::api::core::v1::Node;
use kube::api::{Api, ApiResource, GroupVersionKind, ListParams};
use serde::Serialize;
use tracing::{debug, warn};

use kubedeck_core::ResourceKind;

use crate::client::ClusterClient;
use crate::types::FacadeConfig;
use crate::Result;

/// The `group/version` a resource kind is served under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ApiSurface {
    group: &'static str,
    version: &'static str,
}

impl ApiSurface {
    /// `apps/v1`, the modern workload group.
    pub const APPS_V1: Self = Self::new("apps", "v1");

    /// `extensions/v1beta1`, the legacy group.
    pub const EXTENSIONS_V1BETA1: Self = Self::new("extensions", "v1beta1");

    /// Create a surface from its group and version.
    #[must_use]
    pub const fn new(group: &'static str, version: &'static str) -> Self {
        Self { group, version }
    }

    /// API group.
    #[must_use]
    pub const fn group(&self) -> &'static str {
        self.group
    }

    /// API version within the group.
    #[must_use]
    pub const fn version(&self) -> &'static str {
        self.version
    }

    /// The `apiVersion` string written into objects.
    #[must_use]
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.to_string()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    /// Dynamic API resource for `kind` under this surface.
    #[must_use]
    pub fn resource(&self, kind: ResourceKind) -> ApiResource {
        let gvk = GroupVersionKind::gvk(self.group, self.version, kind.api_kind());
        ApiResource::from_gvk_with_plural(&gvk, kind.plural())
    }
}

impl fmt::Display for ApiSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.api_version())
    }
}

/// One row of a [`SurfaceTable`].
#[derive(Debug, Clone)]
pub struct SurfaceRule {
    /// Resource kind the rule applies to.
    pub kind: ResourceKind,
    /// Minor versions the rule applies to.
    pub minors: RangeFrom<u32>,
    /// Surface selected when the rule matches.
    pub surface: ApiSurface,
}

impl SurfaceRule {
    fn matches(&self, kind: ResourceKind, minor: u32) -> bool {
        self.kind == kind && self.minors.contains(&minor)
    }
}

/// Ordered `(kind, minor range) → surface` rules with a legacy fallback.
#[derive(Debug, Clone)]
pub struct SurfaceTable {
    rules: Vec<SurfaceRule>,
    fallback: ApiSurface,
}

impl SurfaceTable {
    /// Create a table from explicit rules.
    #[must_use]
    pub fn new(rules: Vec<SurfaceRule>, fallback: ApiSurface) -> Self {
        Self { rules, fallback }
    }

    /// The standard table: deployments move to `apps/v1` from `modern_min_minor` on.
    #[must_use]
    pub fn standard(modern_min_minor: u32) -> Self {
        Self::new(
            vec![SurfaceRule {
                kind: ResourceKind::Deployment,
                minors: modern_min_minor..,
                surface: ApiSurface::APPS_V1,
            }],
            ApiSurface::EXTENSIONS_V1BETA1,
        )
    }

    /// Surface for `kind` at `minor`. First matching rule wins.
    #[must_use]
    pub fn select(&self, kind: ResourceKind, minor: u32) -> ApiSurface {
        self.rules
            .iter()
            .find(|rule| rule.matches(kind, minor))
            .map_or(self.fallback, |rule| rule.surface)
    }
}

/// Parse the minor version out of a version string.
///
/// Takes the leading digits of the second dot-separated component, so
/// `v1.20.4-gke.1` yields 20. Returns `None` when there are none.
#[must_use]
pub fn parse_minor(version: &str) -> Option<u32> {
    let component = version.split('.').nth(1)?;
    let end = component
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(component.len());
    component[..end].parse().ok()
}

/// Kubelet version of the first node in the cluster, if any.
pub(crate) async fn probe_kubelet_version(client: &ClusterClient) -> Result<Option<String>> {
    let nodes = client
        .call(|kube| async move {
            Api::<Node>::all(kube)
                .list(&ListParams::default().limit(1))
                .await
        })
        .await?;

    let version = nodes
        .items
        .into_iter()
        .next()
        .and_then(|node| node.status)
        .and_then(|status| status.node_info)
        .map(|info| info.kubelet_version);

    debug!(version = ?version, "Probed control-plane version");
    Ok(version)
}

/// Selects the API surface per resource kind from the cluster version.
#[derive(Debug, Clone)]
pub struct VersionResolver {
    table: SurfaceTable,
    floor_minor: u32,
}

impl VersionResolver {
    /// Create a resolver from an explicit table and floor.
    #[must_use]
    pub fn new(table: SurfaceTable, floor_minor: u32) -> Self {
        Self { table, floor_minor }
    }

    /// Create the standard resolver from façade configuration.
    #[must_use]
    pub fn from_config(config: &FacadeConfig) -> Self {
        Self::new(
            SurfaceTable::standard(config.modern_api_min_minor),
            config.version_floor_minor,
        )
    }

    /// The cluster's kubelet version, probed once per client.
    ///
    /// # Errors
    ///
    /// Returns an error if the node list cannot be read.
    pub async fn version(&self, client: &ClusterClient) -> Result<Option<String>> {
        client.kubelet_version().await
    }

    /// Minor version to select surfaces with. Never fails.
    pub async fn minor(&self, client: &ClusterClient) -> u32 {
        match self.version(client).await {
            Ok(Some(version)) => parse_minor(&version).unwrap_or_else(|| {
                warn!(version = %version, floor = self.floor_minor, "Unparseable version, using floor");
                self.floor_minor
            }),
            Ok(None) => {
                debug!(floor = self.floor_minor, "No nodes reported a version, using floor");
                self.floor_minor
            }
            Err(e) => {
                warn!(error = %e, floor = self.floor_minor, "Version probe failed, using floor");
                self.floor_minor
            }
        }
    }

    /// Surface for `kind` on the cluster behind `client`.
    pub async fn api_surface(&self, client: &ClusterClient, kind: ResourceKind) -> ApiSurface {
        let minor = self.minor(client).await;
        self.table.select(kind, minor)
    }

    /// Surface for `kind` at a known minor version.
    #[must_use]
    pub fn surface_for(&self, kind: ResourceKind, minor: u32) -> ApiSurface {
        self.table.select(kind, minor)
    }
}

impl Default for VersionResolver {
    fn default() -> Self {
        Self::from_config(&FacadeConfig::default())
    }
}
