//! Uniform, version-tolerant operations per resource kind.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{ConfigMap, Namespace, Node, Pod};
use kube::api::{
    Api, ApiResource, DeleteParams, DynamicObject, GroupVersionKind, ListParams, LogParams, Patch,
    PatchParams, PostParams,
};
use kube::core::ObjectList;
use kube::ResourceExt;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use kubedeck_core::{ResourceKind, DEFAULT_NAMESPACE};

use crate::attr::AttrPath;
use crate::canonical::{canonical_payload, canonicalize};
use crate::client::ClusterClient;
use crate::credential::ClientFactory;
use crate::types::{
    DaemonSetSummary, DeploymentSummary, FacadeConfig, IngressSummary, MetricsSource,
    NodeSummary, PodSummary, SourceUsage, POD_LOG_LIMIT_BYTES,
};
use crate::version::{ApiSurface, VersionResolver};
use crate::{FacadeError, Result};

/// JSON pointer to the first container's image in a workload object.
pub const FIRST_IMAGE_POINTER: &str = "/spec/template/spec/containers/0/image";

/// Entry point for every cluster operation.
///
/// A façade owns one [`ClusterClient`]; build one per request and drop it
/// afterwards.
pub struct ResourceFacade {
    client: ClusterClient,
    resolver: VersionResolver,
    config: FacadeConfig,
}

impl ResourceFacade {
    /// Create a façade over an existing client.
    #[must_use]
    pub fn new(client: ClusterClient, config: FacadeConfig) -> Self {
        Self {
            resolver: VersionResolver::from_config(&config),
            client,
            config,
        }
    }

    /// Resolve `credential` and create a façade for it.
    ///
    /// # Errors
    ///
    /// Returns [`FacadeError::Auth`] if the credential is empty or invalid.
    pub async fn connect(credential: &str, config: FacadeConfig) -> Result<Self> {
        let client = ClientFactory::build(credential).await?;
        Ok(Self::new(client, config))
    }

    /// The underlying client.
    #[must_use]
    pub fn client(&self) -> &ClusterClient {
        &self.client
    }

    /// The façade configuration.
    #[must_use]
    pub fn config(&self) -> &FacadeConfig {
        &self.config
    }

    /// Kubelet version of the first node, or `None` for an empty cluster.
    ///
    /// # Errors
    ///
    /// Returns an error if the node list cannot be read.
    pub async fn version(&self) -> Result<Option<String>> {
        self.resolver.version(&self.client).await
    }

    /// API surface `kind` is served under on this cluster.
    pub async fn api_surface(&self, kind: ResourceKind) -> ApiSurface {
        self.resolver.api_surface(&self.client, kind).await
    }

    // ------------------------------------------------------------------
    // Version-gated dynamic access
    // ------------------------------------------------------------------

    async fn resource(&self, kind: ResourceKind) -> ApiResource {
        let surface = self.api_surface(kind).await;
        debug!(kind = %kind, surface = %surface, "Selected API surface");
        surface.resource(kind)
    }

    pub(crate) async fn get_dynamic(
        &self,
        kind: ResourceKind,
        name: &str,
        namespace: &str,
    ) -> Result<DynamicObject> {
        let ar = self.resource(kind).await;
        let ar = &ar;
        self.client
            .call(|kube| async move {
                Api::<DynamicObject>::namespaced_with(kube, namespace, ar)
                    .get(name)
                    .await
            })
            .await
    }

    pub(crate) async fn list_dynamic(
        &self,
        kind: ResourceKind,
        namespace: Option<&str>,
    ) -> Result<ObjectList<DynamicObject>> {
        let ar = self.resource(kind).await;
        let ar = &ar;
        self.client
            .call(|kube| async move {
                let api = match namespace {
                    Some(ns) => Api::<DynamicObject>::namespaced_with(kube, ns, ar),
                    None => Api::<DynamicObject>::all_with(kube, ar),
                };
                api.list(&ListParams::default()).await
            })
            .await
    }

    pub(crate) async fn patch_dynamic(
        &self,
        kind: ResourceKind,
        name: &str,
        namespace: &str,
        patch: &Value,
    ) -> Result<DynamicObject> {
        let ar = self.resource(kind).await;
        let ar = &ar;
        self.client
            .call(|kube| async move {
                Api::<DynamicObject>::namespaced_with(kube, namespace, ar)
                    .patch(name, &PatchParams::default(), &Patch::Merge(patch))
                    .await
            })
            .await
    }

    // ------------------------------------------------------------------
    // Nodes and namespaces
    // ------------------------------------------------------------------

    /// List nodes with their cached images, system info, capacity and labels.
    ///
    /// # Errors
    ///
    /// Returns an error if the node list cannot be read.
    pub async fn list_nodes(&self) -> Result<Vec<NodeSummary>> {
        let nodes = self.nodes().await?;
        Ok(nodes.iter().map(node_summary).collect())
    }

    async fn nodes(&self) -> Result<Vec<Node>> {
        let list = self
            .client
            .call(|kube| async move { Api::<Node>::all(kube).list(&ListParams::default()).await })
            .await?;
        Ok(list.items)
    }

    /// Set or remove node labels. A `None` value removes the label.
    ///
    /// # Errors
    ///
    /// Returns [`FacadeError::NotFound`] if the node does not exist.
    pub async fn label_node(
        &self,
        node: &str,
        labels: &BTreeMap<String, Option<String>>,
    ) -> Result<Value> {
        let patch = json!({ "metadata": { "labels": labels } });
        let patch = &patch;
        let updated = self
            .client
            .call(|kube| async move {
                Api::<Node>::all(kube)
                    .patch(node, &PatchParams::default(), &Patch::Merge(patch))
                    .await
            })
            .await?;
        info!(node, labels = labels.len(), "Labelled node");
        Ok(canonicalize(&updated))
    }

    /// First `InternalIP` address of every node that reports one.
    ///
    /// # Errors
    ///
    /// Returns an error if the node list cannot be read.
    pub async fn node_internal_ips(&self) -> Result<Vec<String>> {
        let nodes = self.nodes().await?;
        Ok(nodes
            .iter()
            .filter_map(|node| {
                node.status
                    .as_ref()?
                    .addresses
                    .as_ref()?
                    .iter()
                    .find(|address| address.type_ == "InternalIP")
                    .map(|address| address.address.clone())
            })
            .collect())
    }

    /// Names of all namespaces.
    ///
    /// # Errors
    ///
    /// Returns an error if the namespace list cannot be read.
    pub async fn list_namespaces(&self) -> Result<Vec<String>> {
        let list = self
            .client
            .call(|kube| async move {
                Api::<Namespace>::all(kube)
                    .list(&ListParams::default())
                    .await
            })
            .await?;
        Ok(list.items.iter().map(ResourceExt::name_any).collect())
    }

    // ------------------------------------------------------------------
    // Pods
    // ------------------------------------------------------------------

    fn pods(kube: kube::Client, namespace: Option<&str>) -> Api<Pod> {
        match namespace {
            Some(ns) => Api::namespaced(kube, ns),
            None => Api::all(kube),
        }
    }

    /// List pods in `namespace`, or in every namespace when `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the pod list cannot be read.
    pub async fn list_pods(&self, namespace: Option<&str>) -> Result<Vec<PodSummary>> {
        let list = self
            .client
            .call(|kube| async move {
                Self::pods(kube, namespace)
                    .list(&ListParams::default())
                    .await
            })
            .await?;
        Ok(list.items.iter().map(pod_summary).collect())
    }

    /// Read one pod in canonical form.
    ///
    /// # Errors
    ///
    /// Returns [`FacadeError::NotFound`] if the pod does not exist.
    pub async fn read_pod(&self, name: &str, namespace: &str) -> Result<Value> {
        let pod = self
            .client
            .call(|kube| async move { Api::<Pod>::namespaced(kube, namespace).get(name).await })
            .await?;
        Ok(canonicalize(&pod))
    }

    /// Whether a pod exists.
    pub(crate) async fn pod_exists(&self, name: &str, namespace: &str) -> Result<bool> {
        let pod = self
            .client
            .call(|kube| async move { Api::<Pod>::namespaced(kube, namespace).get_opt(name).await })
            .await?;
        Ok(pod.is_some())
    }

    /// Fetch a pod's log, capped at 10 MiB.
    ///
    /// `since_seconds` takes precedence over `tail_lines` when both are set.
    ///
    /// # Errors
    ///
    /// Returns [`FacadeError::NotFound`] if the pod does not exist.
    pub async fn pod_logs(
        &self,
        name: &str,
        namespace: &str,
        tail_lines: Option<i64>,
        since_seconds: Option<i64>,
    ) -> Result<String> {
        let params = LogParams {
            tail_lines: if since_seconds.is_some() { None } else { tail_lines },
            since_seconds,
            limit_bytes: Some(POD_LOG_LIMIT_BYTES),
            pretty: true,
            ..LogParams::default()
        };
        let params = &params;
        self.client
            .call(|kube| async move {
                Api::<Pod>::namespaced(kube, namespace)
                    .logs(name, params)
                    .await
            })
            .await
    }

    /// Delete a pod so its controller recreates it.
    ///
    /// # Errors
    ///
    /// Returns [`FacadeError::NotFound`] if the pod does not exist.
    pub async fn delete_pod(&self, name: &str, namespace: &str) -> Result<bool> {
        self.client
            .call(|kube| async move {
                Api::<Pod>::namespaced(kube, namespace)
                    .delete(name, &DeleteParams::default())
                    .await
            })
            .await?;
        info!(pod = name, namespace, "Deleted pod for restart");
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Daemon sets
    // ------------------------------------------------------------------

    /// List daemon sets in `namespace`, or in every namespace when `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be read.
    pub async fn list_daemon_sets(&self, namespace: Option<&str>) -> Result<Vec<DaemonSetSummary>> {
        let list = self.list_dynamic(ResourceKind::DaemonSet, namespace).await?;
        Ok(list
            .items
            .iter()
            .map(|ds| DaemonSetSummary {
                name: ds.name_any(),
                namespace: ds.namespace().unwrap_or_default(),
                image: first_image(ds),
                desired: pointer_i64(ds, "/status/desiredNumberScheduled"),
                current: pointer_i64(ds, "/status/currentNumberScheduled"),
                template: canonical_spec(ds),
            })
            .collect())
    }

    /// Read one daemon set in canonical form.
    ///
    /// # Errors
    ///
    /// Returns [`FacadeError::NotFound`] if it does not exist.
    pub async fn read_daemon_set(&self, name: &str, namespace: &str) -> Result<Value> {
        let ds = self
            .get_dynamic(ResourceKind::DaemonSet, name, namespace)
            .await?;
        Ok(canonicalize(&ds))
    }

    // ------------------------------------------------------------------
    // Ingresses
    // ------------------------------------------------------------------

    /// List ingresses in `namespace`, or in every namespace when `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be read.
    pub async fn list_ingresses(&self, namespace: Option<&str>) -> Result<Vec<IngressSummary>> {
        let list = self.list_dynamic(ResourceKind::Ingress, namespace).await?;
        Ok(list.items.iter().map(ingress_summary).collect())
    }

    /// Read one ingress.
    ///
    /// # Errors
    ///
    /// Returns [`FacadeError::NotFound`] if it does not exist.
    pub async fn read_ingress(&self, name: &str, namespace: &str) -> Result<IngressSummary> {
        let ingress = self
            .get_dynamic(ResourceKind::Ingress, name, namespace)
            .await?;
        Ok(ingress_summary(&ingress))
    }

    // ------------------------------------------------------------------
    // Config maps
    // ------------------------------------------------------------------

    /// All config maps in `namespace`, canonical list form.
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be read.
    pub async fn list_config_maps(&self, namespace: &str) -> Result<Value> {
        let list = self
            .client
            .call(|kube| async move {
                Api::<ConfigMap>::namespaced(kube, namespace)
                    .list(&ListParams::default())
                    .await
            })
            .await?;
        Ok(canonicalize(&list))
    }

    /// Set one key of a config map, writing the whole data map back.
    ///
    /// A `None` value is written as `null`; the API server's merge semantics
    /// drop the key. A missing key is simply added.
    ///
    /// # Errors
    ///
    /// Returns [`FacadeError::NotFound`] if the config map does not exist.
    pub async fn patch_config_map(
        &self,
        name: &str,
        key: &str,
        value: Option<&str>,
        namespace: &str,
    ) -> Result<Value> {
        let current = self
            .client
            .call(|kube| async move {
                Api::<ConfigMap>::namespaced(kube, namespace)
                    .get(name)
                    .await
            })
            .await?;

        let mut data: Map<String, Value> = current
            .data
            .unwrap_or_default()
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect();
        data.insert(key.to_string(), value.map_or(Value::Null, Value::from));

        let patch = json!({ "data": data });
        let updated = self.merge_config_map(name, namespace, &patch).await?;
        info!(config_map = name, namespace, key, removed = value.is_none(), "Patched config map");
        Ok(canonicalize(&updated))
    }

    /// Merge `entries` into a config map's data. `None` values remove keys.
    ///
    /// # Errors
    ///
    /// Returns [`FacadeError::NotFound`] if the config map does not exist.
    pub async fn update_config_map(
        &self,
        name: &str,
        entries: &BTreeMap<String, Option<String>>,
        namespace: &str,
    ) -> Result<Value> {
        let patch = json!({ "data": entries });
        let updated = self.merge_config_map(name, namespace, &patch).await?;
        info!(config_map = name, namespace, keys = entries.len(), "Updated config map");
        Ok(canonicalize(&updated))
    }

    async fn merge_config_map(&self, name: &str, namespace: &str, patch: &Value) -> Result<ConfigMap> {
        self.client
            .call(|kube| async move {
                Api::<ConfigMap>::namespaced(kube, namespace)
                    .patch(name, &PatchParams::default(), &Patch::Merge(patch))
                    .await
            })
            .await
    }

    // ------------------------------------------------------------------
    // Deployments
    // ------------------------------------------------------------------

    /// List deployments in `namespace`, or in every namespace when `None`.
    ///
    /// Only namespaced listings carry the `template`.
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be read.
    pub async fn list_deployments(&self, namespace: Option<&str>) -> Result<Vec<DeploymentSummary>> {
        let list = self.list_dynamic(ResourceKind::Deployment, namespace).await?;
        Ok(list
            .items
            .iter()
            .map(|deploy| DeploymentSummary {
                name: deploy.name_any(),
                namespace: deploy.namespace().unwrap_or_default(),
                image: first_image(deploy),
                replicas: pointer_i64(deploy, "/spec/replicas"),
                desired: pointer_i64(deploy, "/spec/replicas"),
                current: pointer_i64(deploy, "/status/availableReplicas"),
                template: namespace.map(|_| canonical_spec(deploy)),
            })
            .collect())
    }

    /// Read one deployment in canonical form.
    ///
    /// # Errors
    ///
    /// Returns [`FacadeError::NotFound`] if it does not exist.
    pub async fn read_deployment(&self, name: &str, namespace: &str) -> Result<Value> {
        let deploy = self
            .get_dynamic(ResourceKind::Deployment, name, namespace)
            .await?;
        Ok(canonicalize(&deploy))
    }

    /// Patch the scale subresource. Returns the replica count the server reports.
    ///
    /// # Errors
    ///
    /// Returns [`FacadeError::NotFound`] if the deployment does not exist.
    pub async fn scale_deployment(&self, name: &str, namespace: &str, replicas: i32) -> Result<i32> {
        let ar = self.resource(ResourceKind::Deployment).await;
        let ar = &ar;
        let patch = json!({ "spec": { "replicas": replicas } });
        let patch = &patch;
        let scale = self
            .client
            .call(|kube| async move {
                Api::<DynamicObject>::namespaced_with(kube, namespace, ar)
                    .patch_scale(name, &PatchParams::default(), &Patch::Merge(patch))
                    .await
            })
            .await?;
        let applied = scale.spec.and_then(|spec| spec.replicas).unwrap_or(replicas);
        info!(deployment = name, namespace, replicas = applied, "Scaled deployment");
        Ok(applied)
    }

    /// Replace the whole deployment with its first container image changed.
    ///
    /// # Errors
    ///
    /// Returns [`FacadeError::NotFound`] if the deployment does not exist, or
    /// [`FacadeError::InvalidObject`] if it has no containers.
    pub async fn replace_deployment_image(
        &self,
        name: &str,
        namespace: &str,
        image: &str,
    ) -> Result<Value> {
        let ar = self.resource(ResourceKind::Deployment).await;
        let ar = &ar;
        let mut deploy = self
            .client
            .call(|kube| async move {
                Api::<DynamicObject>::namespaced_with(kube, namespace, ar)
                    .get(name)
                    .await
            })
            .await?;

        let previous = replace_first_image(&mut deploy, image)?;
        let deploy = &deploy;
        let replaced = self
            .client
            .call(|kube| async move {
                Api::<DynamicObject>::namespaced_with(kube, namespace, ar)
                    .replace(name, &PostParams::default(), deploy)
                    .await
            })
            .await?;
        info!(deployment = name, namespace, previous = %previous, image, "Replaced deployment");
        Ok(canonicalize(&replaced))
    }

    /// Overwrite or insert one attribute of a deployment and patch it.
    ///
    /// # Errors
    ///
    /// Returns [`FacadeError::InvalidArguments`] if the path does not resolve,
    /// or [`FacadeError::NotFound`] if the deployment does not exist.
    pub async fn set_deployment_attr(
        &self,
        path: &str,
        value: Value,
        name: &str,
        namespace: &str,
    ) -> Result<Value> {
        let path = AttrPath::parse(path)?;
        let deploy = self
            .get_dynamic(ResourceKind::Deployment, name, namespace)
            .await?;

        let mut object = serde_json::to_value(&deploy)
            .map_err(|e| FacadeError::InvalidObject(e.to_string()))?;
        path.assign(&mut object, value)?;

        let patch = path.root_patch(&object);
        let updated = self
            .patch_dynamic(ResourceKind::Deployment, name, namespace, &patch)
            .await?;
        info!(deployment = name, namespace, path = %path, "Set deployment attribute");
        Ok(canonicalize(&updated))
    }

    // ------------------------------------------------------------------
    // Metrics
    // ------------------------------------------------------------------

    /// Current CPU and memory usage from the metrics API.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics API is unavailable.
    pub async fn source_status(&self, source: MetricsSource) -> Result<Vec<SourceUsage>> {
        let gvk = GroupVersionKind::gvk("metrics.k8s.io", "v1beta1", source.api_kind());
        let ar = ApiResource::from_gvk_with_plural(&gvk, source.plural());
        let ar = &ar;
        let list = self
            .client
            .call(|kube| async move {
                Api::<DynamicObject>::all_with(kube, ar)
                    .list(&ListParams::default())
                    .await
            })
            .await?;

        let usage_pointer = match source {
            MetricsSource::Nodes => "/usage",
            MetricsSource::Pods => "/containers/0/usage",
        };
        Ok(list
            .items
            .iter()
            .map(|item| {
                let usage = item.data.pointer(usage_pointer);
                let quantity = |key: &str| {
                    usage
                        .and_then(|u| u.get(key))
                        .and_then(Value::as_str)
                        .map(str::to_string)
                };
                SourceUsage {
                    name: item.name_any(),
                    ns: item.namespace().unwrap_or_else(|| "Node".to_string()),
                    cpu: quantity("cpu"),
                    memory: quantity("memory"),
                }
            })
            .collect())
    }
}

/// First container image of a workload object.
pub(crate) fn first_image(object: &DynamicObject) -> Option<String> {
    object
        .data
        .pointer(FIRST_IMAGE_POINTER)
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Set the first container image, returning the previous one.
pub(crate) fn replace_first_image(object: &mut DynamicObject, image: &str) -> Result<String> {
    let name = object.name_any();
    let slot = object
        .data
        .pointer_mut(FIRST_IMAGE_POINTER)
        .ok_or_else(|| FacadeError::InvalidObject(format!("{name} has no container image")))?;
    let previous = slot.as_str().unwrap_or_default().to_string();
    *slot = Value::String(image.to_string());
    Ok(previous)
}

fn pointer_i64(object: &DynamicObject, pointer: &str) -> Option<i64> {
    object.data.pointer(pointer).and_then(Value::as_i64)
}

fn node_summary(node: &Node) -> NodeSummary {
    let status = node.status.as_ref();

    let image_list = status
        .and_then(|s| s.images.as_ref())
        .into_iter()
        .flatten()
        .filter_map(|image| {
            let names = image.names.as_ref()?;
            match names.as_slice() {
                [_, second] => Some(second.clone()),
                [first, ..] => Some(first.clone()),
                [] => None,
            }
        })
        .collect();

    let node_info = status
        .and_then(|s| s.node_info.as_ref())
        .map_or(Value::Null, canonicalize);

    let capacity = status
        .and_then(|s| s.capacity.as_ref())
        .map(|capacity| {
            capacity
                .iter()
                .map(|(k, q)| (k.clone(), q.0.clone()))
                .collect()
        })
        .unwrap_or_default();

    NodeSummary {
        name: node.name_any(),
        image_list,
        node_info,
        capacity,
        labels: node.labels().clone(),
    }
}

fn pod_summary(pod: &Pod) -> PodSummary {
    let status = pod.status.as_ref();
    let first = status
        .and_then(|s| s.container_statuses.as_ref())
        .and_then(|statuses| statuses.first());

    PodSummary {
        name: pod.name_any(),
        namespace: pod
            .namespace()
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string()),
        node_name: pod.spec.as_ref().and_then(|s| s.node_name.clone()),
        host_ip: status.and_then(|s| s.host_ip.clone()),
        pod_ip: status.and_then(|s| s.pod_ip.clone()),
        start_time: status
            .and_then(|s| s.start_time.as_ref())
            .and_then(|t| canonicalize(t).as_str().map(str::to_string)),
        phase: status.and_then(|s| s.phase.clone()),
        ready: first.map_or(true, |c| c.ready),
        restart_count: first.map_or(0, |c| c.restart_count),
        image: first.map(|c| c.image.clone()),
    }
}

fn ingress_summary(ingress: &DynamicObject) -> IngressSummary {
    IngressSummary {
        name: ingress.name_any(),
        namespace: ingress.namespace().unwrap_or_default(),
        annotations: ingress.annotations().clone(),
        spec: canonical_spec(ingress),
    }
}

fn canonical_spec(object: &DynamicObject) -> Value {
    object.data.get("spec").map_or(Value::Null, canonical_payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{ContainerImage, ContainerStatus, NodeStatus, PodStatus};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    fn deployment(image: Option<&str>) -> DynamicObject {
        let containers = image.map_or_else(|| json!([]), |i| json!([{"name": "app", "image": i}]));
        DynamicObject {
            types: None,
            metadata: ObjectMeta {
                name: Some("api".to_string()),
                namespace: Some("prod".to_string()),
                ..Default::default()
            },
            data: json!({"spec": {"replicas": 2, "template": {"spec": {"containers": containers}}}}),
        }
    }

    #[test]
    fn first_image_reads_index_zero() {
        assert_eq!(first_image(&deployment(Some("api:1.0"))).as_deref(), Some("api:1.0"));
        assert_eq!(first_image(&deployment(None)), None);
    }

    #[test]
    fn replace_first_image_returns_previous() {
        let mut deploy = deployment(Some("api:1.0"));
        let previous = replace_first_image(&mut deploy, "api:2.0").unwrap();
        assert_eq!(previous, "api:1.0");
        assert_eq!(first_image(&deploy).as_deref(), Some("api:2.0"));

        let mut empty = deployment(None);
        assert!(matches!(
            replace_first_image(&mut empty, "api:2.0"),
            Err(FacadeError::InvalidObject(_))
        ));
    }

    #[test]
    fn node_image_alias_prefers_second_of_two() {
        let node = Node {
            metadata: ObjectMeta {
                name: Some("worker-1".to_string()),
                ..Default::default()
            },
            spec: None,
            status: Some(NodeStatus {
                images: Some(vec![
                    ContainerImage {
                        names: Some(vec!["repo@sha256:abc".to_string(), "repo:1.0".to_string()]),
                        size_bytes: None,
                    },
                    ContainerImage {
                        names: Some(vec![
                            "a@sha256:1".to_string(),
                            "a:1".to_string(),
                            "a:latest".to_string(),
                        ]),
                        size_bytes: None,
                    },
                ]),
                ..Default::default()
            }),
        };
        let summary = node_summary(&node);
        assert_eq!(summary.name, "worker-1");
        assert_eq!(summary.image_list, vec!["repo:1.0", "a@sha256:1"]);
        assert_eq!(summary.node_info, Value::Null);
        assert!(summary.labels.is_empty());
    }

    #[test]
    fn pods_without_statuses_use_fallbacks() {
        let pod = Pod {
            metadata: ObjectMeta {
                name: Some("web-0".to_string()),
                namespace: Some("prod".to_string()),
                ..Default::default()
            },
            spec: None,
            status: Some(PodStatus {
                phase: Some("Pending".to_string()),
                ..Default::default()
            }),
        };
        let summary = pod_summary(&pod);
        assert!(summary.ready);
        assert_eq!(summary.restart_count, 0);
        assert_eq!(summary.image, None);
        assert_eq!(summary.start_time, None);
        assert_eq!(summary.phase.as_deref(), Some("Pending"));
    }

    #[test]
    fn pods_report_first_container_status() {
        let pod = Pod {
            metadata: ObjectMeta::default(),
            spec: None,
            status: Some(PodStatus {
                container_statuses: Some(vec![ContainerStatus {
                    name: "app".to_string(),
                    image: "app:3".to_string(),
                    image_id: String::new(),
                    ready: false,
                    restart_count: 4,
                    ..Default::default()
                }]),
                ..Default::default()
            }),
        };
        let summary = pod_summary(&pod);
        assert!(!summary.ready);
        assert_eq!(summary.restart_count, 4);
        assert_eq!(summary.image.as_deref(), Some("app:3"));
    }
}
