//! Named façade operations.
//!
//! Remote callers address operations as `{function_name, function_params}`.
//! [`Operation::from_call`] maps that pair onto a closed set of variants and
//! rejects unknown names before any cluster connection is made.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use kubedeck_core::DEFAULT_NAMESPACE;

use crate::facade::ResourceFacade;
use crate::ingress::IngressPatch;
use crate::types::MetricsSource;
use crate::{FacadeError, Result};

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

/// A namespace argument.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InNamespace {
    /// Namespace; defaults to `default`.
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

/// A named object in a namespace.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Target {
    /// Object name.
    pub name: String,
    /// Namespace; defaults to `default`.
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

/// Arguments of `label_node`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LabelNodeParams {
    /// Node name.
    pub node: String,
    /// Labels to set; `null` removes.
    pub label_dict: BTreeMap<String, Option<String>>,
}

/// Arguments of `patch_config_map`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PatchConfigMapParams {
    /// Config map name.
    pub name: String,
    /// Key to set.
    pub cm_key: String,
    /// New value; `null` deletes.
    #[serde(default)]
    pub cm_value: Option<String>,
    /// Namespace; defaults to `default`.
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

/// Arguments of `update_config_map`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpdateConfigMapParams {
    /// Config map name.
    pub name: String,
    /// Entries to merge; `null` removes.
    pub config_dict: BTreeMap<String, Option<String>>,
    /// Namespace; defaults to `default`.
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

/// Arguments of `read_namespaced_pod_log`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PodLogParams {
    /// Pod name.
    pub name: String,
    /// Namespace; defaults to `default`.
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Number of trailing lines.
    #[serde(default)]
    pub tail_lines: Option<i64>,
    /// Only lines newer than this many seconds; wins over `tail_lines`.
    #[serde(default)]
    pub since_seconds: Option<i64>,
}

/// Arguments of `patch_namespaced_ingress`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PatchIngressParams {
    /// Ingress name.
    pub name: String,
    /// Namespace; defaults to `default`.
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Host, location and backend.
    #[serde(flatten)]
    pub patch: IngressPatch,
}

/// Arguments of `set_new_version_by_deploy_list`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BulkImageParams {
    /// `{deployment: image}`.
    pub deploy_dict: BTreeMap<String, String>,
    /// Namespace; defaults to `default`.
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

/// Arguments of `set_new_version_by_deploy`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SetImageParams {
    /// Image to set.
    pub new_image: String,
    /// Deployment name.
    pub deploy_name: String,
    /// Namespace; defaults to `default`.
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

/// Arguments of `set_attr_by_deploy`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SetAttrParams {
    /// Dotted attribute path.
    pub attr: String,
    /// Value to write.
    pub attr_value: Value,
    /// Deployment name.
    pub deploy_name: String,
    /// Namespace; defaults to `default`.
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

/// Arguments of `set_new_version_by_image_name`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImageByNameParams {
    /// Namespace; defaults to `default`.
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// `name:tag` to roll out.
    pub new_image: String,
}

/// Arguments of `patch_namespaced_deployment_scale`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScaleParams {
    /// Deployment name.
    pub name: String,
    /// Namespace; defaults to `default`.
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Replica count.
    pub new_replicas: i32,
}

/// Arguments of the deployment image operations.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeploymentImageParams {
    /// Deployment name.
    pub name: String,
    /// Namespace; defaults to `default`.
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Image to set.
    pub new_image: String,
}

/// Arguments of `exec_command_on_pod`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExecParams {
    /// Commands, run in order.
    pub command_line: Vec<String>,
    /// Pod name.
    pub name: String,
    /// Namespace; defaults to `default`.
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

/// Arguments of `get_source_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SourceStatusParams {
    /// `nodes` or `pods`; defaults to `nodes`.
    #[serde(default)]
    pub source_type: MetricsSource,
}

/// One façade operation with decoded arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// `version`
    Version,
    /// `list_node`
    ListNodes,
    /// `label_node`
    LabelNode(LabelNodeParams),
    /// `list_config_map`
    ListConfigMaps(InNamespace),
    /// `patch_config_map`
    PatchConfigMap(PatchConfigMapParams),
    /// `update_config_map`
    UpdateConfigMap(UpdateConfigMapParams),
    /// `list_namespace`
    ListNamespaces,
    /// `list_pod_for_all_namespaces`
    ListAllPods,
    /// `list_namespaced_pod`
    ListPods(InNamespace),
    /// `read_namespaced_pod`
    ReadPod(Target),
    /// `read_namespaced_pod_log`
    PodLogs(PodLogParams),
    /// `delete_namespaced_pod`
    DeletePod(Target),
    /// `list_daemon_set_for_all_namespaces`
    ListAllDaemonSets,
    /// `list_namespaced_daemon_set`
    ListDaemonSets(InNamespace),
    /// `read_namespaced_daemon_set`
    ReadDaemonSet(Target),
    /// `list_ingress_for_all_namespaces`
    ListAllIngresses,
    /// `list_namespaced_ingress`
    ListIngresses(InNamespace),
    /// `read_namespaced_ingress`
    ReadIngress(Target),
    /// `patch_namespaced_ingress`
    PatchIngress(PatchIngressParams),
    /// `set_new_version_by_deploy_list`
    SetImagesBulk(BulkImageParams),
    /// `set_new_version_by_deploy`
    SetImage(SetImageParams),
    /// `set_attr_by_deploy`
    SetDeploymentAttr(SetAttrParams),
    /// `set_new_version_by_image_name`
    SetImageByName(ImageByNameParams),
    /// `list_namespaced_deployment`
    ListDeployments(InNamespace),
    /// `list_deployment_for_all_namespaces`
    ListAllDeployments,
    /// `read_namespaced_deployment`
    ReadDeployment(Target),
    /// `patch_namespaced_deployment_scale`
    ScaleDeployment(ScaleParams),
    /// `patch_namespaced_deployment_image`
    PatchDeploymentImage(DeploymentImageParams),
    /// `replace_namespaced_deployment`
    ReplaceDeployment(DeploymentImageParams),
    /// `exec_command_on_pod`
    ExecCommands(ExecParams),
    /// `get_source_status`
    SourceStatus(SourceStatusParams),
}

/// Every accepted operation name.
pub const OPERATION_NAMES: [&str; 31] = [
    "version",
    "list_node",
    "label_node",
    "list_config_map",
    "patch_config_map",
    "update_config_map",
    "list_namespace",
    "list_pod_for_all_namespaces",
    "list_namespaced_pod",
    "read_namespaced_pod",
    "read_namespaced_pod_log",
    "delete_namespaced_pod",
    "list_daemon_set_for_all_namespaces",
    "list_namespaced_daemon_set",
    "read_namespaced_daemon_set",
    "list_ingress_for_all_namespaces",
    "list_namespaced_ingress",
    "read_namespaced_ingress",
    "patch_namespaced_ingress",
    "set_new_version_by_deploy_list",
    "set_new_version_by_deploy",
    "set_attr_by_deploy",
    "set_new_version_by_image_name",
    "list_namespaced_deployment",
    "list_deployment_for_all_namespaces",
    "read_namespaced_deployment",
    "patch_namespaced_deployment_scale",
    "patch_namespaced_deployment_image",
    "replace_namespaced_deployment",
    "exec_command_on_pod",
    "get_source_status",
];

fn decode<T: DeserializeOwned>(name: &str, params: Value) -> Result<T> {
    let params = if params.is_null() { json!({}) } else { params };
    serde_json::from_value(params)
        .map_err(|e| FacadeError::InvalidArguments(format!("{name}: {e}")))
}

impl Operation {
    /// Decode an operation from its wire name and parameters.
    ///
    /// # Errors
    ///
    /// Returns [`FacadeError::UnknownOperation`] for names outside the set and
    /// [`FacadeError::InvalidArguments`] for parameters that do not decode.
    pub fn from_call(name: &str, params: Value) -> Result<Self> {
        let op = match name {
            "version" => Self::Version,
            "list_node" => Self::ListNodes,
            "label_node" => Self::LabelNode(decode(name, params)?),
            "list_config_map" => Self::ListConfigMaps(decode(name, params)?),
            "patch_config_map" => Self::PatchConfigMap(decode(name, params)?),
            "update_config_map" => Self::UpdateConfigMap(decode(name, params)?),
            "list_namespace" => Self::ListNamespaces,
            "list_pod_for_all_namespaces" => Self::ListAllPods,
            "list_namespaced_pod" => Self::ListPods(decode(name, params)?),
            "read_namespaced_pod" => Self::ReadPod(decode(name, params)?),
            "read_namespaced_pod_log" => Self::PodLogs(decode(name, params)?),
            "delete_namespaced_pod" => Self::DeletePod(decode(name, params)?),
            "list_daemon_set_for_all_namespaces" => Self::ListAllDaemonSets,
            "list_namespaced_daemon_set" => Self::ListDaemonSets(decode(name, params)?),
            "read_namespaced_daemon_set" => Self::ReadDaemonSet(decode(name, params)?),
            "list_ingress_for_all_namespaces" => Self::ListAllIngresses,
            "list_namespaced_ingress" => Self::ListIngresses(decode(name, params)?),
            "read_namespaced_ingress" => Self::ReadIngress(decode(name, params)?),
            "patch_namespaced_ingress" => Self::PatchIngress(decode(name, params)?),
            "set_new_version_by_deploy_list" => Self::SetImagesBulk(decode(name, params)?),
            "set_new_version_by_deploy" => Self::SetImage(decode(name, params)?),
            "set_attr_by_deploy" => Self::SetDeploymentAttr(decode(name, params)?),
            "set_new_version_by_image_name" => Self::SetImageByName(decode(name, params)?),
            "list_namespaced_deployment" => Self::ListDeployments(decode(name, params)?),
            "list_deployment_for_all_namespaces" => Self::ListAllDeployments,
            "read_namespaced_deployment" => Self::ReadDeployment(decode(name, params)?),
            "patch_namespaced_deployment_scale" => Self::ScaleDeployment(decode(name, params)?),
            "patch_namespaced_deployment_image" => Self::PatchDeploymentImage(decode(name, params)?),
            "replace_namespaced_deployment" => Self::ReplaceDeployment(decode(name, params)?),
            "exec_command_on_pod" => Self::ExecCommands(decode(name, params)?),
            "get_source_status" => Self::SourceStatus(decode(name, params)?),
            _ => return Err(FacadeError::UnknownOperation(name.to_string())),
        };
        Ok(op)
    }

    /// The operation's wire name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Version => "version",
            Self::ListNodes => "list_node",
            Self::LabelNode(_) => "label_node",
            Self::ListConfigMaps(_) => "list_config_map",
            Self::PatchConfigMap(_) => "patch_config_map",
            Self::UpdateConfigMap(_) => "update_config_map",
            Self::ListNamespaces => "list_namespace",
            Self::ListAllPods => "list_pod_for_all_namespaces",
            Self::ListPods(_) => "list_namespaced_pod",
            Self::ReadPod(_) => "read_namespaced_pod",
            Self::PodLogs(_) => "read_namespaced_pod_log",
            Self::DeletePod(_) => "delete_namespaced_pod",
            Self::ListAllDaemonSets => "list_daemon_set_for_all_namespaces",
            Self::ListDaemonSets(_) => "list_namespaced_daemon_set",
            Self::ReadDaemonSet(_) => "read_namespaced_daemon_set",
            Self::ListAllIngresses => "list_ingress_for_all_namespaces",
            Self::ListIngresses(_) => "list_namespaced_ingress",
            Self::ReadIngress(_) => "read_namespaced_ingress",
            Self::PatchIngress(_) => "patch_namespaced_ingress",
            Self::SetImagesBulk(_) => "set_new_version_by_deploy_list",
            Self::SetImage(_) => "set_new_version_by_deploy",
            Self::SetDeploymentAttr(_) => "set_attr_by_deploy",
            Self::SetImageByName(_) => "set_new_version_by_image_name",
            Self::ListDeployments(_) => "list_namespaced_deployment",
            Self::ListAllDeployments => "list_deployment_for_all_namespaces",
            Self::ReadDeployment(_) => "read_namespaced_deployment",
            Self::ScaleDeployment(_) => "patch_namespaced_deployment_scale",
            Self::PatchDeploymentImage(_) => "patch_namespaced_deployment_image",
            Self::ReplaceDeployment(_) => "replace_namespaced_deployment",
            Self::ExecCommands(_) => "exec_command_on_pod",
            Self::SourceStatus(_) => "get_source_status",
        }
    }

    /// Run the operation against `facade`.
    ///
    /// # Errors
    ///
    /// Returns whatever the underlying façade call returns.
    pub async fn execute(self, facade: &ResourceFacade) -> Result<Value> {
        debug!(operation = self.name(), "Executing operation");
        let value = match self {
            Self::Version => json!({ "version": facade.version().await? }),
            Self::ListNodes => to_value(facade.list_nodes().await?)?,
            Self::LabelNode(p) => facade.label_node(&p.node, &p.label_dict).await?,
            Self::ListConfigMaps(p) => facade.list_config_maps(&p.namespace).await?,
            Self::PatchConfigMap(p) => {
                facade
                    .patch_config_map(&p.name, &p.cm_key, p.cm_value.as_deref(), &p.namespace)
                    .await?
            }
            Self::UpdateConfigMap(p) => {
                facade
                    .update_config_map(&p.name, &p.config_dict, &p.namespace)
                    .await?
            }
            Self::ListNamespaces => to_value(facade.list_namespaces().await?)?,
            Self::ListAllPods => to_value(facade.list_pods(None).await?)?,
            Self::ListPods(p) => to_value(facade.list_pods(Some(&p.namespace)).await?)?,
            Self::ReadPod(t) => facade.read_pod(&t.name, &t.namespace).await?,
            Self::PodLogs(p) => Value::String(
                facade
                    .pod_logs(&p.name, &p.namespace, p.tail_lines, p.since_seconds)
                    .await?,
            ),
            Self::DeletePod(t) => Value::Bool(facade.delete_pod(&t.name, &t.namespace).await?),
            Self::ListAllDaemonSets => to_value(facade.list_daemon_sets(None).await?)?,
            Self::ListDaemonSets(p) => {
                to_value(facade.list_daemon_sets(Some(&p.namespace)).await?)?
            }
            Self::ReadDaemonSet(t) => facade.read_daemon_set(&t.name, &t.namespace).await?,
            Self::ListAllIngresses => to_value(facade.list_ingresses(None).await?)?,
            Self::ListIngresses(p) => to_value(facade.list_ingresses(Some(&p.namespace)).await?)?,
            Self::ReadIngress(t) => to_value(facade.read_ingress(&t.name, &t.namespace).await?)?,
            Self::PatchIngress(p) => facade.patch_ingress(&p.name, &p.namespace, &p.patch).await?,
            Self::SetImagesBulk(p) => {
                facade
                    .rollout()
                    .set_images_bulk(&p.deploy_dict, &p.namespace)
                    .await?;
                json!({ "success": true })
            }
            Self::SetImage(p) => {
                facade
                    .rollout()
                    .set_image(&p.new_image, &p.deploy_name, &p.namespace)
                    .await?;
                json!({ "success": true })
            }
            Self::SetDeploymentAttr(p) => {
                facade
                    .set_deployment_attr(&p.attr, p.attr_value, &p.deploy_name, &p.namespace)
                    .await?;
                json!({ "success": true })
            }
            Self::SetImageByName(p) => to_value(
                facade
                    .rollout()
                    .set_image_by_name(&p.namespace, &p.new_image)
                    .await?,
            )?,
            Self::ListDeployments(p) => {
                to_value(facade.list_deployments(Some(&p.namespace)).await?)?
            }
            Self::ListAllDeployments => to_value(facade.list_deployments(None).await?)?,
            Self::ReadDeployment(t) => facade.read_deployment(&t.name, &t.namespace).await?,
            Self::ScaleDeployment(p) => {
                facade
                    .scale_deployment(&p.name, &p.namespace, p.new_replicas)
                    .await?;
                Value::Bool(true)
            }
            Self::PatchDeploymentImage(p) => {
                facade
                    .rollout()
                    .set_image(&p.new_image, &p.name, &p.namespace)
                    .await?;
                json!({ "success": true })
            }
            Self::ReplaceDeployment(p) => {
                facade
                    .replace_deployment_image(&p.name, &p.namespace, &p.new_image)
                    .await?;
                Value::Bool(true)
            }
            Self::ExecCommands(p) => to_value(
                facade
                    .exec_commands(&p.name, &p.namespace, p.command_line)
                    .await?,
            )?,
            Self::SourceStatus(p) => to_value(facade.source_status(p.source_type).await?)?,
        };
        Ok(value)
    }
}

fn to_value<T: serde::Serialize>(value: T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| FacadeError::InvalidObject(e.to_string()))
}
