//! Flattening cluster objects into plain JSON values.
//!
//! Typed objects recurse through a per-type table of camelCase field labels;
//! types without a table go through serde. Timestamps render as
//! `YYYY-MM-DD HH:MM:SS` and dates as `YYYY-MM-DD`. An untyped [`Value`]
//! passes through unchanged; the payload of a [`DynamicObject`] is walked by
//! [`canonical_payload`] so its timestamps match the typed ones.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use k8s_openapi::api::core::v1::{
    AttachedVolume, ConfigMap, ContainerImage, ContainerState, ContainerStateRunning,
    ContainerStateTerminated, ContainerStateWaiting, ContainerStatus, ContainerUser, HostIP,
    Namespace, NamespaceSpec, NamespaceStatus, Node, NodeAddress, NodeCondition, NodeConfigSource,
    NodeConfigStatus, NodeDaemonEndpoints, NodeFeatures, NodeRuntimeHandler, NodeSpec, NodeStatus,
    NodeSystemInfo, Pod, PodCondition, PodIP, PodResourceClaimStatus, PodSpec, PodStatus,
    ResourceRequirements, ResourceStatus, Taint, VolumeMountStatus,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{
    FieldsV1, ListMeta, ManagedFieldsEntry, MicroTime, ObjectMeta, OwnerReference, Time,
};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use k8s_openapi::ByteString;
use kube::core::{DynamicObject, ObjectList};
use serde_json::{Map, Value};

/// Timestamp format of canonical output.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Date format of canonical output.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Conversion into the canonical plain-value form.
pub trait Canonicalize {
    /// Flatten `self` into scalars, ordered mappings and sequences.
    fn canonicalize(&self) -> Value;
}

/// Canonicalize any supported value.
pub fn canonicalize<T: Canonicalize + ?Sized>(value: &T) -> Value {
    value.canonicalize()
}

macro_rules! scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Canonicalize for $ty {
                fn canonicalize(&self) -> Value {
                    Value::from(*self)
                }
            }
        )*
    };
}

scalar!(bool, i32, i64, u32, u64, f64);

impl Canonicalize for str {
    fn canonicalize(&self) -> Value {
        Value::String(self.to_string())
    }
}

impl Canonicalize for String {
    fn canonicalize(&self) -> Value {
        Value::String(self.clone())
    }
}

impl Canonicalize for Value {
    fn canonicalize(&self) -> Value {
        self.clone()
    }
}

impl<T: Canonicalize> Canonicalize for Option<T> {
    fn canonicalize(&self) -> Value {
        self.as_ref().map_or(Value::Null, Canonicalize::canonicalize)
    }
}

impl<T: Canonicalize + ?Sized> Canonicalize for Box<T> {
    fn canonicalize(&self) -> Value {
        (**self).canonicalize()
    }
}

impl<T: Canonicalize> Canonicalize for Vec<T> {
    fn canonicalize(&self) -> Value {
        Value::Array(self.iter().map(Canonicalize::canonicalize).collect())
    }
}

impl<T: Canonicalize> Canonicalize for BTreeMap<String, T> {
    fn canonicalize(&self) -> Value {
        Value::Object(
            self.iter()
                .map(|(key, value)| (key.clone(), value.canonicalize()))
                .collect(),
        )
    }
}

impl Canonicalize for DateTime<Utc> {
    fn canonicalize(&self) -> Value {
        Value::String(self.format(TIMESTAMP_FORMAT).to_string())
    }
}

impl Canonicalize for NaiveDate {
    fn canonicalize(&self) -> Value {
        Value::String(self.format(DATE_FORMAT).to_string())
    }
}

impl Canonicalize for Time {
    fn canonicalize(&self) -> Value {
        self.0.canonicalize()
    }
}

impl Canonicalize for MicroTime {
    fn canonicalize(&self) -> Value {
        self.0.canonicalize()
    }
}

impl Canonicalize for Quantity {
    fn canonicalize(&self) -> Value {
        Value::String(self.0.clone())
    }
}

/// Types without a label table serialize through serde.
macro_rules! via_serde {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Canonicalize for $ty {
                fn canonicalize(&self) -> Value {
                    serde_json::to_value(self).unwrap_or_else(|e| {
                        tracing::warn!(
                            type_name = stringify!($ty),
                            error = %e,
                            "Failed to serialize object, rendering null"
                        );
                        Value::Null
                    })
                }
            }
        )*
    };
}

via_serde!(
    AttachedVolume,
    ByteString,
    ContainerImage,
    ContainerUser,
    FieldsV1,
    HostIP,
    IntOrString,
    ListMeta,
    NamespaceSpec,
    NamespaceStatus,
    NodeAddress,
    NodeConfigSource,
    NodeConfigStatus,
    NodeDaemonEndpoints,
    NodeFeatures,
    NodeRuntimeHandler,
    NodeSystemInfo,
    OwnerReference,
    PodIP,
    PodResourceClaimStatus,
    PodSpec,
    ResourceRequirements,
    ResourceStatus,
    VolumeMountStatus,
);

/// Declares the camelCase label table of a typed object.
///
/// The `resource` form also stamps `apiVersion` and `kind` from the type.
macro_rules! field_table {
    (resource $ty:ty { $($field:ident => $label:literal),* $(,)? }) => {
        impl Canonicalize for $ty {
            fn canonicalize(&self) -> Value {
                let mut map = Map::new();
                map.insert(
                    "apiVersion".to_string(),
                    Value::from(<$ty as k8s_openapi::Resource>::API_VERSION),
                );
                map.insert(
                    "kind".to_string(),
                    Value::from(<$ty as k8s_openapi::Resource>::KIND),
                );
                $( map.insert($label.to_string(), self.$field.canonicalize()); )*
                Value::Object(map)
            }
        }
    };
    ($ty:ty { $($field:ident => $label:literal),* $(,)? }) => {
        impl Canonicalize for $ty {
            fn canonicalize(&self) -> Value {
                let mut map = Map::new();
                $( map.insert($label.to_string(), self.$field.canonicalize()); )*
                Value::Object(map)
            }
        }
    };
}

field_table!(ObjectMeta {
    annotations => "annotations",
    creation_timestamp => "creationTimestamp",
    deletion_grace_period_seconds => "deletionGracePeriodSeconds",
    deletion_timestamp => "deletionTimestamp",
    finalizers => "finalizers",
    generate_name => "generateName",
    generation => "generation",
    labels => "labels",
    managed_fields => "managedFields",
    name => "name",
    namespace => "namespace",
    owner_references => "ownerReferences",
    resource_version => "resourceVersion",
    self_link => "selfLink",
    uid => "uid",
});

field_table!(ManagedFieldsEntry {
    api_version => "apiVersion",
    fields_type => "fieldsType",
    fields_v1 => "fieldsV1",
    manager => "manager",
    operation => "operation",
    subresource => "subresource",
    time => "time",
});

field_table!(resource Node {
    metadata => "metadata",
    spec => "spec",
    status => "status",
});

field_table!(NodeSpec {
    config_source => "configSource",
    external_id => "externalID",
    pod_cidr => "podCIDR",
    pod_cidrs => "podCIDRs",
    provider_id => "providerID",
    taints => "taints",
    unschedulable => "unschedulable",
});

field_table!(Taint {
    effect => "effect",
    key => "key",
    time_added => "timeAdded",
    value => "value",
});

field_table!(NodeStatus {
    addresses => "addresses",
    allocatable => "allocatable",
    capacity => "capacity",
    conditions => "conditions",
    config => "config",
    daemon_endpoints => "daemonEndpoints",
    features => "features",
    images => "images",
    node_info => "nodeInfo",
    phase => "phase",
    runtime_handlers => "runtimeHandlers",
    volumes_attached => "volumesAttached",
    volumes_in_use => "volumesInUse",
});

field_table!(NodeCondition {
    last_heartbeat_time => "lastHeartbeatTime",
    last_transition_time => "lastTransitionTime",
    message => "message",
    reason => "reason",
    status => "status",
    type_ => "type",
});

field_table!(resource Pod {
    metadata => "metadata",
    spec => "spec",
    status => "status",
});

field_table!(PodStatus {
    conditions => "conditions",
    container_statuses => "containerStatuses",
    ephemeral_container_statuses => "ephemeralContainerStatuses",
    host_ip => "hostIP",
    host_ips => "hostIPs",
    init_container_statuses => "initContainerStatuses",
    message => "message",
    nominated_node_name => "nominatedNodeName",
    phase => "phase",
    pod_ip => "podIP",
    pod_ips => "podIPs",
    qos_class => "qosClass",
    reason => "reason",
    resize => "resize",
    resource_claim_statuses => "resourceClaimStatuses",
    start_time => "startTime",
});

field_table!(PodCondition {
    last_probe_time => "lastProbeTime",
    last_transition_time => "lastTransitionTime",
    message => "message",
    reason => "reason",
    status => "status",
    type_ => "type",
});

field_table!(ContainerStatus {
    allocated_resources => "allocatedResources",
    allocated_resources_status => "allocatedResourcesStatus",
    container_id => "containerID",
    image => "image",
    image_id => "imageID",
    last_state => "lastState",
    name => "name",
    ready => "ready",
    resources => "resources",
    restart_count => "restartCount",
    started => "started",
    state => "state",
    user => "user",
    volume_mounts => "volumeMounts",
});

field_table!(ContainerState {
    running => "running",
    terminated => "terminated",
    waiting => "waiting",
});

field_table!(ContainerStateRunning {
    started_at => "startedAt",
});

field_table!(ContainerStateTerminated {
    container_id => "containerID",
    exit_code => "exitCode",
    finished_at => "finishedAt",
    message => "message",
    reason => "reason",
    signal => "signal",
    started_at => "startedAt",
});

field_table!(ContainerStateWaiting {
    message => "message",
    reason => "reason",
});

field_table!(resource ConfigMap {
    binary_data => "binaryData",
    data => "data",
    immutable => "immutable",
    metadata => "metadata",
});

field_table!(resource Namespace {
    metadata => "metadata",
    spec => "spec",
    status => "status",
});

/// Payload keys whose values are free-form strings, never timestamps.
const OPAQUE_KEYS: &[&str] = &["annotations", "labels", "matchLabels", "nodeSelector", "data"];

/// Whether a payload key names a `Time` or `MicroTime` field.
fn is_time_label(key: &str) -> bool {
    key == "time"
        || key == "timeAdded"
        || key.ends_with("Time")
        || key.ends_with("Timestamp")
        || key.ends_with("At")
}

/// Canonicalize an untyped Kubernetes payload.
///
/// Strings under time-labelled keys that parse as RFC 3339 are rendered in
/// [`TIMESTAMP_FORMAT`]. Everything else keeps its JSON shape.
#[must_use]
pub fn canonical_payload(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| (key.clone(), canonical_field(key, value)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(canonical_payload).collect()),
        other => other.clone(),
    }
}

fn canonical_field(key: &str, value: &Value) -> Value {
    if OPAQUE_KEYS.contains(&key) {
        return value.clone();
    }
    match value {
        Value::String(raw) if is_time_label(key) => DateTime::parse_from_rfc3339(raw)
            .map_or_else(
                |_| value.clone(),
                |parsed| parsed.with_timezone(&Utc).canonicalize(),
            ),
        _ => canonical_payload(value),
    }
}

/// Objects served under a version-dependent group carry their payload untyped.
impl Canonicalize for DynamicObject {
    fn canonicalize(&self) -> Value {
        let mut map = Map::new();
        if let Some(types) = &self.types {
            map.insert("apiVersion".to_string(), Value::from(types.api_version.as_str()));
            map.insert("kind".to_string(), Value::from(types.kind.as_str()));
        }
        map.insert("metadata".to_string(), self.metadata.canonicalize());
        if let Value::Object(data) = &self.data {
            for (key, value) in data {
                map.insert(key.clone(), canonical_field(key, value));
            }
        }
        Value::Object(map)
    }
}

impl<K: Canonicalize + Clone> Canonicalize for ObjectList<K> {
    fn canonicalize(&self) -> Value {
        let mut map = Map::new();
        map.insert(
            "apiVersion".to_string(),
            Value::from(self.types.api_version.as_str()),
        );
        map.insert("kind".to_string(), Value::from(self.types.kind.as_str()));
        map.insert("metadata".to_string(), self.metadata.canonicalize());
        map.insert("items".to_string(), self.items.canonicalize());
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn at(h: u32, m: u32, s: u32) -> Time {
        Time(Utc.with_ymd_and_hms(2024, 3, 9, h, m, s).unwrap())
    }

    #[test]
    fn untyped_values_pass_through() {
        let value = json!({"a": [1, "two", null, {"b": true}]});
        assert_eq!(canonicalize(&value), value);
    }

    #[test]
    fn scalars_and_options() {
        assert_eq!(canonicalize(&3_i32), json!(3));
        assert_eq!(canonicalize(&Some("x".to_string())), json!("x"));
        assert_eq!(canonicalize(&None::<String>), Value::Null);
    }

    #[test]
    fn times_and_dates_are_formatted() {
        assert_eq!(canonicalize(&at(7, 5, 3)), json!("2024-03-09 07:05:03"));
        let date = NaiveDate::from_ymd_opt(2023, 12, 1).unwrap();
        assert_eq!(canonicalize(&date), json!("2023-12-01"));
    }

    #[test]
    fn pods_recurse_through_label_tables() {
        let pod = Pod {
            metadata: ObjectMeta {
                name: Some("api-0".to_string()),
                namespace: Some("prod".to_string()),
                creation_timestamp: Some(at(1, 0, 0)),
                labels: Some(BTreeMap::from([("app".to_string(), "api".to_string())])),
                ..Default::default()
            },
            spec: None,
            status: Some(PodStatus {
                phase: Some("Running".to_string()),
                start_time: Some(at(1, 2, 3)),
                container_statuses: Some(vec![ContainerStatus {
                    name: "api".to_string(),
                    image: "api:1.0".to_string(),
                    image_id: "sha".to_string(),
                    ready: true,
                    restart_count: 2,
                    state: Some(ContainerState {
                        running: Some(ContainerStateRunning {
                            started_at: Some(at(1, 2, 4)),
                        }),
                        ..Default::default()
                    }),
                    ..Default::default()
                }]),
                ..Default::default()
            }),
        };

        let value = canonicalize(&pod);
        assert_eq!(value["apiVersion"], "v1");
        assert_eq!(value["kind"], "Pod");
        assert_eq!(value["metadata"]["name"], "api-0");
        assert_eq!(value["metadata"]["creationTimestamp"], "2024-03-09 01:00:00");
        assert_eq!(value["metadata"]["labels"]["app"], "api");
        assert_eq!(value["spec"], Value::Null);
        assert_eq!(value["status"]["startTime"], "2024-03-09 01:02:03");
        let status = &value["status"]["containerStatuses"][0];
        assert_eq!(status["restartCount"], 2);
        assert_eq!(status["state"]["running"]["startedAt"], "2024-03-09 01:02:04");
        assert_eq!(status["state"]["waiting"], Value::Null);
    }

    #[test]
    fn quantities_render_as_strings() {
        let status = NodeStatus {
            capacity: Some(BTreeMap::from([(
                "cpu".to_string(),
                Quantity("4".to_string()),
            )])),
            ..Default::default()
        };
        assert_eq!(canonicalize(&status)["capacity"], json!({"cpu": "4"}));
    }

    #[test]
    fn dynamic_objects_merge_payload() {
        let mut object = DynamicObject {
            types: Some(kube::core::TypeMeta {
                api_version: "apps/v1".to_string(),
                kind: "Deployment".to_string(),
            }),
            metadata: ObjectMeta {
                name: Some("api".to_string()),
                ..Default::default()
            },
            data: json!({"spec": {"replicas": 3}}),
        };
        let value = canonicalize(&object);
        assert_eq!(value["kind"], "Deployment");
        assert_eq!(value["metadata"]["name"], "api");
        assert_eq!(value["spec"]["replicas"], 3);

        object.types = None;
        assert!(canonicalize(&object).get("apiVersion").is_none());
    }

    struct Unserializable;

    impl serde::Serialize for Unserializable {
        fn serialize<S: serde::Serializer>(&self, _: S) -> std::result::Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("refused"))
        }
    }

    via_serde!(Unserializable);

    #[test]
    fn serde_failure_renders_null() {
        assert_eq!(canonicalize(&Unserializable), Value::Null);
    }

    #[test]
    fn deployment_payload_timestamps_match_metadata() {
        let deploy = DynamicObject {
            types: Some(kube::core::TypeMeta {
                api_version: "apps/v1".to_string(),
                kind: "Deployment".to_string(),
            }),
            metadata: ObjectMeta {
                name: Some("api".to_string()),
                creation_timestamp: Some(at(10, 11, 12)),
                ..Default::default()
            },
            data: json!({
                "spec": {
                    "template": {
                        "metadata": {
                            "annotations": { "deployedAt": "2024-03-09T10:11:12Z" }
                        }
                    }
                },
                "status": {
                    "conditions": [{
                        "type": "Available",
                        "lastUpdateTime": "2024-03-09T10:11:12Z",
                        "lastTransitionTime": "2024-03-09T12:11:12.250000+02:00"
                    }]
                }
            }),
        };

        let value = canonicalize(&deploy);
        assert_eq!(value["metadata"]["creationTimestamp"], "2024-03-09 10:11:12");
        let condition = &value["status"]["conditions"][0];
        assert_eq!(condition["lastUpdateTime"], "2024-03-09 10:11:12");
        assert_eq!(condition["lastTransitionTime"], "2024-03-09 10:11:12");
        assert_eq!(condition["type"], "Available");
        assert_eq!(
            value["spec"]["template"]["metadata"]["annotations"]["deployedAt"],
            "2024-03-09T10:11:12Z"
        );
    }

    #[test]
    fn payload_keeps_non_time_strings() {
        let spec = json!({
            "progressDeadlineSeconds": 600,
            "startedAt": "not a time",
            "selector": { "matchLabels": { "createdAt": "2024-03-09T10:11:12Z" } }
        });
        assert_eq!(canonical_payload(&spec), spec);
    }

    fn label_keys(value: &Value) -> Vec<String> {
        let mut keys: Vec<String> = value
            .as_object()
            .map_or_else(Vec::new, |map| map.keys().cloned().collect());
        keys.sort();
        keys
    }

    /// Label tables must emit every field serde does for a fully populated value.
    fn assert_table_complete<T: Canonicalize + serde::Serialize>(value: &T) {
        let expected = label_keys(&serde_json::to_value(value).unwrap());
        assert_eq!(label_keys(&canonicalize(value)), expected);
    }

    // The struct literals below list every field without `..Default::default()`
    // so a k8s-openapi upgrade that adds a field stops compiling here.

    fn full_container_status() -> ContainerStatus {
        ContainerStatus {
            allocated_resources: Some(BTreeMap::new()),
            allocated_resources_status: Some(vec![ResourceStatus::default()]),
            container_id: Some("containerd://1".to_string()),
            image: "api:1.0".to_string(),
            image_id: "sha".to_string(),
            last_state: Some(ContainerState::default()),
            name: "api".to_string(),
            ready: true,
            resources: Some(ResourceRequirements::default()),
            restart_count: 0,
            started: Some(true),
            state: Some(ContainerState::default()),
            user: Some(ContainerUser::default()),
            volume_mounts: Some(vec![VolumeMountStatus::default()]),
        }
    }

    #[test]
    fn container_status_table_is_complete() {
        assert_table_complete(&full_container_status());
    }

    #[test]
    fn pod_status_table_is_complete() {
        let status = PodStatus {
            conditions: Some(vec![PodCondition::default()]),
            container_statuses: Some(vec![full_container_status()]),
            ephemeral_container_statuses: Some(Vec::new()),
            host_ip: Some("10.0.0.1".to_string()),
            host_ips: Some(vec![HostIP {
                ip: "10.0.0.1".to_string(),
            }]),
            init_container_statuses: Some(Vec::new()),
            message: Some(String::new()),
            nominated_node_name: Some(String::new()),
            phase: Some("Running".to_string()),
            pod_ip: Some("10.1.0.4".to_string()),
            pod_ips: Some(vec![PodIP::default()]),
            qos_class: Some("BestEffort".to_string()),
            reason: Some(String::new()),
            resize: Some(String::new()),
            resource_claim_statuses: Some(vec![PodResourceClaimStatus::default()]),
            start_time: Some(at(1, 2, 3)),
        };
        assert_table_complete(&status);
        assert_eq!(canonicalize(&status)["hostIPs"], json!([{"ip": "10.0.0.1"}]));
    }

    #[test]
    fn node_status_table_is_complete() {
        let status = NodeStatus {
            addresses: Some(vec![NodeAddress::default()]),
            allocatable: Some(BTreeMap::new()),
            capacity: Some(BTreeMap::new()),
            conditions: Some(vec![NodeCondition::default()]),
            config: Some(NodeConfigStatus::default()),
            daemon_endpoints: Some(NodeDaemonEndpoints::default()),
            features: Some(NodeFeatures::default()),
            images: Some(vec![ContainerImage::default()]),
            node_info: Some(NodeSystemInfo::default()),
            phase: Some(String::new()),
            runtime_handlers: Some(vec![NodeRuntimeHandler::default()]),
            volumes_attached: Some(vec![AttachedVolume::default()]),
            volumes_in_use: Some(Vec::new()),
        };
        assert_table_complete(&status);
    }

    #[test]
    fn object_meta_table_is_complete() {
        let meta = ObjectMeta {
            annotations: Some(BTreeMap::new()),
            creation_timestamp: Some(at(1, 0, 0)),
            deletion_grace_period_seconds: Some(30),
            deletion_timestamp: Some(at(2, 0, 0)),
            finalizers: Some(Vec::new()),
            generate_name: Some(String::new()),
            generation: Some(1),
            labels: Some(BTreeMap::new()),
            managed_fields: Some(Vec::new()),
            name: Some("api".to_string()),
            namespace: Some("prod".to_string()),
            owner_references: Some(Vec::new()),
            resource_version: Some("1".to_string()),
            self_link: Some(String::new()),
            uid: Some("uid".to_string()),
        };
        assert_table_complete(&meta);
    }
}
