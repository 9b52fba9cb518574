//! Façade flows against a mock API server.
//!
//! Each test stands up a `wiremock` server that plays the Kubernetes API and
//! connects to it with a service-account credential.

use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use kubedeck_facade::{
    ApiSurface, CredentialSource, FacadeConfig, FacadeError, IngressBackend, IngressPatch,
    Operation, ResourceFacade,
};
use kubedeck_core::ResourceKind;

async fn connect(server: &MockServer) -> ResourceFacade {
    let credential = json!({ "api_server": server.uri(), "token": "test-token" }).to_string();
    ResourceFacade::connect(&credential, FacadeConfig::default())
        .await
        .expect("connect")
}

fn node_list(kubelet: Option<&str>) -> Value {
    let items: Vec<Value> = kubelet
        .map(|version| {
            json!({
                "metadata": { "name": "worker-1", "labels": { "zone": "a" } },
                "status": {
                    "addresses": [
                        { "type": "Hostname", "address": "worker-1" },
                        { "type": "InternalIP", "address": "10.0.0.11" }
                    ],
                    "capacity": { "cpu": "4", "memory": "16Gi" },
                    "images": [
                        { "names": ["repo@sha256:abc", "repo:1.0"], "sizeBytes": 10 }
                    ],
                    "nodeInfo": {
                        "architecture": "amd64",
                        "bootID": "boot",
                        "containerRuntimeVersion": "containerd://1.7.0",
                        "kernelVersion": "6.1.0",
                        "kubeProxyVersion": version,
                        "kubeletVersion": version,
                        "machineID": "machine",
                        "operatingSystem": "linux",
                        "osImage": "Debian GNU/Linux 12",
                        "systemUUID": "uuid"
                    }
                }
            })
        })
        .into_iter()
        .collect();
    json!({ "apiVersion": "v1", "kind": "NodeList", "metadata": {}, "items": items })
}

async fn mount_nodes(server: &MockServer, kubelet: Option<&str>) {
    Mock::given(method("GET"))
        .and(path("/api/v1/nodes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(node_list(kubelet)))
        .mount(server)
        .await;
}

fn deployment(api_version: &str, name: &str, image: &str) -> Value {
    json!({
        "apiVersion": api_version,
        "kind": "Deployment",
        "metadata": { "name": name, "namespace": "prod" },
        "spec": {
            "replicas": 2,
            "template": { "spec": { "containers": [ { "name": "app", "image": image } ] } }
        },
        "status": { "availableReplicas": 1 }
    })
}

fn deployment_list(api_version: &str, items: Vec<Value>) -> Value {
    json!({ "apiVersion": api_version, "kind": "DeploymentList", "metadata": {}, "items": items })
}

fn not_found(what: &str) -> ResponseTemplate {
    ResponseTemplate::new(404).set_body_json(json!({
        "apiVersion": "v1",
        "kind": "Status",
        "status": "Failure",
        "message": format!("{what} not found"),
        "reason": "NotFound",
        "code": 404
    }))
}

#[tokio::test]
async fn service_account_credential_is_recorded() {
    let server = MockServer::start().await;
    let facade = connect(&server).await;
    assert_eq!(
        facade.client().source(),
        Some(CredentialSource::ServiceAccount)
    );
}

#[tokio::test]
async fn modern_cluster_lists_apps_v1_deployments() {
    let server = MockServer::start().await;
    mount_nodes(&server, Some("v1.20.4-gke.1")).await;
    let mut api = deployment("apps/v1", "api", "api:1.0");
    api["spec"]["template"]["metadata"] = json!({ "creationTimestamp": "2024-03-09T10:11:12Z" });
    Mock::given(method("GET"))
        .and(path("/apis/apps/v1/namespaces/prod/deployments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(deployment_list(
            "apps/v1",
            vec![api],
        )))
        .expect(1)
        .mount(&server)
        .await;

    let facade = connect(&server).await;
    assert_eq!(facade.version().await.unwrap().as_deref(), Some("v1.20.4-gke.1"));
    assert_eq!(
        facade.api_surface(ResourceKind::Deployment).await,
        ApiSurface::APPS_V1
    );

    let deployments = facade.list_deployments(Some("prod")).await.unwrap();
    assert_eq!(deployments.len(), 1);
    let api = &deployments[0];
    assert_eq!(api.image.as_deref(), Some("api:1.0"));
    assert_eq!(api.replicas, Some(2));
    assert_eq!(api.desired, Some(2));
    assert_eq!(api.current, Some(1));
    let template = api.template.as_ref().expect("namespaced listing carries template");
    assert_eq!(template["replicas"], 2);
    assert_eq!(
        template["template"]["metadata"]["creationTimestamp"],
        "2024-03-09 10:11:12"
    );
}

#[tokio::test]
async fn old_cluster_lists_legacy_deployments_without_template() {
    let server = MockServer::start().await;
    mount_nodes(&server, Some("v1.15.3")).await;
    Mock::given(method("GET"))
        .and(path("/apis/extensions/v1beta1/deployments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(deployment_list(
            "extensions/v1beta1",
            vec![deployment("extensions/v1beta1", "api", "api:1.0")],
        )))
        .expect(1)
        .mount(&server)
        .await;

    let facade = connect(&server).await;
    let deployments = facade.list_deployments(None).await.unwrap();
    assert_eq!(deployments.len(), 1);
    assert!(deployments[0].template.is_none());
}

#[tokio::test]
async fn empty_cluster_falls_back_to_floor() {
    let server = MockServer::start().await;
    mount_nodes(&server, None).await;

    let facade = connect(&server).await;
    assert_eq!(facade.version().await.unwrap(), None);
    assert_eq!(
        facade.api_surface(ResourceKind::Deployment).await,
        ApiSurface::EXTENSIONS_V1BETA1
    );
}

#[tokio::test]
async fn failed_probe_falls_back_to_floor() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/nodes"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let facade = connect(&server).await;
    assert_eq!(
        facade.api_surface(ResourceKind::Deployment).await,
        ApiSurface::EXTENSIONS_V1BETA1
    );
}

#[tokio::test]
async fn set_image_by_name_updates_only_matching_deployments() {
    let server = MockServer::start().await;
    mount_nodes(&server, Some("v1.20.0")).await;
    Mock::given(method("GET"))
        .and(path("/apis/apps/v1/namespaces/prod/deployments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(deployment_list(
            "apps/v1",
            vec![
                deployment("apps/v1", "svc-a", "svcA:1.0"),
                deployment("apps/v1", "svc-b", "svcB:1.0"),
                deployment("apps/v1", "legacy", "svcA"),
            ],
        )))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/apis/apps/v1/namespaces/prod/deployments/svc-a"))
        .and(body_partial_json(json!({
            "spec": { "template": { "spec": { "containers": [ { "name": "app", "image": "svcA:1.1" } ] } } }
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(deployment("apps/v1", "svc-a", "svcA:1.1")),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/apis/apps/v1/namespaces/prod/deployments/svc-b"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/apis/apps/v1/namespaces/prod/deployments/legacy"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let facade = connect(&server).await;
    let updated = facade
        .rollout()
        .set_image_by_name("prod", "svcA:1.1")
        .await
        .unwrap();
    assert_eq!(updated, vec!["svc-a".to_string()]);
}

#[tokio::test]
async fn set_image_by_name_rejects_untagged_input() {
    let server = MockServer::start().await;
    let facade = connect(&server).await;
    let err = facade
        .rollout()
        .set_image_by_name("prod", "svcA")
        .await
        .unwrap_err();
    assert!(matches!(err, FacadeError::InvalidImage(_)));
}

#[tokio::test]
async fn set_image_on_missing_deployment_is_not_found() {
    let server = MockServer::start().await;
    mount_nodes(&server, Some("v1.20.0")).await;
    Mock::given(method("GET"))
        .and(path("/apis/apps/v1/namespaces/prod/deployments/ghost"))
        .respond_with(not_found("deployments.apps \"ghost\""))
        .mount(&server)
        .await;

    let facade = connect(&server).await;
    let err = facade
        .rollout()
        .set_image("ghost:2.0", "ghost", "prod")
        .await
        .unwrap_err();
    assert!(matches!(err, FacadeError::NotFound(_)));
}

#[tokio::test]
async fn pods_without_statuses_report_defaults() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/namespaces/prod/pods"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "apiVersion": "v1",
            "kind": "PodList",
            "metadata": {},
            "items": [
                {
                    "metadata": { "name": "pending-0", "namespace": "prod" },
                    "spec": { "containers": [ { "name": "app", "image": "app:1" } ] },
                    "status": { "phase": "Pending" }
                },
                {
                    "metadata": { "name": "running-0", "namespace": "prod" },
                    "spec": {
                        "nodeName": "worker-1",
                        "containers": [ { "name": "app", "image": "app:1" } ]
                    },
                    "status": {
                        "phase": "Running",
                        "hostIP": "10.0.0.11",
                        "podIP": "172.16.0.5",
                        "startTime": "2024-03-09T01:02:03Z",
                        "containerStatuses": [ {
                            "name": "app",
                            "image": "app:1",
                            "imageID": "sha256:1",
                            "ready": false,
                            "restartCount": 3
                        } ]
                    }
                }
            ]
        })))
        .mount(&server)
        .await;

    let facade = connect(&server).await;
    let pods = facade.list_pods(Some("prod")).await.unwrap();
    assert_eq!(pods.len(), 2);

    assert!(pods[0].ready);
    assert_eq!(pods[0].restart_count, 0);
    assert_eq!(pods[0].image, None);
    assert_eq!(pods[0].start_time, None);

    assert!(!pods[1].ready);
    assert_eq!(pods[1].restart_count, 3);
    assert_eq!(pods[1].start_time.as_deref(), Some("2024-03-09 01:02:03"));
    assert_eq!(pods[1].node_name.as_deref(), Some("worker-1"));
}

#[tokio::test]
async fn patch_config_map_writes_null_for_removal() {
    let server = MockServer::start().await;
    let config_map = json!({
        "apiVersion": "v1",
        "kind": "ConfigMap",
        "metadata": { "name": "app", "namespace": "default" },
        "data": { "LOG_LEVEL": "debug", "MODE": "fast" }
    });
    Mock::given(method("GET"))
        .and(path("/api/v1/namespaces/default/configmaps/app"))
        .respond_with(ResponseTemplate::new(200).set_body_json(config_map))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/v1/namespaces/default/configmaps/app"))
        .and(body_partial_json(json!({ "data": { "LOG_LEVEL": null, "MODE": "fast" } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": { "name": "app", "namespace": "default" },
            "data": { "MODE": "fast" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let facade = connect(&server).await;
    let updated = facade
        .patch_config_map("app", "LOG_LEVEL", None, "default")
        .await
        .unwrap();
    assert_eq!(updated["data"], json!({ "MODE": "fast" }));
    assert_eq!(updated["kind"], "ConfigMap");
}

#[tokio::test]
async fn ingress_patch_round_trips_through_api() {
    let server = MockServer::start().await;
    mount_nodes(&server, Some("v1.14.0")).await;
    let ingress = json!({
        "apiVersion": "extensions/v1beta1",
        "kind": "Ingress",
        "metadata": { "name": "edge", "namespace": "default" },
        "spec": { "rules": [ { "host": "a.example.com", "http": { "paths": [
            { "path": "/api", "backend": { "serviceName": "api", "servicePort": 80 } }
        ] } } ] }
    });
    Mock::given(method("GET"))
        .and(path("/apis/extensions/v1beta1/namespaces/default/ingresses/edge"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ingress.clone()))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/apis/extensions/v1beta1/namespaces/default/ingresses/edge"))
        .and(body_partial_json(json!({ "spec": { "rules": [ { "host": "a.example.com", "http": { "paths": [
            { "path": "/api", "backend": { "serviceName": "api", "servicePort": 80 } },
            { "path": "/docs", "backend": { "serviceName": "docs", "servicePort": 8080 } }
        ] } } ] } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(ingress))
        .expect(1)
        .mount(&server)
        .await;

    let facade = connect(&server).await;
    let patch = IngressPatch {
        host: Some("a.example.com".to_string()),
        location: "/docs".to_string(),
        service: Some(IngressBackend {
            service_name: "docs".to_string(),
            service_port: k8s_openapi::apimachinery::pkg::util::intstr::IntOrString::Int(8080),
        }),
    };
    facade.patch_ingress("edge", "default", &patch).await.unwrap();
}

#[tokio::test]
async fn exec_on_missing_pod_is_instance_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/namespaces/default/pods/ghost"))
        .respond_with(not_found("pods \"ghost\""))
        .mount(&server)
        .await;

    let facade = connect(&server).await;
    let op = Operation::from_call(
        "exec_command_on_pod",
        json!({ "command_line": ["ls"], "name": "ghost" }),
    )
    .unwrap();
    let err = op.execute(&facade).await.unwrap_err();
    assert!(matches!(err, FacadeError::NotFound(ref m) if m.starts_with("instance not found")));
}

#[tokio::test]
async fn node_operations_project_summaries() {
    let server = MockServer::start().await;
    mount_nodes(&server, Some("v1.22.1")).await;

    let facade = connect(&server).await;
    let nodes = facade.list_nodes().await.unwrap();
    assert_eq!(nodes[0].name, "worker-1");
    assert_eq!(nodes[0].image_list, vec!["repo:1.0"]);
    assert_eq!(nodes[0].capacity["cpu"], "4");
    assert_eq!(nodes[0].node_info["kubeletVersion"], "v1.22.1");
    assert_eq!(nodes[0].labels["zone"], "a");

    assert_eq!(facade.node_internal_ips().await.unwrap(), vec!["10.0.0.11"]);

    let version = Operation::from_call("version", Value::Null)
        .unwrap()
        .execute(&facade)
        .await
        .unwrap();
    assert_eq!(version, json!({ "version": "v1.22.1" }));
}
