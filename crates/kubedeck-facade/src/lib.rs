//! Version-tolerant Kubernetes resource façade for kubedeck.
//!
//! This crate provides [`ResourceFacade`], a uniform entry point for reading
//! and patching cluster objects across control-plane version skew. It handles:
//!
//! - Credential resolution (kubeconfig file, service-account token, inline text)
//! - API surface selection per resource kind from the cluster version
//! - Canonicalization of typed objects into plain JSON
//! - Image rollout, ingress path patching and interactive exec
//! - A closed set of named operations for remote callers
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                 Operation::from_call / execute                   │
//! └─────────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       ResourceFacade                             │
//! │  ┌─────────────┐ ┌─────────────┐ ┌─────────────┐ ┌───────────┐  │
//! │  │   Image     │ │  Ingress    │ │    Exec     │ │  Per-kind │  │
//! │  │   Rollout   │ │  Patch      │ │  Streamer   │ │  list/get │  │
//! │  └─────────────┘ └─────────────┘ └─────────────┘ └───────────┘  │
//! │                         │                                        │
//! │               ┌─────────┴─────────┐                              │
//! │               ▼                   ▼                              │
//! │        ┌────────────┐      ┌──────────────┐                      │
//! │        │  Version   │      │  Canonical   │                      │
//! │        │  Resolver  │      │  form        │                      │
//! │        └────────────┘      └──────────────┘                      │
//! └─────────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │         ClusterClient (one credential, reconnect on 401)         │
//! └─────────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Kubernetes API Server                         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use kubedeck_facade::{FacadeConfig, Operation, ResourceFacade};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let credential = r#"{"api_server": "https://10.0.0.1:6443", "token": "..."}"#;
//! let facade = ResourceFacade::connect(credential, FacadeConfig::default()).await?;
//!
//! // Typed call
//! let deployments = facade.list_deployments(Some("prod")).await?;
//! println!("{} deployments", deployments.len());
//!
//! // Named call, as the HTTP surface dispatches it
//! let op = Operation::from_call("read_namespaced_pod", json!({"name": "web-0"}))?;
//! let pod = op.execute(&facade).await?;
//! println!("{pod}");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod attr;
pub mod canonical;
pub mod client;
pub mod credential;
pub mod error;
pub mod exec;
pub mod facade;
pub mod ingress;
pub mod ops;
pub mod rollout;
pub mod types;
pub mod version;

pub use canonical::{canonical_payload, canonicalize, Canonicalize};
pub use client::ClusterClient;
pub use credential::{ClientFactory, ClusterCredential, CredentialSource};
pub use error::{FacadeError, Result};
pub use exec::{ChannelEvent, ExecChannel, ExecStreamer, KubeExecChannel, OutputStream};
pub use facade::ResourceFacade;
pub use ingress::{IngressBackend, IngressPatch, PatchOutcome};
pub use ops::Operation;
pub use rollout::ImageRolloutEngine;
pub use types::{
    CommandOutput, DaemonSetSummary, DeploymentSummary, FacadeConfig, IngressSummary,
    MetricsSource, NodeSummary, PodSummary, SourceUsage,
};
pub use version::{ApiSurface, SurfaceRule, SurfaceTable, VersionResolver};
