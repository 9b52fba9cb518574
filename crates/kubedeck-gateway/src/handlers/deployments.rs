//! Deployment listing and image rollout endpoints.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;
use crate::handlers::{body, require, Envelope};
use crate::state::GatewayState;

/// Body of `/get_deployments`.
#[derive(Debug, Deserialize)]
pub struct ListDeploymentsBody {
    /// Cluster credential.
    pub config: String,
    /// Namespace to list; all namespaces when absent or blank.
    #[serde(default)]
    pub namespace: Option<String>,
}

/// Body of `/update_deployments`.
#[derive(Debug, Deserialize)]
pub struct UpdateDeploymentBody {
    /// Cluster credential.
    pub config: String,
    /// Deployment to update.
    pub deployment_name: String,
    /// Namespace of the deployment.
    pub namespace: String,
    /// `name:tag` to roll out.
    pub new_image: String,
}

/// Body of `/set_new_image`.
#[derive(Debug, Deserialize)]
pub struct SetImageBody {
    /// Cluster credential.
    pub config: String,
    /// Namespace to search.
    pub namespace: String,
    /// `name:tag` to roll out.
    pub new_image: String,
}

/// List deployments in one namespace or all of them.
///
/// # Errors
///
/// Returns an error if the credential is missing or the list cannot be read.
pub async fn get_deployments(
    State(state): State<GatewayState>,
    payload: Result<Json<ListDeploymentsBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let req = body(payload)?;
    let _permit = state.permit().await?;
    let facade = state.facade(&req.config).await?;

    let namespace = req.namespace.as_deref().filter(|ns| !ns.trim().is_empty());
    let deployments = facade.list_deployments(namespace).await?;
    tracing::debug!(namespace = ?namespace, count = deployments.len(), "Listed deployments");

    Ok(Envelope::ok(deployments))
}

/// Set the first container image of one deployment.
///
/// # Errors
///
/// Returns an error if a field is missing, the image is untagged or the
/// deployment does not exist.
pub async fn update_deployment(
    State(state): State<GatewayState>,
    payload: Result<Json<UpdateDeploymentBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let req = body(payload)?;
    require(&[&req.config, &req.deployment_name, &req.namespace, &req.new_image])?;
    let _permit = state.permit().await?;
    let facade = state.facade(&req.config).await?;

    facade
        .rollout()
        .set_image(&req.new_image, &req.deployment_name, &req.namespace)
        .await?;

    Ok(Envelope::ok(json!({ "success": true })))
}

/// Roll `new_image` out to every deployment in a namespace running that image name.
///
/// # Errors
///
/// Returns an error if a field is missing, the image is untagged or a patch fails.
pub async fn set_new_image(
    State(state): State<GatewayState>,
    payload: Result<Json<SetImageBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let req = body(payload)?;
    require(&[&req.config, &req.namespace, &req.new_image])?;
    let _permit = state.permit().await?;
    let facade = state.facade(&req.config).await?;

    let updated = facade
        .rollout()
        .set_image_by_name(&req.namespace, &req.new_image)
        .await?;

    Ok(Envelope::ok(updated))
}
