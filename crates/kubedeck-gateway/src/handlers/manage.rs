//! Named façade operation dispatch.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

use kubedeck_facade::Operation;

use crate::error::ApiError;
use crate::handlers::{body, require, Envelope};
use crate::state::GatewayState;

/// Body of `/k8s_manage`.
#[derive(Debug, Deserialize)]
pub struct ManageBody {
    /// Cluster credential.
    pub config: String,
    /// Operation name.
    pub function_name: String,
    /// Operation parameters.
    #[serde(default)]
    pub function_params: Value,
}

/// Run one named operation against the cluster.
///
/// The operation is parsed before any connection is made, so unknown names
/// and malformed parameters never reach the cluster.
///
/// # Errors
///
/// Returns an error if a field is missing, the operation is unknown or it fails.
pub async fn k8s_manage(
    State(state): State<GatewayState>,
    payload: Result<Json<ManageBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let req = body(payload)?;
    require(&[&req.config, &req.function_name])?;
    let op = Operation::from_call(&req.function_name, req.function_params)?;
    tracing::info!(operation = op.name(), "Dispatching operation");

    let _permit = state.permit().await?;
    let facade = state.facade(&req.config).await?;
    let data = op.execute(&facade).await?;

    Ok(Envelope::ok(data))
}
