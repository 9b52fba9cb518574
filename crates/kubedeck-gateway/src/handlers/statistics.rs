//! Node hardware usage endpoint.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use kubedeck_core::NodeUsage;
use kubedeck_telemetry::{NodeTelemetryAggregator, ProbeFailure};

use crate::error::ApiError;
use crate::handlers::body;
use crate::state::GatewayState;

/// Body of `/statistics`.
#[derive(Debug, Deserialize)]
pub struct StatisticsBody {
    /// Cluster credential.
    pub config: String,
}

/// Response of `/statistics`.
#[derive(Debug, Serialize)]
pub struct StatisticsResponse {
    /// Always `true`.
    pub success: bool,
    /// Usage of every node that answered.
    pub data: Vec<NodeUsage>,
    /// Nodes that did not.
    pub failures: Vec<ProbeFailure>,
}

/// Collect hardware usage from every node.
///
/// Uses the hardware sidecars when a monitor list is configured, the
/// container-stats agents otherwise. Unreachable nodes are listed in
/// `failures` and never fail the request.
///
/// # Errors
///
/// Returns an error if the credential is missing or the node list cannot be read.
pub async fn statistics(
    State(state): State<GatewayState>,
    payload: Result<Json<StatisticsBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let req = body(payload)?;
    let _permit = state.permit().await?;
    let facade = state.facade(&req.config).await?;

    let aggregator = NodeTelemetryAggregator::new(&facade, state.telemetry.clone())?;
    let report = if state.config.monitor_list.is_empty() {
        aggregator.node_info().await?
    } else {
        aggregator
            .hard_usage(&state.config.monitor_list, state.config.monitor_port)
            .await?
    };

    if let Some(outage) = report.partial_outage() {
        tracing::warn!(error = %outage, "Statistics incomplete");
    }

    Ok(Json(StatisticsResponse {
        success: true,
        data: report.nodes,
        failures: report.failures,
    }))
}
