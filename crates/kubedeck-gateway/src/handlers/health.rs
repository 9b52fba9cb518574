//! Liveness and readiness routes.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::GatewayState;

/// Body of the liveness routes.
pub const PING_TEXT: &str = "Hello,i'm living";

/// What the gateway is configured to talk to, and how busy it is.
#[derive(Debug, Serialize)]
pub struct ServiceStatus {
    /// `"ready"`, or `"saturated"` when every request slot is taken.
    pub status: &'static str,
    /// Gateway build version.
    pub version: &'static str,
    /// Hosts probed by `/statistics` when the cluster is not asked.
    pub monitors: Vec<String>,
    /// Sidecar port used for monitors given without one.
    pub monitor_port: u16,
    /// Deployments use `apps/v1` from this minor version on.
    pub modern_api_min_minor: u32,
    /// Minor version assumed when a cluster hides its version.
    pub version_floor_minor: u32,
    /// Request slots currently free.
    pub free_slots: usize,
}

/// `GET /health`: configuration summary and request-slot usage.
pub async fn health(State(state): State<GatewayState>) -> Json<ServiceStatus> {
    let free_slots = state.available_permits();
    Json(ServiceStatus {
        status: if free_slots == 0 { "saturated" } else { "ready" },
        version: env!("CARGO_PKG_VERSION"),
        monitors: state.config.monitor_list.clone(),
        monitor_port: state.config.monitor_port,
        modern_api_min_minor: state.facade.modern_api_min_minor,
        version_floor_minor: state.facade.version_floor_minor,
        free_slots,
    })
}

/// Plain-text liveness check.
pub async fn ping() -> &'static str {
    PING_TEXT
}

#[cfg(test)]
mod tests {
    use super::*;
    use kubedeck_facade::FacadeConfig;
    use kubedeck_telemetry::TelemetryConfig;

    use crate::config::GatewayConfig;

    fn state(max: usize) -> GatewayState {
        let config = GatewayConfig {
            monitor_list: vec!["10.0.0.5".to_string()],
            max_concurrent_requests: max,
            ..GatewayConfig::default()
        };
        GatewayState::new(config, FacadeConfig::default(), TelemetryConfig::default())
    }

    #[tokio::test]
    async fn reports_monitors_and_version_gate() {
        let Json(status) = health(State(state(4))).await;
        assert_eq!(status.status, "ready");
        assert_eq!(status.monitors, vec!["10.0.0.5"]);
        assert_eq!(status.monitor_port, 8000);
        assert_eq!(status.modern_api_min_minor, 16);
        assert_eq!(status.version_floor_minor, 9);
        assert_eq!(status.free_slots, 4);
    }

    #[tokio::test]
    async fn saturated_when_no_slot_is_free() {
        let state = state(1);
        let _held = state.permit().await.unwrap();
        let Json(status) = health(State(state.clone())).await;
        assert_eq!(status.status, "saturated");
        assert_eq!(status.free_slots, 0);
    }

    #[tokio::test]
    async fn ping_text() {
        assert_eq!(ping().await, "Hello,i'm living");
    }
}
