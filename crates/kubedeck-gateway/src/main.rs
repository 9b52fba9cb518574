//! Kubedeck Gateway - HTTP API for cluster management and node telemetry.
//!
//! Configuration comes from the environment; see [`GatewayConfig::from_env`],
//! [`FacadeConfig::from_env`] and [`TelemetryConfig::from_env`].

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kubedeck_facade::FacadeConfig;
use kubedeck_gateway::{create_router, GatewayConfig, GatewayState};
use kubedeck_telemetry::TelemetryConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,kubedeck=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Kubedeck Gateway");

    let config = GatewayConfig::from_env();
    let facade = FacadeConfig::from_env();
    let telemetry = TelemetryConfig::from_env();

    tracing::info!(
        listen_addr = %config.listen_addr,
        monitor_list = ?config.monitor_list,
        monitor_port = config.monitor_port,
        max_concurrent_requests = config.max_concurrent_requests,
        request_timeout_seconds = config.request_timeout_seconds,
        "Gateway configuration loaded"
    );
    tracing::debug!(
        modern_api_min_minor = facade.modern_api_min_minor,
        version_floor_minor = facade.version_floor_minor,
        probe_timeout = ?telemetry.probe_timeout,
        cadvisor_port = telemetry.cadvisor_port,
        "Cluster settings loaded"
    );

    if config.monitor_list.is_empty() {
        tracing::info!("No MONITOR_LIST set - statistics read container-stats agents");
    }

    let listen_addr = config.listen_addr.clone();
    let state = GatewayState::new(config, facade, telemetry);
    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    tracing::info!(listen_addr = %listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
