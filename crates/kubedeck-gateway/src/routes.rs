//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{deployments, health, manage, statistics};
use crate::state::GatewayState;

/// Create the gateway router with all routes and middleware.
///
/// # Routes
///
/// ## Liveness
/// - `GET /health` - Configuration summary and request-slot usage
/// - `GET|POST /ping`, `GET /` - Liveness text
///
/// ## Cluster
/// - `POST /get_deployments` - List deployments
/// - `POST /update_deployments` - Set one deployment's image
/// - `POST /set_new_image` - Set the image of every deployment running it
/// - `POST /statistics` - Node hardware usage
/// - `POST /k8s_manage` - Dispatch one named façade operation
pub fn create_router(state: GatewayState) -> Router {
    let cors = build_cors_layer(&state.config.cors_origins);
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout = state.config.request_timeout();

    Router::new()
        .route("/health", get(health::health))
        .route("/ping", get(health::ping).post(health::ping))
        .route("/", get(health::ping))
        .route("/get_deployments", post(deployments::get_deployments))
        .route("/update_deployments", post(deployments::update_deployment))
        .route("/set_new_image", post(deployments::set_new_image))
        .route("/statistics", post(statistics::statistics))
        .route("/k8s_manage", post(manage::k8s_manage))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(request_timeout))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use kubedeck_facade::FacadeConfig;
    use kubedeck_telemetry::TelemetryConfig;

    use crate::config::GatewayConfig;

    fn server() -> TestServer {
        let state = GatewayState::new(
            GatewayConfig::default(),
            FacadeConfig::default(),
            TelemetryConfig::default(),
        );
        TestServer::new(create_router(state)).unwrap()
    }

    #[test]
    fn cors_specific_origins() {
        let origins = vec!["https://ops.example.com".to_string()];
        let _layer = build_cors_layer(&origins);
    }

    #[tokio::test]
    async fn liveness_routes() {
        let server = server();
        server.get("/ping").await.assert_text("Hello,i'm living");
        server.post("/ping").await.assert_text("Hello,i'm living");
        server.get("/").await.assert_text("Hello,i'm living");
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        server()
            .get("/nope")
            .expect_failure()
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
