//! HTTP gateway for kubedeck.
//!
//! This crate exposes the resource façade and the node telemetry aggregator
//! over HTTP. Each request carries its own cluster credential in the `config`
//! field; the gateway connects a fresh façade for it and drops it afterwards.
//!
//! - Liveness and health routes
//! - Deployment listing and image rollout
//! - Node hardware statistics with per-node failure reporting
//! - Dispatch of any named façade operation
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Clients                               │
//! │                     (HTTP / JSON)                            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    kubedeck-gateway                          │
//! │  ┌─────────────┐ ┌─────────────┐ ┌─────────────────────┐    │
//! │  │  Request    │ │   Router    │ │    Operation        │    │
//! │  │  permits    │ │ + Handlers  │ │    dispatch         │    │
//! │  └─────────────┘ └─────────────┘ └─────────────────────┘    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!               ┌──────────────┴──────────────┐
//!               ▼                             ▼
//!        ┌──────────────┐             ┌──────────────┐
//!        │  Resource    │             │  Telemetry   │
//!        │  façade      │             │  aggregator  │
//!        └──────────────┘             └──────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use kubedeck_facade::FacadeConfig;
//! use kubedeck_gateway::{create_router, GatewayConfig, GatewayState};
//! use kubedeck_telemetry::TelemetryConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GatewayConfig::from_env();
//! let listen_addr = config.listen_addr.clone();
//! let state = GatewayState::new(config, FacadeConfig::from_env(), TelemetryConfig::from_env());
//!
//! let app = create_router(state);
//! let listener = tokio::net::TcpListener::bind(listen_addr).await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::GatewayConfig;
pub use error::ApiError;
pub use routes::create_router;
pub use state::GatewayState;
