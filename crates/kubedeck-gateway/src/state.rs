//! Gateway application state.
//!
//! This module defines the shared state that is available to all request handlers.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use kubedeck_facade::{FacadeConfig, ResourceFacade};
use kubedeck_telemetry::TelemetryConfig;

use crate::config::GatewayConfig;
use crate::error::ApiError;

/// Shared application state for the gateway.
///
/// Façades are not shared: every request connects with the credential it
/// carries. The state bounds how many of those requests run at once.
#[derive(Clone)]
pub struct GatewayState {
    /// Gateway configuration.
    pub config: GatewayConfig,
    /// Settings handed to every façade.
    pub facade: FacadeConfig,
    /// Settings handed to every telemetry pass.
    pub telemetry: TelemetryConfig,
    permits: Arc<Semaphore>,
}

impl GatewayState {
    /// Create a new gateway state.
    #[must_use]
    pub fn new(config: GatewayConfig, facade: FacadeConfig, telemetry: TelemetryConfig) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrent_requests.max(1)));
        Self {
            config,
            facade,
            telemetry,
            permits,
        }
    }

    /// Wait for a free request slot.
    ///
    /// # Errors
    ///
    /// Returns an error if the semaphore has been closed.
    pub async fn permit(&self) -> Result<OwnedSemaphorePermit, ApiError> {
        Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| ApiError::Internal("request slots closed".to_string()))
    }

    /// Number of request slots currently free.
    #[must_use]
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    /// Connect a façade for `credential`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::IncompleteArguments`] for a blank credential and
    /// [`ApiError::Unauthorized`] if it cannot be resolved.
    pub async fn facade(&self, credential: &str) -> Result<ResourceFacade, ApiError> {
        if credential.trim().is_empty() {
            return Err(ApiError::IncompleteArguments);
        }
        Ok(ResourceFacade::connect(credential, self.facade.clone()).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(max: usize) -> GatewayState {
        let config = GatewayConfig {
            max_concurrent_requests: max,
            ..GatewayConfig::default()
        };
        GatewayState::new(config, FacadeConfig::default(), TelemetryConfig::default())
    }

    #[tokio::test]
    async fn permits_are_bounded() {
        let state = state(2);
        let first = state.permit().await.unwrap();
        let _second = state.permit().await.unwrap();
        assert_eq!(state.available_permits(), 0);
        drop(first);
        assert_eq!(state.available_permits(), 1);
    }

    #[tokio::test]
    async fn zero_limit_still_admits_one() {
        assert_eq!(state(0).available_permits(), 1);
    }

    #[tokio::test]
    async fn blank_credential_is_incomplete() {
        let err = state(1).facade("  ").await.err().unwrap();
        assert!(matches!(err, ApiError::IncompleteArguments));
    }
}
