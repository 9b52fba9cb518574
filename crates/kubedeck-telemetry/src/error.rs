//! Error types for telemetry aggregation.

use kubedeck_facade::FacadeError;
use thiserror::Error;

/// A result type using `TelemetryError`.
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Errors raised while collecting node telemetry.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A single node could not be probed.
    #[error("probe of {address} failed: {reason}")]
    Probe {
        /// Address that was probed.
        address: String,
        /// Human-readable failure reason.
        reason: String,
    },

    /// Some probes in a report failed.
    #[error("{failed} of {total} node probes failed")]
    PartialOutage {
        /// Number of failed probes.
        failed: usize,
        /// Number of probes attempted.
        total: usize,
    },

    /// The node address list could not be read from the cluster.
    #[error("cluster error: {0}")]
    Facade(#[from] FacadeError),

    /// The HTTP client could not be built.
    #[error("http client error: {0}")]
    Client(String),
}

impl TelemetryError {
    /// Build a probe failure for `address`.
    pub fn probe(address: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Probe {
            address: address.into(),
            reason: reason.into(),
        }
    }

    /// Check if this error is retriable.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Probe { .. } | Self::PartialOutage { .. } => true,
            Self::Facade(e) => e.is_retriable(),
            Self::Client(_) => false,
        }
    }
}
