//! Node hardware telemetry for kubedeck.
//!
//! [`NodeTelemetryAggregator`] fans bounded-timeout probes out to every node
//! and normalizes what comes back into [`kubedeck_core::NodeUsage`]. Two
//! sources are supported:
//!
//! - the hardware sidecar, reached on a configurable port ([`SidecarProbe`])
//! - the per-node container-stats agent ([`CadvisorProbe`])
//!
//! A probe that times out, is refused, answers with a non-success status or
//! returns a malformed body is dropped from the report's `nodes` and listed in
//! its `failures`. Aggregation itself only fails when the node list cannot be
//! read.
//!
//! # Example
//!
//! ```no_run
//! use kubedeck_telemetry::{NodeTelemetryAggregator, StaticAddresses, TelemetryConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let hosts = StaticAddresses(vec!["10.0.0.11".to_string()]);
//! let aggregator = NodeTelemetryAggregator::new(&hosts, TelemetryConfig::from_env())?;
//! let report = aggregator.hard_usage(&["nfs-1:8000".to_string()], 8000).await?;
//! if let Some(outage) = report.partial_outage() {
//!     eprintln!("{outage}");
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod aggregator;
pub mod cadvisor;
pub mod error;
pub mod probe;
pub mod sidecar;
pub mod types;

pub use aggregator::{NodeAddressSource, NodeTelemetryAggregator, StaticAddresses};
pub use cadvisor::CadvisorProbe;
pub use error::{Result, TelemetryError};
pub use probe::{ProbeTarget, UsageProbe};
pub use sidecar::SidecarProbe;
pub use types::{
    ProbeFailure, TelemetryConfig, TelemetryReport, DEFAULT_CADVISOR_PORT, DEFAULT_SIDECAR_PORT,
};
