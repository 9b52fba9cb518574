//! Core types for kubedeck.
//!
//! This crate holds the vocabulary shared by the façade, the telemetry
//! aggregator and the gateway:
//!
//! - **Resources**: [`ResourceKind`] and [`ResourceRef`] naming cluster objects
//! - **Images**: [`ImageRef`], a parsed `name:tag` container image
//! - **Usage**: the [`NodeUsage`] schema every telemetry source normalizes into
//!
//! # Example
//!
//! ```
//! use kubedeck_core::{ImageRef, ResourceKind, ResourceRef};
//!
//! let image: ImageRef = "registry.local/billing:1.4.2".parse().unwrap();
//! assert_eq!(image.name(), "registry.local/billing");
//! assert_eq!(image.tag(), "1.4.2");
//!
//! let target = ResourceRef::new(ResourceKind::Deployment, "billing");
//! assert_eq!(target.to_string(), "deployment default/billing");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod image;
pub mod resource;
pub mod usage;

pub use error::{CoreError, Result};
pub use image::ImageRef;
pub use resource::{ResourceKind, ResourceRef, DEFAULT_NAMESPACE};
pub use usage::{CpuUsage, DiskSummary, DiskUsage, MemoryUsage, NodeUsage};
