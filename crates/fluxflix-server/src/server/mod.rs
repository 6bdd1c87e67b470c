//! Server-side components of the `fluxflix` movie service.
//!
//! ## Submodules
//!
//! - [`config`] - CLI and environment configuration.
//! - [`service`] - HTTP routes, shared state, and shutdown coordination.
//! - [`telemetry`] - structured logging and optional OpenTelemetry export.

pub mod config;
pub mod service;
pub mod telemetry;
