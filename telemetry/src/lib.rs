//! Telemetry initialization for the ingestion workspace.

pub mod tracing;
