//! Bulk ingestion pipeline for the arxiv metadata dump.
//!
//! The crate moves a large line-delimited record dump through a
//! producer / transform / sink topology with bounded queues and sentinel-based
//! shutdown, persists the cleaned records as an intermediate dataset, and fans
//! that dataset into two independently queried backing stores with an
//! idempotent re-run guard.

pub mod catalog;
pub mod concurrency;
pub mod conversions;
pub mod destination;
pub mod error;
pub mod loader;
mod macros;
pub mod pipeline;
pub mod types;
pub mod workers;
