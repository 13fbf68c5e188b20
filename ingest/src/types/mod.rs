//! Core data types flowing through the ingestion pipeline.

mod message;
mod record;

pub use message::*;
pub use record::*;
