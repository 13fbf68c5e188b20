//! Concurrency primitives for the ingestion pipeline.
//!
//! The pipeline stages communicate exclusively through the bounded queue defined
//! here. The queue is the backpressure mechanism that keeps peak memory bounded
//! regardless of input size or speed mismatch between stages.

pub mod queue;
