//! The boundary to the two backing stores.
//!
//! Real store clients (the full-text index and the relational database) are
//! external collaborators; the pipeline only depends on the narrow
//! [`base::StoreDestination`] trait. The in-memory implementations are used by
//! tests, development, and the memory destination of the setup binary.

pub mod base;
pub mod memory;
