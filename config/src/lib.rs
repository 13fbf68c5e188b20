//! Shared configuration types for the ingestion workspace.

pub mod shared;
