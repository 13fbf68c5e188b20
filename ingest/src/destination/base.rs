use std::future::Future;

use crate::error::IngestResult;
use crate::types::CleanRecord;

/// Trait for stores that can receive the cleaned dataset.
///
/// [`StoreDestination`] captures the only three capabilities the dual-store
/// loader needs from a backing store: a record count, a schema/index reset,
/// and a bulk upsert. Upserts are keyed by record identifier, so re-loading
/// the same batch must be idempotent.
///
/// A destination value is privately owned by the loader task that uses it;
/// no connection or session is ever shared across concurrent tasks. The batch
/// passed to [`StoreDestination::write_batch`] is owned by the callee, so a
/// store that needs its own value representation (e.g. native dates instead of
/// date strings) transforms its private copy without affecting the sibling
/// store.
pub trait StoreDestination {
    /// Returns the name of the destination, used in logs and progress output.
    fn name() -> &'static str;

    /// Returns the number of records currently stored.
    fn record_count(&self) -> impl Future<Output = IngestResult<u64>> + Send;

    /// Drops and recreates the store's schema or index, discarding all records.
    fn recreate(&self) -> impl Future<Output = IngestResult<()>> + Send;

    /// Bulk-upserts a batch of cleaned records keyed by identifier.
    fn write_batch(
        &self,
        batch: Vec<CleanRecord>,
    ) -> impl Future<Output = IngestResult<()>> + Send;
}
