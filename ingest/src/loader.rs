//! Dual-store loader: fans the intermediate dataset into both backing stores.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use config::shared::{ForceLevel, LoaderConfig};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::catalog::CategoryCatalog;
use crate::destination::base::StoreDestination;
use crate::error::{ErrorKind, IngestError, IngestResult};
use crate::types::CleanRecord;
use crate::{bail, ingest_error};

/// Record counts of both stores sampled at one point in time.
///
/// Used only for the skip/force decision and the final reconciliation check,
/// never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreCountSnapshot {
    pub search: u64,
    pub relational: u64,
}

impl StoreCountSnapshot {
    /// Returns `true` when both counts agree and are non-zero.
    pub fn in_agreement(&self) -> bool {
        self.search == self.relational && self.search > 0
    }
}

/// Counters of one store's loader task.
#[derive(Debug, Clone, Default)]
pub struct StoreLoadReport {
    /// Parts whose batched upsert succeeded.
    pub parts_completed: usize,
    /// Parts whose batched upsert failed and were skipped.
    pub failed_parts: usize,
    /// Records successfully upserted.
    pub records_written: u64,
    /// Dataset lines that were not valid cleaned records.
    pub unparseable_lines: u64,
    /// Category tokens not present in the catalog, when one was provided.
    pub unknown_categories: u64,
}

/// Outcome of one [`DualStoreLoader::load`] invocation.
#[derive(Debug, Clone)]
pub struct LoadReport {
    /// `true` when the idempotent re-run guard skipped the load entirely.
    pub skipped: bool,
    pub search: StoreLoadReport,
    pub relational: StoreLoadReport,
    /// `true` when the post-load counts of both stores agree and are non-zero.
    ///
    /// A `false` value is detectable but never auto-corrected; operators must
    /// re-run with an appropriate force level.
    pub reconciled: bool,
    /// Store counts sampled after the load (or at the skip decision).
    pub counts: StoreCountSnapshot,
}

impl LoadReport {
    fn skipped(counts: StoreCountSnapshot) -> Self {
        Self {
            skipped: true,
            search: StoreLoadReport::default(),
            relational: StoreLoadReport::default(),
            reconciled: true,
            counts,
        }
    }
}

/// Loads the intermediate dataset into the search and relational stores.
///
/// The two stores are independent fault domains: each is driven by its own
/// task over its own file handle and its own privately owned destination, the
/// tasks share no mutable state and may progress at different rates, and a
/// failing batch in one store never halts the other. Before loading, the
/// loader samples both stores' record counts and skips the load entirely when
/// they already agree and are non-empty, unless a force level overrides this.
#[derive(Debug)]
pub struct DualStoreLoader<S, R> {
    search: S,
    relational: R,
    config: LoaderConfig,
    catalog: Option<Arc<CategoryCatalog>>,
}

impl<S, R> DualStoreLoader<S, R>
where
    S: StoreDestination + Clone + Send + Sync + 'static,
    R: StoreDestination + Clone + Send + Sync + 'static,
{
    pub fn new(search: S, relational: R, config: LoaderConfig) -> Self {
        Self {
            search,
            relational,
            config,
            catalog: None,
        }
    }

    /// Attaches a category catalog; the relational task will count record
    /// category tokens unknown to it.
    pub fn with_catalog(mut self, catalog: CategoryCatalog) -> Self {
        self.catalog = Some(Arc::new(catalog));
        self
    }

    /// Samples both stores' record counts.
    ///
    /// A failing count query is reported and treated as zero, which forces a
    /// load rather than aborting the run.
    pub async fn snapshot_counts(&self) -> StoreCountSnapshot {
        StoreCountSnapshot {
            search: count_or_zero::<S>(self.search.record_count().await),
            relational: count_or_zero::<R>(self.relational.record_count().await),
        }
    }

    /// Returns `true` when both stores already hold the same non-zero number
    /// of records.
    pub async fn stores_in_sync(&self) -> bool {
        self.snapshot_counts().await.in_agreement()
    }

    /// Runs the dual-store load over the dataset at `dataset`.
    ///
    /// Fatal only when the dataset is missing (a setup precondition violation);
    /// per-batch store failures are reported in the [`LoadReport`] instead.
    pub async fn load(&self, dataset: &Path, force: ForceLevel) -> IngestResult<LoadReport> {
        if !dataset.is_file() {
            bail!(
                ErrorKind::DatasetMissing,
                "Intermediate dataset not found",
                dataset.display()
            );
        }

        let snapshot = self.snapshot_counts().await;
        if force == ForceLevel::None && snapshot.in_agreement() {
            info!(
                count = snapshot.search,
                "both stores agree and are non-empty, skipping load"
            );

            return Ok(LoadReport::skipped(snapshot));
        }

        info!(
            search = snapshot.search,
            relational = snapshot.relational,
            ?force,
            "recreating both stores before loading"
        );
        tokio::try_join!(self.search.recreate(), self.relational.recreate())?;

        // Pre-scan the dataset length to partition it into contiguous parts
        // for batching and progress granularity.
        let total_lines = count_lines(dataset).await?;
        let part_len = total_lines / self.config.parts as u64 + 1;

        info!(
            total_lines,
            parts = self.config.parts,
            "loading dataset into both stores"
        );

        let search_task = spawn_store_load(
            self.search.clone(),
            dataset.to_path_buf(),
            part_len,
            self.config.parts,
            None,
        );
        let relational_task = spawn_store_load(
            self.relational.clone(),
            dataset.to_path_buf(),
            part_len,
            self.config.parts,
            self.catalog.clone(),
        );

        let mut errors = Vec::new();
        let search_report = join_store_load(search_task, &mut errors).await;
        let relational_report = join_store_load(relational_task, &mut errors).await;

        if !errors.is_empty() {
            return Err(errors.into());
        }

        let counts = self.snapshot_counts().await;
        let reconciled = counts.in_agreement();
        if reconciled {
            info!(count = counts.search, "both stores loaded and reconciled");
        } else {
            warn!(
                search = counts.search,
                relational = counts.relational,
                "post-load record counts disagree, re-run with a higher force level"
            );
        }

        Ok(LoadReport {
            skipped: false,
            search: search_report.unwrap_or_default(),
            relational: relational_report.unwrap_or_default(),
            reconciled,
            counts,
        })
    }
}

/// Spawns one store's loader task.
fn spawn_store_load<D>(
    destination: D,
    dataset: PathBuf,
    part_len: u64,
    parts: usize,
    catalog: Option<Arc<CategoryCatalog>>,
) -> JoinHandle<IngestResult<StoreLoadReport>>
where
    D: StoreDestination + Send + Sync + 'static,
{
    tokio::spawn(async move { load_store(destination, dataset, part_len, parts, catalog).await })
}

/// Streams the dataset into one store, one batched upsert per part.
///
/// A failing batch is logged and skipped; the task continues with the next
/// part (best-effort bulk load, not all-or-nothing).
async fn load_store<D>(
    destination: D,
    dataset: PathBuf,
    part_len: u64,
    parts: usize,
    catalog: Option<Arc<CategoryCatalog>>,
) -> IngestResult<StoreLoadReport>
where
    D: StoreDestination,
{
    let file = File::open(&dataset).await.map_err(|err| {
        ingest_error!(
            ErrorKind::DatasetIoError,
            "Cannot open intermediate dataset",
            dataset.display(),
            source: err
        )
    })?;
    let mut lines = BufReader::new(file).lines();

    let mut report = StoreLoadReport::default();
    let mut batch: Vec<CleanRecord> = Vec::new();
    let mut part_index = 0usize;

    while let Some(line) = lines.next_line().await.map_err(|err| {
        ingest_error!(
            ErrorKind::DatasetIoError,
            "Cannot read intermediate dataset",
            dataset.display(),
            source: err
        )
    })? {
        match serde_json::from_str::<CleanRecord>(&line) {
            Ok(record) => {
                if let Some(catalog) = &catalog {
                    report.unknown_categories += record
                        .categories
                        .iter()
                        .filter(|category| !catalog.contains(category))
                        .count() as u64;
                }

                batch.push(record);
            }
            Err(err) => {
                warn!(store = D::name(), error = %err, "skipping unparseable dataset line");
                report.unparseable_lines += 1;
            }
        }

        if batch.len() as u64 >= part_len {
            flush_part(&destination, &mut batch, &mut report, &mut part_index, parts).await;
        }
    }

    if !batch.is_empty() {
        flush_part(&destination, &mut batch, &mut report, &mut part_index, parts).await;
    }

    Ok(report)
}

/// Issues one batched upsert and updates the report and progress.
async fn flush_part<D>(
    destination: &D,
    batch: &mut Vec<CleanRecord>,
    report: &mut StoreLoadReport,
    part_index: &mut usize,
    parts: usize,
) where
    D: StoreDestination,
{
    let records = std::mem::take(batch);
    let len = records.len();
    *part_index += 1;

    match destination.write_batch(records).await {
        Ok(()) => {
            report.parts_completed += 1;
            report.records_written += len as u64;

            info!(
                store = D::name(),
                "loaded {:.2}% of the dataset",
                (*part_index).min(parts) as f64 / parts as f64 * 100.0
            );
        }
        Err(err) => {
            report.failed_parts += 1;

            error!(
                store = D::name(),
                part = *part_index,
                error = %err,
                "batch upsert failed, continuing with the next part"
            );
        }
    }
}

/// Awaits one store's loader task, collecting panics as errors.
async fn join_store_load(
    task: JoinHandle<IngestResult<StoreLoadReport>>,
    errors: &mut Vec<IngestError>,
) -> Option<StoreLoadReport> {
    match task.await {
        Ok(Ok(report)) => Some(report),
        Ok(Err(err)) => {
            errors.push(err);
            None
        }
        Err(join_err) => {
            errors.push(ingest_error!(
                ErrorKind::LoaderTaskPanic,
                "Store loader task panicked",
                source: join_err
            ));
            None
        }
    }
}

fn count_or_zero<D>(result: IngestResult<u64>) -> u64
where
    D: StoreDestination,
{
    match result {
        Ok(count) => count,
        Err(err) => {
            warn!(store = D::name(), error = %err, "count query failed, assuming an empty store");
            0
        }
    }
}

/// Counts the lines of the dataset for part sizing and progress reporting.
async fn count_lines(dataset: &Path) -> IngestResult<u64> {
    let file = File::open(dataset).await.map_err(|err| {
        ingest_error!(
            ErrorKind::DatasetIoError,
            "Cannot open intermediate dataset",
            dataset.display(),
            source: err
        )
    })?;

    let mut lines = BufReader::new(file).lines();
    let mut total = 0u64;
    while lines
        .next_line()
        .await
        .map_err(|err| {
            ingest_error!(
                ErrorKind::DatasetIoError,
                "Cannot read intermediate dataset",
                dataset.display(),
                source: err
            )
        })?
        .is_some()
    {
        total += 1;
    }

    Ok(total)
}
