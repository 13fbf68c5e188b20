//! Orchestration of the multi-stage ingestion pipeline.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use config::shared::PipelineConfig;
use tracing::info;

use crate::concurrency::queue::BoundedQueue;
use crate::error::{ErrorKind, IngestError, IngestResult};
use crate::types::DropReason;
use crate::workers::reader::SourceReader;
use crate::workers::transform::{TransformReport, TransformWorker};
use crate::workers::writer::SinkWriter;
use crate::{bail, ingest_error};

/// Aggregated counters of one full pipeline run.
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    /// Total lines seen in the dump.
    pub lines_read: u64,
    /// Lines that were not valid JSON objects.
    pub unparseable_lines: u64,
    /// Records the reader discarded for a null submitter.
    pub missing_submitter: u64,
    /// Records successfully normalized by the worker pool.
    pub records_cleaned: u64,
    /// Records dropped during normalization, counted per reason.
    pub drops: BTreeMap<DropReason, u64>,
    /// Records persisted to the intermediate dataset.
    pub records_written: u64,
}

/// The producer / transform / sink pipeline over two bounded queues.
///
/// One reader thread streams the dump into the input queue, a fixed pool of
/// transform worker threads normalizes records in parallel (normalization is
/// CPU-bound text processing, so the workers are OS threads), and one writer
/// thread persists the cleaned records. The bounded queues provide the
/// backpressure that bounds peak memory regardless of input size; sentinel
/// propagation after natural input exhaustion is the only clean shutdown path.
#[derive(Debug)]
pub struct Pipeline {
    config: Arc<PipelineConfig>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Processes the raw dump at `dump` into the intermediate dataset at `dataset`.
    ///
    /// Blocks the calling thread until every stage has terminated. Worker
    /// panics and stage failures are collected and returned aggregated, so a
    /// single failing stage never goes unreported.
    pub fn run(&self, dump: &Path, dataset: &Path) -> IngestResult<PipelineReport> {
        if !dump.is_file() {
            bail!(
                ErrorKind::SourceNotFound,
                "Source dump not found",
                dump.display()
            );
        }

        info!(
            workers = self.config.num_workers,
            queue_capacity = self.config.queue_capacity,
            dump = %dump.display(),
            "starting ingestion pipeline"
        );

        let input = Arc::new(BoundedQueue::new(self.config.queue_capacity));
        let output = Arc::new(BoundedQueue::new(self.config.queue_capacity));

        let reader = SourceReader::new(
            Arc::clone(&self.config),
            dump.to_path_buf(),
            Arc::clone(&input),
        );
        let reader_handle = spawn_stage("source-reader", move || reader.run())?;

        let mut worker_handles = Vec::with_capacity(self.config.num_workers);
        for worker_id in 0..self.config.num_workers {
            let worker = TransformWorker::new(
                worker_id,
                Arc::clone(&self.config),
                Arc::clone(&input),
                Arc::clone(&output),
            );
            worker_handles.push(spawn_stage(&format!("transform-{worker_id}"), move || {
                worker.run()
            })?);
        }

        let writer = SinkWriter::new(
            Arc::clone(&self.config),
            dataset.to_path_buf(),
            Arc::clone(&output),
        );
        let writer_handle = spawn_stage("sink-writer", move || writer.run())?;

        let mut errors = Vec::new();
        let mut report = PipelineReport::default();

        match join_stage(reader_handle, ErrorKind::ReaderWorkerPanic) {
            Ok(reader_report) => {
                report.lines_read = reader_report.lines_read;
                report.unparseable_lines = reader_report.unparseable_lines;
                report.missing_submitter = reader_report.missing_submitter;
            }
            Err(err) => errors.push(err),
        }

        let mut transform_report = TransformReport::default();
        for handle in worker_handles {
            match join_stage(handle, ErrorKind::TransformWorkerPanic) {
                Ok(worker_report) => transform_report.merge(worker_report),
                Err(err) => errors.push(err),
            }
        }
        report.records_cleaned = transform_report.records_cleaned;
        report.drops = transform_report.drops;

        match join_stage(writer_handle, ErrorKind::WriterWorkerPanic) {
            Ok(writer_report) => report.records_written = writer_report.records_written,
            Err(err) => errors.push(err),
        }

        if !errors.is_empty() {
            return Err(errors.into());
        }

        info!(
            cleaned = report.records_cleaned,
            written = report.records_written,
            dropped = report.drops.values().sum::<u64>(),
            "ingestion pipeline finished"
        );

        Ok(report)
    }
}

/// Spawns a named pipeline stage thread.
fn spawn_stage<R, F>(name: &str, stage: F) -> IngestResult<JoinHandle<IngestResult<R>>>
where
    R: Send + 'static,
    F: FnOnce() -> IngestResult<R> + Send + 'static,
{
    thread::Builder::new()
        .name(name.to_string())
        .spawn(stage)
        .map_err(|err| {
            ingest_error!(
                ErrorKind::ConfigError,
                "Cannot spawn pipeline stage thread",
                name,
                source: err
            )
        })
}

/// Joins a stage thread, mapping a panic to the given error kind.
fn join_stage<R>(
    handle: JoinHandle<IngestResult<R>>,
    panic_kind: ErrorKind,
) -> IngestResult<R> {
    match handle.join() {
        Ok(result) => result,
        Err(_) => Err(IngestError::from((panic_kind, "Pipeline stage panicked"))),
    }
}
