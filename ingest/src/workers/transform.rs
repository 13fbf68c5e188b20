//! Transform workers: the parallel normalization stage.

use std::collections::BTreeMap;
use std::sync::Arc;

use config::shared::PipelineConfig;
use tracing::debug;

use crate::concurrency::queue::{BoundedQueue, GetTimeoutError};
use crate::conversions::record::normalize;
use crate::types::{CleanRecord, DropReason, Message, RawRecord};

/// Counters produced by one transform worker run.
#[derive(Debug, Clone, Default)]
pub struct TransformReport {
    /// Records successfully normalized and forwarded.
    pub records_cleaned: u64,
    /// Dropped records, counted per reason.
    pub drops: BTreeMap<DropReason, u64>,
}

impl TransformReport {
    /// Total number of records dropped by this worker.
    pub fn records_dropped(&self) -> u64 {
        self.drops.values().sum()
    }

    /// Folds another report into this one.
    pub fn merge(&mut self, other: TransformReport) {
        self.records_cleaned += other.records_cleaned;
        for (reason, count) in other.drops {
            *self.drops.entry(reason).or_default() += count;
        }
    }
}

/// One worker of the normalization pool.
///
/// Pulls raw records from the shared input queue, normalizes them, and pushes
/// cleaned records to the shared output queue. On receiving its own sentinel it
/// forwards exactly one sentinel downstream and exits; it never short-circuits
/// another worker's shutdown. A record that fails normalization is dropped and
/// counted, never propagated as an error.
#[derive(Debug)]
pub struct TransformWorker {
    worker_id: usize,
    config: Arc<PipelineConfig>,
    input: Arc<BoundedQueue<Message<RawRecord>>>,
    output: Arc<BoundedQueue<Message<CleanRecord>>>,
}

impl TransformWorker {
    pub fn new(
        worker_id: usize,
        config: Arc<PipelineConfig>,
        input: Arc<BoundedQueue<Message<RawRecord>>>,
        output: Arc<BoundedQueue<Message<CleanRecord>>>,
    ) -> Self {
        Self {
            worker_id,
            config,
            input,
            output,
        }
    }

    /// Runs the worker loop until a sentinel is observed.
    pub fn run(self) -> crate::error::IngestResult<TransformReport> {
        let get_timeout = self.config.get_timeout();
        let put_timeout = self.config.put_timeout();

        let mut report = TransformReport::default();
        loop {
            let raw = match self.input.get_timeout(get_timeout) {
                // Momentarily empty but not terminated, wait for more data.
                Err(GetTimeoutError::Empty) => continue,
                // A sibling stage failed and closed the queue; still forward
                // the sentinel so the writer can account for this worker.
                Err(GetTimeoutError::Closed) | Ok(Message::Sentinel) => {
                    self.output.put(Message::Sentinel, put_timeout)?;
                    break;
                }
                Ok(Message::Record(raw)) => raw,
            };

            match normalize(raw) {
                Ok(clean) => {
                    if let Err(err) = self.output.put(Message::Record(clean), put_timeout) {
                        // The writer is gone; unwind the upstream stages too.
                        self.input.close();
                        return Err(err);
                    }

                    report.records_cleaned += 1;
                }
                Err(dropped) => {
                    debug!(
                        worker = self.worker_id,
                        id = dropped.id.as_deref().unwrap_or("<unknown>"),
                        reason = dropped.reason.as_str(),
                        "dropping malformed record"
                    );

                    *report.drops.entry(dropped.reason).or_default() += 1;
                }
            }
        }

        debug!(
            worker = self.worker_id,
            cleaned = report.records_cleaned,
            dropped = report.records_dropped(),
            "transform worker finished"
        );

        Ok(report)
    }
}
