//! Sink writer: the single consumer persisting the intermediate dataset.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

use config::shared::PipelineConfig;
use tracing::info;

use crate::concurrency::queue::{BoundedQueue, GetTimeoutError};
use crate::error::{ErrorKind, IngestError, IngestResult};
use crate::ingest_error;
use crate::types::{CleanRecord, Message};

/// Counters produced by one writer run.
#[derive(Debug, Clone, Default)]
pub struct WriterReport {
    /// Cleaned records appended to the intermediate dataset.
    pub records_written: u64,
    /// Sentinels observed before termination.
    pub sentinels_seen: usize,
}

/// Single consumer draining the output queue into the intermediate dataset.
///
/// Appends each cleaned record as one JSON line in arrival order, which may
/// differ from input order since the transform workers run in parallel; this
/// reordering is an accepted property of the pipeline, not a defect. The
/// writer opens its output exactly once per run and terminates after counting
/// one sentinel per transform worker. Partial writes on abnormal termination
/// are not rolled back.
#[derive(Debug)]
pub struct SinkWriter {
    config: Arc<PipelineConfig>,
    dataset: PathBuf,
    queue: Arc<BoundedQueue<Message<CleanRecord>>>,
}

impl SinkWriter {
    pub fn new(
        config: Arc<PipelineConfig>,
        dataset: PathBuf,
        queue: Arc<BoundedQueue<Message<CleanRecord>>>,
    ) -> Self {
        Self {
            config,
            dataset,
            queue,
        }
    }

    /// Drains the queue until one sentinel per worker has been observed.
    pub fn run(self) -> IngestResult<WriterReport> {
        match self.write() {
            Ok(report) => Ok(report),
            Err(err) => {
                // Unblock the transform workers instead of letting them spin
                // against a consumer that will never return.
                self.queue.close();

                Err(err)
            }
        }
    }

    fn write(&self) -> IngestResult<WriterReport> {
        let file = File::create(&self.dataset).map_err(|err| self.io_error(err))?;
        let mut writer = BufWriter::new(file);

        let get_timeout = self.config.get_timeout();

        let mut report = WriterReport::default();
        loop {
            match self.queue.get_timeout(get_timeout) {
                // Momentarily empty but not terminated, wait for more data.
                Err(GetTimeoutError::Empty) => continue,
                // The upstream stages failed and closed the queue.
                Err(GetTimeoutError::Closed) => break,
                Ok(Message::Sentinel) => {
                    // Workers' sentinels arrive in any order; all must be
                    // accounted for before terminating.
                    report.sentinels_seen += 1;
                    if report.sentinels_seen == self.config.num_workers {
                        break;
                    }
                }
                Ok(Message::Record(clean)) => {
                    let line = serde_json::to_string(&clean).map_err(|err| {
                        ingest_error!(
                            ErrorKind::SerializationError,
                            "Cannot serialize cleaned record",
                            clean.id,
                            source: err
                        )
                    })?;

                    writer
                        .write_all(line.as_bytes())
                        .and_then(|()| writer.write_all(b"\n"))
                        .map_err(|err| self.io_error(err))?;

                    report.records_written += 1;
                }
            }
        }

        writer.flush().map_err(|err| self.io_error(err))?;

        info!(
            records = report.records_written,
            sentinels = report.sentinels_seen,
            dataset = %self.dataset.display(),
            "intermediate dataset written"
        );

        Ok(report)
    }

    fn io_error(&self, err: std::io::Error) -> IngestError {
        ingest_error!(
            ErrorKind::DatasetIoError,
            "Cannot write intermediate dataset",
            self.dataset.display(),
            source: err
        )
    }
}
