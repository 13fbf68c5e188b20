//! Source reader: the single producer at the head of the pipeline.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use config::shared::PipelineConfig;
use tracing::{debug, info, warn};

use crate::concurrency::queue::BoundedQueue;
use crate::error::{ErrorKind, IngestResult};
use crate::types::{Message, RawRecord};
use crate::{bail, ingest_error};

/// How many lines to read between progress log events.
const PROGRESS_EVERY: u64 = 100_000;

/// Counters produced by one reader run.
#[derive(Debug, Clone, Default)]
pub struct ReaderReport {
    /// Total lines seen in the dump.
    pub lines_read: u64,
    /// Lines that were not valid JSON objects.
    pub unparseable_lines: u64,
    /// Records discarded because the submitter field was null or absent.
    pub missing_submitter: u64,
    /// Records forwarded into the input queue.
    pub records_forwarded: u64,
}

/// Single producer streaming raw records from the dump into the input queue.
///
/// The only validity gate at this stage is the submitter field: records with a
/// null submitter never enter the pipeline. Everything else is the transform
/// workers' concern. The reader is infallible with respect to malformed
/// individual lines; it is fatal only if the source cannot be opened.
#[derive(Debug)]
pub struct SourceReader {
    config: Arc<PipelineConfig>,
    dump: PathBuf,
    queue: Arc<BoundedQueue<Message<RawRecord>>>,
}

impl SourceReader {
    pub fn new(
        config: Arc<PipelineConfig>,
        dump: PathBuf,
        queue: Arc<BoundedQueue<Message<RawRecord>>>,
    ) -> Self {
        Self {
            config,
            dump,
            queue,
        }
    }

    /// Streams the dump into the input queue, then signals shutdown.
    ///
    /// After the source is exhausted the reader waits for the input queue to
    /// drain before enqueueing exactly one sentinel per transform worker, so
    /// that every worker observes its sentinel strictly after the last real
    /// record.
    pub fn run(self) -> IngestResult<ReaderReport> {
        match self.read() {
            Ok(report) => Ok(report),
            Err(err) => {
                // Release the transform workers instead of leaving them
                // polling a queue that will never receive its sentinels.
                self.queue.close();

                Err(err)
            }
        }
    }

    fn read(&self) -> IngestResult<ReaderReport> {
        // Pre-scan the line count so progress can be reported as a percentage.
        let total_lines = BufReader::new(self.open_dump()?)
            .lines()
            .map_while(Result::ok)
            .count() as u64;

        info!(total_lines, "reading source dump");

        let reader = BufReader::new(self.open_dump()?);
        let put_timeout = self.config.put_timeout();

        let mut report = ReaderReport::default();
        for line in reader.lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    warn!(error = %err, "i/o error while reading a dump line, skipping");
                    report.unparseable_lines += 1;
                    continue;
                }
            };
            report.lines_read += 1;

            let raw: RawRecord = match serde_json::from_str(&line) {
                Ok(raw) => raw,
                Err(err) => {
                    debug!(error = %err, line = report.lines_read, "dropping unparseable line");
                    report.unparseable_lines += 1;
                    continue;
                }
            };

            if raw.submitter.is_none() {
                report.missing_submitter += 1;
                continue;
            }

            self.queue.put(Message::Record(raw), put_timeout)?;
            report.records_forwarded += 1;

            if report.lines_read % PROGRESS_EVERY == 0 && total_lines > 0 {
                debug!(
                    "read {:.1}% of the dump",
                    report.lines_read as f64 / total_lines as f64 * 100.0
                );
            }
        }

        info!(
            forwarded = report.records_forwarded,
            missing_submitter = report.missing_submitter,
            unparseable = report.unparseable_lines,
            "source exhausted, waiting for the input queue to drain"
        );

        // Sentinels must be observed strictly after the last real record by
        // every worker, so wait until in-flight records have been consumed.
        let drain_poll = self.config.drain_poll();
        while !self.queue.is_empty() {
            if self.queue.is_closed() {
                bail!(
                    ErrorKind::QueueClosed,
                    "Input queue closed while the reader was draining"
                );
            }

            thread::sleep(drain_poll);
        }

        for _ in 0..self.config.num_workers {
            self.queue.put(Message::Sentinel, put_timeout)?;
        }

        Ok(report)
    }

    fn open_dump(&self) -> IngestResult<File> {
        File::open(&self.dump).map_err(|err| {
            ingest_error!(
                ErrorKind::SourceNotFound,
                "Cannot open source dump",
                self.dump.display(),
                source: err
            )
        })
    }
}
