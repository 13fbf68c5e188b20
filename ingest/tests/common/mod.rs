#![allow(dead_code)]

//! Shared helpers for the integration tests.

use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use config::shared::PipelineConfig;
use ingest::destination::base::StoreDestination;
use ingest::error::{ErrorKind, IngestResult};
use ingest::ingest_error;
use ingest::types::CleanRecord;

/// Returns a unique path in the system temp directory.
pub fn temp_file(prefix: &str) -> PathBuf {
    env::temp_dir().join(format!("{prefix}-{}.jsonl", rand::random::<u64>()))
}

/// Writes `lines` as a newline-delimited file and returns its path.
pub fn write_lines(prefix: &str, lines: &[String]) -> PathBuf {
    let path = temp_file(prefix);
    fs::write(&path, lines.join("\n") + "\n").unwrap();
    path
}

/// Builds one raw dump line with the given identity fields.
pub fn raw_line(
    id: &str,
    submitter: Option<&str>,
    categories: &str,
    comments: Option<&str>,
) -> String {
    serde_json::json!({
        "id": id,
        "submitter": submitter,
        "authors_parsed": [["Doe", "John", ""]],
        "title": format!("Title {id}"),
        "abstract": "We prove things.",
        "comments": comments,
        "journal-ref": null,
        "doi": null,
        "categories": categories,
        "versions": [
            {"version": "v1", "created": "Mon, 2 Apr 2007 19:18:42 GMT"},
            {"version": "v2", "created": "Tue, 24 Jul 2007 20:10:27 GMT"}
        ],
        "update_date": "2007-07-24"
    })
    .to_string()
}

/// Builds a cleaned record ready for loader tests.
pub fn clean_record(id: &str) -> CleanRecord {
    CleanRecord {
        id: id.to_string(),
        submitter: "Jane Roe".to_string(),
        authors: vec!["Doe John".to_string(), "Jane Roe".to_string()],
        title: format!("Title {id}"),
        comments: String::new(),
        journal_ref: None,
        doi: None,
        categories: vec!["cs".to_string(), "cs.AI".to_string()],
        abstract_text: "We prove things.".to_string(),
        create_date: "2007-04-02".to_string(),
        update_date: "2007-07-24".to_string(),
    }
}

/// Writes cleaned records as an intermediate dataset file.
pub fn write_dataset(records: &[CleanRecord]) -> PathBuf {
    let lines: Vec<String> = records
        .iter()
        .map(|record| serde_json::to_string(record).unwrap())
        .collect();

    write_lines("dataset", &lines)
}

/// Pipeline configuration with short timeouts for fast tests.
pub fn test_pipeline_config(num_workers: usize) -> PipelineConfig {
    PipelineConfig {
        num_workers,
        queue_capacity: 16,
        put_timeout_ms: 50,
        get_timeout_ms: 50,
        drain_poll_ms: 10,
    }
}

/// Store wrapper counting how many batched upserts were issued.
#[derive(Debug, Clone)]
pub struct CountingStore<D> {
    inner: D,
    write_batches: Arc<AtomicU64>,
}

impl<D> CountingStore<D> {
    pub fn new(inner: D) -> Self {
        Self {
            inner,
            write_batches: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Number of [`StoreDestination::write_batch`] calls observed.
    pub fn write_batches(&self) -> u64 {
        self.write_batches.load(Ordering::SeqCst)
    }
}

impl<D> StoreDestination for CountingStore<D>
where
    D: StoreDestination + Send + Sync,
{
    fn name() -> &'static str {
        D::name()
    }

    async fn record_count(&self) -> IngestResult<u64> {
        self.inner.record_count().await
    }

    async fn recreate(&self) -> IngestResult<()> {
        self.inner.recreate().await
    }

    async fn write_batch(&self, batch: Vec<CleanRecord>) -> IngestResult<()> {
        self.write_batches.fetch_add(1, Ordering::SeqCst);
        self.inner.write_batch(batch).await
    }
}

/// Store whose batched upserts always fail, for fault-domain tests.
#[derive(Debug, Clone, Default)]
pub struct FailingStore;

impl StoreDestination for FailingStore {
    fn name() -> &'static str {
        "failing-store"
    }

    async fn record_count(&self) -> IngestResult<u64> {
        Ok(0)
    }

    async fn recreate(&self) -> IngestResult<()> {
        Ok(())
    }

    async fn write_batch(&self, _batch: Vec<CleanRecord>) -> IngestResult<()> {
        Err(ingest_error!(
            ErrorKind::DestinationError,
            "Simulated store outage"
        ))
    }
}
