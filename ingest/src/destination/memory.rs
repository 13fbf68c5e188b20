//! In-memory destinations for testing and development.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::Mutex;
use tracing::info;

use crate::destination::base::StoreDestination;
use crate::error::{ErrorKind, IngestResult};
use crate::ingest_error;
use crate::types::CleanRecord;

/// In-memory stand-in for the full-text search store.
///
/// Stores cleaned records keyed by identifier, mirroring the upsert semantics
/// of a document index. All data is held in memory and lost when the process
/// terminates, which makes this ideal for tests and development runs.
#[derive(Debug, Clone, Default)]
pub struct MemorySearchStore {
    documents: Arc<Mutex<HashMap<String, CleanRecord>>>,
}

impl MemorySearchStore {
    /// Creates a new empty search store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all stored documents keyed by identifier.
    ///
    /// Useful for verifying loader behavior in tests.
    pub async fn documents(&self) -> HashMap<String, CleanRecord> {
        self.documents.lock().await.clone()
    }
}

impl StoreDestination for MemorySearchStore {
    fn name() -> &'static str {
        "memory-search"
    }

    async fn record_count(&self) -> IngestResult<u64> {
        Ok(self.documents.lock().await.len() as u64)
    }

    async fn recreate(&self) -> IngestResult<()> {
        info!("recreating the in-memory search index");
        self.documents.lock().await.clear();

        Ok(())
    }

    async fn write_batch(&self, batch: Vec<CleanRecord>) -> IngestResult<()> {
        let mut documents = self.documents.lock().await;
        for record in batch {
            documents.insert(record.id.clone(), record);
        }

        Ok(())
    }
}

/// One row of the in-memory relational store.
///
/// This is the relational store's private value representation: the identifier
/// moves into an `arxiv_id` column and the calendar-date strings are parsed
/// into native dates. The conversion happens on the store's own copy of the
/// batch, so the search store's view of the same records is never affected.
#[derive(Debug, Clone, PartialEq)]
pub struct PaperRow {
    pub arxiv_id: String,
    pub submitter: String,
    pub authors: Vec<String>,
    pub title: String,
    pub comments: String,
    pub journal_ref: Option<String>,
    pub doi: Option<String>,
    pub categories: Vec<String>,
    pub abstract_text: String,
    pub create_date: NaiveDate,
    pub update_date: NaiveDate,
}

impl PaperRow {
    fn try_from_record(record: CleanRecord) -> IngestResult<Self> {
        let create_date = parse_date(&record.create_date)?;
        let update_date = parse_date(&record.update_date)?;

        Ok(Self {
            arxiv_id: record.id,
            submitter: record.submitter,
            authors: record.authors,
            title: record.title,
            comments: record.comments,
            journal_ref: record.journal_ref,
            doi: record.doi,
            categories: record.categories,
            abstract_text: record.abstract_text,
            create_date,
            update_date,
        })
    }
}

fn parse_date(value: &str) -> IngestResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|err| {
        ingest_error!(
            ErrorKind::InvalidData,
            "Record carries a malformed calendar date",
            value,
            source: err
        )
    })
}

/// In-memory stand-in for the relational store.
#[derive(Debug, Clone, Default)]
pub struct MemoryRelationalStore {
    rows: Arc<Mutex<HashMap<String, PaperRow>>>,
}

impl MemoryRelationalStore {
    /// Creates a new empty relational store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all stored rows keyed by `arxiv_id`.
    ///
    /// Useful for verifying loader behavior in tests.
    pub async fn rows(&self) -> HashMap<String, PaperRow> {
        self.rows.lock().await.clone()
    }
}

impl StoreDestination for MemoryRelationalStore {
    fn name() -> &'static str {
        "memory-relational"
    }

    async fn record_count(&self) -> IngestResult<u64> {
        Ok(self.rows.lock().await.len() as u64)
    }

    async fn recreate(&self) -> IngestResult<()> {
        info!("recreating the in-memory papers table");
        self.rows.lock().await.clear();

        Ok(())
    }

    async fn write_batch(&self, batch: Vec<CleanRecord>) -> IngestResult<()> {
        // Transform into the private row representation before taking the
        // lock, so a malformed batch fails without partially applying.
        let mut converted = Vec::with_capacity(batch.len());
        for record in batch {
            converted.push(PaperRow::try_from_record(record)?);
        }

        let mut rows = self.rows.lock().await;
        for row in converted {
            rows.insert(row.arxiv_id.clone(), row);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversions::record::normalize;
    use crate::types::{RawRecord, RawVersion};

    fn clean_record(id: &str) -> CleanRecord {
        let raw = RawRecord {
            id: Some(id.to_string()),
            submitter: Some("Jane Roe".to_string()),
            authors_parsed: vec![],
            title: Some("Title".to_string()),
            abstract_text: Some("Abstract".to_string()),
            comments: None,
            journal_ref: None,
            doi: None,
            categories: Some("cs.AI".to_string()),
            versions: vec![RawVersion {
                version: "v1".to_string(),
                created: Some("Mon, 2 Apr 2007 19:18:42 GMT".to_string()),
            }],
            update_date: None,
        };

        normalize(raw).unwrap()
    }

    #[tokio::test]
    async fn write_batch_upserts_by_identifier() {
        let store = MemorySearchStore::new();

        store.write_batch(vec![clean_record("a"), clean_record("a")]).await.unwrap();
        assert_eq!(store.record_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn relational_store_parses_native_dates() {
        let store = MemoryRelationalStore::new();
        store.write_batch(vec![clean_record("a")]).await.unwrap();

        let rows = store.rows().await;
        let row = rows.get("a").unwrap();
        assert_eq!(
            row.create_date,
            NaiveDate::from_ymd_opt(2007, 4, 2).unwrap()
        );
    }

    #[tokio::test]
    async fn recreate_discards_all_records() {
        let store = MemorySearchStore::new();
        store.write_batch(vec![clean_record("a")]).await.unwrap();

        store.recreate().await.unwrap();
        assert_eq!(store.record_count().await.unwrap(), 0);
    }
}
