mod common;

use chrono::NaiveDate;
use config::shared::{ForceLevel, LoaderConfig};
use ingest::catalog::CategoryCatalog;
use ingest::destination::memory::{MemoryRelationalStore, MemorySearchStore};
use ingest::error::ErrorKind;
use ingest::loader::DualStoreLoader;
use ingest::types::CleanRecord;
use telemetry::tracing::init_test_tracing;

use crate::common::{CountingStore, FailingStore};

fn sample_records(count: usize) -> Vec<CleanRecord> {
    (0..count)
        .map(|i| common::clean_record(&format!("0704.{i:04}")))
        .collect()
}

fn test_loader_config() -> LoaderConfig {
    LoaderConfig { parts: 4 }
}

#[tokio::test]
async fn load_fills_both_stores_and_reconciles() {
    init_test_tracing();

    let dataset = common::write_dataset(&sample_records(10));
    let search = MemorySearchStore::new();
    let relational = MemoryRelationalStore::new();

    let loader = DualStoreLoader::new(search.clone(), relational.clone(), test_loader_config());
    let report = loader.load(&dataset, ForceLevel::None).await.unwrap();

    assert!(!report.skipped);
    assert!(report.reconciled);
    assert_eq!(report.search.records_written, 10);
    assert_eq!(report.relational.records_written, 10);
    assert_eq!(report.counts.search, 10);
    assert_eq!(report.counts.relational, 10);

    // The search store keeps the cleaned record untouched, calendar dates as
    // strings, while the relational store applied its own row transformation.
    let documents = search.documents().await;
    assert_eq!(documents["0704.0003"].create_date, "2007-04-02");

    let rows = relational.rows().await;
    let row = &rows["0704.0003"];
    assert_eq!(row.arxiv_id, "0704.0003");
    assert_eq!(row.create_date, NaiveDate::from_ymd_opt(2007, 4, 2).unwrap());
    assert_eq!(row.update_date, NaiveDate::from_ymd_opt(2007, 7, 24).unwrap());
}

#[tokio::test]
async fn second_run_is_skipped_when_the_stores_agree() {
    init_test_tracing();

    let dataset = common::write_dataset(&sample_records(8));
    let search = CountingStore::new(MemorySearchStore::new());
    let relational = CountingStore::new(MemoryRelationalStore::new());

    let loader = DualStoreLoader::new(search.clone(), relational.clone(), test_loader_config());

    let first = loader.load(&dataset, ForceLevel::None).await.unwrap();
    assert!(!first.skipped);
    let batches_after_first = (search.write_batches(), relational.write_batches());
    assert!(batches_after_first.0 > 0);

    // The stores now agree and are non-empty, so a plain re-run must not
    // touch them at all.
    let second = loader.load(&dataset, ForceLevel::None).await.unwrap();
    assert!(second.skipped);
    assert!(second.reconciled);
    assert_eq!(
        (search.write_batches(), relational.write_batches()),
        batches_after_first
    );
}

#[tokio::test]
async fn force_reload_bypasses_the_skip_guard() {
    init_test_tracing();

    let dataset = common::write_dataset(&sample_records(8));
    let search = CountingStore::new(MemorySearchStore::new());
    let relational = CountingStore::new(MemoryRelationalStore::new());

    let loader = DualStoreLoader::new(search.clone(), relational.clone(), test_loader_config());

    loader.load(&dataset, ForceLevel::None).await.unwrap();
    let batches_after_first = search.write_batches();

    let report = loader
        .load(&dataset, ForceLevel::ReloadStores)
        .await
        .unwrap();

    assert!(!report.skipped);
    assert!(report.reconciled);
    assert!(search.write_batches() > batches_after_first);

    // The stores were recreated before the reload, so no double counting.
    assert_eq!(report.counts.search, 8);
    assert_eq!(report.counts.relational, 8);
}

#[tokio::test]
async fn store_failures_stay_in_their_own_fault_domain() {
    init_test_tracing();

    let dataset = common::write_dataset(&sample_records(10));
    let relational = MemoryRelationalStore::new();

    let loader = DualStoreLoader::new(FailingStore, relational.clone(), test_loader_config());
    let report = loader.load(&dataset, ForceLevel::None).await.unwrap();

    // Every search batch failed, yet the relational load ran to completion.
    assert!(report.search.failed_parts > 0);
    assert_eq!(report.search.records_written, 0);
    assert_eq!(report.relational.failed_parts, 0);
    assert_eq!(report.relational.records_written, 10);
    assert_eq!(relational.rows().await.len(), 10);

    // The divergence is reported, not auto-corrected.
    assert!(!report.reconciled);
}

#[tokio::test]
async fn missing_dataset_is_fatal() {
    init_test_tracing();

    let loader = DualStoreLoader::new(
        MemorySearchStore::new(),
        MemoryRelationalStore::new(),
        test_loader_config(),
    );

    let err = loader
        .load(&common::temp_file("does-not-exist"), ForceLevel::None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DatasetMissing);
}

#[tokio::test]
async fn unknown_categories_are_counted_against_the_catalog() {
    init_test_tracing();

    let mut records = sample_records(3);
    records[1].categories = vec![
        "cs".to_string(),
        "cs.AI".to_string(),
        "math".to_string(),
        "math.GT".to_string(),
    ];
    let dataset = common::write_dataset(&records);

    let loader = DualStoreLoader::new(
        MemorySearchStore::new(),
        MemoryRelationalStore::new(),
        test_loader_config(),
    )
    .with_catalog(CategoryCatalog::from_names(["cs.AI"]));

    let report = loader.load(&dataset, ForceLevel::None).await.unwrap();

    // Only the relational task checks the catalog; `math` and `math.GT` are
    // the two tokens it does not know.
    assert_eq!(report.search.unknown_categories, 0);
    assert_eq!(report.relational.unknown_categories, 2);
    assert_eq!(report.relational.records_written, 3);
}

#[tokio::test]
async fn unparseable_dataset_lines_are_skipped() {
    init_test_tracing();

    let mut lines: Vec<String> = sample_records(4)
        .iter()
        .map(|record| serde_json::to_string(record).unwrap())
        .collect();
    lines.insert(2, "not a record".to_string());
    let dataset = common::write_lines("dataset", &lines);

    let search = MemorySearchStore::new();
    let loader = DualStoreLoader::new(
        search.clone(),
        MemoryRelationalStore::new(),
        test_loader_config(),
    );

    let report = loader.load(&dataset, ForceLevel::None).await.unwrap();

    assert_eq!(report.search.unparseable_lines, 1);
    assert_eq!(report.search.records_written, 4);
    assert!(report.reconciled);
    assert_eq!(search.documents().await.len(), 4);
}
