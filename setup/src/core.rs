use anyhow::{bail, Context};
use config::shared::{ForceLevel, LoaderConfig, PipelineConfig};
use ingest::catalog::CategoryCatalog;
use ingest::destination::memory::{MemoryRelationalStore, MemorySearchStore};
use ingest::loader::DualStoreLoader;
use ingest::pipeline::Pipeline;
use tracing::info;

use crate::SetupArgs;

/// Runs the full setup flow: optional preprocessing, then the dual-store load.
pub async fn start_setup(args: SetupArgs) -> anyhow::Result<()> {
    let force = ForceLevel::from_count(args.force);
    let dataset = args
        .dataset
        .clone()
        .unwrap_or_else(|| args.dump.with_file_name("arxiv-processed.jsonl"));

    let mut pipeline_config = PipelineConfig::default();
    if let Some(workers) = args.workers {
        pipeline_config.num_workers = workers;
    }
    pipeline_config.validate()?;

    let loader_config = LoaderConfig::default();
    loader_config.validate()?;

    // The store bindings are external collaborators; this binary wires the
    // in-memory destinations. Deployments plug their own store clients into
    // the same trait.
    let search = MemorySearchStore::new();
    let relational = MemoryRelationalStore::new();

    let mut loader = DualStoreLoader::new(search, relational, loader_config);
    if let Some(path) = &args.categories {
        let catalog = CategoryCatalog::from_file(path)?;
        info!(categories = catalog.len(), "loaded category taxonomy");
        loader = loader.with_catalog(catalog);
    }

    // Check store agreement before the expensive preprocessing phase, not
    // just inside the loader.
    if force == ForceLevel::None && loader.stores_in_sync().await {
        info!("both stores already agree and are non-empty, nothing to do");
        return Ok(());
    }

    match force {
        ForceLevel::ReloadStores => {
            if !dataset.is_file() {
                bail!(
                    "intermediate dataset {} does not exist; re-run with -ff to reprocess the dump",
                    dataset.display()
                );
            }

            info!(dataset = %dataset.display(), "reusing the existing intermediate dataset");
        }
        ForceLevel::None | ForceLevel::Reprocess => {
            let pipeline = Pipeline::new(pipeline_config);
            let dump = args.dump.clone();
            let dataset = dataset.clone();

            // The pipeline is synchronous CPU-bound work on its own threads.
            let report = tokio::task::spawn_blocking(move || pipeline.run(&dump, &dataset))
                .await
                .context("pipeline task panicked")??;

            info!(
                written = report.records_written,
                dropped = report.drops.values().sum::<u64>(),
                missing_submitter = report.missing_submitter,
                "preprocessing finished"
            );
        }
    }

    let report = loader.load(&dataset, force).await?;
    if report.skipped {
        info!("load skipped, both stores already agree");
    } else {
        info!(
            search = report.search.records_written,
            relational = report.relational.records_written,
            reconciled = report.reconciled,
            "load finished"
        );
    }

    Ok(())
}
