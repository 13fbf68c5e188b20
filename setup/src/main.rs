//! Setup binary for the ingestion workspace.
//!
//! Runs the preprocessing pipeline over the raw metadata dump and loads the
//! resulting intermediate dataset into both backing stores, honoring the
//! operator-selected force level.

use std::path::PathBuf;

use clap::{ArgAction, Parser};

mod core;

#[derive(Debug, Parser)]
#[command(name = "setup", about = "Prepare the metadata stores from the raw dump")]
pub struct SetupArgs {
    /// Path to the raw metadata dump (one JSON record per line).
    #[arg(long, default_value = "arxiv-metadata-oai-snapshot.json")]
    pub dump: PathBuf,

    /// Path of the intermediate dataset; defaults to `arxiv-processed.jsonl`
    /// next to the dump.
    #[arg(long)]
    pub dataset: Option<PathBuf>,

    /// Path to the semicolon-delimited category taxonomy file.
    #[arg(long)]
    pub categories: Option<PathBuf>,

    /// Number of parallel transform workers.
    #[arg(long)]
    pub workers: Option<usize>,

    /// How forceful the setup should be: omit to skip when both stores agree,
    /// pass once to reuse the intermediate dataset and only reload the stores,
    /// pass twice to reprocess from the raw dump.
    #[arg(short, long, action = ArgAction::Count)]
    pub force: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::tracing::init_tracing();

    let args = SetupArgs::parse();
    core::start_setup(args).await
}
