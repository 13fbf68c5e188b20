use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// How forceful a setup run should be.
///
/// Maps directly to the operator-facing `--force` count: passing the flag once
/// reuses an existing intermediate dataset, passing it twice (or more)
/// reprocesses from the raw dump.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ForceLevel {
    /// Skip entirely when both stores agree and are non-empty.
    None,
    /// Reuse the existing intermediate dataset and only reload the stores.
    ReloadStores,
    /// Reprocess from the raw dump, then reload the stores.
    Reprocess,
}

impl ForceLevel {
    /// Converts the countable CLI flag into a force level.
    pub fn from_count(count: u8) -> Self {
        match count {
            0 => ForceLevel::None,
            1 => ForceLevel::ReloadStores,
            _ => ForceLevel::Reprocess,
        }
    }
}

impl Default for ForceLevel {
    fn default() -> Self {
        ForceLevel::None
    }
}

/// Configuration for the dual-store loader.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoaderConfig {
    /// Number of contiguous parts the dataset is partitioned into; each part
    /// is one batched upsert and one unit of progress reporting.
    #[serde(default = "default_parts")]
    pub parts: usize,
}

impl LoaderConfig {
    /// Default number of dataset parts.
    pub const DEFAULT_PARTS: usize = 25;

    /// Validates loader configuration settings.
    ///
    /// Ensures the part count is non-zero.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.parts == 0 {
            return Err(ValidationError::invalid(
                "loader.parts",
                "must be greater than 0",
            ));
        }

        Ok(())
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            parts: default_parts(),
        }
    }
}

fn default_parts() -> usize {
    LoaderConfig::DEFAULT_PARTS
}
