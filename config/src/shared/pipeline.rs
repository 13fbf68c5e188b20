use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Configuration for the processing pipeline.
///
/// Queue capacity and timeouts define the backpressure behavior: a full queue
/// blocks producers for `put_timeout_ms` per attempt, an empty queue blocks
/// consumers for `get_timeout_ms`, and neither condition is an error.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PipelineConfig {
    /// Number of parallel transform workers.
    #[serde(default = "default_num_workers")]
    pub num_workers: usize,
    /// Maximum number of in-flight items per inter-stage queue.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Maximum time, in milliseconds, a single blocking put attempt waits for
    /// capacity before retrying.
    #[serde(default = "default_put_timeout_ms")]
    pub put_timeout_ms: u64,
    /// Maximum time, in milliseconds, a get waits on an empty queue before
    /// reporting it as such.
    #[serde(default = "default_get_timeout_ms")]
    pub get_timeout_ms: u64,
    /// Interval, in milliseconds, between reader checks for the input queue to
    /// drain before it emits the shutdown sentinels.
    #[serde(default = "default_drain_poll_ms")]
    pub drain_poll_ms: u64,
}

impl PipelineConfig {
    /// Default number of transform workers.
    pub const DEFAULT_NUM_WORKERS: usize = 12;

    /// Default per-queue capacity.
    pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

    /// Default put attempt timeout in milliseconds.
    pub const DEFAULT_PUT_TIMEOUT_MS: u64 = 1000;

    /// Default get timeout in milliseconds.
    pub const DEFAULT_GET_TIMEOUT_MS: u64 = 1000;

    /// Default drain poll interval in milliseconds.
    pub const DEFAULT_DRAIN_POLL_MS: u64 = 100;

    pub fn put_timeout(&self) -> Duration {
        Duration::from_millis(self.put_timeout_ms)
    }

    pub fn get_timeout(&self) -> Duration {
        Duration::from_millis(self.get_timeout_ms)
    }

    pub fn drain_poll(&self) -> Duration {
        Duration::from_millis(self.drain_poll_ms)
    }

    /// Validates pipeline configuration settings.
    ///
    /// Ensures the worker count and queue capacity are non-zero.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.num_workers == 0 {
            return Err(ValidationError::invalid(
                "pipeline.num_workers",
                "must be greater than 0",
            ));
        }

        if self.queue_capacity == 0 {
            return Err(ValidationError::invalid(
                "pipeline.queue_capacity",
                "must be greater than 0",
            ));
        }

        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            num_workers: default_num_workers(),
            queue_capacity: default_queue_capacity(),
            put_timeout_ms: default_put_timeout_ms(),
            get_timeout_ms: default_get_timeout_ms(),
            drain_poll_ms: default_drain_poll_ms(),
        }
    }
}

fn default_num_workers() -> usize {
    PipelineConfig::DEFAULT_NUM_WORKERS
}

fn default_queue_capacity() -> usize {
    PipelineConfig::DEFAULT_QUEUE_CAPACITY
}

fn default_put_timeout_ms() -> u64 {
    PipelineConfig::DEFAULT_PUT_TIMEOUT_MS
}

fn default_get_timeout_ms() -> u64 {
    PipelineConfig::DEFAULT_GET_TIMEOUT_MS
}

fn default_drain_poll_ms() -> u64 {
    PipelineConfig::DEFAULT_DRAIN_POLL_MS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_workers_fail_validation() {
        let config = PipelineConfig {
            num_workers: 0,
            ..Default::default()
        };

        assert!(config.validate().is_err());
    }
}
