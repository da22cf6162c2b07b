//! Reallocator timing and behaviour configuration.
//!
//! Every field defaults to the production values: 60 attempts one second
//! apart for mutations, a 3 second settle after the soft attempt, a 1 second
//! pause while scaled to zero, and 60 convergence polls one second apart.
//! A JSON file may override any subset of fields; unknown keys are rejected.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::retry::{RetryConfig, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_INTERVAL};
use crate::{Error, Result};

/// Tunables for one reallocation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReallocatorConfig {
    /// Attempt cap for replica and affinity mutations
    pub max_attempts: u32,
    /// Seconds between mutation attempts
    pub retry_interval_secs: u64,
    /// Seconds to wait after the soft attempt before reading status
    pub settle_delay_secs: u64,
    /// Seconds to stay at zero replicas in hard mode
    pub scale_down_pause_secs: u64,
    /// Polls before giving up on ReplicaFailure clearing
    pub convergence_polls: u32,
    /// Seconds between convergence polls
    pub poll_interval_secs: u64,
}

impl Default for ReallocatorConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_interval_secs: DEFAULT_RETRY_INTERVAL.as_secs(),
            settle_delay_secs: 3,
            scale_down_pause_secs: 1,
            convergence_polls: DEFAULT_MAX_ATTEMPTS,
            poll_interval_secs: 1,
        }
    }
}

impl ReallocatorConfig {
    /// Load from a JSON file; absent fields keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("failed to read {}: {}", path.display(), e)))?;
        Self::from_json(&data)
            .map_err(|e| Error::config(format!("failed to parse {}: {}", path.display(), e)))
    }

    /// Parse from a JSON string
    pub fn from_json(data: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(data)
    }

    /// Same attempt caps with every delay set to zero
    pub fn without_delays(mut self) -> Self {
        self.retry_interval_secs = 0;
        self.settle_delay_secs = 0;
        self.scale_down_pause_secs = 0;
        self.poll_interval_secs = 0;
        self
    }

    /// Retry policy for replica and affinity mutations
    pub fn retry(&self) -> RetryConfig {
        RetryConfig::new(self.max_attempts, Duration::from_secs(self.retry_interval_secs))
    }

    /// Wait after the soft attempt
    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settle_delay_secs)
    }

    /// Pause between scale-to-zero and restore
    pub fn scale_down_pause(&self) -> Duration {
        Duration::from_secs(self.scale_down_pause_secs)
    }

    /// Delay between convergence polls
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}
