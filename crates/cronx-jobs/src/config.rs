//! Ambient scheduler configuration.

use serde::{Deserialize, Serialize};

/// Tunables that sit outside the per-job strategy/retry fields: where
/// the store file lives, and the default retry policy applied when a
/// job doesn't carry its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Path to the SQLite store file.
    #[serde(default = "default_store_path")]
    pub store_path: String,

    /// Optional RNG seed; when set, every strategy's draws become
    /// reproducible.
    #[serde(default)]
    pub seed: Option<String>,
}

fn default_store_path() -> String {
    "cronx.db".to_string()
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            seed: None,
        }
    }
}
