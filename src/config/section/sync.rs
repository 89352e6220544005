//! `[sync]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [sync]
//! debounce_ms = 300           # Edit relay window
//! max_source_bytes = 1048576  # Larger sources are rejected
//! ```

use serde::{Deserialize, Serialize};

/// Edit synchronization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Quiet period after the last keystroke before an edit is relayed.
    pub debounce_ms: u64,

    /// Upper bound on diagram source size, in bytes.
    pub max_source_bytes: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            max_source_bytes: 1024 * 1024,
        }
    }
}

impl SyncConfig {
    pub fn validate(&self, errors: &mut Vec<String>) {
        if self.debounce_ms == 0 {
            errors.push("[sync] debounce_ms must be greater than 0".into());
        }
        if self.max_source_bytes == 0 {
            errors.push("[sync] max_source_bytes must be greater than 0".into());
        }
    }
}
