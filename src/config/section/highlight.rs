//! `[highlight]` section configuration.
//!
//! ```toml
//! [highlight]
//! fade_ms = 500         # delay before the cursor highlight fades
//! faded_opacity = 0.7
//! ```

use serde::{Deserialize, Serialize};

/// Cursor highlight overlay settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub fade_ms: u64,
    pub faded_opacity: f64,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            fade_ms: 500,
            faded_opacity: 0.7,
        }
    }
}

impl HighlightConfig {
    pub fn validate(&self, errors: &mut Vec<String>) {
        if !(0.0..=1.0).contains(&self.faded_opacity) {
            errors.push("[highlight] faded_opacity must be in [0, 1]".into());
        }
    }
}
