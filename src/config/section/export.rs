//! `[export]` section configuration.
//!
//! ```toml
//! [export]
//! dir = "~/Pictures/diagrams"   # where the save dialog starts (default: next to the document)
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Export settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Starting directory for suggested export destinations.
    pub dir: Option<PathBuf>,
}
