//! Configuration management for `studio.toml`.
//!
//! # Sections
//!
//! | Section        | Purpose                                           |
//! |----------------|---------------------------------------------------|
//! | `[sync]`       | Edit relay debounce, source size limit            |
//! | `[viewport]`   | Zoom range and steps, fit margin, re-render policy |
//! | `[export]`     | Suggested export directory                        |
//! | `[render]`     | External renderer command, theme, background      |
//! | `[highlight]`  | Cursor highlight fade timing                      |
//!
//! The file is optional: without one every section takes its defaults.

mod error;
pub mod section;

pub use error::ConfigError;
pub use section::{
    ExportConfig, HighlightConfig, RenderConfig, RenderPolicy, SyncConfig, ThemeSetting,
    ViewportConfig,
};

use crate::log;
use anyhow::Result;
use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Arc, LazyLock},
};

/// Default config file name, looked up next to the diagram.
pub const CONFIG_FILE: &str = "studio.toml";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing studio.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudioConfig {
    /// Absolute path to the config file, if one was loaded (internal use only)
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub viewport: ViewportConfig,

    #[serde(default)]
    pub export: ExportConfig,

    #[serde(default)]
    pub render: RenderConfig,

    #[serde(default)]
    pub highlight: HighlightConfig,
}

impl StudioConfig {
    /// Load configuration.
    ///
    /// An explicit path must exist. Otherwise `studio.toml` is looked up in the
    /// document's directory and its ancestors; when none is found the defaults
    /// are used.
    pub fn load(explicit: Option<&Path>, document: &Path) -> Result<Self> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => find_config_file(document),
        };

        let mut config = match &path {
            Some(path) => Self::from_path(path)?,
            None => Self::default(),
        };
        config.config_path = path;
        config.normalize_paths();
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring: {}", display_path, fields.join(", "));
    }

    /// Expand `~` in user-supplied paths.
    fn normalize_paths(&mut self) {
        if let Some(dir) = self.export.dir.take() {
            self.export.dir = Some(expand_tilde(&dir));
        }
    }

    /// Validate every section, reporting all problems at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();
        self.sync.validate(&mut errors);
        self.viewport.validate(&mut errors);
        self.render.validate(&mut errors);
        self.highlight.validate(&mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

/// Search upward from the document's directory for `studio.toml`.
fn find_config_file(document: &Path) -> Option<PathBuf> {
    let start = document.parent()?;
    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILE))
        .find(|candidate| candidate.is_file())
}

/// Tilde expansion for config and CLI paths.
pub fn expand_tilde(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(s) => PathBuf::from(shellexpand::tilde(s).into_owned()),
        None => path.to_path_buf(),
    }
}

// ============================================================================
// global handle
// ============================================================================

/// Global config storage.
static CONFIG: LazyLock<ArcSwap<StudioConfig>> =
    LazyLock::new(|| ArcSwap::from_pointee(StudioConfig::default()));

#[inline]
pub fn cfg() -> Arc<StudioConfig> {
    CONFIG.load_full()
}

#[inline]
pub fn init_config(config: StudioConfig) -> Arc<StudioConfig> {
    let arc = Arc::new(config);
    CONFIG.store(Arc::clone(&arc));
    arc
}

// ============================================================================
// Test Helpers
// ============================================================================

/// Parse config, panicking on unknown fields (to catch typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> StudioConfig {
    let (parsed, ignored) = StudioConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}
