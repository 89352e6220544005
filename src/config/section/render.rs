//! `[render]` section configuration.
//!
//! The renderer itself is an external program. By default this is the
//! mermaid CLI (`mmdc`); any command accepting the same `-i/-o/-t/-b`
//! flags works.
//!
//! ```toml
//! [render]
//! command = ["npx", "-y", "@mermaid-js/mermaid-cli"]
//! theme = "auto"             # "auto" follows the host theme
//! background = "transparent"
//! ```

use serde::{Deserialize, Serialize};

use crate::protocol::ThemeKind;

/// Renderer theme selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ThemeSetting {
    /// Follow the host's theme kind.
    #[default]
    Auto,
    Dark,
    Light,
    HighContrast,
}

impl ThemeSetting {
    /// Resolve against the host theme.
    pub fn resolve(self, host: ThemeKind) -> ThemeKind {
        match self {
            Self::Auto => host,
            Self::Dark => ThemeKind::Dark,
            Self::Light => ThemeKind::Light,
            Self::HighContrast => ThemeKind::HighContrast,
        }
    }
}

/// External renderer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Program and leading arguments.
    pub command: Vec<String>,
    pub theme: ThemeSetting,
    pub background: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            command: vec!["mmdc".into()],
            theme: ThemeSetting::Auto,
            background: "transparent".into(),
        }
    }
}

impl RenderConfig {
    pub fn validate(&self, errors: &mut Vec<String>) {
        if self.command.first().is_none_or(|c| c.trim().is_empty()) {
            errors.push("[render] command must name a program".into());
        }
    }
}
