//! `[viewport]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [viewport]
//! zoom_min = 0.1
//! zoom_max = 3.0
//! wheel_step = 0.05               # Ctrl + wheel
//! button_step = 0.1               # toolbar and keyboard zoom
//! fit_margin = 0.9                # fraction of the container used by fit
//! on_first_render = "fit"         # "fit" | "reset"
//! on_content_change = "preserve"  # "preserve" | "reset" | "fit"
//! ```

use serde::{Deserialize, Serialize};

/// What a re-render does to the user's zoom and pan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderPolicy {
    /// Fit the artifact into the container and center it.
    Fit,
    /// Back to 100% at the origin.
    Reset,
    /// Keep the current zoom and offset.
    Preserve,
}

/// Viewport settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub zoom_min: f64,
    pub zoom_max: f64,
    pub wheel_step: f64,
    pub button_step: f64,
    pub fit_margin: f64,
    pub on_first_render: RenderPolicy,
    pub on_content_change: RenderPolicy,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            zoom_min: 0.1,
            zoom_max: 3.0,
            wheel_step: 0.05,
            button_step: 0.1,
            fit_margin: 0.9,
            on_first_render: RenderPolicy::Fit,
            on_content_change: RenderPolicy::Preserve,
        }
    }
}

impl ViewportConfig {
    pub fn validate(&self, errors: &mut Vec<String>) {
        if !(self.zoom_min > 0.0) {
            errors.push("[viewport] zoom_min must be greater than 0".into());
        }
        if self.zoom_min > self.zoom_max {
            errors.push("[viewport] zoom_min must not exceed zoom_max".into());
        }
        if !(self.fit_margin > 0.0 && self.fit_margin <= 1.0) {
            errors.push("[viewport] fit_margin must be in (0, 1]".into());
        }
        if !(self.wheel_step > 0.0) || !(self.button_step > 0.0) {
            errors.push("[viewport] zoom steps must be greater than 0".into());
        }
        if self.on_first_render == RenderPolicy::Preserve {
            errors.push(
                "[viewport] on_first_render must be \"fit\" or \"reset\" (nothing to preserve yet)"
                    .into(),
            );
        }
    }
}
