//! Configuration section definitions.

mod export;
mod highlight;
mod render;
mod sync;
mod viewport;

pub use export::ExportConfig;
pub use highlight::HighlightConfig;
pub use render::{RenderConfig, ThemeSetting};
pub use sync::SyncConfig;
pub use viewport::{RenderPolicy, ViewportConfig};
