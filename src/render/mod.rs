//! Diagram rendering boundary.
//!
//! The renderer turns diagram source into an SVG artifact (and, for export,
//! into PNG bytes). It is a black box behind [`DiagramRenderer`]; everything
//! the rest of the crate needs from its output is read back by [`svg`].
//!
//! ```text
//! source ──► DiagramRenderer ──► SVG text ──► svg::artifact_size ──► Size
//!                                         └─► svg::extract_nodes  ──► [ArtifactNode]
//! ```

mod exec;
pub mod geometry;
mod mmdc;
pub mod svg;

pub use geometry::{Point, Rect, Size};
pub use mmdc::MermaidCli;

use crate::core::StudioResult;
use crate::protocol::{ExportFormat, ThemeKind};

/// Identifiable element of a rendered artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactNode {
    pub id: String,
    /// Concatenated text content, trimmed.
    pub text: String,
    /// Bounds in artifact coordinates.
    pub bounds: Rect,
}

/// Result of a successful render.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedDiagram {
    pub svg: String,
    pub size: Size,
    pub nodes: Vec<ArtifactNode>,
}

impl RenderedDiagram {
    /// Inspect rendered SVG text.
    pub fn from_svg(svg: String) -> StudioResult<Self> {
        let size = svg::artifact_size(&svg);
        let nodes = svg::extract_nodes(&svg)?;
        Ok(Self { svg, size, nodes })
    }
}

/// The external diagram renderer.
pub trait DiagramRenderer: Send {
    /// Render `source` to SVG text.
    fn render_svg(&mut self, source: &str, theme: ThemeKind) -> StudioResult<String>;

    /// Render `source` to the bytes of an export file.
    fn export(&mut self, source: &str, format: ExportFormat, theme: ThemeKind)
    -> StudioResult<Vec<u8>>;

    /// Render and inspect.
    fn render(&mut self, source: &str, theme: ThemeKind) -> StudioResult<RenderedDiagram> {
        RenderedDiagram::from_svg(self.render_svg(source, theme)?)
    }
}

/// Renderer theme name for a host theme kind.
pub const fn renderer_theme(theme: ThemeKind) -> &'static str {
    match theme {
        ThemeKind::Dark => "dark",
        ThemeKind::Light => "default",
        ThemeKind::HighContrast => "neutral",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renderer_theme_names() {
        assert_eq!(renderer_theme(ThemeKind::Dark), "dark");
        assert_eq!(renderer_theme(ThemeKind::Light), "default");
        assert_eq!(renderer_theme(ThemeKind::HighContrast), "neutral");
    }

    #[test]
    fn test_from_svg_collects_geometry_and_nodes() {
        let svg = r#"<svg width="200" height="100"><g id="n1" transform="translate(10,10)"><rect width="20" height="10"/><text>line 3</text></g></svg>"#;
        let diagram = RenderedDiagram::from_svg(svg.to_string()).unwrap();
        assert_eq!(diagram.size, Size::new(200.0, 100.0));
        assert_eq!(diagram.nodes.len(), 1);
        assert_eq!(diagram.nodes[0].bounds, Rect::new(10.0, 10.0, 20.0, 10.0));
    }
}
