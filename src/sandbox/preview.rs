//! Preview pane: the rendered artifact, or an inline error in its place.
//!
//! Renderer failures never escape this boundary. A render error replaces the
//! artifact with an error region; a validation error (input refused before
//! rendering) keeps the last good artifact on screen.

use crate::core::StudioError;
use crate::render::{ArtifactNode, RenderedDiagram};

/// What the pane currently shows.
#[derive(Debug, Clone, PartialEq)]
pub enum PreviewContent {
    Empty,
    Diagram(RenderedDiagram),
    Error(String),
}

/// Outcome of showing a render result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shown {
    /// A diagram is on screen; `first` when no diagram was rendered before.
    Diagram { first: bool },
    /// The error region replaced the artifact.
    Error,
    /// The input was refused; the previous content stays.
    Kept,
}

#[derive(Debug)]
pub struct Preview {
    content: PreviewContent,
    /// Message shown next to a kept artifact.
    notice: Option<String>,
    rendered: u64,
}

impl Default for Preview {
    fn default() -> Self {
        Self::new()
    }
}

impl Preview {
    pub const fn new() -> Self {
        Self {
            content: PreviewContent::Empty,
            notice: None,
            rendered: 0,
        }
    }

    pub fn content(&self) -> &PreviewContent {
        &self.content
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn diagram(&self) -> Option<&RenderedDiagram> {
        match &self.content {
            PreviewContent::Diagram(d) => Some(d),
            _ => None,
        }
    }

    /// Nodes available for cursor correlation.
    pub fn nodes(&self) -> &[ArtifactNode] {
        self.diagram().map_or(&[], |d| d.nodes.as_slice())
    }

    /// Number of successful renders so far.
    pub fn render_count(&self) -> u64 {
        self.rendered
    }

    pub fn show(&mut self, result: Result<RenderedDiagram, StudioError>) -> Shown {
        match result {
            Ok(diagram) => {
                let first = self.rendered == 0;
                self.rendered += 1;
                self.content = PreviewContent::Diagram(diagram);
                self.notice = None;
                Shown::Diagram { first }
            }
            Err(err @ StudioError::Validation(_)) => {
                crate::debug!("sandbox"; "input refused: {}", err);
                self.notice = Some(err.to_string());
                Shown::Kept
            }
            Err(err) => {
                crate::debug!("sandbox"; "render failed: {}", err);
                self.content = PreviewContent::Error(error_region(&err));
                self.notice = None;
                Shown::Error
            }
        }
    }
}

/// Text of the inline error region.
fn error_region(err: &StudioError) -> String {
    format!("Syntax error in diagram\n{err}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Size;

    fn diagram(width: f64) -> RenderedDiagram {
        RenderedDiagram {
            svg: "<svg/>".into(),
            size: Size::new(width, 10.0),
            nodes: Vec::new(),
        }
    }

    #[test]
    fn test_first_render_flag() {
        let mut preview = Preview::new();
        assert_eq!(preview.show(Ok(diagram(1.0))), Shown::Diagram { first: true });
        assert_eq!(preview.show(Ok(diagram(2.0))), Shown::Diagram { first: false });
        assert_eq!(preview.render_count(), 2);
    }

    #[test]
    fn test_render_error_replaces_artifact() {
        let mut preview = Preview::new();
        preview.show(Ok(diagram(1.0)));
        let shown = preview.show(Err(StudioError::Render("Parse error on line 2".into())));
        assert_eq!(shown, Shown::Error);
        match preview.content() {
            PreviewContent::Error(msg) => assert!(msg.contains("Parse error on line 2")),
            other => panic!("expected error region, got {other:?}"),
        }
        assert!(preview.nodes().is_empty());
    }

    #[test]
    fn test_validation_error_keeps_previous() {
        let mut preview = Preview::new();
        preview.show(Ok(diagram(42.0)));
        let shown = preview.show(Err(StudioError::Validation("source too large".into())));
        assert_eq!(shown, Shown::Kept);
        assert_eq!(preview.diagram().unwrap().size.width, 42.0);
        assert_eq!(preview.notice(), Some("source too large"));
    }
}
