//! Cursor correlation: highlight the artifact node for a source line.
//!
//! The match is a heuristic. A node matches when its text content contains
//! the decimal line number; the first match in document order wins. Diagrams
//! whose labels don't mention line numbers simply get no highlight.

use std::time::{Duration, Instant};

use super::viewport::Viewport;
use crate::config::HighlightConfig;
use crate::render::{ArtifactNode, Point, Rect};

/// The transient highlight box.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub node_id: String,
    /// Node bounds in artifact coordinates.
    pub bounds: Rect,
    pub opacity: f64,
    fade_at: Instant,
    faded: bool,
}

impl Overlay {
    /// Position relative to the container under the current view.
    pub fn container_rect(&self, viewport: &Viewport) -> Rect {
        let origin = viewport.to_container(Point::new(self.bounds.x, self.bounds.y));
        let zoom = viewport.zoom();
        Rect::new(
            origin.x,
            origin.y,
            self.bounds.width * zoom,
            self.bounds.height * zoom,
        )
    }

    pub fn is_faded(&self) -> bool {
        self.faded
    }
}

/// Owns the single highlight overlay.
pub struct Highlighter {
    fade_after: Duration,
    faded_opacity: f64,
    overlay: Option<Overlay>,
}

impl Highlighter {
    pub fn new(config: &HighlightConfig) -> Self {
        Self {
            fade_after: Duration::from_millis(config.fade_ms),
            faded_opacity: config.faded_opacity,
            overlay: None,
        }
    }

    pub fn overlay(&self) -> Option<&Overlay> {
        self.overlay.as_ref()
    }

    /// Replace any prior overlay with one for `line`, if a node matches.
    pub fn correlate(&mut self, line: u32, nodes: &[ArtifactNode], now: Instant) -> Option<&Overlay> {
        self.overlay = None;
        let needle = line.to_string();
        let node = nodes.iter().find(|n| n.text.contains(&needle))?;
        self.overlay = Some(Overlay {
            node_id: node.id.clone(),
            bounds: node.bounds,
            opacity: 1.0,
            fade_at: now + self.fade_after,
            faded: false,
        });
        self.overlay.as_ref()
    }

    /// When the overlay is due to fade, if it hasn't yet.
    pub fn deadline(&self) -> Option<Instant> {
        self.overlay
            .as_ref()
            .filter(|o| !o.is_faded())
            .map(|o| o.fade_at)
    }

    /// Apply the fade once its time has come. Returns whether anything changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        match &mut self.overlay {
            Some(overlay) if !overlay.is_faded() && now >= overlay.fade_at => {
                overlay.opacity = self.faded_opacity;
                overlay.faded = true;
                true
            }
            _ => false,
        }
    }

    pub fn clear(&mut self) {
        self.overlay = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewportConfig;
    use crate::render::Size;

    fn node(id: &str, text: &str, bounds: Rect) -> ArtifactNode {
        ArtifactNode {
            id: id.into(),
            text: text.into(),
            bounds,
        }
    }

    fn nodes() -> Vec<ArtifactNode> {
        vec![
            node("a", "Start", Rect::new(0.0, 0.0, 10.0, 10.0)),
            node("b", "step 12", Rect::new(20.0, 40.0, 30.0, 10.0)),
            node("c", "line 2", Rect::new(50.0, 50.0, 5.0, 5.0)),
        ]
    }

    #[test]
    fn test_first_substring_match_wins() {
        let mut hl = Highlighter::new(&HighlightConfig::default());
        // "2" is a substring of "step 12", which comes first
        let overlay = hl.correlate(2, &nodes(), Instant::now()).unwrap();
        assert_eq!(overlay.node_id, "b");
    }

    #[test]
    fn test_no_match_clears_previous() {
        let mut hl = Highlighter::new(&HighlightConfig::default());
        let now = Instant::now();
        assert!(hl.correlate(12, &nodes(), now).is_some());
        assert!(hl.correlate(7, &nodes(), now).is_none());
        assert!(hl.overlay().is_none());
    }

    #[test]
    fn test_single_overlay_replaced() {
        let mut hl = Highlighter::new(&HighlightConfig::default());
        let now = Instant::now();
        hl.correlate(12, &nodes(), now);
        hl.correlate(2, &[node("c", "line 2", Rect::default())], now);
        assert_eq!(hl.overlay().unwrap().node_id, "c");
    }

    #[test]
    fn test_fades_after_delay() {
        let mut hl = Highlighter::new(&HighlightConfig::default());
        let t0 = Instant::now();
        hl.correlate(12, &nodes(), t0);
        assert_eq!(hl.deadline(), Some(t0 + Duration::from_millis(500)));

        assert!(!hl.tick(t0 + Duration::from_millis(499)));
        assert_eq!(hl.overlay().unwrap().opacity, 1.0);

        assert!(hl.tick(t0 + Duration::from_millis(500)));
        assert_eq!(hl.overlay().unwrap().opacity, 0.7);
        assert_eq!(hl.deadline(), None);
        assert!(!hl.tick(t0 + Duration::from_secs(2)));
    }

    #[test]
    fn test_container_rect_follows_view() {
        let mut hl = Highlighter::new(&HighlightConfig::default());
        let mut vp = Viewport::new(ViewportConfig::default(), Size::new(200.0, 200.0));
        vp.zoom_by(1.0, Point::ORIGIN);

        let overlay = hl.correlate(12, &nodes(), Instant::now()).unwrap();
        assert_eq!(overlay.container_rect(&vp), Rect::new(40.0, 80.0, 60.0, 20.0));
    }
}
