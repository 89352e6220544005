//! Viewport controller: zoom and pan over the rendered artifact.
//!
//! ```text
//!            pointer-down (primary + Space/Alt)
//!   Idle ───────────────────────────────────────► Panning
//!    ▲                                              │ pointer-move: offset += delta
//!    └──────── pointer-up / cancel / leave ─────────┘
//! ```
//!
//! Zoom is orthogonal to panning. Every zoom re-anchors the offset so the
//! point under the anchor stays fixed:
//! `offset' = anchor - (anchor - offset) * zoom' / zoom`.

use crate::config::{RenderPolicy, ViewportConfig};
use crate::render::{Point, Size, svg::FALLBACK_SIZE};

/// Modifier keys held during a pointer, wheel or key event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub meta: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const CTRL: Self = Self {
        ctrl: true,
        meta: false,
        alt: false,
    };
    pub const ALT: Self = Self {
        ctrl: false,
        meta: false,
        alt: true,
    };

    fn zoom(self) -> bool {
        self.ctrl || self.meta
    }
}

/// Keys the viewport reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Space,
    Char(char),
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PanState {
    Idle,
    Panning { last: Point },
}

#[derive(Debug, Clone)]
pub struct Viewport {
    config: ViewportConfig,
    zoom: f64,
    offset: Point,
    container: Size,
    artifact: Option<Size>,
    pan: PanState,
    space_held: bool,
}

impl Viewport {
    pub fn new(config: ViewportConfig, container: Size) -> Self {
        Self {
            config,
            zoom: 1.0,
            offset: Point::ORIGIN,
            container,
            artifact: None,
            pan: PanState::Idle,
            space_held: false,
        }
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn offset(&self) -> Point {
        self.offset
    }

    pub fn pan_state(&self) -> PanState {
        self.pan
    }

    pub fn is_panning(&self) -> bool {
        matches!(self.pan, PanState::Panning { .. })
    }

    // ------------------------------------------------------------------------
    // Panning
    // ------------------------------------------------------------------------

    /// Primary button with Space or Alt held starts a pan.
    pub fn pointer_down(&mut self, button: u8, at: Point, modifiers: Modifiers) -> bool {
        if button != 0 || !(self.space_held || modifiers.alt) {
            return false;
        }
        self.pan = PanState::Panning { last: at };
        true
    }

    /// Drag incrementally from the last recorded pointer position.
    pub fn pointer_move(&mut self, at: Point) {
        if let PanState::Panning { last } = self.pan {
            self.offset.x += at.x - last.x;
            self.offset.y += at.y - last.y;
            self.pan = PanState::Panning { last: at };
        }
    }

    /// Pointer up, cancel and leave all end a pan.
    pub fn pointer_up(&mut self) {
        self.pan = PanState::Idle;
    }

    // ------------------------------------------------------------------------
    // Zoom
    // ------------------------------------------------------------------------

    /// Wheel with Ctrl/Meta zooms at the cursor. Scrolling down zooms out.
    pub fn wheel(&mut self, delta_y: f64, at: Point, modifiers: Modifiers) -> bool {
        if !modifiers.zoom() || delta_y == 0.0 {
            return false;
        }
        let step = self.config.wheel_step;
        self.zoom_by(if delta_y > 0.0 { -step } else { step }, at);
        true
    }

    pub fn zoom_in(&mut self) {
        self.zoom_by(self.config.button_step, self.container.center());
    }

    pub fn zoom_out(&mut self) {
        self.zoom_by(-self.config.button_step, self.container.center());
    }

    /// Change zoom by `delta` keeping `anchor` (container coordinates) fixed.
    pub fn zoom_by(&mut self, delta: f64, anchor: Point) {
        let zoom = self.clamp_zoom(self.zoom + delta);
        if zoom == self.zoom {
            return;
        }
        let scale = zoom / self.zoom;
        self.offset = Point::new(
            anchor.x - (anchor.x - self.offset.x) * scale,
            anchor.y - (anchor.y - self.offset.y) * scale,
        );
        self.zoom = zoom;
    }

    fn clamp_zoom(&self, zoom: f64) -> f64 {
        zoom.clamp(self.config.zoom_min, self.config.zoom_max)
    }

    // ------------------------------------------------------------------------
    // Layouts
    // ------------------------------------------------------------------------

    pub fn reset_view(&mut self) {
        self.zoom = 1.0;
        self.offset = Point::ORIGIN;
    }

    /// Largest zoom that fits the artifact with the margin, then center.
    pub fn fit_to_screen(&mut self) {
        let artifact = self.artifact_or_fallback();
        let (c, m) = (self.container, self.config.fit_margin);
        if !c.is_usable() {
            return;
        }
        let zoom = (m * c.width / artifact.width)
            .min(m * c.height / artifact.height)
            .min(self.config.zoom_max);
        self.zoom = zoom.max(self.config.zoom_min);
        self.center_content();
    }

    pub fn center_content(&mut self) {
        let artifact = self.artifact_or_fallback();
        self.offset = Point::new(
            (self.container.width - artifact.width * self.zoom) / 2.0,
            (self.container.height - artifact.height * self.zoom) / 2.0,
        );
    }

    fn artifact_or_fallback(&self) -> Size {
        self.artifact
            .filter(Size::is_usable)
            .unwrap_or(FALLBACK_SIZE)
    }

    // ------------------------------------------------------------------------
    // Geometry changes
    // ------------------------------------------------------------------------

    /// New artifact geometry after a render.
    ///
    /// The first render for the content applies `on_first_render`, later
    /// content re-renders apply `on_content_change`.
    pub fn artifact_rendered(&mut self, size: Size, first: bool) {
        self.artifact = Some(size);
        let policy = if first {
            self.config.on_first_render
        } else {
            self.config.on_content_change
        };
        match policy {
            RenderPolicy::Fit => self.fit_to_screen(),
            RenderPolicy::Reset => self.reset_view(),
            RenderPolicy::Preserve => {}
        }
    }

    /// Container resize keeps the user's zoom and pan.
    pub fn set_container(&mut self, size: Size) {
        self.container = size;
    }

    // ------------------------------------------------------------------------
    // Keyboard
    // ------------------------------------------------------------------------

    /// Handle a key press. Returns whether the key was consumed.
    pub fn key_down(&mut self, key: Key, modifiers: Modifiers) -> bool {
        match key {
            Key::Space => {
                self.space_held = true;
                false
            }
            Key::Char(c) if modifiers.zoom() => match c.to_ascii_lowercase() {
                '0' => {
                    self.reset_view();
                    true
                }
                'f' => {
                    self.fit_to_screen();
                    true
                }
                '=' | '+' => {
                    self.zoom_in();
                    true
                }
                '-' => {
                    self.zoom_out();
                    true
                }
                _ => false,
            },
            _ => false,
        }
    }

    pub fn key_up(&mut self, key: Key) {
        if key == Key::Space {
            self.space_held = false;
        }
    }

    // ------------------------------------------------------------------------
    // Output
    // ------------------------------------------------------------------------

    /// Map an artifact point into container coordinates.
    pub fn to_container(&self, p: Point) -> Point {
        Point::new(
            self.offset.x + self.zoom * p.x,
            self.offset.y + self.zoom * p.y,
        )
    }

    /// The single affine transform, translate first.
    pub fn transform(&self) -> String {
        format!(
            "translate({}px, {}px) scale({})",
            self.offset.x, self.offset.y, self.zoom
        )
    }

    /// Zoom level for the toolbar label, e.g. `75%`.
    pub fn zoom_label(&self) -> String {
        format!("{}%", (self.zoom * 100.0).round())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn viewport(container: Size) -> Viewport {
        Viewport::new(ViewportConfig::default(), container)
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < EPS
    }

    #[test]
    fn test_zoom_keeps_point_under_cursor() {
        let mut vp = viewport(Size::new(1000.0, 500.0));
        let anchor = Point::new(100.0, 100.0);
        vp.zoom_by(0.1, anchor);

        assert!(close(vp.zoom(), 1.1));
        assert!(close(vp.offset().x, -10.0));
        assert!(close(vp.offset().y, -10.0));

        // artifact point that was under the anchor is still there
        let mapped = vp.to_container(Point::new(100.0, 100.0));
        assert!(close(mapped.x, anchor.x));
        assert!(close(mapped.y, anchor.y));
    }

    #[test]
    fn test_zoom_anchor_invariant_from_arbitrary_state() {
        let mut vp = viewport(Size::new(800.0, 600.0));
        vp.zoom_by(0.7, Point::new(10.0, 20.0));
        vp.pointer_down(0, Point::new(0.0, 0.0), Modifiers::ALT);
        vp.pointer_move(Point::new(33.0, -12.0));
        vp.pointer_up();

        let anchor = Point::new(250.0, 140.0);
        // artifact coordinate currently under the anchor
        let before = Point::new(
            (anchor.x - vp.offset().x) / vp.zoom(),
            (anchor.y - vp.offset().y) / vp.zoom(),
        );
        vp.wheel(-1.0, anchor, Modifiers::CTRL);
        let after = vp.to_container(before);
        assert!(close(after.x, anchor.x));
        assert!(close(after.y, anchor.y));
    }

    #[test]
    fn test_zoom_clamped_and_noop_at_limit() {
        let mut vp = viewport(Size::new(100.0, 100.0));
        vp.zoom_by(100.0, Point::new(5.0, 5.0));
        assert!(close(vp.zoom(), 3.0));
        let offset = vp.offset();
        vp.zoom_by(0.1, Point::new(50.0, 50.0));
        assert_eq!(vp.offset(), offset);

        vp.zoom_by(-100.0, Point::ORIGIN);
        assert!(close(vp.zoom(), 0.1));
    }

    #[test]
    fn test_wheel_requires_modifier() {
        let mut vp = viewport(Size::new(100.0, 100.0));
        assert!(!vp.wheel(-1.0, Point::ORIGIN, Modifiers::default()));
        assert!(close(vp.zoom(), 1.0));

        assert!(vp.wheel(1.0, Point::ORIGIN, Modifiers::CTRL));
        assert!(close(vp.zoom(), 0.95));
    }

    #[test]
    fn test_fit_to_screen() {
        let mut vp = viewport(Size::new(1000.0, 500.0));
        vp.artifact_rendered(Size::new(800.0, 600.0), false);
        vp.fit_to_screen();

        assert!(close(vp.zoom(), 0.75));
        assert!(close(vp.offset().x, (1000.0 - 800.0 * 0.75) / 2.0));
        assert!(close(vp.offset().y, (500.0 - 600.0 * 0.75) / 2.0));
        assert_eq!(vp.zoom_label(), "75%");
    }

    #[test]
    fn test_fit_capped_by_zoom_max() {
        let mut vp = viewport(Size::new(1000.0, 1000.0));
        vp.artifact_rendered(Size::new(10.0, 10.0), true);
        assert!(close(vp.zoom(), 3.0));
    }

    #[test]
    fn test_reset_is_independent_of_state() {
        let mut vp = viewport(Size::new(640.0, 480.0));
        vp.artifact_rendered(Size::new(5000.0, 200.0), true);
        vp.zoom_by(0.5, Point::new(3.0, 7.0));
        vp.reset_view();
        assert_eq!(vp.zoom(), 1.0);
        assert_eq!(vp.offset(), Point::ORIGIN);
    }

    #[test]
    fn test_pan_requires_modifier_and_primary_button() {
        let mut vp = viewport(Size::new(100.0, 100.0));
        assert!(!vp.pointer_down(0, Point::ORIGIN, Modifiers::default()));
        assert!(!vp.pointer_down(1, Point::ORIGIN, Modifiers::ALT));
        assert_eq!(vp.pan_state(), PanState::Idle);

        vp.key_down(Key::Space, Modifiers::default());
        assert!(vp.pointer_down(0, Point::new(10.0, 10.0), Modifiers::default()));
        assert!(vp.is_panning());
    }

    #[test]
    fn test_pan_is_incremental() {
        let mut vp = viewport(Size::new(100.0, 100.0));
        vp.pointer_down(0, Point::new(10.0, 10.0), Modifiers::ALT);
        vp.pointer_move(Point::new(15.0, 12.0));
        vp.pointer_move(Point::new(20.0, 20.0));
        assert_eq!(vp.offset(), Point::new(10.0, 10.0));

        vp.pointer_up();
        vp.pointer_move(Point::new(90.0, 90.0));
        assert_eq!(vp.offset(), Point::new(10.0, 10.0));
    }

    #[test]
    fn test_render_policies() {
        let mut vp = viewport(Size::new(1000.0, 500.0));
        vp.artifact_rendered(Size::new(800.0, 600.0), true);
        assert!(close(vp.zoom(), 0.75));

        vp.zoom_in();
        let zoom = vp.zoom();
        vp.artifact_rendered(Size::new(400.0, 300.0), false);
        assert_eq!(vp.zoom(), zoom);

        let config = ViewportConfig {
            on_first_render: RenderPolicy::Reset,
            on_content_change: RenderPolicy::Fit,
            ..ViewportConfig::default()
        };
        let mut vp = Viewport::new(config, Size::new(1000.0, 500.0));
        vp.zoom_by(0.3, Point::ORIGIN);
        vp.artifact_rendered(Size::new(800.0, 600.0), true);
        assert_eq!(vp.zoom(), 1.0);
        vp.artifact_rendered(Size::new(800.0, 600.0), false);
        assert!(close(vp.zoom(), 0.75));
    }

    #[test]
    fn test_resize_keeps_user_view() {
        let mut vp = viewport(Size::new(1000.0, 500.0));
        vp.artifact_rendered(Size::new(800.0, 600.0), true);
        vp.zoom_by(0.2, Point::new(1.0, 2.0));
        let (zoom, offset) = (vp.zoom(), vp.offset());

        vp.set_container(Size::new(300.0, 300.0));
        assert_eq!(vp.zoom(), zoom);
        assert_eq!(vp.offset(), offset);
    }

    #[test]
    fn test_keyboard_shortcuts() {
        let mut vp = viewport(Size::new(1000.0, 500.0));
        vp.artifact_rendered(Size::new(800.0, 600.0), false);

        assert!(vp.key_down(Key::Char('f'), Modifiers::CTRL));
        assert!(close(vp.zoom(), 0.75));

        assert!(vp.key_down(Key::Char('0'), Modifiers::CTRL));
        assert_eq!(vp.zoom(), 1.0);

        assert!(vp.key_down(Key::Char('='), Modifiers::CTRL));
        assert!(close(vp.zoom(), 1.1));

        assert!(!vp.key_down(Key::Char('f'), Modifiers::default()));
    }

    #[test]
    fn test_button_zoom_anchors_at_center() {
        let mut vp = viewport(Size::new(200.0, 100.0));
        vp.zoom_in();
        // center (100, 50) stays fixed
        assert!(close(vp.offset().x, 100.0 - 100.0 * 1.1));
        assert!(close(vp.offset().y, 50.0 - 50.0 * 1.1));
    }

    #[test]
    fn test_transform_string() {
        let mut vp = viewport(Size::new(1000.0, 500.0));
        vp.artifact_rendered(Size::new(800.0, 600.0), true);
        assert_eq!(vp.transform(), "translate(200px, 25px) scale(0.75)");
    }
}
