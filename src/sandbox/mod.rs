//! Sandbox context: editing widget, preview and viewport.
//!
//! The sandbox never touches the document or the filesystem. It renders what
//! it is given, relays debounced edits, and answers export requests with the
//! payload inline.
//!
//! ```text
//! host ──update──► widget ──► render ──► preview ──► viewport
//! UI ──typing──► relay ──(debounce)──► render + editorChange ──► host
//! host ──requestExport──► renderer ──► exportComplete | exportError ──► host
//! ```
//!
//! [`Sandbox`] is a synchronous state machine over explicit instants;
//! [`actor::SandboxActor`] drives it from the channel and the timers.

pub mod actor;
pub mod cursor;
pub mod preview;
pub mod relay;
pub mod viewport;
pub mod widget;


use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::config::{StudioConfig, ThemeSetting};
use crate::core::{StudioError, StudioResult};
use crate::protocol::{
    ExportFormat, HostCommand, HostMessage, HostNotice, Outbox, SandboxMessage, ThemeKind,
};
use crate::render::{DiagramRenderer, Point, RenderedDiagram, Size};

pub use actor::{SandboxActor, SandboxInput, SandboxStatus};
use cursor::Highlighter;
use preview::{Preview, Shown};
use relay::EditRelay;
use viewport::{Key, Modifiers, Viewport};
use widget::EditorWidget;

/// Toolbar buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarAction {
    ZoomIn,
    ZoomOut,
    Reset,
    Fit,
    Export(ExportFormat),
    Format,
}

/// Input from the sandbox's own UI.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    /// The widget's content after a keystroke.
    Typed(String),
    /// 1-based cursor position in the widget.
    CursorMoved { line: u32, column: u32 },
    /// 1-based first visible line of the widget.
    Scroll(usize),
    PointerDown {
        button: u8,
        at: Point,
        modifiers: Modifiers,
    },
    PointerMove(Point),
    /// Pointer up, cancel or leave.
    PointerUp,
    Wheel {
        delta_y: f64,
        at: Point,
        modifiers: Modifiers,
    },
    KeyDown(Key, Modifiers),
    KeyUp(Key),
    Resize(Size),
    Toolbar(ToolbarAction),
}

pub struct Sandbox {
    outbox: Outbox<SandboxMessage>,
    renderer: Box<dyn DiagramRenderer>,
    widget: EditorWidget,
    relay: EditRelay,
    viewport: Viewport,
    highlighter: Highlighter,
    preview: Preview,
    host_theme: ThemeKind,
    theme_setting: ThemeSetting,
    max_source_bytes: usize,
}

impl Sandbox {
    pub fn new(
        config: &StudioConfig,
        container: Size,
        renderer: Box<dyn DiagramRenderer>,
        outbox: Outbox<SandboxMessage>,
    ) -> Self {
        Self {
            outbox,
            renderer,
            widget: EditorWidget::default(),
            relay: EditRelay::new(Duration::from_millis(config.sync.debounce_ms)),
            viewport: Viewport::new(config.viewport.clone(), container),
            highlighter: Highlighter::new(&config.highlight),
            preview: Preview::new(),
            host_theme: ThemeKind::default(),
            theme_setting: config.render.theme,
            max_source_bytes: config.sync.max_source_bytes,
        }
    }

    pub fn widget(&self) -> &EditorWidget {
        &self.widget
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn preview(&self) -> &Preview {
        &self.preview
    }

    pub fn highlighter(&self) -> &Highlighter {
        &self.highlighter
    }

    pub fn has_pending_edit(&self) -> bool {
        self.relay.is_pending()
    }

    fn theme(&self) -> ThemeKind {
        self.theme_setting.resolve(self.host_theme)
    }

    // ------------------------------------------------------------------------
    // Host messages
    // ------------------------------------------------------------------------

    pub fn handle_host(&mut self, msg: HostMessage) -> StudioResult<()> {
        match msg {
            HostMessage::Notice(HostNotice::Update { text }) => {
                if text.is_empty() {
                    crate::debug!("sandbox"; "ignoring empty update");
                    return Ok(());
                }
                // the document is authoritative; a pending local commit is stale
                if self.relay.cancel() {
                    crate::debug!("sandbox"; "external update superseded pending edit");
                }
                self.widget.replace_preserving(text);
                self.render_current();
                Ok(())
            }
            HostMessage::Notice(HostNotice::ThemeChanged { theme }) => {
                self.host_theme = theme;
                if !self.widget.text().is_empty() {
                    self.render_current();
                }
                Ok(())
            }
            HostMessage::Command(HostCommand::RequestExport { format, file_path }) => {
                self.answer_export(format, file_path)
            }
            HostMessage::Command(HostCommand::Unknown) | HostMessage::Notice(HostNotice::Unknown) => {
                crate::debug!("sandbox"; "ignoring unrecognized host message");
                Ok(())
            }
        }
    }

    /// Render in the requested format and reply with the payload or an error.
    fn answer_export(&mut self, format: ExportFormat, file_path: PathBuf) -> StudioResult<()> {
        let reply = match self.export_bytes(format) {
            Ok(bytes) => {
                SandboxMessage::export_complete(format, format.encode(&bytes), file_path)
            }
            Err(e) => {
                crate::log!("sandbox"; "export as {} failed: {}", format.label(), e);
                SandboxMessage::export_error(e.to_string())
            }
        };
        self.outbox.post(&reply)
    }

    fn export_bytes(&mut self, format: ExportFormat) -> StudioResult<Vec<u8>> {
        let source = self.widget.text();
        if source.trim().is_empty() {
            return Err(StudioError::Validation("No diagram to export".into()));
        }
        self.check_source_size()?;
        let theme = self.theme();
        self.renderer.export(self.widget.text(), format, theme)
    }

    // ------------------------------------------------------------------------
    // UI input
    // ------------------------------------------------------------------------

    pub fn handle_ui(&mut self, event: UiEvent, now: Instant) -> StudioResult<()> {
        match event {
            UiEvent::Typed(text) => {
                self.widget.type_text(text.clone());
                self.relay.push(text, now);
            }
            UiEvent::CursorMoved { line, column } => {
                self.widget.set_cursor(line, column);
                let (line, column) = self.widget.cursor_position();
                self.highlighter.correlate(line, self.preview.nodes(), now);
                self.outbox
                    .post(&SandboxMessage::cursor_position(line, column))?;
            }
            UiEvent::Scroll(line) => self.widget.scroll_to(line.saturating_sub(1)),
            UiEvent::PointerDown {
                button,
                at,
                modifiers,
            } => {
                self.viewport.pointer_down(button, at, modifiers);
            }
            UiEvent::PointerMove(at) => self.viewport.pointer_move(at),
            UiEvent::PointerUp => self.viewport.pointer_up(),
            UiEvent::Wheel {
                delta_y,
                at,
                modifiers,
            } => {
                self.viewport.wheel(delta_y, at, modifiers);
            }
            UiEvent::KeyDown(key, modifiers) => {
                self.viewport.key_down(key, modifiers);
            }
            UiEvent::KeyUp(key) => self.viewport.key_up(key),
            UiEvent::Resize(size) => self.viewport.set_container(size),
            UiEvent::Toolbar(action) => self.toolbar(action)?,
        }
        Ok(())
    }

    fn toolbar(&mut self, action: ToolbarAction) -> StudioResult<()> {
        match action {
            ToolbarAction::ZoomIn => self.viewport.zoom_in(),
            ToolbarAction::ZoomOut => self.viewport.zoom_out(),
            ToolbarAction::Reset => self.viewport.reset_view(),
            ToolbarAction::Fit => self.viewport.fit_to_screen(),
            ToolbarAction::Export(format) => self.outbox.post(&SandboxMessage::export(format))?,
            ToolbarAction::Format => self.outbox.post(&SandboxMessage::format())?,
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Timers
    // ------------------------------------------------------------------------

    /// Earliest instant at which [`Sandbox::poll`] has work.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.relay.deadline(), self.highlighter.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Fire whatever is due: the debounced edit, the highlight fade.
    pub fn poll(&mut self, now: Instant) -> StudioResult<()> {
        self.highlighter.tick(now);
        if let Some(text) = self.relay.take_if_ready(now) {
            self.render_current();
            self.outbox.post(&SandboxMessage::editor_change(text))?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------------

    fn render_current(&mut self) {
        let result = self.render_checked();
        match self.preview.show(result) {
            Shown::Diagram { first } => {
                let size = self.preview.diagram().map(|d| d.size);
                if let Some(size) = size {
                    self.viewport.artifact_rendered(size, first);
                }
                self.highlighter.clear();
            }
            Shown::Error => self.highlighter.clear(),
            Shown::Kept => {
                if let Some(notice) = self.preview.notice() {
                    crate::logger::status_warning(notice);
                }
            }
        }
    }

    fn render_checked(&mut self) -> StudioResult<RenderedDiagram> {
        self.check_source_size()?;
        let theme = self.theme();
        self.renderer.render(self.widget.text(), theme)
    }

    fn check_source_size(&self) -> StudioResult<()> {
        let len = self.widget.text().len();
        if len > self.max_source_bytes {
            return Err(StudioError::Validation(format!(
                "diagram source is {len} bytes, limit is {}",
                self.max_source_bytes
            )));
        }
        Ok(())
    }
}
