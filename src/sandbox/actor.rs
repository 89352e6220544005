//! Sandbox event loop.
//!
//! One task owns the [`Sandbox`]. It wakes on host messages, UI input, and
//! the earliest pending timer (debounced edit or highlight fade).

use std::time::{Duration, Instant};

use tokio::sync::{mpsc, oneshot};

use super::cursor::Overlay;
use super::preview::PreviewContent;
use super::{Sandbox, UiEvent};
use crate::core::StudioError;
use crate::protocol::{HostMessage, Inbox};
use crate::render::Rect;

/// Sleep used when no timer is armed.
const IDLE_SLEEP: Duration = Duration::from_secs(86400);

/// Input to the sandbox task besides host messages.
#[derive(Debug)]
pub enum SandboxInput {
    Ui(UiEvent),
    /// Snapshot of what the sandbox shows, for the status line.
    Status(oneshot::Sender<SandboxStatus>),
}

/// What the sandbox currently shows.
#[derive(Debug, Clone, PartialEq)]
pub struct SandboxStatus {
    pub zoom_label: String,
    pub transform: String,
    pub panning: bool,
    pub pending_edit: bool,
    /// `Some(Ok(node count))` for a diagram, `Some(Err(message))` for the error region.
    pub preview: Option<Result<usize, String>>,
    pub notice: Option<String>,
    pub highlight: Option<(String, Rect, f64)>,
}

pub struct SandboxActor {
    sandbox: Sandbox,
    inbox: Inbox<HostMessage>,
    input_rx: mpsc::UnboundedReceiver<SandboxInput>,
}

impl SandboxActor {
    pub fn new(
        sandbox: Sandbox,
        inbox: Inbox<HostMessage>,
        input_rx: mpsc::UnboundedReceiver<SandboxInput>,
    ) -> Self {
        Self {
            sandbox,
            inbox,
            input_rx,
        }
    }

    /// Run until the host or the UI goes away.
    pub async fn run(mut self) {
        loop {
            let sleep = self
                .sandbox
                .next_deadline()
                .map_or(IDLE_SLEEP, |deadline| {
                    deadline
                        .saturating_duration_since(Instant::now())
                        .max(Duration::from_millis(1))
                });

            let result = tokio::select! {
                msg = self.inbox.recv() => match msg {
                    Some(msg) => self.sandbox.handle_host(msg),
                    None => break,
                },
                input = self.input_rx.recv() => match input {
                    Some(SandboxInput::Ui(event)) => self.sandbox.handle_ui(event, Instant::now()),
                    Some(SandboxInput::Status(reply)) => {
                        let _ = reply.send(self.status());
                        Ok(())
                    }
                    None => break,
                },
                _ = tokio::time::sleep(sleep) => self.sandbox.poll(Instant::now()),
            };

            match result {
                Ok(()) => {}
                Err(StudioError::ChannelClosed) => break,
                Err(e) => crate::log!("sandbox"; "{}", e),
            }
        }
        self.inbox.close();
        crate::debug!("sandbox"; "disposed");
    }

    fn status(&self) -> SandboxStatus {
        let sandbox = &self.sandbox;
        let viewport = sandbox.viewport();
        let preview = match sandbox.preview().content() {
            PreviewContent::Empty => None,
            PreviewContent::Diagram(d) => Some(Ok(d.nodes.len())),
            PreviewContent::Error(msg) => Some(Err(msg.clone())),
        };
        let highlight = sandbox.highlighter().overlay().map(|o: &Overlay| {
            (o.node_id.clone(), o.container_rect(viewport), o.opacity)
        });
        SandboxStatus {
            zoom_label: viewport.zoom_label(),
            transform: viewport.transform(),
            panning: viewport.is_panning(),
            pending_edit: sandbox.has_pending_edit(),
            preview,
            notice: sandbox.preview().notice().map(str::to_string),
            highlight,
        }
    }
}
