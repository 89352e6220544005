//! Host event loop and its handle.
//!
//! Every source of host work (sandbox forwarders, file watchers, the CLI)
//! sends a [`HostEvent`] into one unbounded channel. The actor applies them
//! in arrival order, so host handlers never interleave.

use std::path::PathBuf;

use tokio::sync::{mpsc, oneshot};

use super::document::DocumentStore;
use super::watch::DocumentWatcher;
use super::{Host, HostEvent, InstanceStatus};
use crate::core::{EditorId, StudioError, StudioResult};
use crate::protocol::{ExportFormat, HostEnd, Inbox, SandboxMessage, ThemeKind};

pub struct HostActor {
    host: Host,
    rx: mpsc::UnboundedReceiver<HostEvent>,
    /// Weak so the loop ends once every handle and forwarder is gone.
    tx: mpsc::WeakUnboundedSender<HostEvent>,
}

impl HostActor {
    pub fn new(host: Host) -> (Self, HostHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let actor = Self {
            host,
            rx,
            tx: tx.downgrade(),
        };
        (actor, HostHandle { tx })
    }

    pub async fn run(mut self) {
        while let Some(event) = self.rx.recv().await {
            if matches!(event, HostEvent::Shutdown) {
                break;
            }
            self.dispatch(event);
        }
        self.host.dispose_all();
        crate::debug!("host"; "stopped");
    }

    fn dispatch(&mut self, event: HostEvent) {
        match event {
            HostEvent::Open {
                id,
                document,
                end,
                watch,
            } => self.open(id, document, end, watch),
            HostEvent::Sandbox { id, msg } => self.host.handle_sandbox(id, msg),
            HostEvent::SandboxClosed { id } => self.host.sandbox_closed(id),
            HostEvent::DocumentChanged { id } => self.host.document_changed(id),
            HostEvent::Export {
                id,
                format,
                path: Some(path),
            } => self.host.request_export(id, format, path),
            HostEvent::Export {
                id,
                format,
                path: None,
            } => self.host.export_with_dialog(id, format),
            HostEvent::SetTheme(theme) => self.host.set_theme(theme),
            HostEvent::Close { id } => {
                self.host.dispose(id);
            }
            HostEvent::Status(reply) => {
                let _ = reply.send(self.host.status());
            }
            HostEvent::Shutdown => {}
        }
    }

    fn open(&mut self, id: EditorId, document: Box<dyn DocumentStore>, end: HostEnd, watch: bool) {
        let Some(tx) = self.tx.upgrade() else {
            return;
        };
        let path = document.path().to_path_buf();
        if let Err(e) = self.host.open(id, document, end.outbox) {
            crate::log!("host"; "cannot open {}: {}", path.display(), e);
            return;
        }

        self.host
            .attach_listener(id, tokio::spawn(forward(id, end.inbox, tx.clone())));

        if watch {
            match DocumentWatcher::spawn(&path, id, tx) {
                Ok(watcher) => self.host.attach_watcher(id, watcher),
                Err(e) => crate::log!("watch"; "cannot watch {}: {}", path.display(), e),
            }
        }
    }
}

/// Pump one sandbox's records into the host queue.
async fn forward(
    id: EditorId,
    mut inbox: Inbox<SandboxMessage>,
    events: mpsc::UnboundedSender<HostEvent>,
) {
    while let Some(msg) = inbox.recv().await {
        if events.send(HostEvent::Sandbox { id, msg }).is_err() {
            return;
        }
    }
    let _ = events.send(HostEvent::SandboxClosed { id });
}

/// Cloneable front door to a running [`HostActor`].
#[derive(Clone)]
pub struct HostHandle {
    tx: mpsc::UnboundedSender<HostEvent>,
}

impl HostHandle {
    fn send(&self, event: HostEvent) -> StudioResult<()> {
        self.tx.send(event).map_err(|_| StudioError::ChannelClosed)
    }

    /// Open an editor for `document`, talking to the sandbox behind `end`.
    pub fn open(
        &self,
        document: Box<dyn DocumentStore>,
        end: HostEnd,
        watch: bool,
    ) -> StudioResult<EditorId> {
        let id = EditorId::next();
        self.send(HostEvent::Open {
            id,
            document,
            end,
            watch,
        })?;
        Ok(id)
    }

    pub fn close(&self, id: EditorId) -> StudioResult<()> {
        self.send(HostEvent::Close { id })
    }

    /// Export to `path`, or to wherever the save dialog says.
    pub fn export(
        &self,
        id: EditorId,
        format: ExportFormat,
        path: Option<PathBuf>,
    ) -> StudioResult<()> {
        self.send(HostEvent::Export { id, format, path })
    }

    pub fn set_theme(&self, theme: ThemeKind) -> StudioResult<()> {
        self.send(HostEvent::SetTheme(theme))
    }

    pub async fn status(&self) -> StudioResult<Vec<InstanceStatus>> {
        let (reply, rx) = oneshot::channel();
        self.send(HostEvent::Status(reply))?;
        rx.await.map_err(|_| StudioError::ChannelClosed)
    }

    pub fn shutdown(&self) {
        let _ = self.tx.send(HostEvent::Shutdown);
    }
}
