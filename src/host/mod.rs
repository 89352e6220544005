//! Host context: owns the documents and all external I/O.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────┐  HostEvent   ┌──────────────────────────────────────┐
//! │ forwarder(id) │─────────────►│ HostActor                            │
//! │ watcher(id)   │─────────────►│   Host                               │
//! │ HostHandle    │─────────────►│     Registry: id → EditorInstance    │
//! └───────────────┘              │       document, sync, export, surface│
//!                                │     Platform: dialog, sink, notifier │
//!                                └──────────────────────────────────────┘
//! ```
//!
//! [`Host`] is synchronous; [`actor::HostActor`] feeds it events one at a
//! time, so no two handlers ever run concurrently.

pub mod actor;
pub mod document;
pub mod export;
pub mod format;
pub mod platform;
pub mod registry;
pub mod sync;
pub mod watch;

#[cfg(test)]
mod tests;

use std::path::PathBuf;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

pub use actor::{HostActor, HostHandle};
use document::DocumentStore;
use export::suggested_path;
use platform::Platform;
use registry::{EditorInstance, Registry};
use watch::DocumentWatcher;

use crate::config::StudioConfig;
use crate::core::{EditorId, StudioError, StudioResult};
use crate::protocol::{
    ExportFormat, HostEnd, HostMessage, Outbox, SandboxCommand, SandboxMessage, SandboxNotice,
    ThemeKind,
};

/// Everything the host reacts to.
pub enum HostEvent {
    Open {
        id: EditorId,
        document: Box<dyn DocumentStore>,
        end: HostEnd,
        watch: bool,
    },
    /// A record from the instance's sandbox.
    Sandbox { id: EditorId, msg: SandboxMessage },
    /// The sandbox side of the channel is gone.
    SandboxClosed { id: EditorId },
    /// The backing file may have changed.
    DocumentChanged { id: EditorId },
    /// Export; `path: None` asks the save dialog.
    Export {
        id: EditorId,
        format: ExportFormat,
        path: Option<PathBuf>,
    },
    SetTheme(ThemeKind),
    Close { id: EditorId },
    Status(oneshot::Sender<Vec<InstanceStatus>>),
    Shutdown,
}

/// Summary of one open editor.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceStatus {
    pub id: EditorId,
    pub path: PathBuf,
    pub revision: u64,
    pub pending_export: Option<PathBuf>,
    pub echo_suppressed: bool,
}

pub struct Host {
    registry: Registry,
    platform: Platform,
    theme: ThemeKind,
    max_source_bytes: usize,
}

impl Host {
    pub fn new(config: &StudioConfig, platform: Platform) -> Self {
        Self {
            registry: Registry::new(),
            platform,
            theme: ThemeKind::default(),
            max_source_bytes: config.sync.max_source_bytes,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Register an instance and bring its sandbox up to date.
    pub fn open(
        &mut self,
        id: EditorId,
        document: Box<dyn DocumentStore>,
        surface: Outbox<HostMessage>,
    ) -> StudioResult<()> {
        let mut instance = EditorInstance::new(document, surface);
        let snapshot = instance.document.snapshot();

        instance.surface.post(&HostMessage::theme_changed(self.theme))?;
        if let Some(update) = instance.sync.on_document_changed(&snapshot) {
            instance.surface.post(&update)?;
        }

        crate::log!("host"; "opened {} ({})", id, instance.document.path().display());
        self.registry.insert(id, instance);
        Ok(())
    }

    pub fn attach_listener(&mut self, id: EditorId, handle: JoinHandle<()>) {
        match self.registry.get_mut(id) {
            Some(instance) => instance.add_listener(handle),
            None => handle.abort(),
        }
    }

    pub fn attach_watcher(&mut self, id: EditorId, watcher: DocumentWatcher) {
        if let Some(instance) = self.registry.get_mut(id) {
            instance.set_watcher(watcher);
        }
    }

    /// Close an instance. Safe to call more than once.
    pub fn dispose(&mut self, id: EditorId) -> bool {
        let disposed = self.registry.dispose(id);
        if disposed {
            crate::log!("host"; "closed {}", id);
        }
        disposed
    }

    pub fn dispose_all(&mut self) {
        for id in self.registry.ids() {
            self.dispose(id);
        }
    }

    // ------------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------------

    /// Handle one record from a sandbox.
    pub fn handle_sandbox(&mut self, id: EditorId, msg: SandboxMessage) {
        if !self.registry.contains(id) {
            crate::debug!("host"; "dropping message for disposed {}", id);
            return;
        }
        match msg {
            SandboxMessage::Command(SandboxCommand::EditorChange { text }) => {
                self.apply_sandbox_edit(id, &text);
            }
            SandboxMessage::Command(SandboxCommand::Export { format }) => {
                self.export_with_dialog(id, format);
            }
            SandboxMessage::Command(SandboxCommand::ExportComplete {
                format,
                data,
                file_path,
            }) => {
                if let Some(instance) = self.registry.get_mut(id) {
                    instance.export.complete(
                        format,
                        &data,
                        &file_path,
                        self.platform.sink.as_mut(),
                        self.platform.notifier.as_mut(),
                    );
                }
            }
            SandboxMessage::Command(SandboxCommand::ExportError { error }) => {
                if let Some(instance) = self.registry.get_mut(id) {
                    instance.export.fail(&error, self.platform.notifier.as_mut());
                }
            }
            SandboxMessage::Command(SandboxCommand::Format) => self.format_document(id),
            SandboxMessage::Notice(SandboxNotice::CursorPosition { line, column }) => {
                crate::debug!("host"; "{} cursor at {}:{}", id, line, column);
            }
            SandboxMessage::Command(SandboxCommand::Unknown)
            | SandboxMessage::Notice(SandboxNotice::Unknown) => {
                crate::debug!("host"; "ignoring unrecognized message from {}", id);
            }
        }
    }

    fn apply_sandbox_edit(&mut self, id: EditorId, text: &str) {
        let Some(instance) = self.registry.get_mut(id) else {
            return;
        };
        let applied =
            instance
                .sync
                .on_sandbox_edit(text, instance.document.as_mut(), self.max_source_bytes);
        match applied {
            Ok(snapshot) => {
                // the change notification for our own apply
                if let Some(update) = instance.sync.on_document_changed(&snapshot) {
                    post_or_log(&instance.surface, &update, id);
                }
            }
            Err(e) => self
                .platform
                .notifier
                .error(&format!("Failed to update editor content: {e}")),
        }
    }

    /// The backing document may have changed outside the sandbox.
    pub fn document_changed(&mut self, id: EditorId) {
        let Some(instance) = self.registry.get_mut(id) else {
            return;
        };
        match instance.document.reload() {
            Ok(Some(snapshot)) => {
                if let Some(update) = instance.sync.on_document_changed(&snapshot) {
                    crate::debug!("host"; "{} revision {} -> sandbox", id, snapshot.revision);
                    post_or_log(&instance.surface, &update, id);
                }
            }
            Ok(None) => {}
            Err(e) => crate::log!("host"; "cannot reload {}: {}", id, e),
        }
    }

    // ------------------------------------------------------------------------
    // Export
    // ------------------------------------------------------------------------

    /// Ask the save dialog, then request the export. Cancel is a no-op.
    pub fn export_with_dialog(&mut self, id: EditorId, format: ExportFormat) {
        let Some(instance) = self.registry.get_mut(id) else {
            self.report_export_failure(format, &no_surface());
            return;
        };
        let suggested = suggested_path(instance.document.path(), format);
        match self.platform.dialog.choose(&suggested, format) {
            Ok(Some(path)) => self.request_export(id, format, path),
            Ok(None) => crate::debug!("export"; "dialog cancelled"),
            Err(e) => self.report_export_failure(format, &e),
        }
    }

    /// Send `requestExport` for a chosen destination.
    pub fn request_export(&mut self, id: EditorId, format: ExportFormat, path: PathBuf) {
        let Some(instance) = self.registry.get_mut(id) else {
            self.report_export_failure(format, &no_surface());
            return;
        };
        match instance.export.begin(format, path, &instance.surface) {
            Ok(()) => {}
            Err(e @ StudioError::ExportBusy(_)) => self.platform.notifier.error(&e.to_string()),
            Err(e) => self.report_export_failure(format, &e),
        }
    }

    fn report_export_failure(&mut self, format: ExportFormat, e: &StudioError) {
        self.platform
            .notifier
            .error(&format!("Failed to export as {}: {e}", format.label()));
    }

    // ------------------------------------------------------------------------
    // Other commands
    // ------------------------------------------------------------------------

    /// Trim every line of the document and apply the result.
    pub fn format_document(&mut self, id: EditorId) {
        let Some(instance) = self.registry.get_mut(id) else {
            return;
        };
        let current = instance.document.snapshot();
        let formatted = format::format_source(&current.text);
        if formatted != current.text {
            match instance.document.replace_all(&formatted) {
                Ok(snapshot) => {
                    if let Some(update) = instance.sync.on_document_changed(&snapshot) {
                        post_or_log(&instance.surface, &update, id);
                    }
                }
                Err(e) => {
                    self.platform
                        .notifier
                        .error(&format!("Failed to format document: {e}"));
                    return;
                }
            }
        }
        self.platform
            .notifier
            .info("Document formatted with basic formatter");
    }

    /// Broadcast a host theme change to every sandbox.
    pub fn set_theme(&mut self, theme: ThemeKind) {
        self.theme = theme;
        let msg = HostMessage::theme_changed(theme);
        for (id, instance) in self.registry.iter_mut() {
            post_or_log(&instance.surface, &msg, *id);
        }
    }

    /// The sandbox went away: whatever it owed us is abandoned.
    pub fn sandbox_closed(&mut self, id: EditorId) {
        if let Some(instance) = self.registry.get_mut(id)
            && instance.export.abandon().is_some()
        {
            crate::log!("export"; "{} closed with an export in flight", id);
        }
        self.dispose(id);
    }

    pub fn status(&self) -> Vec<InstanceStatus> {
        self.registry
            .ids()
            .into_iter()
            .filter_map(|id| {
                let instance = self.registry.get(id)?;
                Some(InstanceStatus {
                    id,
                    path: instance.document.path().to_path_buf(),
                    revision: instance.document.snapshot().revision,
                    pending_export: instance.export.pending().map(|p| p.path.clone()),
                    echo_suppressed: instance.sync.is_echo_suppressed(),
                })
            })
            .collect()
    }
}

fn no_surface() -> StudioError {
    StudioError::Configuration("No active rendering surface".into())
}

fn post_or_log(surface: &Outbox<HostMessage>, msg: &HostMessage, id: EditorId) {
    if let Err(e) = surface.post(msg) {
        crate::debug!("host"; "{}: {}", id, e);
    }
}
