//! External change detection for file-backed documents.
//!
//! The parent directory is watched rather than the file, so editors that save
//! by writing a temp file and renaming it over the original are still seen.
//! Every relevant event just pokes the host; the document store decides by
//! content hash whether anything changed.

use std::ffi::OsString;
use std::path::Path;

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use super::HostEvent;
use crate::core::EditorId;

/// Keeps the watcher alive; dropping it stops the notifications.
pub struct DocumentWatcher {
    _watcher: RecommendedWatcher,
}

impl DocumentWatcher {
    pub fn spawn(
        path: &Path,
        id: EditorId,
        events: mpsc::UnboundedSender<HostEvent>,
    ) -> notify::Result<Self> {
        let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();
        let Some(name) = path.file_name().map(|n| n.to_os_string()) else {
            return Err(notify::Error::generic("document path has no file name"));
        };

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            match res {
                Ok(event) if touches(&event, &name) => {
                    crate::debug!("watch"; "{:?} {:?}", event.kind, event.paths);
                    let _ = events.send(HostEvent::DocumentChanged { id });
                }
                Ok(_) => {}
                Err(e) => crate::log!("watch"; "notify error: {}", e),
            }
        })?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        crate::debug!("watch"; "watching {} for {}", dir.display(), id);

        Ok(Self { _watcher: watcher })
    }
}

/// Content-relevant event on the watched file name.
fn touches(event: &notify::Event, name: &OsString) -> bool {
    let relevant = match event.kind {
        EventKind::Create(_) => true,
        EventKind::Modify(modify) => !matches!(modify, notify::event::ModifyKind::Metadata(_)),
        _ => false,
    };
    relevant
        && event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(name.as_os_str()))
}
