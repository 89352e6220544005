//! Instance-keyed registry of open editors.
//!
//! Everything that belongs to one editor lives in its [`EditorInstance`] and
//! goes away with it: sync state, the export slot, the channel to its
//! sandbox and the listeners feeding the host.

use rustc_hash::FxHashMap;
use tokio::task::JoinHandle;

use super::document::DocumentStore;
use super::export::ExportSlot;
use super::sync::SyncState;
use super::watch::DocumentWatcher;
use crate::core::EditorId;
use crate::protocol::{HostMessage, Outbox};

pub struct EditorInstance {
    pub document: Box<dyn DocumentStore>,
    pub sync: SyncState,
    pub export: ExportSlot,
    pub surface: Outbox<HostMessage>,
    listeners: Vec<JoinHandle<()>>,
    watcher: Option<DocumentWatcher>,
}

impl EditorInstance {
    pub fn new(document: Box<dyn DocumentStore>, surface: Outbox<HostMessage>) -> Self {
        Self {
            document,
            sync: SyncState::new(),
            export: ExportSlot::new(),
            surface,
            listeners: Vec::new(),
            watcher: None,
        }
    }

    pub fn add_listener(&mut self, handle: JoinHandle<()>) {
        self.listeners.push(handle);
    }

    pub fn set_watcher(&mut self, watcher: DocumentWatcher) {
        self.watcher = Some(watcher);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len() + usize::from(self.watcher.is_some())
    }

    /// Detach every listener and drop in-flight state.
    fn release(&mut self) {
        for handle in self.listeners.drain(..) {
            handle.abort();
        }
        self.watcher = None;
        self.export.abandon();
    }
}

#[derive(Default)]
pub struct Registry {
    instances: FxHashMap<EditorId, EditorInstance>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: EditorId, instance: EditorInstance) {
        self.instances.insert(id, instance);
    }

    pub fn get(&self, id: EditorId) -> Option<&EditorInstance> {
        self.instances.get(&id)
    }

    pub fn get_mut(&mut self, id: EditorId) -> Option<&mut EditorInstance> {
        self.instances.get_mut(&id)
    }

    pub fn contains(&self, id: EditorId) -> bool {
        self.instances.contains_key(&id)
    }

    pub fn ids(&self) -> Vec<EditorId> {
        let mut ids: Vec<_> = self.instances.keys().copied().collect();
        ids.sort_by_key(|id| id.get());
        ids
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&EditorId, &mut EditorInstance)> {
        self.instances.iter_mut()
    }

    /// Remove and release an instance. Disposing twice is a no-op.
    pub fn dispose(&mut self, id: EditorId) -> bool {
        match self.instances.remove(&id) {
            Some(mut instance) => {
                instance.release();
                crate::debug!("host"; "disposed {}", id);
                true
            }
            None => false,
        }
    }
}
