//! Sync coordinator: keeps the sandbox's text in step with the document.
//!
//! Two directions, one rule: never send the sandbox text it already has.
//!
//! - document changed: send `update` unless the text is what the sandbox last
//!   gave us (the echo of its own edit) or the revision is stale
//! - sandbox edit: record the text first, then apply it, so the resulting
//!   document change is recognised as an echo

use super::document::{DocumentStore, Snapshot};
use crate::core::{StudioError, StudioResult};
use crate::protocol::HostMessage;

/// Per-instance synchronization state.
#[derive(Debug, Default)]
pub struct SyncState {
    /// Latest revision the sandbox is known to hold.
    last_sent_revision: Option<u64>,
    /// Text the sandbox holds, as far as the host knows.
    last_received_text: Option<String>,
    /// The recorded text came from the sandbox and its echo is expected.
    echo_suppressed: bool,
}

impl SyncState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_received_text(&self) -> Option<&str> {
        self.last_received_text.as_deref()
    }

    pub fn is_echo_suppressed(&self) -> bool {
        self.echo_suppressed
    }

    /// The document changed. Returns the `update` to send, if any.
    pub fn on_document_changed(&mut self, snapshot: &Snapshot) -> Option<HostMessage> {
        if self
            .last_sent_revision
            .is_some_and(|sent| snapshot.revision <= sent)
        {
            crate::debug!("sync"; "skipping stale revision {}", snapshot.revision);
            return None;
        }
        self.last_sent_revision = Some(snapshot.revision);

        if self.last_received_text.as_deref() == Some(snapshot.text.as_str()) {
            if self.echo_suppressed {
                crate::debug!("sync"; "suppressed echo of revision {}", snapshot.revision);
            }
            return None;
        }

        self.last_received_text = Some(snapshot.text.clone());
        self.echo_suppressed = false;
        Some(HostMessage::update(snapshot.text.clone()))
    }

    /// Apply a sandbox edit to the document over its full range.
    ///
    /// On failure the state is rolled back and nothing is retried.
    pub fn on_sandbox_edit(
        &mut self,
        text: &str,
        document: &mut dyn DocumentStore,
        max_bytes: usize,
    ) -> StudioResult<Snapshot> {
        if text.is_empty() {
            return Err(StudioError::Validation("Invalid document or text".into()));
        }
        if text.len() > max_bytes {
            return Err(StudioError::Validation(format!(
                "edit is {} bytes, limit is {max_bytes}",
                text.len()
            )));
        }

        let previous = self.last_received_text.replace(text.to_string());
        let previous_flag = std::mem::replace(&mut self.echo_suppressed, true);

        document.replace_all(text).map_err(|e| {
            self.last_received_text = previous;
            self.echo_suppressed = previous_flag;
            match e {
                StudioError::EditRejected(_) => e,
                other => StudioError::EditRejected(other.to_string()),
            }
        })
    }
}
