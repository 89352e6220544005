//! Document store: the authoritative diagram source.
//!
//! The host is the only writer. Every mutation goes through
//! [`DocumentStore::replace_all`]; external changes are picked up with
//! [`DocumentStore::reload`]. Revisions only move when content does, so
//! spurious watcher events and self-inflicted writes are filtered by hash.

use std::fs;
use std::path::{Path, PathBuf};

use crate::core::{StudioError, StudioResult};

/// Immutable view of the document at one revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub text: String,
    pub revision: u64,
}

/// Content hash used to decide whether the document really changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ContentHash([u8; 32]);

impl ContentHash {
    fn of(text: &str) -> Self {
        Self(*blake3::hash(text.as_bytes()).as_bytes())
    }
}

/// Storage and edit-application primitive for one document.
pub trait DocumentStore: Send {
    /// Location, used for the default export file name.
    fn path(&self) -> &Path;

    fn snapshot(&self) -> Snapshot;

    /// Replace the full range with `text`.
    fn replace_all(&mut self, text: &str) -> StudioResult<Snapshot>;

    /// Re-read after an external change. `None` when the content is unchanged.
    fn reload(&mut self) -> StudioResult<Option<Snapshot>>;
}

/// Tracks text, hash and revision; shared by the stores.
#[derive(Debug)]
struct Revisioned {
    text: String,
    hash: ContentHash,
    revision: u64,
}

impl Revisioned {
    fn new(text: String) -> Self {
        Self {
            hash: ContentHash::of(&text),
            text,
            revision: 1,
        }
    }

    /// Adopt `text`, bumping the revision only if the content differs.
    fn adopt(&mut self, text: String) -> bool {
        let hash = ContentHash::of(&text);
        if hash == self.hash {
            return false;
        }
        self.text = text;
        self.hash = hash;
        self.revision += 1;
        true
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            text: self.text.clone(),
            revision: self.revision,
        }
    }
}

// ============================================================================
// File-backed store
// ============================================================================

#[derive(Debug)]
pub struct FileDocument {
    path: PathBuf,
    state: Revisioned,
}

impl FileDocument {
    pub fn open(path: impl Into<PathBuf>) -> StudioResult<Self> {
        let path = path.into();
        let text = fs::read_to_string(&path).map_err(|e| StudioError::Io(path.clone(), e))?;
        Ok(Self {
            path,
            state: Revisioned::new(text),
        })
    }
}

impl DocumentStore for FileDocument {
    fn path(&self) -> &Path {
        &self.path
    }

    fn snapshot(&self) -> Snapshot {
        self.state.snapshot()
    }

    fn replace_all(&mut self, text: &str) -> StudioResult<Snapshot> {
        fs::write(&self.path, text).map_err(|e| StudioError::Io(self.path.clone(), e))?;
        self.state.adopt(text.to_string());
        Ok(self.state.snapshot())
    }

    fn reload(&mut self) -> StudioResult<Option<Snapshot>> {
        let text =
            fs::read_to_string(&self.path).map_err(|e| StudioError::Io(self.path.clone(), e))?;
        Ok(self.state.adopt(text).then(|| self.state.snapshot()))
    }
}

// ============================================================================
// In-memory store (tests)
// ============================================================================

/// Store without backing file; `reload` never sees changes.
#[cfg(test)]
#[derive(Debug)]
pub struct MemoryDocument {
    path: PathBuf,
    state: Revisioned,
    read_only: bool,
}

#[cfg(test)]
impl MemoryDocument {
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            state: Revisioned::new(text.into()),
            read_only: false,
        }
    }

    /// Refuse edits, as a locked editor would.
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    /// Simulate a change made by another editor.
    pub fn external_edit(&mut self, text: &str) -> Option<Snapshot> {
        self.state
            .adopt(text.to_string())
            .then(|| self.state.snapshot())
    }
}

#[cfg(test)]
impl DocumentStore for MemoryDocument {
    fn path(&self) -> &Path {
        &self.path
    }

    fn snapshot(&self) -> Snapshot {
        self.state.snapshot()
    }

    fn replace_all(&mut self, text: &str) -> StudioResult<Snapshot> {
        if self.read_only {
            return Err(StudioError::EditRejected("document is read-only".into()));
        }
        self.state.adopt(text.to_string());
        Ok(self.state.snapshot())
    }

    fn reload(&mut self) -> StudioResult<Option<Snapshot>> {
        Ok(None)
    }
}
