//! Host platform primitives: save dialog, file writes, user notifications.
//!
//! The host logic only sees these traits. The terminal session wires them to
//! the filesystem and the status line; tests wire them to recorders.

use std::fs;
use std::path::{Path, PathBuf};

use crate::core::{StudioError, StudioResult};
use crate::logger::{status_error, status_success};
use crate::protocol::ExportFormat;

/// Choose an export destination.
pub trait SaveDialog: Send {
    /// `Ok(None)` when the user cancels.
    fn choose(&mut self, suggested: &Path, format: ExportFormat) -> StudioResult<Option<PathBuf>>;
}

/// Persist exported bytes.
pub trait FileSink: Send {
    fn write(&mut self, path: &Path, bytes: &[u8]) -> StudioResult<()>;
}

/// Show messages to the user.
pub trait Notifier: Send {
    fn info(&mut self, message: &str);
    fn error(&mut self, message: &str);
}

/// The three primitives bundled for the host.
pub struct Platform {
    pub dialog: Box<dyn SaveDialog>,
    pub sink: Box<dyn FileSink>,
    pub notifier: Box<dyn Notifier>,
}

impl Platform {
    /// Terminal session defaults: accept suggested paths, write to disk,
    /// report on the status line.
    pub fn terminal(export_dir: Option<PathBuf>) -> Self {
        Self {
            dialog: Box::new(AcceptSuggested { dir: export_dir }),
            sink: Box::new(DiskSink),
            notifier: Box::new(StatusNotifier),
        }
    }
}

// ============================================================================
// Terminal implementations
// ============================================================================

/// Non-interactive dialog: takes the suggested file name, optionally moved
/// into a configured directory.
pub struct AcceptSuggested {
    pub dir: Option<PathBuf>,
}

impl SaveDialog for AcceptSuggested {
    fn choose(&mut self, suggested: &Path, _format: ExportFormat) -> StudioResult<Option<PathBuf>> {
        let path = match (&self.dir, suggested.file_name()) {
            (Some(dir), Some(name)) => dir.join(name),
            _ => suggested.to_path_buf(),
        };
        Ok(Some(path))
    }
}

pub struct DiskSink;

impl FileSink for DiskSink {
    fn write(&mut self, path: &Path, bytes: &[u8]) -> StudioResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StudioError::Io(parent.to_path_buf(), e))?;
        }
        fs::write(path, bytes).map_err(|e| StudioError::Io(path.to_path_buf(), e))
    }
}

pub struct StatusNotifier;

impl Notifier for StatusNotifier {
    fn info(&mut self, message: &str) {
        status_success(message);
    }

    fn error(&mut self, message: &str) {
        status_error(message, "");
    }
}

// ============================================================================
// Recorders (tests)
// ============================================================================

#[cfg(test)]
pub mod testing {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;

    /// Everything the host did through its platform.
    #[derive(Debug, Default)]
    pub struct Record {
        pub writes: Vec<(PathBuf, Vec<u8>)>,
        pub infos: Vec<String>,
        pub errors: Vec<String>,
        pub dialogs: Vec<PathBuf>,
    }

    pub type Shared = Arc<Mutex<Record>>;

    pub struct Recorder {
        record: Shared,
        /// Dialog answer; `None` cancels.
        pub answer: Option<PathBuf>,
        pub fail_writes: bool,
    }

    impl SaveDialog for Recorder {
        fn choose(&mut self, suggested: &Path, _: ExportFormat) -> StudioResult<Option<PathBuf>> {
            self.record.lock().dialogs.push(suggested.to_path_buf());
            Ok(self.answer.clone())
        }
    }

    impl FileSink for Recorder {
        fn write(&mut self, path: &Path, bytes: &[u8]) -> StudioResult<()> {
            if self.fail_writes {
                return Err(StudioError::Io(
                    path.to_path_buf(),
                    std::io::Error::new(std::io::ErrorKind::PermissionDenied, "permission denied"),
                ));
            }
            self.record.lock().writes.push((path.to_path_buf(), bytes.to_vec()));
            Ok(())
        }
    }

    impl Notifier for Recorder {
        fn info(&mut self, message: &str) {
            self.record.lock().infos.push(message.to_string());
        }

        fn error(&mut self, message: &str) {
            self.record.lock().errors.push(message.to_string());
        }
    }

    /// A platform whose three primitives all report into one record.
    pub fn recording(answer: Option<PathBuf>, fail_writes: bool) -> (Platform, Shared) {
        let record = Shared::default();
        let make = || Recorder {
            record: Arc::clone(&record),
            answer: answer.clone(),
            fail_writes,
        };
        let platform = Platform {
            dialog: Box::new(make()),
            sink: Box::new(make()),
            notifier: Box::new(make()),
        };
        (platform, record)
    }
}
