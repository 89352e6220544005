//! Export coordinator, host half.
//!
//! ```text
//! host                                   sandbox
//!  │ choose destination                     │
//!  │ begin: slot ← pending ──requestExport──►│ render
//!  │◄──────────── exportComplete | exportError
//!  │ complete: decode, write, notify        │
//! ```
//!
//! One slot per editor instance. The wire carries no request id, so a second
//! request while one is pending is rejected rather than replacing the first:
//! a late reply to the first would otherwise be written to the second
//! destination. Replies are matched on `filePath` as well.

use std::path::{Path, PathBuf};
use std::time::Instant;

use super::platform::{FileSink, Notifier};
use crate::core::{StudioError, StudioResult};
use crate::protocol::{ExportFormat, HostMessage, Outbox};

/// An in-flight export request.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingExport {
    pub format: ExportFormat,
    pub path: PathBuf,
    pub started: Instant,
}

/// How a reply was handled.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportOutcome {
    Written(PathBuf),
    WriteFailed(String),
    /// Sandbox reported failure; nothing written.
    Failed(String),
    /// No matching pending request; nothing written.
    Ignored,
}

#[derive(Debug, Default)]
pub struct ExportSlot {
    pending: Option<PendingExport>,
}

impl ExportSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> Option<&PendingExport> {
        self.pending.as_ref()
    }

    /// Send `requestExport` and record the pending entry.
    ///
    /// Fails fast when the rendering surface is gone.
    pub fn begin(
        &mut self,
        format: ExportFormat,
        path: PathBuf,
        surface: &Outbox<HostMessage>,
    ) -> StudioResult<()> {
        if let Some(pending) = &self.pending {
            return Err(StudioError::ExportBusy(pending.path.clone()));
        }
        let no_surface = || StudioError::Configuration("No active rendering surface".into());
        if surface.is_closed() {
            return Err(no_surface());
        }
        surface
            .post(&HostMessage::request_export(format, path.clone()))
            .map_err(|_| no_surface())?;

        crate::debug!("export"; "requested {} -> {}", format.label(), path.display());
        self.pending = Some(PendingExport {
            format,
            path,
            started: Instant::now(),
        });
        Ok(())
    }

    /// Handle `exportComplete`: decode, write once, notify.
    pub fn complete(
        &mut self,
        format: ExportFormat,
        data: &str,
        path: &Path,
        sink: &mut dyn FileSink,
        notifier: &mut dyn Notifier,
    ) -> ExportOutcome {
        let Some(pending) = self.take_matching(path) else {
            crate::debug!("export"; "ignoring unmatched reply for {}", path.display());
            return ExportOutcome::Ignored;
        };
        if pending.format != format {
            crate::debug!("export"; "requested {} but got {}", pending.format.label(), format.label());
        }

        let written = format
            .decode(data)
            .and_then(|bytes| sink.write(&pending.path, &bytes));
        match written {
            Ok(()) => {
                crate::debug!("export"; "done in {:?}", pending.started.elapsed());
                notifier.info(&format!("Exported diagram as {}", format.label()));
                ExportOutcome::Written(pending.path)
            }
            Err(e) => {
                let message = format!("Failed to save exported file: {e}");
                notifier.error(&message);
                ExportOutcome::WriteFailed(message)
            }
        }
    }

    /// Handle `exportError`: report verbatim, discard the entry.
    pub fn fail(&mut self, error: &str, notifier: &mut dyn Notifier) -> ExportOutcome {
        if self.pending.take().is_none() {
            crate::debug!("export"; "exportError with nothing pending: {}", error);
            return ExportOutcome::Ignored;
        }
        notifier.error(error);
        ExportOutcome::Failed(error.to_string())
    }

    /// Drop the pending entry without reporting (surface disposed).
    pub fn abandon(&mut self) -> Option<PendingExport> {
        let pending = self.pending.take();
        if let Some(p) = &pending {
            crate::debug!("export"; "abandoned export to {}", p.path.display());
        }
        pending
    }

    fn take_matching(&mut self, path: &Path) -> Option<PendingExport> {
        match &self.pending {
            Some(p) if p.path == path => self.pending.take(),
            _ => None,
        }
    }
}

/// Default export destination: `<document stem>.<ext>` next to the document.
pub fn suggested_path(document: &Path, format: ExportFormat) -> PathBuf {
    let stem = document
        .file_stem()
        .map_or_else(|| "diagram".into(), |s| s.to_string_lossy());
    document.with_file_name(format!("{stem}.{}", format.extension()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::platform::testing::recording;
    use crate::protocol::{HostCommand, pair};

    #[test]
    fn test_vector_round_trip_writes_once() {
        let (host, mut sandbox) = pair();
        let (mut platform, record) = recording(None, false);
        let mut slot = ExportSlot::new();

        slot.begin(ExportFormat::Vector, "/out/a.svg".into(), &host.outbox)
            .unwrap();
        assert!(matches!(
            sandbox.inbox.try_recv(),
            Some(HostMessage::Command(HostCommand::RequestExport { .. }))
        ));

        let outcome = slot.complete(
            ExportFormat::Vector,
            "X",
            Path::new("/out/a.svg"),
            platform.sink.as_mut(),
            platform.notifier.as_mut(),
        );
        assert_eq!(outcome, ExportOutcome::Written("/out/a.svg".into()));

        let record = record.lock();
        assert_eq!(record.writes, vec![(PathBuf::from("/out/a.svg"), b"X".to_vec())]);
        assert_eq!(record.infos, vec!["Exported diagram as SVG".to_string()]);
        assert!(slot.pending().is_none());
    }

    #[test]
    fn test_raster_payload_decoded() {
        let (host, _sandbox) = pair();
        let (mut platform, record) = recording(None, false);
        let mut slot = ExportSlot::new();

        slot.begin(ExportFormat::Raster, "/a.png".into(), &host.outbox)
            .unwrap();
        slot.complete(
            ExportFormat::Raster,
            "iVBORw==",
            Path::new("/a.png"),
            platform.sink.as_mut(),
            platform.notifier.as_mut(),
        );
        assert_eq!(record.lock().writes[0].1, vec![0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn test_export_error_writes_nothing() {
        let (host, _sandbox) = pair();
        let (mut platform, record) = recording(None, false);
        let mut slot = ExportSlot::new();

        slot.begin(ExportFormat::Vector, "/a.svg".into(), &host.outbox)
            .unwrap();
        let outcome = slot.fail("Parse error on line 3", platform.notifier.as_mut());
        assert_eq!(outcome, ExportOutcome::Failed("Parse error on line 3".into()));

        let record = record.lock();
        assert!(record.writes.is_empty());
        assert_eq!(record.errors, vec!["Parse error on line 3".to_string()]);
        assert!(slot.pending().is_none());
    }

    #[test]
    fn test_second_request_rejected_while_pending() {
        let (host, _sandbox) = pair();
        let mut slot = ExportSlot::new();
        slot.begin(ExportFormat::Vector, "/a.svg".into(), &host.outbox)
            .unwrap();

        let err = slot
            .begin(ExportFormat::Raster, "/b.png".into(), &host.outbox)
            .unwrap_err();
        assert!(matches!(err, StudioError::ExportBusy(ref p) if p == Path::new("/a.svg")));
        assert_eq!(slot.pending().unwrap().path, PathBuf::from("/a.svg"));
    }

    #[test]
    fn test_no_surface_fails_fast() {
        let (host, sandbox) = pair();
        drop(sandbox);
        let mut slot = ExportSlot::new();
        let err = slot
            .begin(ExportFormat::Vector, "/a.svg".into(), &host.outbox)
            .unwrap_err();
        assert!(!err.is_recoverable());
        assert!(slot.pending().is_none());
    }

    #[test]
    fn test_unmatched_reply_ignored() {
        let (host, _sandbox) = pair();
        let (mut platform, record) = recording(None, false);
        let mut slot = ExportSlot::new();

        // nothing pending
        let outcome = slot.complete(
            ExportFormat::Vector,
            "X",
            Path::new("/a.svg"),
            platform.sink.as_mut(),
            platform.notifier.as_mut(),
        );
        assert_eq!(outcome, ExportOutcome::Ignored);

        slot.begin(ExportFormat::Vector, "/a.svg".into(), &host.outbox)
            .unwrap();
        let outcome = slot.complete(
            ExportFormat::Vector,
            "X",
            Path::new("/elsewhere.svg"),
            platform.sink.as_mut(),
            platform.notifier.as_mut(),
        );
        assert_eq!(outcome, ExportOutcome::Ignored);
        assert!(slot.pending().is_some());
        assert!(record.lock().writes.is_empty());
    }

    #[test]
    fn test_write_failure_reported() {
        let (host, _sandbox) = pair();
        let (mut platform, record) = recording(None, true);
        let mut slot = ExportSlot::new();

        slot.begin(ExportFormat::Vector, "/ro/a.svg".into(), &host.outbox)
            .unwrap();
        let outcome = slot.complete(
            ExportFormat::Vector,
            "X",
            Path::new("/ro/a.svg"),
            platform.sink.as_mut(),
            platform.notifier.as_mut(),
        );
        assert!(matches!(outcome, ExportOutcome::WriteFailed(_)));
        let record = record.lock();
        assert_eq!(
            record.errors,
            vec!["Failed to save exported file: `/ro/a.svg`: permission denied".to_string()]
        );
    }

    #[test]
    fn test_suggested_path() {
        assert_eq!(
            suggested_path(Path::new("/docs/flow.mmd"), ExportFormat::Raster),
            PathBuf::from("/docs/flow.png")
        );
        assert_eq!(
            suggested_path(Path::new("notes.md"), ExportFormat::Vector),
            PathBuf::from("notes.svg")
        );
    }
}
