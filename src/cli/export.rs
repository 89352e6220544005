//! `export`: one full export handshake, then exit.
//!
//! A host and a sandbox run in-process exactly as in `watch`; the only
//! difference is a notifier that also reports back to this command, so the
//! first notification decides the exit status.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tokio::sync::mpsc;

use crate::config::cfg;
use crate::host::document::FileDocument;
use crate::host::platform::{AcceptSuggested, DiskSink, Notifier, Platform, StatusNotifier};
use crate::host::{Host, HostActor};
use crate::log;
use crate::protocol::{ExportFormat, pair};
use crate::render::{MermaidCli, Size};
use crate::sandbox::{Sandbox, SandboxActor};

/// Upper bound for the renderer round trip.
const EXPORT_TIMEOUT: Duration = Duration::from_secs(120);

/// Shows notifications on the status line and forwards them.
struct ReportingNotifier {
    inner: StatusNotifier,
    tx: mpsc::UnboundedSender<Result<String, String>>,
}

impl Notifier for ReportingNotifier {
    fn info(&mut self, message: &str) {
        self.inner.info(message);
        let _ = self.tx.send(Ok(message.to_string()));
    }

    fn error(&mut self, message: &str) {
        self.inner.error(message);
        let _ = self.tx.send(Err(message.to_string()));
    }
}

pub async fn run_export(
    file: &Path,
    format: ExportFormat,
    output: Option<PathBuf>,
) -> Result<()> {
    let config = cfg();
    let document = FileDocument::open(file)
        .with_context(|| format!("failed to open {}", file.display()))?;

    let (tx, mut outcomes) = mpsc::unbounded_channel();
    let platform = Platform {
        dialog: Box::new(AcceptSuggested {
            dir: config.export.dir.clone(),
        }),
        sink: Box::new(DiskSink),
        notifier: Box::new(ReportingNotifier {
            inner: StatusNotifier,
            tx,
        }),
    };
    let (host_actor, host) = HostActor::new(Host::new(&config, platform));
    let host_task = tokio::spawn(host_actor.run());

    let (host_end, sandbox_end) = pair();
    // the container size only matters for the viewport, which export ignores
    let sandbox = Sandbox::new(
        &config,
        Size::new(1000.0, 700.0),
        Box::new(MermaidCli::new(&config.render)),
        sandbox_end.outbox,
    );
    let (ui, ui_rx) = mpsc::unbounded_channel();
    let sandbox_task = tokio::spawn(SandboxActor::new(sandbox, sandbox_end.inbox, ui_rx).run());

    let id = host.open(Box::new(document), host_end, false)?;
    host.export(id, format, output)?;
    log!("export"; "rendering {} as {}", file.display(), format.label());

    let outcome = tokio::time::timeout(EXPORT_TIMEOUT, outcomes.recv()).await;

    host.close(id).ok();
    host.shutdown();
    drop(ui);
    let _ = tokio::join!(host_task, sandbox_task);

    match outcome {
        Ok(Some(Ok(_))) => Ok(()),
        Ok(Some(Err(message))) => bail!(message),
        Ok(None) => bail!("export ended without a result"),
        Err(_) => bail!("export timed out after {}s", EXPORT_TIMEOUT.as_secs()),
    }
}
