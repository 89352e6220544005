use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use super::document::{FileDocument, MemoryDocument};
use super::platform::testing::{Shared, recording};
use super::*;
use crate::protocol::{HostCommand, HostNotice, SandboxEnd, pair};

fn host_with(answer: Option<PathBuf>, fail_writes: bool) -> (Host, Shared) {
    let (platform, record) = recording(answer, fail_writes);
    (Host::new(&StudioConfig::default(), platform), record)
}

fn open(host: &mut Host, document: Box<dyn DocumentStore>) -> (EditorId, SandboxEnd) {
    let (end, mut sandbox) = pair();
    let id = EditorId::next();
    host.open(id, document, end.outbox).unwrap();
    // theme first, then the initial content
    assert!(matches!(
        sandbox.inbox.try_recv(),
        Some(HostMessage::Notice(HostNotice::ThemeChanged { .. }))
    ));
    assert!(matches!(
        sandbox.inbox.try_recv(),
        Some(HostMessage::Notice(HostNotice::Update { .. }))
    ));
    (id, sandbox)
}

fn memory(text: &str) -> Box<dyn DocumentStore> {
    Box::new(MemoryDocument::new("/docs/flow.mmd", text))
}

fn drain(sandbox: &mut SandboxEnd) -> Vec<HostMessage> {
    std::iter::from_fn(|| sandbox.inbox.try_recv()).collect()
}

#[test]
fn test_sandbox_edits_are_not_echoed() {
    let (mut host, record) = host_with(None, false);
    let (id, mut sandbox) = open(&mut host, memory("graph TD"));

    host.handle_sandbox(id, SandboxMessage::editor_change("A"));
    host.handle_sandbox(id, SandboxMessage::editor_change("B"));

    assert!(drain(&mut sandbox).is_empty());
    let status = host.status();
    assert_eq!(status[0].revision, 3);
    assert!(status[0].echo_suppressed);
    assert!(record.lock().errors.is_empty());
}

#[test]
fn test_external_file_change_reaches_sandbox() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("flow.mmd");
    fs::write(&path, "graph TD").unwrap();

    let (mut host, _) = host_with(None, false);
    let (id, mut sandbox) = open(&mut host, Box::new(FileDocument::open(&path).unwrap()));

    // a watcher poke with nothing new on disk
    host.document_changed(id);
    assert!(drain(&mut sandbox).is_empty());

    fs::write(&path, "graph LR").unwrap();
    host.document_changed(id);
    assert_eq!(drain(&mut sandbox), vec![HostMessage::update("graph LR")]);
}

#[test]
fn test_own_write_to_file_is_not_echoed() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("flow.mmd");
    fs::write(&path, "graph TD").unwrap();

    let (mut host, _) = host_with(None, false);
    let (id, mut sandbox) = open(&mut host, Box::new(FileDocument::open(&path).unwrap()));

    host.handle_sandbox(id, SandboxMessage::editor_change("graph LR"));
    host.document_changed(id);

    assert_eq!(fs::read_to_string(&path).unwrap(), "graph LR");
    assert!(drain(&mut sandbox).is_empty());
}

#[test]
fn test_empty_edit_reported() {
    let (mut host, record) = host_with(None, false);
    let (id, _sandbox) = open(&mut host, memory("graph TD"));

    host.handle_sandbox(id, SandboxMessage::editor_change(""));
    assert_eq!(
        record.lock().errors,
        vec!["Failed to update editor content: Invalid document or text".to_string()]
    );
}

#[test]
fn test_export_round_trip_writes_once() {
    let (mut host, record) = host_with(Some("/out/flow.svg".into()), false);
    let (id, mut sandbox) = open(&mut host, memory("graph TD"));

    host.handle_sandbox(id, SandboxMessage::export(ExportFormat::Vector));
    let request = drain(&mut sandbox);
    assert_eq!(
        request,
        vec![HostMessage::request_export(ExportFormat::Vector, "/out/flow.svg")]
    );

    host.handle_sandbox(
        id,
        SandboxMessage::export_complete(ExportFormat::Vector, "<svg/>", "/out/flow.svg"),
    );
    // a duplicate reply finds nothing pending
    host.handle_sandbox(
        id,
        SandboxMessage::export_complete(ExportFormat::Vector, "<svg/>", "/out/flow.svg"),
    );

    let record = record.lock();
    assert_eq!(record.dialogs, vec![PathBuf::from("/docs/flow.svg")]);
    assert_eq!(record.writes.len(), 1);
    assert_eq!(record.infos, vec!["Exported diagram as SVG".to_string()]);
}

#[test]
fn test_export_error_writes_nothing() {
    let (mut host, record) = host_with(None, false);
    let (id, _sandbox) = open(&mut host, memory("graph TD"));

    host.request_export(id, ExportFormat::Raster, "/out/flow.png".into());
    host.handle_sandbox(id, SandboxMessage::export_error("Parse error on line 2"));

    let record = record.lock();
    assert!(record.writes.is_empty());
    assert_eq!(record.errors, vec!["Parse error on line 2".to_string()]);
    assert!(host.status()[0].pending_export.is_none());
}

#[test]
fn test_dialog_cancel_is_noop() {
    let (mut host, record) = host_with(None, false);
    let (id, mut sandbox) = open(&mut host, memory("graph TD"));

    host.handle_sandbox(id, SandboxMessage::export(ExportFormat::Raster));
    assert!(drain(&mut sandbox).is_empty());
    let record = record.lock();
    assert_eq!(record.dialogs.len(), 1);
    assert!(record.errors.is_empty());
}

#[test]
fn test_busy_export_rejected_with_notice() {
    let (mut host, record) = host_with(None, false);
    let (id, mut sandbox) = open(&mut host, memory("graph TD"));

    host.request_export(id, ExportFormat::Vector, "/a.svg".into());
    host.request_export(id, ExportFormat::Raster, "/b.png".into());

    assert_eq!(drain(&mut sandbox).len(), 1);
    assert_eq!(
        record.lock().errors,
        vec!["an export to `/a.svg` is already in progress".to_string()]
    );
    assert_eq!(
        host.status()[0].pending_export,
        Some(PathBuf::from("/a.svg"))
    );
}

#[test]
fn test_export_without_surface_fails_fast() {
    let (mut host, record) = host_with(None, false);
    let (id, sandbox) = open(&mut host, memory("graph TD"));
    drop(sandbox);

    host.request_export(id, ExportFormat::Raster, "/a.png".into());
    host.request_export(EditorId::next(), ExportFormat::Vector, "/a.svg".into());

    assert_eq!(
        record.lock().errors,
        vec![
            "Failed to export as PNG: No active rendering surface".to_string(),
            "Failed to export as SVG: No active rendering surface".to_string(),
        ]
    );
}

#[test]
fn test_reply_after_dispose_ignored() {
    let (mut host, record) = host_with(None, false);
    let (id, _sandbox) = open(&mut host, memory("graph TD"));

    host.request_export(id, ExportFormat::Vector, "/a.svg".into());
    assert!(host.dispose(id));
    assert!(!host.dispose(id));

    host.handle_sandbox(
        id,
        SandboxMessage::export_complete(ExportFormat::Vector, "<svg/>", "/a.svg"),
    );
    host.handle_sandbox(id, SandboxMessage::editor_change("late"));

    let record = record.lock();
    assert!(record.writes.is_empty());
    assert!(record.errors.is_empty());
    assert!(host.registry().is_empty());
}

#[test]
fn test_format_trims_and_updates_sandbox() {
    let (mut host, record) = host_with(None, false);
    let (id, mut sandbox) = open(&mut host, memory("  graph TD  \n   A-->B"));

    host.handle_sandbox(id, SandboxMessage::format());
    assert_eq!(drain(&mut sandbox), vec![HostMessage::update("graph TD\nA-->B")]);
    assert_eq!(
        record.lock().infos,
        vec!["Document formatted with basic formatter".to_string()]
    );
}

#[test]
fn test_theme_broadcast() {
    let (mut host, _) = host_with(None, false);
    let (_, mut first) = open(&mut host, memory("a"));
    let (_, mut second) = open(&mut host, memory("b"));

    host.set_theme(ThemeKind::HighContrast);
    for sandbox in [&mut first, &mut second] {
        assert_eq!(
            drain(sandbox),
            vec![HostMessage::theme_changed(ThemeKind::HighContrast)]
        );
    }
}

#[test]
fn test_unknown_and_cursor_messages_ignored() {
    let (mut host, record) = host_with(None, false);
    let (id, mut sandbox) = open(&mut host, memory("graph TD"));

    host.handle_sandbox(id, SandboxMessage::Command(SandboxCommand::Unknown));
    host.handle_sandbox(id, SandboxMessage::cursor_position(2, 4));

    assert!(drain(&mut sandbox).is_empty());
    let record = record.lock();
    assert!(record.errors.is_empty() && record.infos.is_empty());
}

#[tokio::test]
async fn test_actor_open_edit_close() {
    let (platform, record) = recording(None, false);
    let (actor, handle) = HostActor::new(Host::new(&StudioConfig::default(), platform));
    let task = tokio::spawn(actor.run());

    let (end, mut sandbox) = pair();
    let id = handle.open(memory("graph TD"), end, false).unwrap();

    assert!(matches!(
        sandbox.inbox.recv().await,
        Some(HostMessage::Notice(HostNotice::ThemeChanged { .. }))
    ));
    assert_eq!(sandbox.inbox.recv().await, Some(HostMessage::update("graph TD")));

    sandbox
        .outbox
        .post(&SandboxMessage::editor_change("graph LR"))
        .unwrap();
    let mut status = Vec::new();
    for _ in 0..100 {
        status = handle.status().await.unwrap();
        if status[0].revision == 2 {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert_eq!(status.len(), 1);
    assert_eq!(status[0].revision, 2);
    assert_eq!(status[0].path, Path::new("/docs/flow.mmd"));

    handle
        .export(id, ExportFormat::Vector, Some("/a.svg".into()))
        .unwrap();
    // no update for the sandbox's own edit, only the request
    assert!(matches!(
        sandbox.inbox.recv().await,
        Some(HostMessage::Command(HostCommand::RequestExport { .. }))
    ));

    handle.close(id).unwrap();
    // the surface goes away with the instance
    assert_eq!(sandbox.inbox.recv().await, None);
    assert!(record.lock().writes.is_empty());

    handle.shutdown();
    task.await.unwrap();
}

#[tokio::test]
async fn test_actor_disposes_when_sandbox_goes_away() {
    let (platform, _) = recording(None, false);
    let (actor, handle) = HostActor::new(Host::new(&StudioConfig::default(), platform));
    let task = tokio::spawn(actor.run());

    let (end, sandbox) = pair();
    handle.open(memory("graph TD"), end, false).unwrap();
    drop(sandbox);

    let mut remaining = 1;
    for _ in 0..100 {
        remaining = handle.status().await.unwrap().len();
        if remaining == 0 {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert_eq!(remaining, 0);

    drop(handle);
    task.await.unwrap();
}
