//! `watch`: one editor instance on a file, driven from stdin.
//!
//! ```text
//! stdin thread ──Input──┐
//! ctrl-c thread ──Input─┤
//!                       ▼
//!                   run_watch ──UiEvent──► SandboxActor ◄──channel──► HostActor
//!                             ──HostHandle─────────────────────────────┘
//! ```

use std::io::BufRead;
use std::path::Path;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, oneshot};

use super::command::{Command, HELP};
use crate::config::cfg;
use crate::core::{EditorId, StudioError, shutdown_signal};
use crate::host::document::FileDocument;
use crate::host::platform::Platform;
use crate::host::{Host, HostActor, HostHandle};
use crate::log;
use crate::protocol::pair;
use crate::render::{MermaidCli, Point, Size};
use crate::sandbox::viewport::{Key, Modifiers};
use crate::sandbox::{Sandbox, SandboxActor, SandboxInput, ToolbarAction, UiEvent};

enum Input {
    Line(String),
    Interrupt,
}

pub async fn run_watch(file: &Path, container: Size) -> Result<()> {
    let config = cfg();
    let document = FileDocument::open(file)
        .with_context(|| format!("failed to open {}", file.display()))?;

    let platform = Platform::terminal(config.export.dir.clone());
    let (host_actor, host) = HostActor::new(Host::new(&config, platform));
    let host_task = tokio::spawn(host_actor.run());

    let (host_end, sandbox_end) = pair();
    let sandbox = Sandbox::new(
        &config,
        container,
        Box::new(MermaidCli::new(&config.render)),
        sandbox_end.outbox,
    );
    let (ui, ui_rx) = mpsc::unbounded_channel();
    let sandbox_task = tokio::spawn(SandboxActor::new(sandbox, sandbox_end.inbox, ui_rx).run());

    let id = host.open(Box::new(document), host_end, true)?;
    log!("watch"; "editing {} (`help` lists commands)", file.display());

    let mut inputs = spawn_inputs();
    while let Some(input) = inputs.recv().await {
        let line = match input {
            Input::Line(line) => line,
            Input::Interrupt => break,
        };
        match Command::parse(&line) {
            Ok(Command::Quit) => break,
            Ok(command) => {
                if let Err(e) = apply(command, id, &host, &ui, container).await {
                    log!(e.category(); "{}", e);
                    if matches!(e, StudioError::ChannelClosed) || !e.is_recoverable() {
                        break;
                    }
                }
            }
            Err(e) => log!("watch"; "{}", e),
        }
    }

    host.close(id).ok();
    host.shutdown();
    drop(ui);
    let (host_done, sandbox_done) = tokio::join!(host_task, sandbox_task);
    host_done.context("host task failed")?;
    sandbox_done.context("sandbox task failed")?;
    log!("watch"; "closed {}", file.display());
    Ok(())
}

/// Stdin lines and Ctrl+C, merged into one stream.
fn spawn_inputs() -> mpsc::UnboundedReceiver<Input> {
    let (tx, rx) = mpsc::unbounded_channel();

    if let Some(signal) = shutdown_signal() {
        let tx = tx.clone();
        std::thread::spawn(move || {
            if signal.recv().is_ok() {
                let _ = tx.send(Input::Interrupt);
            }
        });
    }

    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(Input::Line(line)).is_err() {
                return;
            }
        }
        // EOF ends the session like `quit`
        let _ = tx.send(Input::Interrupt);
    });

    rx
}

async fn apply(
    command: Command,
    id: EditorId,
    host: &HostHandle,
    ui: &mpsc::UnboundedSender<SandboxInput>,
    container: Size,
) -> Result<(), StudioError> {
    let send = |event: UiEvent| {
        ui.send(SandboxInput::Ui(event))
            .map_err(|_| StudioError::ChannelClosed)
    };

    match command {
        Command::Edit(text) => send(UiEvent::Typed(text)),
        Command::Cursor { line, column } => send(UiEvent::CursorMoved { line, column }),
        Command::Scroll(line) => send(UiEvent::Scroll(line)),
        Command::ZoomIn => send(UiEvent::Toolbar(ToolbarAction::ZoomIn)),
        Command::ZoomOut => send(UiEvent::Toolbar(ToolbarAction::ZoomOut)),
        Command::Fit => send(UiEvent::Toolbar(ToolbarAction::Fit)),
        Command::Reset => send(UiEvent::Toolbar(ToolbarAction::Reset)),
        Command::Pan { dx, dy } => {
            let start = container.center();
            send(UiEvent::KeyDown(Key::Space, Modifiers::default()))?;
            send(UiEvent::PointerDown {
                button: 0,
                at: start,
                modifiers: Modifiers::default(),
            })?;
            send(UiEvent::PointerMove(Point::new(start.x + dx, start.y + dy)))?;
            send(UiEvent::PointerUp)?;
            send(UiEvent::KeyUp(Key::Space))
        }
        Command::Wheel { delta_y, at } => send(UiEvent::Wheel {
            delta_y,
            at,
            modifiers: Modifiers::CTRL,
        }),
        Command::Resize(size) => send(UiEvent::Resize(size)),
        Command::Export {
            format,
            path: Some(path),
        } => host.export(id, format, Some(path)),
        Command::Export { format, path: None } => {
            send(UiEvent::Toolbar(ToolbarAction::Export(format)))
        }
        Command::Format => send(UiEvent::Toolbar(ToolbarAction::Format)),
        Command::Theme(theme) => host.set_theme(theme),
        Command::Status => print_status(host, ui).await,
        Command::Help => {
            println!("{HELP}");
            Ok(())
        }
        Command::Quit => Ok(()),
    }
}

async fn print_status(
    host: &HostHandle,
    ui: &mpsc::UnboundedSender<SandboxInput>,
) -> Result<(), StudioError> {
    for instance in host.status().await? {
        log!("host"; "{} {} rev {}{}",
            instance.id,
            instance.path.display(),
            instance.revision,
            instance
                .pending_export
                .map(|p| format!(", exporting to {}", p.display()))
                .unwrap_or_default());
    }

    let (reply, rx) = oneshot::channel();
    ui.send(SandboxInput::Status(reply))
        .map_err(|_| StudioError::ChannelClosed)?;
    let status = rx.await.map_err(|_| StudioError::ChannelClosed)?;

    let preview = match &status.preview {
        None => "empty".to_string(),
        Some(Ok(nodes)) => format!("{nodes} node(s)"),
        Some(Err(message)) => message.lines().next().unwrap_or_default().to_string(),
    };
    log!("sandbox"; "zoom {} | {} | {}{}",
        status.zoom_label,
        status.transform,
        preview,
        if status.pending_edit { " | edit pending" } else { "" });
    if let Some(notice) = &status.notice {
        log!("sandbox"; "{}", notice);
    }
    if let Some((node, rect, opacity)) = &status.highlight {
        log!("sandbox"; "highlight {} at ({:.0}, {:.0}) {:.0}x{:.0}, opacity {}",
            node, rect.x, rect.y, rect.width, rect.height, opacity);
    }
    Ok(())
}
