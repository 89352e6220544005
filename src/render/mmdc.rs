//! Mermaid CLI (`mmdc`) adapter.

use std::ffi::OsStr;
use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use super::exec::Cmd;
use super::{DiagramRenderer, renderer_theme};
use crate::config::RenderConfig;
use crate::core::{StudioError, StudioResult};
use crate::protocol::{ExportFormat, ThemeKind};

/// Renders by shelling out to the mermaid CLI through scratch files.
#[derive(Debug, Clone)]
pub struct MermaidCli {
    command: Vec<String>,
    background: String,
}

impl MermaidCli {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            command: config.command.clone(),
            background: config.background.clone(),
        }
    }

    /// Run one conversion and return the output file's bytes.
    fn convert(&self, source: &str, extension: &str, theme: ThemeKind) -> StudioResult<Vec<u8>> {
        let job = Scratch::new(extension)?;
        fs::write(&job.input, source).map_err(|e| StudioError::Io(job.input.clone(), e))?;

        Cmd::from_slice(&self.command)
            .args([
                OsStr::new("-i"),
                job.input.as_os_str(),
                OsStr::new("-o"),
                job.output.as_os_str(),
                OsStr::new("-t"),
                OsStr::new(renderer_theme(theme)),
                OsStr::new("-b"),
                OsStr::new(&self.background),
            ])
            .run()?;

        fs::read(&job.output).map_err(|e| StudioError::Io(job.output.clone(), e))
    }
}

impl DiagramRenderer for MermaidCli {
    fn render_svg(&mut self, source: &str, theme: ThemeKind) -> StudioResult<String> {
        let bytes = self.convert(source, ExportFormat::Vector.extension(), theme)?;
        String::from_utf8(bytes)
            .map_err(|_| StudioError::Render("renderer produced non UTF-8 SVG".into()))
    }

    fn export(
        &mut self,
        source: &str,
        format: ExportFormat,
        theme: ThemeKind,
    ) -> StudioResult<Vec<u8>> {
        self.convert(source, format.extension(), theme)
    }
}

/// Input/output file pair in a private directory, removed on drop.
struct Scratch {
    _dir: TempDir,
    input: PathBuf,
    output: PathBuf,
}

impl Scratch {
    fn new(extension: &str) -> StudioResult<Self> {
        let dir = tempfile::Builder::new()
            .prefix("mermaid-studio-")
            .tempdir()
            .map_err(|e| StudioError::Io(std::env::temp_dir(), e))?;
        Ok(Self {
            input: dir.path().join("diagram.mmd"),
            output: dir.path().join(format!("diagram.{extension}")),
            _dir: dir,
        })
    }
}
