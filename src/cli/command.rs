//! Line commands read by `watch` on stdin.
//!
//! Each line stands in for one thing a user does in the editor panel:
//! typing, moving the cursor, pressing a toolbar button, dragging or
//! wheel-zooming the preview.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use crate::protocol::{ExportFormat, ThemeKind};
use crate::render::{Point, Size};

pub const HELP: &str = "\
edit <text>            replace the editor text (\\n for newlines)
cursor <line> <col>    move the cursor (1-based)
scroll <line>          scroll the editor to a line (1-based)
zoom in|out            toolbar zoom
fit | reset            fit to screen / reset view
pan <dx> <dy>          drag the preview with space held
wheel <dy> <x> <y>     ctrl+wheel at a container point
resize <w> <h>         resize the preview container
export png|svg [path]  export, asking the dialog when no path is given
format                 format the document
theme dark|light|high-contrast
status                 show editor and preview state
quit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Edit(String),
    Cursor { line: u32, column: u32 },
    Scroll(usize),
    ZoomIn,
    ZoomOut,
    Fit,
    Reset,
    Pan { dx: f64, dy: f64 },
    Wheel { delta_y: f64, at: Point },
    Resize(Size),
    Export {
        format: ExportFormat,
        path: Option<PathBuf>,
    },
    Format,
    Theme(ThemeKind),
    Status,
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim();
        let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();
        let args: Vec<&str> = rest.split_whitespace().collect();

        let command = match (word, args.as_slice()) {
            ("edit", _) => Self::Edit(rest.replace("\\n", "\n")),
            ("cursor", [line, column]) => Self::Cursor {
                line: number(line)?,
                column: number(column)?,
            },
            ("scroll", [line]) => Self::Scroll(number(line)?),
            ("zoom", ["in"]) => Self::ZoomIn,
            ("zoom", ["out"]) => Self::ZoomOut,
            ("fit", []) => Self::Fit,
            ("reset", []) => Self::Reset,
            ("pan", [dx, dy]) => Self::Pan {
                dx: number(dx)?,
                dy: number(dy)?,
            },
            ("wheel", [dy, x, y]) => Self::Wheel {
                delta_y: number(dy)?,
                at: Point::new(number(x)?, number(y)?),
            },
            ("resize", [w, h]) => {
                let size = Size::new(number(w)?, number(h)?);
                if !size.is_usable() {
                    bail!("container size must be positive");
                }
                Self::Resize(size)
            }
            ("export", [format, path @ ..]) if path.len() <= 1 => Self::Export {
                format: export_format(format)?,
                path: path.first().map(PathBuf::from),
            },
            ("format", []) => Self::Format,
            ("theme", [kind]) => Self::Theme(theme(kind)?),
            ("status", []) => Self::Status,
            ("help" | "?", []) => Self::Help,
            ("quit" | "exit" | "q", []) => Self::Quit,
            ("", _) => bail!("empty command"),
            _ => bail!("unrecognized command `{line}` (try `help`)"),
        };
        Ok(command)
    }
}

fn number<T: std::str::FromStr>(s: &str) -> Result<T> {
    s.parse().ok().with_context(|| format!("invalid number `{s}`"))
}

fn export_format(s: &str) -> Result<ExportFormat> {
    match s {
        "png" => Ok(ExportFormat::Raster),
        "svg" => Ok(ExportFormat::Vector),
        _ => bail!("unknown export format `{s}`, expected png or svg"),
    }
}

fn theme(s: &str) -> Result<ThemeKind> {
    match s {
        "dark" => Ok(ThemeKind::Dark),
        "light" => Ok(ThemeKind::Light),
        "high-contrast" => Ok(ThemeKind::HighContrast),
        _ => bail!("unknown theme `{s}`"),
    }
}
