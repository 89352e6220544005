//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::protocol::ExportFormat;
use crate::render::Size;

/// Mermaid diagram studio: live preview, viewport and export for one diagram
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: studio.toml next to the diagram or above it)
    #[arg(short = 'C', long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Enable verbose output for debugging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Open a diagram, follow changes to it and drive its editor from stdin
    #[command(visible_alias = "w")]
    Watch {
        /// Diagram source file
        #[arg(value_hint = clap::ValueHint::FilePath)]
        file: PathBuf,

        /// Preview container size, as WIDTHxHEIGHT
        #[arg(short, long, default_value = "1000x700", value_parser = parse_size)]
        size: Size,
    },

    /// Export a diagram once and exit
    #[command(visible_alias = "e")]
    Export {
        /// Diagram source file
        #[arg(value_hint = clap::ValueHint::FilePath)]
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "svg")]
        format: ExportFormat,

        /// Output path (default: next to the diagram, or in `[export] dir`)
        #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Render a diagram once and print its geometry
    #[command(visible_alias = "r")]
    Render {
        /// Diagram source file
        #[arg(value_hint = clap::ValueHint::FilePath)]
        file: PathBuf,

        /// Preview container size, as WIDTHxHEIGHT
        #[arg(short, long, default_value = "1000x700", value_parser = parse_size)]
        size: Size,
    },
}

impl Cli {
    /// The diagram file every subcommand works on.
    pub fn file(&self) -> &Path {
        match &self.command {
            Commands::Watch { file, .. }
            | Commands::Export { file, .. }
            | Commands::Render { file, .. } => file,
        }
    }
}

/// Parse `WIDTHxHEIGHT`.
pub fn parse_size(s: &str) -> Result<Size, String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got `{s}`"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .map_err(|_| format!("invalid dimension `{v}`"))
    };
    let size = Size::new(parse(w)?, parse(h)?);
    if !size.is_usable() {
        return Err(format!("size must be positive, got `{s}`"));
    }
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("800x600"), Ok(Size::new(800.0, 600.0)));
        assert_eq!(parse_size("1024X768"), Ok(Size::new(1024.0, 768.0)));
        assert!(parse_size("800").is_err());
        assert!(parse_size("0x600").is_err());
        assert!(parse_size("axb").is_err());
    }

    #[test]
    fn test_export_args() {
        let cli = Cli::parse_from(["mermaid-studio", "export", "flow.mmd", "-f", "png", "-v"]);
        assert!(cli.verbose);
        assert_eq!(cli.file(), Path::new("flow.mmd"));
        match cli.command {
            Commands::Export { format, output, .. } => {
                assert_eq!(format, ExportFormat::Raster);
                assert!(output.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_version_flag_still_available() {
        let err = Cli::try_parse_from(["mermaid-studio", "-V"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }
}
