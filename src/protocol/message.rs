//! Wire message definitions.
//!
//! Records are tagged either by `command` or by `type`, matching what each
//! side of the channel emits. Both directions are modelled as an untagged
//! envelope over two internally tagged enums. Unrecognized tags land in the
//! `Unknown` arms and are ignored by the dispatchers.

use std::path::PathBuf;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::core::{StudioError, StudioResult};

// =============================================================================
// Shared value types
// =============================================================================

/// Export artifact format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
pub enum ExportFormat {
    /// Binary image, base64 in transit.
    #[serde(rename = "png")]
    #[value(name = "png")]
    Raster,
    /// SVG text, sent verbatim.
    #[serde(rename = "svg")]
    #[value(name = "svg")]
    Vector,
}

impl ExportFormat {
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Raster => "png",
            Self::Vector => "svg",
        }
    }

    /// Upper-case label for user messages ("PNG", "SVG").
    pub const fn label(self) -> &'static str {
        match self {
            Self::Raster => "PNG",
            Self::Vector => "SVG",
        }
    }

    /// Encode an artifact for transit.
    pub fn encode(self, bytes: &[u8]) -> String {
        match self {
            Self::Raster => STANDARD.encode(bytes),
            Self::Vector => String::from_utf8_lossy(bytes).into_owned(),
        }
    }

    /// Decode a transit payload back into file bytes.
    pub fn decode(self, data: &str) -> StudioResult<Vec<u8>> {
        match self {
            Self::Raster => STANDARD.decode(data.trim()).map_err(|e| {
                StudioError::Validation(format!("invalid base64 in PNG payload: {e}"))
            }),
            Self::Vector => Ok(data.as_bytes().to_vec()),
        }
    }
}

/// Color theme kind of the host UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ThemeKind {
    #[serde(rename = "vscode-dark")]
    Dark,
    #[default]
    #[serde(rename = "vscode-light")]
    Light,
    #[serde(rename = "vscode-high-contrast")]
    HighContrast,
}

// =============================================================================
// Host -> Sandbox
// =============================================================================

/// Record sent from the host to the sandbox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HostMessage {
    Command(HostCommand),
    Notice(HostNotice),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command")]
pub enum HostCommand {
    /// Render the current diagram in `format` and reply with the payload.
    #[serde(rename = "requestExport")]
    RequestExport {
        format: ExportFormat,
        #[serde(rename = "filePath")]
        file_path: PathBuf,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum HostNotice {
    /// The document changed outside the sandbox.
    #[serde(rename = "update")]
    Update { text: String },
    #[serde(rename = "vscode-theme-changed")]
    ThemeChanged { theme: ThemeKind },
    #[serde(other)]
    Unknown,
}

impl HostMessage {
    pub fn update(text: impl Into<String>) -> Self {
        Self::Notice(HostNotice::Update { text: text.into() })
    }

    pub fn theme_changed(theme: ThemeKind) -> Self {
        Self::Notice(HostNotice::ThemeChanged { theme })
    }

    pub fn request_export(format: ExportFormat, file_path: impl Into<PathBuf>) -> Self {
        Self::Command(HostCommand::RequestExport {
            format,
            file_path: file_path.into(),
        })
    }

    /// Parse from JSON string. Malformed records yield `None`.
    pub fn from_json(s: &str) -> Option<Self> {
        serde_json::from_str(s).ok()
    }
}

// =============================================================================
// Sandbox -> Host
// =============================================================================

/// Record sent from the sandbox to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SandboxMessage {
    Command(SandboxCommand),
    Notice(SandboxNotice),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum SandboxCommand {
    /// Debounced editor content, to be applied to the document.
    EditorChange { text: String },
    /// Toolbar asked for an export; the host picks the destination.
    Export { format: ExportFormat },
    ExportComplete {
        format: ExportFormat,
        data: String,
        #[serde(rename = "filePath")]
        file_path: PathBuf,
    },
    ExportError { error: String },
    /// Toolbar asked the host to format the document.
    Format,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SandboxNotice {
    /// 1-based cursor position in the editing widget.
    CursorPosition { line: u32, column: u32 },
    #[serde(other)]
    Unknown,
}

impl SandboxMessage {
    pub fn editor_change(text: impl Into<String>) -> Self {
        Self::Command(SandboxCommand::EditorChange { text: text.into() })
    }

    pub fn export(format: ExportFormat) -> Self {
        Self::Command(SandboxCommand::Export { format })
    }

    pub fn export_complete(
        format: ExportFormat,
        data: impl Into<String>,
        file_path: impl Into<PathBuf>,
    ) -> Self {
        Self::Command(SandboxCommand::ExportComplete {
            format,
            data: data.into(),
            file_path: file_path.into(),
        })
    }

    pub fn export_error(error: impl Into<String>) -> Self {
        Self::Command(SandboxCommand::ExportError {
            error: error.into(),
        })
    }

    pub fn format() -> Self {
        Self::Command(SandboxCommand::Format)
    }

    pub fn cursor_position(line: u32, column: u32) -> Self {
        Self::Notice(SandboxNotice::CursorPosition { line, column })
    }

    /// Parse from JSON string. Malformed records yield `None`.
    pub fn from_json(s: &str) -> Option<Self> {
        serde_json::from_str(s).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_wire_shape() {
        let json = serde_json::to_string(&HostMessage::update("graph TD")).unwrap();
        assert_eq!(json, r#"{"type":"update","text":"graph TD"}"#);
    }

    #[test]
    fn test_request_export_wire_shape() {
        let msg = HostMessage::request_export(ExportFormat::Raster, "/tmp/a.png");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""command":"requestExport""#));
        assert!(json.contains(r#""format":"png""#));
        assert!(json.contains(r#""filePath":"/tmp/a.png""#));
    }

    #[test]
    fn test_theme_changed_parses() {
        let msg = HostMessage::from_json(r#"{"type":"vscode-theme-changed","theme":"vscode-dark"}"#);
        assert_eq!(msg, Some(HostMessage::theme_changed(ThemeKind::Dark)));
    }

    #[test]
    fn test_sandbox_commands_parse() {
        let msg = SandboxMessage::from_json(r#"{"command":"editorChange","text":"abc"}"#);
        assert_eq!(msg, Some(SandboxMessage::editor_change("abc")));

        let msg = SandboxMessage::from_json(r#"{"command":"format"}"#);
        assert_eq!(msg, Some(SandboxMessage::format()));

        let msg = SandboxMessage::from_json(
            r#"{"command":"exportComplete","format":"svg","data":"<svg/>","filePath":"/x.svg"}"#,
        );
        assert_eq!(
            msg,
            Some(SandboxMessage::export_complete(ExportFormat::Vector, "<svg/>", "/x.svg"))
        );
    }

    #[test]
    fn test_cursor_position_parses() {
        let msg = SandboxMessage::from_json(r#"{"type":"cursorPosition","line":4,"column":2}"#);
        assert_eq!(msg, Some(SandboxMessage::cursor_position(4, 2)));
    }

    #[test]
    fn test_unknown_tags_are_not_errors() {
        let msg = SandboxMessage::from_json(r#"{"command":"theme-change","theme":"dark"}"#);
        assert_eq!(msg, Some(SandboxMessage::Command(SandboxCommand::Unknown)));

        let msg = HostMessage::from_json(r#"{"type":"ping"}"#);
        assert_eq!(msg, Some(HostMessage::Notice(HostNotice::Unknown)));
    }

    #[test]
    fn test_malformed_records_rejected() {
        assert_eq!(SandboxMessage::from_json("not json"), None);
        // known tag, missing field
        assert_eq!(SandboxMessage::from_json(r#"{"command":"editorChange"}"#), None);
        assert_eq!(HostMessage::from_json(r#"{"text":"x"}"#), None);
    }

    #[test]
    fn test_raster_payload_is_base64() {
        let bytes = [0x89, b'P', b'N', b'G', 0x00, 0xff];
        let data = ExportFormat::Raster.encode(&bytes);
        assert_eq!(data, "iVBORwD/");
        assert_eq!(ExportFormat::Raster.decode(&data).unwrap(), bytes);
    }

    #[test]
    fn test_vector_payload_is_verbatim() {
        assert_eq!(ExportFormat::Vector.encode(b"<svg/>"), "<svg/>");
        assert_eq!(ExportFormat::Vector.decode("X").unwrap(), b"X");
    }

    #[test]
    fn test_invalid_base64_is_validation_error() {
        let err = ExportFormat::Raster.decode("***").unwrap_err();
        assert_eq!(err.category(), "validation");
    }
}
