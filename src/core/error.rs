//! Error taxonomy for the synchronization engine.
//!
//! Every error is handled at the boundary nearest its origin and turned into
//! a user-visible message. The only form that crosses the message channel is
//! the `exportError` string payload built from `Display`.

use std::path::PathBuf;
use thiserror::Error;

pub type StudioResult<T> = std::result::Result<T, StudioError>;

#[derive(Debug, Error)]
pub enum StudioError {
    /// A required resource is missing (no rendering surface, no renderer
    /// binary). Fatal to the operation, never retried.
    #[error("{0}")]
    Configuration(String),

    /// Malformed or oversized input. The previous valid state is kept.
    #[error("{0}")]
    Validation(String),

    /// The host refused or failed to apply an edit to the document.
    #[error("failed to apply edit: {0}")]
    EditRejected(String),

    // NOTE: No #[source] here - the reason is part of the message already
    #[error("`{}`: {}", .0.display(), .1)]
    Io(PathBuf, std::io::Error),

    /// The black-box renderer failed.
    #[error("{0}")]
    Render(String),

    /// An export is already pending for this editor instance.
    #[error("an export to `{}` is already in progress", .0.display())]
    ExportBusy(PathBuf),

    /// The peer context is gone (disposed mid-flight).
    #[error("message channel closed")]
    ChannelClosed,
}

impl StudioError {
    /// Short category label used as the log module / status summary.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::Validation(_) | Self::ExportBusy(_) => "validation",
            Self::EditRejected(_) | Self::Io(..) | Self::ChannelClosed => "io",
            Self::Render(_) => "render",
        }
    }

    /// Configuration errors abort the operation; everything else leaves the
    /// session usable.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Configuration(_))
    }
}
