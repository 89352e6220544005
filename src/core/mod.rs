//! Core types shared by the host and sandbox contexts.

mod error;
mod id;
mod state;

pub use error::{StudioError, StudioResult};
pub use id::EditorId;
pub use state::{setup_shutdown_handler, shutdown_signal};
