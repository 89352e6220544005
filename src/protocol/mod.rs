//! Message channel between the host and sandbox contexts.
//!
//! ```text
//! Host ──[update / vscode-theme-changed / requestExport]──> Sandbox
//!   ^                                                          |
//!   +──[editorChange / export / exportComplete / exportError / format / cursorPosition]
//! ```
//!
//! Records travel as JSON text, one record per channel item. Order is FIFO per
//! direction; nothing is guaranteed across directions.

pub mod channel;
pub mod message;

pub use channel::{HostEnd, Inbox, Outbox, SandboxEnd, pair};
pub use message::{
    ExportFormat, HostCommand, HostMessage, HostNotice, SandboxCommand, SandboxMessage,
    SandboxNotice, ThemeKind,
};
