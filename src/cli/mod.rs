//! Command-line interface module.

mod args;
mod command;
pub mod export;
pub mod render;
pub mod watch;

pub use args::{Cli, Commands};
