//! External command execution for the renderer.
//!
//! ```ignore
//! let output = Cmd::from_slice(&["npx", "mmdc"])
//!     .args(["-i", "in.mmd", "-o", "out.svg"])
//!     .run()?;
//! ```

use std::{
    borrow::Cow,
    ffi::{OsStr, OsString},
    process::{Command, Output},
    sync::LazyLock,
};

use regex::Regex;

use crate::core::{StudioError, StudioResult};

static ANSI: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*m").unwrap());

/// Command builder for one renderer invocation.
#[derive(Debug, Default)]
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
}

impl Cmd {
    /// Create from a command array (e.g. `["mmdc"]` or `["npx", "mmdc"]`).
    pub fn from_slice<S: AsRef<OsStr>>(cmd: &[S]) -> Self {
        let mut iter = cmd.iter();
        let program = iter
            .next()
            .map(|s| s.as_ref().to_owned())
            .unwrap_or_default();
        Self {
            program,
            args: iter.map(|s| s.as_ref().to_owned()).collect(),
        }
    }

    /// Add multiple arguments. Empty ones are skipped.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            let arg = arg.as_ref();
            if !arg.is_empty() {
                self.args.push(arg.to_owned());
            }
        }
        self
    }

    fn program_name(&self) -> String {
        self.program.to_string_lossy().to_string()
    }

    /// Run to completion. A non-zero exit is a render error carrying stderr.
    pub fn run(self) -> StudioResult<Output> {
        let name = self.program_name();
        let program = which::which(&self.program).map_err(|_| {
            StudioError::Configuration(format!("renderer `{name}` not found in PATH"))
        })?;

        crate::debug!("render"; "{} {}", name, self.args.iter().map(|a| a.to_string_lossy()).collect::<Vec<_>>().join(" "));

        let output = Command::new(program)
            .args(&self.args)
            .output()
            .map_err(|e| StudioError::Render(format!("failed to execute `{name}`: {e}")))?;

        if !output.status.success() {
            return Err(StudioError::Render(format_error(&name, &output)));
        }
        Ok(output)
    }
}

fn strip_ansi(s: &str) -> Cow<'_, str> {
    ANSI.replace_all(s, "")
}

/// Error text for a failed command.
fn format_error(name: &str, output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = strip_ansi(stderr.trim());

    let mut msg = format!("`{name}` failed with {}", output.status);
    if !stderr.is_empty() {
        msg.push('\n');
        msg.push_str(&stderr);
    }
    msg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_slice_splits_program() {
        let cmd = Cmd::from_slice(&["npx", "-y", "mmdc"]).args(["-i", "", "a.mmd"]);
        assert_eq!(cmd.program, OsString::from("npx"));
        assert_eq!(cmd.args.len(), 4);
    }

    #[test]
    fn test_strip_ansi() {
        assert_eq!(strip_ansi("\x1b[31mParse error\x1b[0m"), "Parse error");
    }

    #[test]
    fn test_missing_program_is_configuration_error() {
        let err = Cmd::from_slice(&["definitely-not-a-renderer-xyz"]).run().unwrap_err();
        assert_eq!(err.category(), "configuration");
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_command_is_render_error() {
        let err = Cmd::from_slice(&["false"]).run().unwrap_err();
        assert_eq!(err.category(), "render");
    }
}
