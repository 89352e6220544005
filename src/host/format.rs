//! Fallback formatter for the `format` command.

/// Trim every line, keeping line structure.
pub fn format_source(text: &str) -> String {
    text.split('\n').map(str::trim).collect::<Vec<_>>().join("\n")
}
