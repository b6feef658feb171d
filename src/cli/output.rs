//! Output formatting
//!
//! Human-readable status lines and JSON output. Logging goes to stderr
//! through `tracing`; everything here goes to stdout, except errors.

use std::fmt::Display;

use serde::Serialize;

/// Status message prefixes
pub mod status {
    /// Success prefix (green checkmark)
    pub const SUCCESS: &str = "✓";

    /// Error prefix (red X)
    pub const ERROR: &str = "✗";

    /// Warning prefix (yellow triangle)
    pub const WARNING: &str = "⚠";

    /// Info prefix (blue circle)
    pub const INFO: &str = "ℹ";
}

/// Effective output settings for one invocation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputConfig {
    /// Suppress everything but errors
    pub quiet: bool,
    /// Emit JSON instead of status lines
    pub json: bool,
}

impl OutputConfig {
    /// Create output settings
    pub fn new(quiet: bool, json: bool) -> Self {
        Self { quiet, json }
    }

    fn human(&self) -> bool {
        !self.quiet && !self.json
    }

    /// Print a success line
    pub fn success(&self, message: impl Display) {
        if self.human() {
            println!("{} {message}", status::SUCCESS);
        }
    }

    /// Print a warning line
    pub fn warning(&self, message: impl Display) {
        if self.human() {
            println!("{} {message}", status::WARNING);
        }
    }

    /// Print an informational line
    pub fn info(&self, message: impl Display) {
        if self.human() {
            println!("{} {message}", status::INFO);
        }
    }

    /// Print an indented detail line
    pub fn detail(&self, message: impl Display) {
        if self.human() {
            println!("  {message}");
        }
    }

    /// Print a value as JSON when JSON output is on
    pub fn json<T: Serialize>(&self, value: &T) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        Ok(())
    }
}

/// Print an error and its causes to stderr
pub fn display_error(error: &anyhow::Error, output: OutputConfig) {
    if output.json {
        let causes: Vec<String> = error.chain().skip(1).map(ToString::to_string).collect();
        let body = serde_json::json!({ "error": error.to_string(), "causes": causes });
        eprintln!("{body}");
        return;
    }

    eprintln!("{} Error: {error}", status::ERROR);
    for cause in error.chain().skip(1) {
        eprintln!("  Caused by: {cause}");
    }
}
