//! Progress reporting sinks.
//!
//! Output is best-effort: nothing written here ever changes what a run does.

use std::sync::Arc;

use owo_colors::OwoColorize;
use parking_lot::Mutex;

/// Destination for human-readable progress messages.
pub trait Output: Send + Sync {
    /// Report progress.
    fn info(&self, message: &str);

    /// Report a completed step.
    fn success(&self, message: &str);

    /// Report a failure.
    fn error(&self, message: &str);
}

/// Styled terminal output. Progress is only printed when verbose.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleOutput {
    verbose: bool,
}

impl ConsoleOutput {
    /// Create console output.
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Whether progress is printed.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

impl Output for ConsoleOutput {
    fn info(&self, message: &str) {
        if self.verbose {
            println!("{} {}", "ℹ".blue().bold(), message);
        }
    }

    fn success(&self, message: &str) {
        if self.verbose {
            println!("{} {}", "✔".green().bold(), message.green());
        }
    }

    fn error(&self, message: &str) {
        eprintln!("{} {}", "✖".red().bold(), message.red());
    }
}

/// Routes messages into `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingOutput;

impl Output for TracingOutput {
    fn info(&self, message: &str) {
        tracing::info!("{}", message);
    }

    fn success(&self, message: &str) {
        tracing::info!(outcome = "success", "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!("{}", message);
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullOutput;

impl Output for NullOutput {
    fn info(&self, _message: &str) {}

    fn success(&self, _message: &str) {}

    fn error(&self, _message: &str) {}
}

/// Severity of a recorded message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputLevel {
    /// Progress.
    Info,
    /// Completed step.
    Success,
    /// Failure.
    Error,
}

/// Keeps every message in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingOutput {
    messages: Arc<Mutex<Vec<(OutputLevel, String)>>>,
}

impl RecordingOutput {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far, in order.
    pub fn messages(&self) -> Vec<(OutputLevel, String)> {
        self.messages.lock().clone()
    }

    /// Messages of one level, in order.
    pub fn at(&self, level: OutputLevel) -> Vec<String> {
        self.messages
            .lock()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    fn push(&self, level: OutputLevel, message: &str) {
        self.messages.lock().push((level, message.to_string()));
    }
}

impl Output for RecordingOutput {
    fn info(&self, message: &str) {
        self.push(OutputLevel::Info, message);
    }

    fn success(&self, message: &str) {
        self.push(OutputLevel::Success, message);
    }

    fn error(&self, message: &str) {
        self.push(OutputLevel::Error, message);
    }
}
