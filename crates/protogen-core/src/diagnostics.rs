//! Leveled diagnostics reported during a transform run

use std::fmt;

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Info,
    Warn,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Info => write!(f, "INFO"),
            Level::Warn => write!(f, "WARN"),
        }
    }
}

/// A single reported message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.level, self.message)
    }
}

/// Destination for diagnostics, owned by whoever drives a run.
///
/// Concurrent runs must each use their own sink.
pub trait DiagnosticSink {
    fn report(&mut self, level: Level, message: String);

    fn info(&mut self, message: String) {
        self.report(Level::Info, message);
    }

    fn warn(&mut self, message: String) {
        self.report(Level::Warn, message);
    }
}

/// Collecting sink that also forwards every entry to `tracing`
#[derive(Debug, Default, Clone)]
pub struct Report {
    entries: Vec<Diagnostic>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(|d| d.level == Level::Warn)
    }

    pub fn has_warnings(&self) -> bool {
        self.warnings().next().is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<Diagnostic> {
        self.entries
    }
}

impl DiagnosticSink for Report {
    fn report(&mut self, level: Level, message: String) {
        match level {
            Level::Info => tracing::info!("{message}"),
            Level::Warn => tracing::warn!("{message}"),
        }
        self.entries.push(Diagnostic { level, message });
    }
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, level: Level, message: String) {
        self.push(Diagnostic { level, message });
    }
}
