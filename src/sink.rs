// ABOUTME: Log sink capability injected into the sync and purge flows.
// ABOUTME: Keeps the orchestrators free of any rendering; includes an in-memory sink.

use crate::types::{ImageReference, StatusRecord};
use parking_lot::Mutex;

/// Severity of a reported line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warn,
}

/// Where orchestrators report what happened.
///
/// Only [`LogSink::log`] is required; the other hooks default to no-ops.
pub trait LogSink: Send + Sync {
    /// A free-text status line.
    fn log(&self, severity: Severity, line: &str);

    /// A new batch entry is starting.
    fn section(&self, _title: &str) {}

    /// Push finished; `records` are in stream order.
    fn push_result(&self, _reference: &ImageReference, _records: &[StatusRecord]) {}

    /// `done` of `total` items handled.
    fn progress(&self, _done: usize, _total: usize) {}
}

/// A reported line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub severity: Severity,
    pub line: String,
}

/// Collects everything reported to it. Useful for tests and for callers
/// that render after the fact.
#[derive(Default)]
pub struct MemorySink {
    lines: Mutex<Vec<LogLine>>,
    sections: Mutex<Vec<String>>,
    progress: Mutex<Vec<(usize, usize)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<LogLine> {
        self.lines.lock().clone()
    }

    /// Just the text of every line, in order.
    pub fn texts(&self) -> Vec<String> {
        self.lines.lock().iter().map(|l| l.line.clone()).collect()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.lines
            .lock()
            .iter()
            .filter(|l| l.severity == Severity::Warn)
            .map(|l| l.line.clone())
            .collect()
    }

    pub fn sections(&self) -> Vec<String> {
        self.sections.lock().clone()
    }

    pub fn progress_updates(&self) -> Vec<(usize, usize)> {
        self.progress.lock().clone()
    }
}

impl LogSink for MemorySink {
    fn log(&self, severity: Severity, line: &str) {
        self.lines.lock().push(LogLine {
            severity,
            line: line.to_string(),
        });
    }

    fn section(&self, title: &str) {
        self.sections.lock().push(title.to_string());
    }

    fn progress(&self, done: usize, total: usize) {
        self.progress.lock().push((done, total));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_starts_empty() {
        let sink = MemorySink::new();
        assert!(sink.lines().is_empty());
        assert!(sink.warnings().is_empty());
    }

    #[test]
    fn memory_sink_keeps_order_and_severity() {
        let sink = MemorySink::new();
        sink.log(Severity::Info, "first");
        sink.log(Severity::Warn, "second");
        sink.progress(1, 2);

        assert_eq!(sink.texts(), vec!["first", "second"]);
        assert_eq!(sink.warnings(), vec!["second"]);
        assert_eq!(sink.progress_updates(), vec![(1, 2)]);
    }
}
