// ABOUTME: Output formatting for CLI feedback.
// ABOUTME: Normal (timestamped), quiet (warnings only) and JSON-lines sinks.

use crate::sink::{LogSink, Severity};
use crate::sync::BatchReport;
use crate::types::{ImageReference, StatusRecord};
use serde::Serialize;
use std::time::Instant;

const RULE_WIDTH: usize = 72;

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly output with timestamps and section rules
    Normal,
    /// Warnings and the final result only, for CI
    Quiet,
    /// JSON lines for scripting
    Json,
}

/// Handles CLI output based on the configured mode.
pub struct Output {
    mode: OutputMode,
    show_push: bool,
    start_time: Option<Instant>,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            show_push: false,
            start_time: None,
        }
    }

    /// Also print the records returned by each push.
    pub fn show_push(mut self, show: bool) -> Self {
        self.show_push = show;
        self
    }

    /// Start timing an operation.
    pub fn start_timer(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Get elapsed time since timer started.
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    /// Print a success message with optional timing.
    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => {
                let elapsed = self.elapsed_secs();
                if elapsed > 0.0 {
                    println!("{message} ({:.1}s)", elapsed);
                } else {
                    println!("{message}");
                }
            }
            OutputMode::Quiet => println!("{message}"),
            OutputMode::Json => self.emit(JsonEvent {
                duration_secs: self.duration(),
                ..JsonEvent::new("success", message)
            }),
        }
    }

    /// Print an error message to stderr, as a JSON event in JSON mode.
    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => eprintln!("Error: {message}"),
            OutputMode::Json => {
                let event = JsonEvent {
                    duration_secs: self.duration(),
                    ..JsonEvent::new("error", message)
                };
                if let Ok(json) = serde_json::to_string(&event) {
                    eprintln!("{json}");
                }
            }
        }
    }

    /// Print the outcome of a sync batch.
    pub fn summary(&self, report: &BatchReport) {
        let message = format!(
            "Synced {} of {} image(s)",
            report.synced.len(),
            report.total()
        );

        if self.mode == OutputMode::Json {
            let failed: Vec<&str> = report.failed.iter().map(|(spec, _)| spec.as_str()).collect();
            self.emit(JsonEvent {
                synced: Some(report.synced.as_slice()),
                failed: Some(failed),
                duration_secs: self.duration(),
                ..JsonEvent::new("summary", &message)
            });
            return;
        }

        self.success(&message);
        for (spec, err) in &report.failed {
            println!("  failed: {spec}: {err}");
        }
    }

    fn duration(&self) -> Option<f64> {
        self.start_time.map(|_| self.elapsed_secs())
    }

    fn emit(&self, event: JsonEvent<'_>) {
        if let Ok(json) = serde_json::to_string(&event) {
            println!("{json}");
        }
    }
}

fn timestamp() -> String {
    chrono::Local::now().format("%F %T").to_string()
}

/// Render push records as a YAML document.
pub fn render_records(records: &[StatusRecord]) -> String {
    serde_yaml::to_string(records).unwrap_or_else(|e| format!("# unrenderable records: {e}\n"))
}

fn section_rule(title: &str) -> String {
    let head = format!("==== {title} ");
    let fill = RULE_WIDTH.saturating_sub(head.chars().count());
    format!("{head}{}", "=".repeat(fill))
}

impl LogSink for Output {
    fn log(&self, severity: Severity, line: &str) {
        match (self.mode, severity) {
            (OutputMode::Normal, _) | (OutputMode::Quiet, Severity::Warn) => {
                println!("[{}] {}", timestamp(), line);
            }
            (OutputMode::Quiet, Severity::Info) => {}
            (OutputMode::Json, _) => {
                let level = match severity {
                    Severity::Info => "info",
                    Severity::Warn => "warn",
                };
                self.emit(JsonEvent {
                    level: Some(level),
                    timestamp: Some(timestamp()),
                    ..JsonEvent::new("log", line)
                });
            }
        }
    }

    fn section(&self, title: &str) {
        if self.mode == OutputMode::Normal {
            println!("{}", section_rule(title));
        }
    }

    fn push_result(&self, reference: &ImageReference, records: &[StatusRecord]) {
        if !self.show_push {
            return;
        }
        match self.mode {
            OutputMode::Normal => print!("{}", render_records(records)),
            OutputMode::Quiet => {}
            OutputMode::Json => {
                let image = reference.dest_name();
                self.emit(JsonEvent {
                    records: Some(records),
                    ..JsonEvent::new("push", &image)
                });
            }
        }
    }

    fn progress(&self, done: usize, total: usize) {
        if self.mode == OutputMode::Normal && total > 1 {
            println!("[{done}/{total}]");
        }
    }
}

#[derive(Serialize)]
struct JsonEvent<'a> {
    event: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    level: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    records: Option<&'a [StatusRecord]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    synced: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failed: Option<Vec<&'a str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
}

impl<'a> JsonEvent<'a> {
    fn new(event: &'a str, message: &'a str) -> Self {
        Self {
            event,
            message,
            level: None,
            timestamp: None,
            records: None,
            synced: None,
            failed: None,
            duration_secs: None,
        }
    }
}
