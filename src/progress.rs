//! Reconcile progress reporting.
//!
//! Reports observable progress during `stock reconcile` so users see how many
//! chunks have gone to the extraction provider and how many remain. Progress
//! is emitted on **stderr** so stdout remains parseable for scripts.

use std::io::Write;

/// A single progress event for reconciliation.
#[derive(Clone, Debug)]
pub enum ReconcileProgressEvent {
    /// Reading the raw log and store (no totals yet).
    Scanning,
    /// Extraction phase: chunk n of total is being submitted to the provider.
    Extracting { provider: String, n: u64, total: u64 },
}

/// Reports reconcile progress. Implementations write to stderr (human or JSON).
pub trait ReconcileProgressReporter: Send + Sync {
    /// Emit a progress event. Called from the reconcile pipeline.
    fn report(&self, event: ReconcileProgressEvent);
}

/// Human-friendly progress on stderr: "reconcile [openai]  extracting  3 / 12 chunks".
pub struct StderrProgress;

impl ReconcileProgressReporter for StderrProgress {
    fn report(&self, event: ReconcileProgressEvent) {
        let line = match &event {
            ReconcileProgressEvent::Scanning => "reconcile  scanning...\n".to_string(),
            ReconcileProgressEvent::Extracting { provider, n, total } => {
                let n_fmt = format_number(*n);
                let total_fmt = format_number(*total);
                format!(
                    "reconcile [{}]  extracting  {} / {} chunks\n",
                    provider, n_fmt, total_fmt
                )
            }
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl ReconcileProgressReporter for JsonProgress {
    fn report(&self, event: ReconcileProgressEvent) {
        let obj = match &event {
            ReconcileProgressEvent::Scanning => serde_json::json!({
                "event": "progress",
                "phase": "scanning"
            }),
            ReconcileProgressEvent::Extracting { provider, n, total } => serde_json::json!({
                "event": "progress",
                "phase": "extracting",
                "provider": provider,
                "n": n,
                "total": total
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl ReconcileProgressReporter for NoProgress {
    fn report(&self, _event: ReconcileProgressEvent) {}
}

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    let chars: Vec<char> = s.chars().rev().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    /// Build a reporter for this mode. Caller passes it to reconcile.
    pub fn reporter(&self) -> Box<dyn ReconcileProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_number_comma() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(1), "1");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234), "1,234");
        assert_eq!(format_number(1_234_567), "1,234,567");
    }
}
