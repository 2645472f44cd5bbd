//! Recognition progress reporting.
//!
//! Optical recognition dominates latency (roughly linear in page count), so
//! callers can watch a document move through the fallback tier page by page.
//! Progress is emitted on **stderr** so stdout remains parseable for scripts.

use std::io::Write;

/// A single progress event for the recognition fallback.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RecognitionEvent {
    /// The document is being rasterized; the page count is not known yet.
    Rendering,
    /// Recognition finished for `page` of `total`.
    Recognized { page: usize, total: usize },
}

/// Reports recognition progress. Implementations write to stderr (human or
/// JSON). Called from the extraction pipeline as a side effect only; nothing
/// flows back.
pub trait RecognitionProgress: Send + Sync {
    fn report(&self, event: RecognitionEvent);
}

/// Human-friendly progress on stderr: "ocr  page 3 / 12".
pub struct StderrProgress;

impl RecognitionProgress for StderrProgress {
    fn report(&self, event: RecognitionEvent) {
        let line = match &event {
            RecognitionEvent::Rendering => "ocr  rendering pages...\n".to_string(),
            RecognitionEvent::Recognized { page, total } => {
                format!("ocr  page {} / {}\n", page, total)
            }
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl RecognitionProgress for JsonProgress {
    fn report(&self, event: RecognitionEvent) {
        let obj = match &event {
            RecognitionEvent::Rendering => serde_json::json!({
                "event": "progress",
                "phase": "rendering"
            }),
            RecognitionEvent::Recognized { page, total } => serde_json::json!({
                "event": "progress",
                "phase": "recognizing",
                "page": page,
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

impl RecognitionProgress for NoProgress {
    fn report(&self, _event: RecognitionEvent) {}
}

/// Progress mode for embedding callers: off, human (stderr), or JSON (stderr).
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

    /// Build a reporter for this mode. Caller passes it to the session.
    pub fn reporter(&self) -> Box<dyn RecognitionProgress> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
