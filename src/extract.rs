//! Two-tier document text extraction.
//!
//! Tier 1 reads the text embedded in the document's own structure: cheap,
//! and for born-digital uploads the only tier that ever runs. Tier 2 is the
//! recognition fallback for scans: rasterize every page, binarize it, and
//! run optical recognition. The fallback is orders of magnitude slower, so
//! tier 1 returning anything non-blank short-circuits it entirely.
//!
//! Tier 1 errors are demoted to "no text" rather than escalated: a scanned
//! document with a damaged text layer must still reach the recognition path.
//! Tier 2 errors are real errors; by that point there is no cheaper way to
//! get an answer.

use crate::ocr::OcrEngine;
use crate::preprocess;
use crate::progress::{RecognitionEvent, RecognitionProgress};
use crate::render::{PageRenderer, RenderError};

/// Extraction outcome. `Empty` is a legitimate result (a blank document)
/// and is distinct from the error cases, which carry an [`ExtractError`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Extraction {
    /// Text read directly from the document structure.
    Embedded(String),
    /// Text recovered by per-page optical recognition.
    Recognized { text: String, pages: usize },
    /// Both tiers ran and neither produced any text.
    Empty,
}

impl Extraction {
    /// The extracted text, empty for [`Extraction::Empty`].
    pub fn text(&self) -> &str {
        match self {
            Extraction::Embedded(text) => text,
            Extraction::Recognized { text, .. } => text,
            Extraction::Empty => "",
        }
    }
}

/// Extraction failure. Contained per document by the caller: the session
/// reports it and stays interactive.
#[derive(Debug)]
pub enum ExtractError {
    /// The document could not be paginated for recognition; it is malformed
    /// at the source and needs re-exporting.
    CorruptDocument(String),
    /// Any other recognition-stage failure.
    Recognition(String),
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::CorruptDocument(e) => write!(f, "document is corrupt: {}", e),
            ExtractError::Recognition(e) => write!(f, "recognition failed: {}", e),
        }
    }
}

impl std::error::Error for ExtractError {}

/// Tier 1: embedded text, page texts joined with a newline, blank pages
/// skipped. Returns `None` both when the document has no text layer and
/// when extraction itself fails; the distinction doesn't matter here,
/// either way the caller falls through to recognition.
pub fn embedded_text(bytes: &[u8]) -> Option<String> {
    let pages = match pdf_extract::extract_text_from_mem_by_pages(bytes) {
        Ok(pages) => pages,
        Err(e) => {
            log::debug!("embedded text extraction failed, treating as no text: {}", e);
            return None;
        }
    };
    let mut out = String::new();
    for page in &pages {
        if page.trim().is_empty() {
            continue;
        }
        out.push_str(page);
        out.push('\n');
    }
    if out.trim().is_empty() {
        None
    } else {
        Some(out)
    }
}

/// Run the full two-tier extraction over one document.
///
/// The byte slice is re-read from the start for tier 2; callers holding a
/// stream must buffer it first. Per-page progress goes to `progress` as a
/// side effect and never changes the result.
pub fn extract_document(
    bytes: &[u8],
    renderer: &dyn PageRenderer,
    engine: &dyn OcrEngine,
    languages: &str,
    progress: &dyn RecognitionProgress,
) -> Result<Extraction, ExtractError> {
    if let Some(text) = embedded_text(bytes) {
        return Ok(Extraction::Embedded(text));
    }

    log::debug!("no embedded text; falling back to recognition");
    progress.report(RecognitionEvent::Rendering);
    let pages = renderer.render_pages(bytes).map_err(|e| match e {
        RenderError::Corrupt(msg) => ExtractError::CorruptDocument(msg),
        RenderError::Backend(msg) => ExtractError::Recognition(msg),
    })?;

    let total = pages.len();
    let mut out = String::new();
    for (index, page) in pages.iter().enumerate() {
        let binary = preprocess::binarize(page);
        let text = engine
            .recognize(&binary, languages)
            .map_err(|e| ExtractError::Recognition(e.to_string()))?;
        if !text.trim().is_empty() {
            out.push_str(&text);
            if !text.ends_with('\n') {
                out.push('\n');
            }
        }
        progress.report(RecognitionEvent::Recognized {
            page: index + 1,
            total,
        });
    }

    if out.trim().is_empty() {
        Ok(Extraction::Empty)
    } else {
        Ok(Extraction::Recognized { text: out, pages: total })
    }
}
