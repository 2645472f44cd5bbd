//! Matching session orchestration.
//!
//! A [`MatchSession`] owns the collaborator set and the cached catalog
//! index, and turns one uploaded document into one [`MatchReport`]. Catalog
//! failures abort the call: there is nothing to match against, and the
//! caller is told distinguishably why. Document failures are contained in
//! the report: an empty match set plus a notice, and the session (cached
//! index included) stays usable for the next upload.
//!
//! The catalog is re-read and re-fingerprinted per document (cheap next to
//! recognition) and the index is rebuilt only when the fingerprint changes.
//! Invalidation is therefore owned here, by the session, not by any
//! process-wide cache.

use std::collections::BTreeSet;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::catalog::{self, CatalogError, CatalogIndex, CatalogRow};
use crate::config::Config;
use crate::extract::{extract_document, ExtractError, Extraction};
use crate::matcher::match_text;
use crate::ocr::OcrEngine;
use crate::progress::RecognitionProgress;
use crate::render::PageRenderer;

/// How the document's text was obtained, for presentation.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextOrigin {
    Embedded,
    Recognized,
    None,
}

/// A contained per-document failure, carried in the report instead of
/// raised. [`DocumentNotice::message`] is the user-facing wording.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum DocumentNotice {
    CorruptDocument(String),
    RecognitionFailed(String),
}

impl DocumentNotice {
    pub fn message(&self) -> String {
        match self {
            DocumentNotice::CorruptDocument(detail) => format!(
                "the document could not be paginated ({}); re-export or flatten it and upload again",
                detail
            ),
            DocumentNotice::RecognitionFailed(detail) => format!(
                "text recognition failed ({}); a cleaner scan may help",
                detail
            ),
        }
    }
}

/// Everything the presentation layer needs for one processed document.
#[derive(Clone, Debug, Serialize)]
pub struct MatchReport {
    /// Canonical matched codes, unique. BTreeSet keeps display order stable.
    pub matched: BTreeSet<String>,
    /// Catalog detail rows for the matched codes, in sheet order.
    pub rows: Vec<CatalogRow>,
    pub origin: TextOrigin,
    pub notice: Option<DocumentNotice>,
    pub elapsed_ms: u64,
    pub processed_at: DateTime<Utc>,
    /// One human-readable line summarizing outcome and timing.
    pub narrative: String,
}

/// One interactive matching session: a catalog plus the collaborators used
/// to read uploads against it.
pub struct MatchSession {
    config: Config,
    renderer: Box<dyn PageRenderer>,
    engine: Box<dyn OcrEngine>,
    progress: Box<dyn RecognitionProgress>,
    catalog: Option<CatalogIndex>,
}

impl MatchSession {
    /// Session with the default collaborators: pdfium rasterization,
    /// Tesseract recognition, TTY-aware progress.
    #[cfg(feature = "ocr")]
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let renderer = crate::render::PdfiumRenderer::new()?;
        Ok(Self::with_collaborators(
            config,
            Box::new(renderer),
            Box::new(crate::ocr::TesseractEngine),
            crate::progress::ProgressMode::default_for_tty().reporter(),
        ))
    }

    /// Session with injected collaborators. This is the seam tests and
    /// callers with their own recognition stack use.
    pub fn with_collaborators(
        config: Config,
        renderer: Box<dyn PageRenderer>,
        engine: Box<dyn OcrEngine>,
        progress: Box<dyn RecognitionProgress>,
    ) -> Self {
        MatchSession {
            config,
            renderer,
            engine,
            progress,
            catalog: None,
        }
    }

    /// The current catalog index, loading or rebuilding it if the catalog
    /// resource changed since the last document.
    pub fn catalog(&mut self) -> Result<&CatalogIndex, CatalogError> {
        let path = &self.config.catalog.path;
        let raw = std::fs::read(path)
            .map_err(|e| CatalogError::Load(format!("{}: {}", path.display(), e)))?;
        let fingerprint = catalog::fingerprint(&raw);

        let index = match self.catalog.take() {
            Some(index) if index.fingerprint() == fingerprint => index,
            _ => {
                let index = catalog::load_catalog(
                    &raw,
                    &self.config.catalog.code_column,
                    self.config.catalog.on_collision,
                )?;
                log::debug!(
                    "catalog index built: {} codes from {}",
                    index.len(),
                    path.display()
                );
                index
            }
        };
        Ok(self.catalog.insert(index))
    }

    /// Process one uploaded document end to end: extract, match, report.
    pub fn process_document(&mut self, bytes: &[u8]) -> Result<MatchReport, CatalogError> {
        let started = Instant::now();
        self.catalog()?;
        let index = match self.catalog.as_ref() {
            Some(index) => index,
            None => return Err(CatalogError::Load("catalog index unavailable".to_string())),
        };

        let extraction = extract_document(
            bytes,
            self.renderer.as_ref(),
            self.engine.as_ref(),
            &self.config.recognition.languages,
            self.progress.as_ref(),
        );

        let (matched, origin, notice, pages) = match extraction {
            Ok(Extraction::Embedded(text)) => {
                (match_text(&text, index), TextOrigin::Embedded, None, None)
            }
            Ok(Extraction::Recognized { text, pages }) => (
                match_text(&text, index),
                TextOrigin::Recognized,
                None,
                Some(pages),
            ),
            Ok(Extraction::Empty) => (BTreeSet::new(), TextOrigin::None, None, None),
            Err(e) => {
                log::warn!("document processing failed: {}", e);
                let notice = match e {
                    ExtractError::CorruptDocument(detail) => {
                        DocumentNotice::CorruptDocument(detail)
                    }
                    ExtractError::Recognition(detail) => DocumentNotice::RecognitionFailed(detail),
                };
                (BTreeSet::new(), TextOrigin::None, Some(notice), None)
            }
        };

        let rows = index.rows_for(&matched);
        let elapsed = started.elapsed();
        let narrative = narrative(
            matched.len(),
            index.len(),
            origin,
            notice.as_ref(),
            pages,
            elapsed.as_secs_f64(),
        );

        Ok(MatchReport {
            matched,
            rows,
            origin,
            notice,
            elapsed_ms: elapsed.as_millis() as u64,
            processed_at: Utc::now(),
            narrative,
        })
    }
}

fn narrative(
    matched: usize,
    catalog_size: usize,
    origin: TextOrigin,
    notice: Option<&DocumentNotice>,
    pages: Option<usize>,
    secs: f64,
) -> String {
    if let Some(notice) = notice {
        return notice.message();
    }
    match origin {
        TextOrigin::Embedded => format!(
            "matched {} of {} catalog codes in {:.2}s (embedded text)",
            matched, catalog_size, secs
        ),
        TextOrigin::Recognized => format!(
            "matched {} of {} catalog codes in {:.2}s (recognized {} pages)",
            matched,
            catalog_size,
            pages.unwrap_or(0),
            secs
        ),
        TextOrigin::None => format!(
            "no text could be extracted in {:.2}s; nothing to match",
            secs
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrative_covers_each_origin() {
        let embedded = narrative(2, 128, TextOrigin::Embedded, None, None, 0.4321);
        assert!(embedded.contains("2 of 128"));
        assert!(embedded.contains("embedded text"));

        let recognized = narrative(1, 10, TextOrigin::Recognized, None, Some(4), 12.0);
        assert!(recognized.contains("recognized 4 pages"));

        let none = narrative(0, 10, TextOrigin::None, None, None, 0.1);
        assert!(none.contains("nothing to match"));
    }

    #[test]
    fn narrative_prefers_the_notice() {
        let notice = DocumentNotice::CorruptDocument("no page tree".to_string());
        let line = narrative(0, 10, TextOrigin::None, Some(&notice), None, 0.2);
        assert!(line.contains("re-export or flatten"));
        assert!(line.contains("no page tree"));
    }
}
