//! # partmatch
//!
//! Catalog-driven part code detection in uploaded documents.
//!
//! partmatch takes a reference catalog (an XLSX workbook with a code column)
//! and a free-form document, and answers one question: which catalog codes
//! appear in this document? Documents render the same part number in many
//! surface forms ("70415-202", "70415/202", "70415202"), so matching runs
//! over normalized keys while results always show the catalog's canonical
//! form.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌───────────────┐   ┌──────────────┐
//! │ XLSX catalog │──▶│ CatalogIndex   │   │  document    │
//! │ (zip+xml)    │   │ key → code    │   │  bytes       │
//! └──────────────┘   └──────┬────────┘   └──────┬───────┘
//!                           │                   ▼
//!                           │          ┌────────────────┐
//!                           │          │ Text Extractor │ tier 1: embedded
//!                           │          │                │ tier 2: render →
//!                           │          └──────┬─────────┘  binarize → OCR
//!                           ▼                 ▼
//!                      ┌─────────────────────────┐
//!                      │      Token Matcher      │
//!                      └───────────┬─────────────┘
//!                                  ▼
//!                           MatchReport (codes, rows,
//!                           notice, narrative, timing)
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use partmatch::{Config, MatchSession};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::for_catalog("base_de_dados.xlsx");
//! let mut session = MatchSession::new(config)?;
//!
//! let upload = std::fs::read("quote.pdf")?;
//! let report = session.process_document(&upload)?;
//! println!("{}", report.narrative);
//! for code in &report.matched {
//!     println!("  {}", code);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`catalog`] | XLSX catalog loading and the normalized-key index |
//! | [`normalize`] | The shared normalization and scrubbing rules |
//! | [`extract`] | Two-tier text extraction (embedded, then recognition) |
//! | [`render`] | Page rasterization seam (pdfium default) |
//! | [`preprocess`] | Adaptive binarization of page images |
//! | [`ocr`] | Recognition seam (Tesseract default) |
//! | [`matcher`] | Token matching against the index |
//! | [`progress`] | Per-page recognition progress reporting |
//! | [`session`] | Session orchestration and the presentation report |

pub mod catalog;
pub mod config;
pub mod extract;
pub mod matcher;
pub mod normalize;
pub mod ocr;
pub mod preprocess;
pub mod progress;
pub mod render;
pub mod session;

pub use catalog::{CatalogError, CatalogIndex, CatalogRow, CollisionPolicy};
pub use config::Config;
pub use extract::{ExtractError, Extraction};
pub use ocr::{OcrEngine, OcrError};
pub use progress::{ProgressMode, RecognitionEvent, RecognitionProgress};
pub use render::{PageRenderer, RenderError};
pub use session::{DocumentNotice, MatchReport, MatchSession, TextOrigin};

#[cfg(feature = "ocr")]
pub use ocr::TesseractEngine;
#[cfg(feature = "ocr")]
pub use render::PdfiumRenderer;
