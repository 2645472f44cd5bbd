//! Character recognition seam for the fallback tier.
//!
//! Recognition is best-effort by contract: the engine returns whatever text
//! it can read from a binarized page, never a guarantee of accuracy. The
//! default backend is Tesseract; the trait exists so tests (and callers with
//! their own recognition stack) can substitute one.

use image::GrayImage;

/// Recognition backend failure.
#[derive(Debug)]
pub struct OcrError(pub String);

impl std::fmt::Display for OcrError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "recognition backend error: {}", self.0)
    }
}

impl std::error::Error for OcrError {}

/// Best-effort text from one binarized page. `languages` is a backend hint
/// such as "eng" or "por+eng".
pub trait OcrEngine {
    fn recognize(&self, page: &GrayImage, languages: &str) -> Result<String, OcrError>;
}

#[cfg(feature = "ocr")]
mod tess {
    use super::{OcrEngine, OcrError};
    use image::codecs::png::PngEncoder;
    use image::{ExtendedColorType, GrayImage, ImageEncoder};
    use tesseract::Tesseract;

    /// Tesseract-backed [`OcrEngine`]. The page is handed over as an
    /// in-memory PNG; Tesseract is re-initialized per page, which keeps the
    /// engine stateless at the cost the interactive workload doesn't notice.
    pub struct TesseractEngine;

    impl OcrEngine for TesseractEngine {
        fn recognize(&self, page: &GrayImage, languages: &str) -> Result<String, OcrError> {
            let mut png = Vec::new();
            PngEncoder::new(&mut png)
                .write_image(
                    page.as_raw(),
                    page.width(),
                    page.height(),
                    ExtendedColorType::L8,
                )
                .map_err(|e| OcrError(e.to_string()))?;

            let tess =
                Tesseract::new(None, Some(languages)).map_err(|e| OcrError(e.to_string()))?;
            let mut tess = tess
                .set_image_from_mem(&png)
                .map_err(|e| OcrError(e.to_string()))?;
            let text = tess.get_text().map_err(|e| OcrError(e.to_string()))?;
            Ok(text)
        }
    }
}

#[cfg(feature = "ocr")]
pub use tess::TesseractEngine;
