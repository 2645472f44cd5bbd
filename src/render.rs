//! Page rasterization seam for the recognition fallback.
//!
//! The extractor only needs "document bytes in, ordered page images out".
//! The default implementation rasterizes through pdfium; anything else that
//! can paginate an upload (a print spooler, a test stub) can stand in behind
//! [`PageRenderer`].

use image::DynamicImage;

/// Rasterization failure, split so the extractor can tell a broken document
/// from a broken backend.
#[derive(Debug)]
pub enum RenderError {
    /// The page count could not be determined: the document itself is
    /// malformed. Surfaced to the user as "re-export and retry".
    Corrupt(String),
    /// Any other rasterization failure.
    Backend(String),
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::Corrupt(e) => write!(f, "page count could not be determined: {}", e),
            RenderError::Backend(e) => write!(f, "page rendering failed: {}", e),
        }
    }
}

impl std::error::Error for RenderError {}

/// Converts document bytes into an ordered sequence of page images.
pub trait PageRenderer {
    fn render_pages(&self, bytes: &[u8]) -> Result<Vec<DynamicImage>, RenderError>;
}

#[cfg(feature = "ocr")]
mod pdfium {
    use super::{PageRenderer, RenderError};
    use image::DynamicImage;
    use pdfium_render::prelude::*;

    /// Raster width for recognition input; roughly 300 DPI on A4. Wider
    /// buys nothing from the recognizer and costs linearly in memory.
    const TARGET_WIDTH: i32 = 2480;

    /// pdfium-backed [`PageRenderer`]. Binds the platform library once at
    /// construction; rendering is sequential per page.
    pub struct PdfiumRenderer {
        pdfium: Pdfium,
    }

    impl PdfiumRenderer {
        /// Bind pdfium from the executable's directory first, then the
        /// system library path.
        pub fn new() -> Result<Self, RenderError> {
            let bindings = Pdfium::bind_to_library(
                Pdfium::pdfium_platform_library_name_at_path("./"),
            )
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| RenderError::Backend(e.to_string()))?;
            Ok(PdfiumRenderer {
                pdfium: Pdfium::new(bindings),
            })
        }
    }

    impl PageRenderer for PdfiumRenderer {
        fn render_pages(&self, bytes: &[u8]) -> Result<Vec<DynamicImage>, RenderError> {
            // Load failure means pdfium cannot even paginate the document:
            // that is the corrupt-document signal, not a backend fault.
            let document = self
                .pdfium
                .load_pdf_from_byte_slice(bytes, None)
                .map_err(|e| RenderError::Corrupt(e.to_string()))?;
            let config = PdfRenderConfig::new().set_target_width(TARGET_WIDTH);
            let mut pages = Vec::with_capacity(document.pages().len() as usize);
            for page in document.pages().iter() {
                let bitmap = page
                    .render_with_config(&config)
                    .map_err(|e| RenderError::Backend(e.to_string()))?;
                pages.push(bitmap.as_image());
            }
            Ok(pages)
        }
    }
}

#[cfg(feature = "ocr")]
pub use pdfium::PdfiumRenderer;
