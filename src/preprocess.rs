//! Page image preparation for recognition.
//!
//! Scanned uploads arrive with uneven illumination: shadows along a spine,
//! gradient lighting from a phone camera. A single global threshold wipes out
//! whole regions of those pages, so each pixel is compared against the mean
//! of its local window instead. Nothing else is done here: no deskew, no
//! denoise. Recognition copes with the rest once the ink is cleanly
//! separated from the paper.

use image::{DynamicImage, GrayImage, Luma};
use imageproc::filter::box_filter;

/// Box-filter radius for the local mean; the window is a (2r+1)² square.
const WINDOW_RADIUS: u32 = 12;

/// Subtracted from the local mean before comparison, so flat gray areas
/// binarize to background instead of speckle.
const MEAN_OFFSET: u8 = 10;

/// Grayscale then binarize: pixels brighter than their local mean (less the
/// offset) become white, everything else black.
pub fn binarize(page: &DynamicImage) -> GrayImage {
    let gray = page.to_luma8();
    let means = box_filter(&gray, WINDOW_RADIUS, WINDOW_RADIUS);
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let pixel = gray.get_pixel(x, y)[0];
        let mean = means.get_pixel(x, y)[0];
        if pixel > mean.saturating_sub(MEAN_OFFSET) {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    #[test]
    fn output_is_two_level() {
        let page = DynamicImage::ImageRgb8(RgbImage::from_fn(64, 64, |x, _| {
            image::Rgb([(x * 3) as u8, (x * 3) as u8, (x * 3) as u8])
        }));
        let binary = binarize(&page);
        assert!(binary.pixels().all(|p| p[0] == 0 || p[0] == 255));
    }

    #[test]
    fn dark_mark_survives_gradient_background() {
        // Background brightness ramps 100..228 across the page; a dark
        // square sits in the bright half. Global thresholding at any single
        // level would lose either the mark or half the background.
        let mut img = GrayImage::from_fn(128, 128, |x, _| Luma([100 + x as u8]));
        for y in 60..68 {
            for x in 100..108 {
                img.put_pixel(x, y, Luma([20]));
            }
        }
        let binary = binarize(&DynamicImage::ImageLuma8(img));
        // The mark binarizes to ink...
        assert_eq!(binary.get_pixel(104, 64)[0], 0);
        // ...while both the dim and the bright background stay paper.
        assert_eq!(binary.get_pixel(10, 10)[0], 255);
        assert_eq!(binary.get_pixel(120, 120)[0], 255);
    }

    #[test]
    fn uniform_pages_do_not_speckle() {
        let white = DynamicImage::ImageLuma8(GrayImage::from_pixel(32, 32, Luma([255])));
        assert!(binarize(&white).pixels().all(|p| p[0] == 255));
        let black = DynamicImage::ImageLuma8(GrayImage::from_pixel(32, 32, Luma([0])));
        assert!(binarize(&black).pixels().all(|p| p[0] == 0));
    }
}
