//! OCR collaborator: turns a clipboard bitmap into recognized text.
//!
//! The engine is consumed as a black box behind [`TextRecognizer`]; the
//! provided implementation shells out to the `tesseract` binary with the
//! configured language packs.

use anyhow::{bail, Context, Result};
use image::imageops::FilterType;
use std::io::Cursor;
use std::process::Command;

use crate::clipboard::PixelImage;

/// Images above this dimension on either edge are downscaled before
/// recognition; very large screenshots can crash or stall the engine
pub const MAX_OCR_DIMENSION: u32 = 2000;

/// Black-box "bitmap in, recognized text out" interface
///
/// Implementations may take seconds. They return an empty string when no
/// text is found and must never panic on malformed input.
pub trait TextRecognizer: Send {
    fn recognize(&self, image: &PixelImage) -> String;
}

/// Recognizer using the tesseract command-line tool
/// Requires tesseract and the configured language packs to be installed
pub struct TesseractCli {
    language: String,
}

impl TesseractCli {
    /// Create a recognizer for the given tesseract language spec
    /// (e.g. "chi_sim+chi_tra")
    pub fn new(language: &str) -> Result<Self> {
        // Verify tesseract is available
        Command::new("tesseract")
            .arg("--version")
            .output()
            .context("tesseract not found. Install the tesseract-ocr package")?;

        log::debug!("TesseractCli initialized for language '{}'", language);
        Ok(TesseractCli {
            language: language.to_string(),
        })
    }

    fn run(&self, image: &PixelImage) -> Result<String> {
        let bounded = bound_dimensions(image);

        // tesseract reads from a real file path; use a unique temp file
        // that is removed when the guard drops
        let file = tempfile::Builder::new()
            .suffix(".png")
            .tempfile()
            .context("Failed to create temp file for OCR")?;

        let mut png = Vec::new();
        bounded
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .context("Failed to encode image for OCR")?;
        std::fs::write(file.path(), &png)
            .with_context(|| format!("Failed to write OCR input {:?}", file.path()))?;

        let output = Command::new("tesseract")
            .arg(file.path())
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .arg("--psm")
            .arg("3")
            .output()
            .context("Failed to run tesseract")?;

        if !output.status.success() {
            bail!(
                "tesseract failed with status {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl TextRecognizer for TesseractCli {
    fn recognize(&self, image: &PixelImage) -> String {
        match self.run(image) {
            Ok(text) => {
                log::debug!("OCR recognized {} bytes of text", text.len());
                text
            }
            Err(e) => {
                log::warn!("OCR failed: {:#}", e);
                String::new()
            }
        }
    }
}

/// Convert to a dynamic image, downscaling above `MAX_OCR_DIMENSION`
/// while maintaining the aspect ratio
fn bound_dimensions(image: &PixelImage) -> image::DynamicImage {
    let buffer = image::RgbImage::from_raw(image.width, image.height, image.data.clone())
        .unwrap_or_else(|| image::RgbImage::new(1, 1));
    let dynamic = image::DynamicImage::ImageRgb8(buffer);

    if image.width <= MAX_OCR_DIMENSION && image.height <= MAX_OCR_DIMENSION {
        return dynamic;
    }

    log::debug!(
        "Downscaling {} x {} image for OCR",
        image.width,
        image.height
    );
    dynamic.resize(MAX_OCR_DIMENSION, MAX_OCR_DIMENSION, FilterType::Lanczos3)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_image_is_not_resized() {
        let image = PixelImage::new(100, 50, vec![0; 100 * 50 * 3]);
        let bounded = bound_dimensions(&image);
        assert_eq!(bounded.width(), 100);
        assert_eq!(bounded.height(), 50);
    }

    #[test]
    fn test_oversized_image_is_bounded_with_aspect_ratio() {
        let image = PixelImage::new(4000, 1000, vec![0; 4000 * 1000 * 3]);
        let bounded = bound_dimensions(&image);
        assert_eq!(bounded.width(), 2000);
        assert_eq!(bounded.height(), 500);
    }

    #[test]
    fn test_malformed_buffer_does_not_panic() {
        // Buffer length disagrees with the claimed dimensions
        let image = PixelImage {
            width: 10,
            height: 10,
            data: vec![0; 5],
        };
        let bounded = bound_dimensions(&image);
        assert_eq!(bounded.width(), 1);
        assert_eq!(bounded.height(), 1);
    }
}
