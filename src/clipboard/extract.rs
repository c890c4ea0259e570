use image::{DynamicImage, ImageReader};
use std::io::Write;

use super::backend::ImagePayload;
use super::PixelImage;

/// One way of turning a raw clipboard payload into pixels
///
/// Strategies are independently fallible; the extractor walks an ordered
/// list and takes the first success. Decode failure is an expected outcome
/// (corrupt or unsupported payloads), never an error.
pub trait ImageDecodeStrategy: Send {
    /// Strategy name for logging
    fn name(&self) -> &'static str;

    /// Attempt to decode the payload; None if this strategy cannot
    fn decode(&self, payload: &ImagePayload) -> Option<PixelImage>;
}

/// Pass through pixels the OS clipboard layer already decoded
pub struct DirectPixels;

impl ImageDecodeStrategy for DirectPixels {
    fn name(&self) -> &'static str {
        "direct-pixels"
    }

    fn decode(&self, payload: &ImagePayload) -> Option<PixelImage> {
        match payload {
            ImagePayload::Pixels(image) => Some(image.clone()),
            ImagePayload::Encoded(_) => None,
        }
    }
}

/// Decode encoded bytes in memory, sniffing the format from content
pub struct MemoryDecode;

impl ImageDecodeStrategy for MemoryDecode {
    fn name(&self) -> &'static str {
        "memory-decode"
    }

    fn decode(&self, payload: &ImagePayload) -> Option<PixelImage> {
        let ImagePayload::Encoded(bytes) = payload else {
            return None;
        };

        match image::load_from_memory(bytes) {
            Ok(image) => Some(to_pixels(image)),
            Err(e) => {
                log::debug!("In-memory image decode failed: {}", e);
                None
            }
        }
    }
}

/// Decode encoded bytes through a temporary file
///
/// Some platform codecs only succeed when reading from a real file path.
/// Each attempt uses a unique temp file that is removed when the guard
/// drops, so overlapping decodes cannot race on a shared path.
pub struct TempFileDecode;

impl ImageDecodeStrategy for TempFileDecode {
    fn name(&self) -> &'static str {
        "temp-file-decode"
    }

    fn decode(&self, payload: &ImagePayload) -> Option<PixelImage> {
        let ImagePayload::Encoded(bytes) = payload else {
            return None;
        };

        let mut file = match tempfile::NamedTempFile::new() {
            Ok(file) => file,
            Err(e) => {
                log::warn!("Failed to create temp file for image decode: {}", e);
                return None;
            }
        };

        if let Err(e) = file.write_all(bytes) {
            log::warn!("Failed to write image bytes to {:?}: {}", file.path(), e);
            return None;
        }

        let reader = ImageReader::open(file.path())
            .and_then(|r| r.with_guessed_format())
            .ok()?;

        match reader.decode() {
            Ok(image) => Some(to_pixels(image)),
            Err(e) => {
                log::debug!("Temp-file image decode failed: {}", e);
                None
            }
        }
    }
}

/// Extracts pixel images from raw clipboard payloads via a fallback chain
pub struct ImageExtractor {
    strategies: Vec<Box<dyn ImageDecodeStrategy>>,
}

impl ImageExtractor {
    /// Create an extractor with the default strategy order:
    /// direct pixels, then in-memory decode, then temp-file decode
    pub fn new() -> Self {
        ImageExtractor {
            strategies: vec![
                Box::new(DirectPixels),
                Box::new(MemoryDecode),
                Box::new(TempFileDecode),
            ],
        }
    }

    /// Create an extractor with a custom strategy list
    pub fn with_strategies(strategies: Vec<Box<dyn ImageDecodeStrategy>>) -> Self {
        ImageExtractor { strategies }
    }

    /// Run the strategy chain; None only if every strategy fails
    pub fn extract(&self, payload: &ImagePayload) -> Option<PixelImage> {
        for strategy in &self.strategies {
            if let Some(image) = strategy.decode(payload) {
                log::debug!(
                    "Decoded clipboard image via {}: {} x {}",
                    strategy.name(),
                    image.width,
                    image.height
                );
                return Some(image);
            }
        }

        log::debug!("No decode strategy handled the clipboard image payload");
        None
    }
}

impl Default for ImageExtractor {
    fn default() -> Self {
        ImageExtractor::new()
    }
}

/// Convert a decoded image to the interleaved RGB layout used throughout
fn to_pixels(image: DynamicImage) -> PixelImage {
    let rgb = image.to_rgb8();
    let (width, height) = (rgb.width(), rgb.height());
    PixelImage::new(width, height, rgb.into_raw())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32, fill: u8) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([fill, fill, fill]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_direct_pixels_passthrough() {
        let image = PixelImage::new(2, 2, vec![0; 12]);
        let extractor = ImageExtractor::new();

        let result = extractor.extract(&ImagePayload::Pixels(image.clone()));
        assert_eq!(result, Some(image));
    }

    #[test]
    fn test_memory_decode_of_png_bytes() {
        let payload = ImagePayload::Encoded(png_bytes(3, 2, 42));
        let extractor = ImageExtractor::new();

        let result = extractor.extract(&payload).expect("PNG should decode");
        assert_eq!(result.width, 3);
        assert_eq!(result.height, 2);
        assert_eq!(result.data.len(), 3 * 2 * 3);
        assert!(result.data.iter().all(|&b| b == 42));
    }

    #[test]
    fn test_temp_file_decode_of_png_bytes() {
        let payload = ImagePayload::Encoded(png_bytes(4, 4, 7));

        let result = TempFileDecode.decode(&payload).expect("PNG should decode");
        assert_eq!(result.width, 4);
        assert_eq!(result.height, 4);
    }

    #[test]
    fn test_invalid_bytes_fail_every_strategy() {
        let payload = ImagePayload::Encoded(vec![0xde, 0xad, 0xbe, 0xef, 0x00]);
        let extractor = ImageExtractor::new();

        assert!(extractor.extract(&payload).is_none());
    }
}
