use std::io::Cursor;

use crate::clipboard::PixelImage;

/// How many leading bytes of two equal-length encodings are compared
/// before images are declared identical
pub const PREFIX_COMPARE_LEN: usize = 1024;

/// Cached identity of the last accepted image
///
/// Holding the canonical PNG encoding alongside the dimensions keeps the
/// steady-state poll cheap: an unchanged clipboard never re-encodes the
/// previous image.
#[derive(Debug, Clone)]
pub struct ImageSignature {
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
}

impl ImageSignature {
    /// Encode an image to its canonical lossless form
    /// None if encoding fails, which callers treat as "no usable image"
    pub fn of(image: &PixelImage) -> Option<Self> {
        let Some(buffer) =
            image::RgbImage::from_raw(image.width, image.height, image.data.clone())
        else {
            log::error!(
                "Pixel buffer length {} does not match {} x {}",
                image.data.len(),
                image.width,
                image.height
            );
            return None;
        };

        let mut png = Vec::new();
        if let Err(e) = image::DynamicImage::ImageRgb8(buffer)
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        {
            log::error!("Failed to encode clipboard image for comparison: {}", e);
            return None;
        }

        Some(ImageSignature {
            width: image.width,
            height: image.height,
            png,
        })
    }
}

/// Decides whether freshly extracted content is genuinely new versus the
/// last observed state
///
/// Text uses exact equality. Images use a three-stage cheap-to-expensive
/// filter: dimensions, then canonical encoded length, then a bounded byte
/// prefix of the encodings. Two distinct images sharing all three are
/// classified as unchanged - an accepted cost/accuracy tradeoff, since a
/// pixel-exact compare on every poll tick would dominate steady-state cost.
pub struct ChangeDetector;

impl ChangeDetector {
    /// Any difference counts, including whitespace
    pub fn is_new_text(candidate: &str, last: Option<&str>) -> bool {
        last != Some(candidate)
    }

    /// Classify a candidate image against the last accepted signature
    ///
    /// Returns the candidate's own signature when it is new, so the caller
    /// can cache it without a second encode. The dimension check runs
    /// before any encoding so trivially-different images stay cheap.
    pub fn evaluate_image(
        candidate: &PixelImage,
        last: Option<&ImageSignature>,
    ) -> Option<ImageSignature> {
        let Some(previous) = last else {
            // No previous image recorded: always new
            return ImageSignature::of(candidate);
        };

        if previous.width != candidate.width || previous.height != candidate.height {
            return ImageSignature::of(candidate);
        }

        let signature = ImageSignature::of(candidate)?;

        if signature.png.len() != previous.png.len() {
            return Some(signature);
        }

        let prefix = PREFIX_COMPARE_LEN.min(signature.png.len());
        if signature.png[..prefix] != previous.png[..prefix] {
            return Some(signature);
        }

        None
    }

    /// Boolean view of `evaluate_image` for callers that do not cache
    pub fn is_new_image(candidate: &PixelImage, last: Option<&ImageSignature>) -> bool {
        Self::evaluate_image(candidate, last).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, fill: u8) -> PixelImage {
        PixelImage::new(
            width,
            height,
            vec![fill; width as usize * height as usize * 3],
        )
    }

    #[test]
    fn test_text_change_requires_inequality() {
        assert!(ChangeDetector::is_new_text("你好", None));
        assert!(ChangeDetector::is_new_text("你好", Some("谢谢")));
        assert!(!ChangeDetector::is_new_text("你好", Some("你好")));

        // Whitespace-only differences still count as new
        assert!(ChangeDetector::is_new_text("你好 ", Some("你好")));
    }

    #[test]
    fn test_first_image_is_always_new() {
        let image = solid(4, 4, 10);
        assert!(ChangeDetector::is_new_image(&image, None));
    }

    #[test]
    fn test_dimension_change_short_circuits() {
        // Same pixel count and identical content bytes, different shape
        let wide = solid(8, 2, 10);
        let tall = solid(2, 8, 10);

        let sig = ImageSignature::of(&wide).unwrap();
        assert!(ChangeDetector::is_new_image(&tall, Some(&sig)));

        let sig = ImageSignature::of(&tall).unwrap();
        assert!(ChangeDetector::is_new_image(&wide, Some(&sig)));
    }

    #[test]
    fn test_identical_image_is_unchanged() {
        let image = solid(16, 16, 128);
        let sig = ImageSignature::of(&image).unwrap();

        assert!(!ChangeDetector::is_new_image(&image.clone(), Some(&sig)));
    }

    #[test]
    fn test_same_dimensions_different_content_is_new() {
        let a = solid(16, 16, 0);
        let b = solid(16, 16, 255);

        let sig = ImageSignature::of(&a).unwrap();
        assert!(ChangeDetector::is_new_image(&b, Some(&sig)));
    }

    #[test]
    fn test_evaluate_returns_cacheable_signature() {
        let a = solid(4, 4, 1);
        let b = solid(4, 4, 2);

        let first = ChangeDetector::evaluate_image(&a, None).unwrap();
        let second = ChangeDetector::evaluate_image(&b, Some(&first)).unwrap();

        assert_eq!(second.width, 4);
        assert_eq!(second.height, 4);
        // The returned signature must describe the candidate, not the previous
        assert_eq!(second.png, ImageSignature::of(&b).unwrap().png);
    }
}
