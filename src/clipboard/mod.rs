pub mod backend;
pub mod extract;
pub mod system;

use anyhow::Result;
use std::fmt;

pub use backend::{ClipboardAccess, ClipboardBackend, ImagePayload};
pub use extract::ImageExtractor;
pub use system::SystemBackend;

/// Decoded clipboard image: interleaved RGB, 3 bytes per pixel
#[derive(Clone, PartialEq, Eq)]
pub struct PixelImage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl PixelImage {
    /// Create a pixel image from an interleaved RGB buffer
    /// The buffer length must be width * height * 3
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), width as usize * height as usize * 3);
        PixelImage {
            width,
            height,
            data,
        }
    }

    /// Size of the pixel buffer in bytes
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }
}

impl fmt::Debug for PixelImage {
    // Pixel buffers can be megabytes; never dump them into logs
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// Create a clipboard backend for the current platform
/// Returns error if no system clipboard is available (e.g. headless session)
pub fn create_backend() -> Result<Box<dyn ClipboardBackend>> {
    let backend = SystemBackend::new()?;
    log::info!("Using {} clipboard backend", backend.name());
    Ok(Box::new(backend))
}
