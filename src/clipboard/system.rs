use anyhow::{Context, Result};
use arboard::Clipboard;

use super::backend::{ClipboardAccess, ClipboardBackend, ImagePayload};
use super::PixelImage;

/// System clipboard backend built on arboard
/// Covers X11/Wayland, Windows and macOS through one API
pub struct SystemBackend {
    clipboard: Clipboard,
}

impl SystemBackend {
    /// Create a new system clipboard backend
    pub fn new() -> Result<Self> {
        let clipboard =
            Clipboard::new().context("Failed to open system clipboard. Is a display available?")?;

        log::debug!("SystemBackend initialized successfully");
        Ok(SystemBackend { clipboard })
    }
}

impl ClipboardBackend for SystemBackend {
    fn acquire(&mut self) -> Option<Box<dyn ClipboardAccess + '_>> {
        // arboard has no explicit open/close; the text read doubles as the
        // acquisition probe so contention is detected up front
        let text = match self.clipboard.get_text() {
            Ok(text) => Some(text),
            Err(arboard::Error::ContentNotAvailable) => None,
            Err(arboard::Error::ClipboardOccupied) => {
                log::debug!("Clipboard held by another process, skipping cycle");
                return None;
            }
            Err(e) => {
                log::debug!("Clipboard text read failed: {}", e);
                None
            }
        };

        Some(Box::new(SystemAccess {
            clipboard: &mut self.clipboard,
            text,
            image: None,
            image_probed: false,
        }))
    }

    fn name(&self) -> &'static str {
        "system"
    }
}

/// Per-cycle clipboard view; reads are cached so probe + extract touch the
/// OS clipboard once per format
struct SystemAccess<'a> {
    clipboard: &'a mut Clipboard,
    text: Option<String>,
    image: Option<ImagePayload>,
    image_probed: bool,
}

impl SystemAccess<'_> {
    fn probe_image(&mut self) {
        if self.image_probed {
            return;
        }
        self.image_probed = true;

        match self.clipboard.get_image() {
            Ok(data) => {
                let pixels = rgba_to_rgb(&data.bytes, data.width, data.height);
                self.image = Some(ImagePayload::Pixels(PixelImage::new(
                    data.width as u32,
                    data.height as u32,
                    pixels,
                )));
            }
            Err(arboard::Error::ContentNotAvailable) => {}
            Err(e) => {
                // Treated as format-absent for this cycle, retried next tick
                log::debug!("Clipboard image read failed: {}", e);
            }
        }
    }
}

impl ClipboardAccess for SystemAccess<'_> {
    fn has_text(&mut self) -> bool {
        self.text.is_some()
    }

    fn has_image(&mut self) -> bool {
        self.probe_image();
        self.image.is_some()
    }

    fn text(&mut self) -> Option<String> {
        self.text.clone()
    }

    fn image(&mut self) -> Option<ImagePayload> {
        self.probe_image();
        self.image.clone()
    }
}

/// Drop the alpha channel from an interleaved RGBA buffer
fn rgba_to_rgb(bytes: &[u8], width: usize, height: usize) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(width * height * 3);
    for pixel in bytes.chunks_exact(4) {
        rgb.extend_from_slice(&pixel[..3]);
    }
    rgb
}
