use super::PixelImage;

/// Raw image payload pulled from the clipboard before decoding
#[derive(Debug, Clone)]
pub enum ImagePayload {
    /// Pixels already decoded by the OS clipboard layer
    Pixels(PixelImage),
    /// Platform-native encoded bytes (PNG, TIFF, ...)
    Encoded(Vec<u8>),
}

/// Scoped access to the clipboard for a single poll cycle
///
/// Probing and extraction assume the clipboard stays acquired until the
/// access value is dropped. Implementations cache reads so probing a format
/// and then extracting it touches the OS clipboard once.
pub trait ClipboardAccess {
    /// True if any textual representation is present
    fn has_text(&mut self) -> bool;

    /// True if a decoded bitmap or a recognized encoded image is present
    fn has_image(&mut self) -> bool;

    /// The textual payload, if present
    fn text(&mut self) -> Option<String>;

    /// The raw image payload, if present
    fn image(&mut self) -> Option<ImagePayload>;
}

/// Trait for clipboard backend abstraction
///
/// A backend hands out scoped access per poll cycle. Acquisition can fail
/// transiently when another process holds the clipboard; that cycle is
/// simply skipped and retried on the next tick.
pub trait ClipboardBackend: Send {
    /// Acquire the clipboard for one cycle; None means transient contention
    fn acquire(&mut self) -> Option<Box<dyn ClipboardAccess + '_>>;

    /// Get the backend name (for logging/debugging)
    fn name(&self) -> &'static str;
}
