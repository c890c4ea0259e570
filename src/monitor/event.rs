use chrono::{DateTime, Utc};

use crate::clipboard::PixelImage;

/// A confirmed, non-duplicate clipboard update
///
/// Constructed transiently per accepted change and handed to exactly one
/// callback; the monitor does not retain it after dispatch.
#[derive(Debug, Clone)]
pub enum ChangeEvent {
    Text {
        text: String,
        timestamp: DateTime<Utc>,
    },
    Image {
        image: PixelImage,
        timestamp: DateTime<Utc>,
    },
}

impl ChangeEvent {
    /// Capture timestamp of this change
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            ChangeEvent::Text { timestamp, .. } => *timestamp,
            ChangeEvent::Image { timestamp, .. } => *timestamp,
        }
    }
}

/// Subscriber slot for text changes
pub type TextCallback = Box<dyn FnMut(&str, DateTime<Utc>) + Send>;

/// Subscriber slot for image changes
pub type ImageCallback = Box<dyn FnMut(&PixelImage, DateTime<Utc>) + Send>;
