pub mod detect;
pub mod event;
pub mod fswatch;
pub mod processor;

pub use detect::{ChangeDetector, ImageSignature};
pub use event::{ChangeEvent, ImageCallback, TextCallback};
pub use fswatch::{DirectoryMonitor, FileChange};
pub use processor::{ClipboardProcessor, ProcessorHandle};
