use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::clipboard::{ClipboardBackend, ImageExtractor};

use super::detect::{ChangeDetector, ImageSignature};
use super::event::{ChangeEvent, ImageCallback, TextCallback};

/// How finely the poll sleep is sliced so `stop()` takes effect promptly
const STOP_CHECK_SLICE: Duration = Duration::from_millis(50);

/// The most recent accepted clipboard state, replaced wholesale on each
/// confirmed change. Text and image are mutually exclusive per poll.
enum LastObserved {
    None,
    Text(String),
    Image(ImageSignature),
}

/// Single-threaded poll engine: backend access, change detection, callback
/// dispatch and the last-observed state all live here, behind one mutex
struct Engine {
    backend: Box<dyn ClipboardBackend>,
    extractor: ImageExtractor,
    text_callback: Option<TextCallback>,
    image_callback: Option<ImageCallback>,
    last: LastObserved,
    last_timestamp: Option<DateTime<Utc>>,
}

impl Engine {
    /// One poll cycle. Returns the dispatched change, if any.
    ///
    /// The clipboard is held only for the duration of this call and is
    /// released on every exit path when the access guard drops. Formats are
    /// checked text-first with short-circuit, so at most one callback fires
    /// per cycle and never both.
    fn process(&mut self) -> Option<ChangeEvent> {
        let Some(mut access) = self.backend.acquire() else {
            // Transient contention: skip this cycle, retry next tick
            log::debug!("Clipboard busy, cycle skipped");
            return None;
        };

        if access.has_text() {
            // An empty clipboard string is normalized to "no text present",
            // so copying an empty string never dispatches an event and the
            // image path still gets a chance this cycle
            if let Some(text) = access.text().filter(|t| !t.is_empty()) {
                let last = match &self.last {
                    LastObserved::Text(t) => Some(t.as_str()),
                    _ => None,
                };
                if !ChangeDetector::is_new_text(&text, last) {
                    // Text present but unchanged: image path is not
                    // attempted in the same cycle
                    return None;
                }

                let timestamp = Self::next_timestamp(&mut self.last_timestamp);
                log::debug!("Clipboard text changed ({} bytes)", text.len());
                self.last = LastObserved::Text(text.clone());
                if let Some(callback) = self.text_callback.as_mut() {
                    callback(&text, timestamp);
                }
                return Some(ChangeEvent::Text { text, timestamp });
            }
        }

        if access.has_image() {
            if let Some(payload) = access.image() {
                let Some(image) = self.extractor.extract(&payload) else {
                    // Decode failure: format treated as absent this cycle
                    return None;
                };

                let last = match &self.last {
                    LastObserved::Image(signature) => Some(signature),
                    _ => None,
                };
                let signature = ChangeDetector::evaluate_image(&image, last)?;

                let timestamp = Self::next_timestamp(&mut self.last_timestamp);
                log::debug!(
                    "Clipboard image changed ({} x {})",
                    image.width,
                    image.height
                );
                self.last = LastObserved::Image(signature);
                if let Some(callback) = self.image_callback.as_mut() {
                    callback(&image, timestamp);
                }
                return Some(ChangeEvent::Image { image, timestamp });
            }
        }

        None
    }

    /// Capture timestamp, clamped so dispatch order never regresses even if
    /// the wall clock steps backwards
    ///
    /// Takes the field directly (not `&mut self`) so it can be called while
    /// the clipboard access guard still borrows `self.backend`.
    fn next_timestamp(last_timestamp: &mut Option<DateTime<Utc>>) -> DateTime<Utc> {
        let mut now = Utc::now();
        if let Some(previous) = *last_timestamp {
            if now < previous {
                now = previous;
            }
        }
        *last_timestamp = Some(now);
        now
    }
}

/// Cheap cloneable handle for controlling a running processor
///
/// `stop()` is a single atomic store, which makes it safe to call from
/// within a dispatched callback or from another thread.
#[derive(Clone)]
pub struct ProcessorHandle {
    running: Arc<AtomicBool>,
}

impl ProcessorHandle {
    /// Request the poll loop to stop; idempotent
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Whether monitoring is currently active
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Clipboard monitoring orchestrator
///
/// Lifecycle: `new` -> `initialize` -> `start`/`stop` (restartable) ->
/// drop. Polling runs on a background thread; all clipboard access, state
/// mutation and callback dispatch are serialized behind one mutex, so the
/// engine behaves as a single logical thread.
pub struct ClipboardProcessor {
    engine: Arc<Mutex<Engine>>,
    running: Arc<AtomicBool>,
    initialized: bool,
    started: bool,
    worker: Option<JoinHandle<()>>,
}

impl ClipboardProcessor {
    /// Create a processor over the given backend
    pub fn new(backend: Box<dyn ClipboardBackend>) -> Self {
        ClipboardProcessor {
            engine: Arc::new(Mutex::new(Engine {
                backend,
                extractor: ImageExtractor::new(),
                text_callback: None,
                image_callback: None,
                last: LastObserved::None,
                last_timestamp: None,
            })),
            running: Arc::new(AtomicBool::new(false)),
            initialized: false,
            started: false,
            worker: None,
        }
    }

    /// Store the callback slots and reset the last-observed state
    ///
    /// Idempotent while not yet started; replacing callbacks after `start`
    /// is not supported and returns false.
    pub fn initialize(
        &mut self,
        text_callback: Option<TextCallback>,
        image_callback: Option<ImageCallback>,
    ) -> bool {
        if self.started {
            log::warn!("ClipboardProcessor already started, callbacks not replaced");
            return false;
        }

        if let Ok(mut engine) = self.engine.lock() {
            engine.text_callback = text_callback;
            engine.image_callback = image_callback;
            engine.last = LastObserved::None;
            engine.last_timestamp = None;
        }
        self.initialized = true;

        log::debug!("ClipboardProcessor initialized");
        true
    }

    /// Start periodic polling
    ///
    /// Arms the poll thread, then performs one synchronous poll on the
    /// caller's thread so the first observable clipboard state is delivered
    /// without waiting a full interval. Returns false if not initialized,
    /// already running, or the poll thread cannot be spawned; a false
    /// return dispatches nothing and changes no state.
    pub fn start(&mut self, interval: Duration) -> bool {
        if !self.initialized {
            log::warn!("ClipboardProcessor not initialized before starting");
            return false;
        }
        if self.running.load(Ordering::SeqCst) {
            log::warn!("ClipboardProcessor already running");
            return false;
        }

        // Reap a previous poll thread before rearming
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }

        self.running.store(true, Ordering::SeqCst);

        let engine = Arc::clone(&self.engine);
        let running = Arc::clone(&self.running);

        let spawned = thread::Builder::new()
            .name("clipboard-poll".to_string())
            .spawn(move || {
                log::debug!("Clipboard poll thread started");
                while running.load(Ordering::SeqCst) {
                    let mut remaining = interval;
                    while running.load(Ordering::SeqCst) && remaining > Duration::ZERO {
                        let step = STOP_CHECK_SLICE.min(remaining);
                        thread::sleep(step);
                        remaining -= step;
                    }
                    if !running.load(Ordering::SeqCst) {
                        break;
                    }
                    if let Ok(mut engine) = engine.lock() {
                        let _ = engine.process();
                    }
                }
                log::debug!("Clipboard poll thread exiting");
            });

        match spawned {
            Ok(worker) => {
                self.worker = Some(worker);
                self.started = true;

                // Immediate first poll, on the caller's thread; the worker
                // sleeps a full interval before its first cycle
                self.process_clipboard();

                log::debug!("ClipboardProcessor started ({:?} interval)", interval);
                true
            }
            Err(e) => {
                // A failed start must leave the processor as it was: not
                // running, nothing dispatched, still re-initializable
                log::error!("Failed to spawn clipboard poll thread: {}", e);
                self.running.store(false, Ordering::SeqCst);
                false
            }
        }
    }

    /// Stop polling; idempotent and safe to call from within a callback
    pub fn stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            log::debug!("ClipboardProcessor stopped");
        }
    }

    /// Whether monitoring is currently active
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Handle for stopping the processor from callbacks or other threads
    pub fn handle(&self) -> ProcessorHandle {
        ProcessorHandle {
            running: Arc::clone(&self.running),
        }
    }

    /// Run one poll cycle now, returning the dispatched change if any
    ///
    /// Valid once initialized, whether or not the poll thread is running.
    /// Serialized with the poll thread through the engine mutex.
    pub fn poll_once(&self) -> Option<ChangeEvent> {
        if !self.initialized {
            return None;
        }
        match self.engine.lock() {
            Ok(mut engine) => engine.process(),
            Err(_) => None,
        }
    }

    /// Boolean view of `poll_once`: whether a change was dispatched
    pub fn process_clipboard(&self) -> bool {
        self.poll_once().is_some()
    }
}

impl Drop for ClipboardProcessor {
    fn drop(&mut self) {
        self.stop();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
