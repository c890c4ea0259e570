//! Hansnap - clipboard watcher that OCRs and translates copied Chinese text
//!
//! This library exports the core modules for testing and potential reuse.

pub mod clipboard;
pub mod config;
pub mod logging;
pub mod monitor;
pub mod ocr;
pub mod store;
pub mod translate;
