use anyhow::{bail, Context, Result};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};

/// A file created, modified or removed inside the watched directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub path: PathBuf,
}

/// Watches one directory for changes using native OS notification
/// primitives (inotify/FSEvents/ReadDirectoryChangesW via notify)
///
/// Native callbacks arrive on the watcher's own thread; they are posted
/// into an internal channel so consumers drain changes from whatever
/// thread they own, never from the native notification context.
pub struct DirectoryMonitor {
    watcher: Option<RecommendedWatcher>,
    directory: Option<PathBuf>,
    tx: Sender<FileChange>,
    rx: Receiver<FileChange>,
}

impl DirectoryMonitor {
    /// Create an unarmed monitor
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        DirectoryMonitor {
            watcher: None,
            directory: None,
            tx,
            rx,
        }
    }

    /// Begin monitoring a directory
    ///
    /// An already-armed monitor is implicitly reset first. On failure the
    /// monitor stays unarmed; there is no retry until the next `init`.
    pub fn init(&mut self, directory: &Path) -> Result<()> {
        self.reset();

        if !directory.is_dir() {
            bail!("Directory does not exist: {:?}", directory);
        }

        let tx = self.tx.clone();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            match res {
                Ok(event) => {
                    if matches!(
                        event.kind,
                        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                    ) {
                        for path in event.paths {
                            let _ = tx.send(FileChange { path });
                        }
                    }
                }
                Err(e) => {
                    log::warn!("File watcher error: {}", e);
                }
            }
        })
        .context("Failed to create directory watcher")?;

        watcher
            .watch(directory, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch directory {:?}", directory))?;

        log::info!("Watching directory: {:?}", directory);
        self.watcher = Some(watcher);
        self.directory = Some(directory.to_path_buf());

        Ok(())
    }

    /// Stop monitoring and release the native watch
    pub fn reset(&mut self) {
        if self.watcher.take().is_some() {
            log::debug!("Directory watch released for {:?}", self.directory);
        }
        self.directory = None;
    }

    /// Whether a directory is currently being watched
    pub fn is_ok(&self) -> bool {
        self.watcher.is_some()
    }

    /// The directory being monitored, if armed
    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    /// Channel of pending change notifications
    pub fn events(&self) -> &Receiver<FileChange> {
        &self.rx
    }

    /// Drain one pending change without blocking
    pub fn try_next(&self) -> Option<FileChange> {
        self.rx.try_recv().ok()
    }
}

impl Default for DirectoryMonitor {
    fn default() -> Self {
        DirectoryMonitor::new()
    }
}
