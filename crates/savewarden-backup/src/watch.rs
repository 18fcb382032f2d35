//! File-system watching for the live autosave directory.
//!
//! The OS watching mechanism sits behind the small [`SaveWatcher`] trait so
//! the ingest loop can be driven by a plain channel in tests without touching
//! the real filesystem.

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use savewarden_core::{Error, Result};
use tokio::sync::mpsc;
use tracing::warn;

/// A file-creation event observed in the watched directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateEvent {
    pub path: Utf8PathBuf,
}

/// Source of file-creation events for the ingest loop.
#[async_trait]
pub trait SaveWatcher: Send {
    /// Waits for the next creation event. `None` means the source is closed.
    async fn next_event(&mut self) -> Option<CreateEvent>;
}

/// Any channel receiver of [`CreateEvent`]s is a watcher; tests drive the
/// ingest loop through this.
#[async_trait]
impl SaveWatcher for mpsc::UnboundedReceiver<CreateEvent> {
    async fn next_event(&mut self) -> Option<CreateEvent> {
        self.recv().await
    }
}

/// Real watcher backed by the platform notification API.
///
/// Dropping it releases the OS watch handle.
pub struct FsWatcher {
    rx: mpsc::UnboundedReceiver<CreateEvent>,
    _watcher: RecommendedWatcher,
}

impl FsWatcher {
    /// Starts watching `dir` (non-recursively) for file creation.
    pub fn new(dir: &Utf8Path) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            match res {
                Ok(event) if matches!(event.kind, EventKind::Create(_)) => {
                    for path in event.paths {
                        match Utf8PathBuf::from_path_buf(path) {
                            Ok(path) => {
                                let _ = tx.send(CreateEvent { path });
                            }
                            Err(path) => {
                                warn!("ignoring non-UTF-8 save path: {}", path.display())
                            }
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => warn!("save watcher error: {e}"),
            }
        })
        .map_err(watch_error)?;

        watcher
            .watch(dir.as_std_path(), RecursiveMode::NonRecursive)
            .map_err(watch_error)?;

        Ok(Self { rx, _watcher: watcher })
    }
}

#[async_trait]
impl SaveWatcher for FsWatcher {
    async fn next_event(&mut self) -> Option<CreateEvent> {
        self.rx.recv().await
    }
}

fn watch_error(e: notify::Error) -> Error {
    Error::Io(std::io::Error::other(format!("file watcher: {e}")))
}
