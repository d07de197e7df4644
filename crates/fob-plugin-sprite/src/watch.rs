//! Icon directory watcher for development sessions.
//!
//! Watches every input base directory recursively and forwards relevant
//! changes through a bounded channel. Events are debounced on the trailing
//! edge: a path is forwarded once it has been quiet for the debounce window,
//! carrying its latest change, so a `Create` immediately followed by the
//! `Modify` that fills the file yields one event after the write settles.

use indexmap::IndexMap;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::error::Result;

/// Default debounce window for repeated events on one path
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(50);

const CHANNEL_CAPACITY: usize = 100;

/// File change event type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileChange {
    Modified(PathBuf),
    Created(PathBuf),
    Removed(PathBuf),
}

impl FileChange {
    /// Get the path affected by this change.
    pub fn path(&self) -> &Path {
        match self {
            FileChange::Modified(p) | FileChange::Created(p) | FileChange::Removed(p) => p,
        }
    }

    fn from_event(kind: &EventKind, path: &Path) -> Option<Self> {
        match kind {
            EventKind::Create(_) => Some(FileChange::Created(path.to_path_buf())),
            EventKind::Modify(_) => Some(FileChange::Modified(path.to_path_buf())),
            EventKind::Remove(_) => Some(FileChange::Removed(path.to_path_buf())),
            _ => None,
        }
    }
}

/// Trailing-edge debouncer keyed by path
///
/// Every push replaces the path's pending change and restarts its quiet
/// period. A change becomes due once no newer event arrived for `window`.
#[derive(Debug)]
pub(crate) struct Debouncer {
    window: Duration,
    pending: IndexMap<PathBuf, (FileChange, Instant)>,
}

impl Debouncer {
    pub(crate) fn new(window: Duration) -> Self {
        Self {
            window,
            pending: IndexMap::new(),
        }
    }

    pub(crate) fn push(&mut self, change: FileChange, now: Instant) {
        let path = change.path().to_path_buf();
        self.pending.shift_remove(&path);
        self.pending.insert(path, (change, now));
    }

    /// When the earliest pending change becomes due
    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().map(|(_, at)| *at + self.window).min()
    }

    /// Remove and return every change quiet for at least the window
    pub(crate) fn take_due(&mut self, now: Instant) -> Vec<FileChange> {
        let window = self.window;
        let mut due = Vec::new();
        self.pending.retain(|_, (change, at)| {
            if now.duration_since(*at) >= window {
                due.push(change.clone());
                false
            } else {
                true
            }
        });
        due
    }
}

/// Debounce raw watcher events into `tx` until either side closes
async fn debounce_loop(
    mut raw: mpsc::UnboundedReceiver<FileChange>,
    tx: mpsc::Sender<FileChange>,
    window: Duration,
) {
    let mut debouncer = Debouncer::new(window);

    loop {
        let deadline = debouncer.next_deadline();
        tokio::select! {
            change = raw.recv() => match change {
                Some(change) => debouncer.push(change, Instant::now()),
                None => break,
            },
            _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                for change in debouncer.take_due(Instant::now()) {
                    // Waits for room instead of dropping, so the last change always arrives
                    if tx.send(change).await.is_err() {
                        return;
                    }
                }
            }
        }
    }
}

/// Recursive watcher over a set of directories
///
/// Dropping it stops the underlying notify watcher and the debounce task,
/// which closes the channel.
pub struct SpriteWatcher {
    _watcher: RecommendedWatcher,
    debounce_task: JoinHandle<()>,
    roots: Vec<PathBuf>,
}

impl std::fmt::Debug for SpriteWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpriteWatcher")
            .field("roots", &self.roots)
            .finish_non_exhaustive()
    }
}

impl SpriteWatcher {
    /// Start watching `roots`. Directories that do not exist are skipped.
    ///
    /// Must be called within a tokio runtime; the debounce task is spawned
    /// on it.
    pub fn new(
        roots: &[PathBuf],
        debounce: Duration,
    ) -> Result<(Self, mpsc::Receiver<FileChange>)> {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (raw_tx, raw_rx) = mpsc::unbounded_channel();

        let mut watched: Vec<PathBuf> = roots.iter().filter(|r| r.is_dir()).cloned().collect();
        watched.sort();
        watched.dedup();
        // A root nested in another root is already covered recursively
        let watched: Vec<PathBuf> = watched
            .iter()
            .filter(|r| !watched.iter().any(|o| o != *r && r.starts_with(o)))
            .cloned()
            .collect();

        let filter_roots = watched.clone();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    tracing::warn!("[fob-sprite] Watch error: {}", e);
                    return;
                }
            };

            for path in &event.paths {
                if should_ignore(path, &filter_roots) {
                    continue;
                }
                if let Some(change) = FileChange::from_event(&event.kind, path) {
                    let _ = raw_tx.send(change);
                }
            }
        })?;

        for root in &watched {
            watcher.watch(root, RecursiveMode::Recursive)?;
            tracing::debug!("[fob-sprite] Watching {}", root.display());
        }

        let debounce_task = tokio::spawn(debounce_loop(raw_rx, tx, debounce));

        Ok((
            Self {
                _watcher: watcher,
                debounce_task,
                roots: watched,
            },
            rx,
        ))
    }

    /// Directories actually being watched
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }
}

impl Drop for SpriteWatcher {
    fn drop(&mut self) {
        self.debounce_task.abort();
    }
}

/// Paths outside every root and hidden entries are ignored
fn should_ignore(path: &Path, roots: &[PathBuf]) -> bool {
    let Some(relative) = roots.iter().find_map(|root| path.strip_prefix(root).ok()) else {
        return true;
    };

    relative.components().any(|component| {
        component
            .as_os_str()
            .to_str()
            .is_some_and(|name| name.starts_with('.') && name != "." && name != "..")
    })
}
