//! File watching for stylesheet hot-reload.

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use notify_debouncer_mini::{DebouncedEventKind, Debouncer, new_debouncer};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::time::Duration;

use atomwind_core::logging::targets;

use crate::atom::AtomRecord;
use crate::store::AtomStore;
use crate::{Error, Result};

/// Event indicating a watched stylesheet changed.
#[derive(Debug, Clone)]
pub struct SheetChangeEvent {
    /// Path to the changed file.
    pub path: PathBuf,
    /// Type of change.
    pub kind: ChangeKind,
}

/// Type of file change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// File was modified or created.
    Modified,
    /// File was removed.
    Removed,
}

/// Watches the CSS files an [`AtomStore`] is compiled from.
///
/// # Example
///
/// ```ignore
/// let mut watcher = SheetWatcher::new()?;
/// watcher.watch("styles/tailwind.css")?;
///
/// // In your event loop:
/// let changes = watcher.poll();
/// if !changes.is_empty() {
///     watcher.apply_changes(&store, &changes)?;
/// }
/// ```
pub struct SheetWatcher {
    debouncer: Debouncer<RecommendedWatcher>,
    rx: Receiver<std::result::Result<Vec<notify_debouncer_mini::DebouncedEvent>, notify::Error>>,
    watched_paths: BTreeSet<PathBuf>,
}

impl SheetWatcher {
    /// Create a new watcher.
    pub fn new() -> Result<Self> {
        let (tx, rx) = mpsc::channel();

        let debouncer = new_debouncer(Duration::from_millis(100), tx)
            .map_err(|e| Error::HotReload(e.to_string()))?;

        Ok(Self {
            debouncer,
            rx,
            watched_paths: BTreeSet::new(),
        })
    }

    /// Start watching a stylesheet file.
    pub fn watch(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path
            .as_ref()
            .canonicalize()
            .map_err(|e| Error::io(path.as_ref(), e))?;

        if !self.watched_paths.contains(&path) {
            self.debouncer
                .watcher()
                .watch(&path, RecursiveMode::NonRecursive)
                .map_err(|e| Error::HotReload(e.to_string()))?;

            tracing::info!(target: targets::HOT_RELOAD, "watching stylesheet: {}", path.display());
            self.watched_paths.insert(path);
        }

        Ok(())
    }

    /// Stop watching a stylesheet file.
    pub fn unwatch(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let Ok(path) = path.as_ref().canonicalize() else {
            return Ok(());
        };

        if self.watched_paths.remove(&path) {
            let _ = self.debouncer.watcher().unwatch(&path);
            tracing::info!(target: targets::HOT_RELOAD, "stopped watching stylesheet: {}", path.display());
        }

        Ok(())
    }

    /// Drain pending change events for watched files, one per path.
    pub fn poll(&mut self) -> Vec<SheetChangeEvent> {
        let mut changes = vec![];

        loop {
            match self.rx.try_recv() {
                Ok(Ok(events)) => {
                    for event in events {
                        if event.kind != DebouncedEventKind::Any || !self.watched_paths.contains(&event.path) {
                            continue;
                        }
                        let kind = if event.path.exists() {
                            ChangeKind::Modified
                        } else {
                            ChangeKind::Removed
                        };
                        changes.push(SheetChangeEvent {
                            path: event.path,
                            kind,
                        });
                    }
                }
                Ok(Err(e)) => {
                    tracing::warn!(target: targets::HOT_RELOAD, "file watcher error: {}", e);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    tracing::error!(target: targets::HOT_RELOAD, "file watcher disconnected");
                    break;
                }
            }
        }

        changes.sort_by(|a, b| a.path.cmp(&b.path));
        changes.dedup_by(|a, b| a.path == b.path);

        changes
    }

    /// Recompile every watched file and swap the result into `store`.
    ///
    /// Files are merged in path order; a class defined in several files
    /// takes the later definition. Removed files are skipped. When any file
    /// fails to compile the store keeps its current record and the error is
    /// returned.
    pub fn apply_changes(&self, store: &AtomStore, changes: &[SheetChangeEvent]) -> Result<()> {
        if changes.is_empty() {
            return Ok(());
        }

        let record = self.compile().inspect_err(|e| {
            tracing::error!(target: targets::HOT_RELOAD, "failed to reload stylesheets: {}", e);
        })?;

        tracing::info!(
            target: targets::HOT_RELOAD,
            "reloaded {} stylesheet(s) ({} atoms)",
            self.watched_paths.len(),
            record.len()
        );
        store.replace(record);
        Ok(())
    }

    fn compile(&self) -> Result<AtomRecord> {
        let mut merged = AtomRecord::new();
        for path in &self.watched_paths {
            if !path.exists() {
                tracing::info!(target: targets::HOT_RELOAD, "stylesheet removed: {}", path.display());
                continue;
            }
            for (name, atom) in AtomRecord::from_css_file(path)?.iter() {
                merged.insert(name, atom.clone());
            }
        }
        Ok(merged)
    }

    /// Get the number of watched files.
    pub fn watched_count(&self) -> usize {
        self.watched_paths.len()
    }

    /// Get the watched paths.
    pub fn watched_paths(&self) -> impl Iterator<Item = &Path> {
        self.watched_paths.iter().map(|p| p.as_path())
    }
}
