//! Hot-reload support for compiled stylesheets.
//!
//! This module is only available with the `hot-reload` feature.

mod watcher;

pub use watcher::{ChangeKind, SheetChangeEvent, SheetWatcher};
