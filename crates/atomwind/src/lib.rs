//! atomwind - utility-class styling for native UI trees.
//!
//! This is the main umbrella crate that re-exports all public APIs.
//!
//! # Example
//!
//! ```
//! use atomwind::prelude::*;
//!
//! let store = atomwind::store_from_css(
//!     ".text-black { color: black } \
//!      @media (prefers-color-scheme: dark) { .dark\\:text-white { color: white } }",
//!     StoreConfig::default(),
//! )?;
//!
//! let mut binding = StyleBinding::new(store.clone());
//! let style = binding.use_sync("text-black dark:text-white", &LocalConditions::new());
//! assert_eq!(style.styles().len(), 1);
//!
//! store.toggle_color_scheme();
//! let style = binding.use_sync("text-black dark:text-white", &LocalConditions::new());
//! assert_eq!(style.styles().len(), 2);
//! # Ok::<(), atomwind::style::Error>(())
//! ```

use std::path::Path;
use std::sync::Arc;

pub use atomwind_core::*;

/// Atom compiler, store and resolution engine.
pub mod style {
    pub use atomwind_style::*;
}

/// Prelude module with commonly used types.
pub mod prelude {
    pub use atomwind_core::{ConnectionGuard, ConnectionId, Property, Signal};
    pub use atomwind_style::prelude::*;
}

use atomwind_core::logging::targets;
use atomwind_style::atom::AtomRecord;
use atomwind_style::store::{AtomStore, StoreConfig};

/// Compile `css` and load it into a new shared store.
pub fn store_from_css(css: &str, config: StoreConfig) -> atomwind_style::Result<Arc<AtomStore>> {
    let record = AtomRecord::from_css(css)?;
    tracing::info!(target: targets::CORE, atoms = record.len(), "compiled stylesheet");
    let store = Arc::new(AtomStore::with_config(config));
    store.replace(record);
    Ok(store)
}

/// Load a TOML store configuration and a CSS file into a new shared store.
pub fn store_from_files(
    css_path: impl AsRef<Path>,
    config_path: impl AsRef<Path>,
) -> atomwind_style::Result<Arc<AtomStore>> {
    let config = StoreConfig::from_file(config_path)?;
    let record = AtomRecord::from_css_file(css_path.as_ref())?;
    tracing::info!(
        target: targets::CORE,
        atoms = record.len(),
        "loaded stylesheet {}",
        css_path.as_ref().display()
    );
    let store = Arc::new(AtomStore::with_config(config));
    store.replace(record);
    Ok(store)
}
