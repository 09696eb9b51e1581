//! The atom store: current atoms, runtime state and change notification.

mod atom_store;
mod config;
mod state;

pub use atom_store::{AtomStore, Invalidation};
pub use config::{DEFAULT_CACHE_CAPACITY, DEFAULT_REM, StoreConfig, default_platform};
pub use state::{ColorScheme, Dimensions, RuntimeState, RuntimeStatePatch};
