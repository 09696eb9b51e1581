//! Utility-class style compiler and reactive resolution engine.
//!
//! This crate turns the CSS a utility-class framework generates into
//! **atoms** (one per class name) and resolves class lists against live
//! runtime state:
//!
//! - **Expressions**: declaration values parsed into literal, unit-call,
//!   inbuilt-call and `var()` trees
//! - **CSS front end**: rule blocks with nested `@media` scopes, pseudo-class
//!   selectors and child-class markers
//! - **Extraction**: declaration blocks grouped into an [`AtomRecord`] with
//!   conditions, rule groups, topics and child classes
//! - **Store**: current atoms plus runtime state (color scheme, dimensions,
//!   platform, variables) with topic-scoped change notification
//! - **Resolution**: memoized, referentially stable style output
//! - **Hot Reload**: recompile watched CSS files during development
//!
//! # Example
//!
//! ```
//! use atomwind_style::prelude::*;
//!
//! let store = AtomStore::new();
//! store.replace(AtomRecord::from_css(r#"
//!     .container { width: 100% }
//!     @media (min-width: 640px) { .container { max-width: 640px } }
//! "#)?);
//!
//! store.set_dimensions(Dimensions::new(700.0, 900.0));
//! let style = store.resolve(&["container"], &LocalConditions::new());
//! assert_eq!(style.styles().len(), 2);
//!
//! store.set_dimensions(Dimensions::new(600.0, 900.0));
//! let style = store.resolve(&["container"], &LocalConditions::new());
//! assert_eq!(style.styles().len(), 1);
//! # Ok::<(), atomwind_style::Error>(())
//! ```
//!
//! [`AtomRecord`]: atom::AtomRecord

pub mod atom;
pub mod binding;
pub mod css;
pub mod expr;
pub mod extract;
pub mod resolve;
pub mod store;

#[cfg(feature = "hot-reload")]
pub mod hot_reload;

mod error;

pub use error::{Error, Result};

/// Prelude module with commonly used types.
pub mod prelude {
    pub use crate::atom::{
        Atom, AtomRecord, Condition, LocalConditions, RuleGroup, RuleKind, RulePredicate,
        StyleFragment, Topic,
    };
    pub use crate::binding::StyleBinding;
    pub use crate::expr::{Expression, Literal};
    pub use crate::resolve::ResolvedStyle;
    pub use crate::store::{
        AtomStore, ColorScheme, Dimensions, Invalidation, RuntimeState, RuntimeStatePatch,
        StoreConfig,
    };

    #[cfg(feature = "hot-reload")]
    pub use crate::hot_reload::SheetWatcher;
}
