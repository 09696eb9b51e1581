//! Style resolution engine.
//!
//! Turns a class-name list plus a consumer's [`LocalConditions`] into the
//! ordered style fragments that apply right now. Results are memoized; a
//! repeated call with nothing relevant changed returns the same shared
//! style array.
//!
//! The engine never walks `childClasses` itself. Child class names are
//! advertised on the result and the caller resolves them on the child nodes.
//!
//! [`LocalConditions`]: crate::atom::LocalConditions

mod cache;
mod engine;
mod evaluate;

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::atom::{StyleFragment, Topic};

pub use cache::{Projection, StyleCache, StyleCacheKey};
pub use engine::ResolutionEngine;
pub use evaluate::{Evaluator, MAX_VARIABLE_DEPTH};

/// The output of one resolution.
///
/// Cloning is cheap; clones share the same style array.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStyle {
    styles: Arc<[StyleFragment]>,
    child_class_names: Option<Arc<[String]>>,
    topics: Arc<BTreeSet<Topic>>,
}

impl ResolvedStyle {
    /// Assemble a result. An empty child list is stored as absent.
    pub fn new(
        styles: Vec<StyleFragment>,
        child_class_names: Vec<String>,
        topics: BTreeSet<Topic>,
    ) -> Self {
        Self {
            styles: styles.into(),
            child_class_names: (!child_class_names.is_empty()).then(|| child_class_names.into()),
            topics: Arc::new(topics),
        }
    }

    /// Included fragments, in class-name then fragment order. Values are
    /// fully evaluated literals.
    pub fn styles(&self) -> &[StyleFragment] {
        &self.styles
    }

    /// The shared style array, for identity comparisons.
    pub fn styles_arc(&self) -> &Arc<[StyleFragment]> {
        &self.styles
    }

    /// Child classes to resolve on structural children; `None` when no atom
    /// declared any.
    pub fn child_class_names(&self) -> Option<&[String]> {
        self.child_class_names.as_deref()
    }

    /// Topics the resolved atoms depend on.
    pub fn topics(&self) -> &BTreeSet<Topic> {
        &self.topics
    }

    /// Whether `other` shares this result's style array.
    pub fn same_as(&self, other: &ResolvedStyle) -> bool {
        Arc::ptr_eq(&self.styles, &other.styles)
    }

    /// Look up the last value set for `property` across all fragments.
    pub fn get(&self, property: &str) -> Option<&crate::expr::Expression> {
        self.styles
            .iter()
            .rev()
            .find_map(|fragment| fragment.get(property))
    }
}

impl Default for ResolvedStyle {
    fn default() -> Self {
        Self::new(vec![], vec![], BTreeSet::new())
    }
}
