//! Per-node binding between a UI element's render cycle and an
//! [`AtomStore`].
//!
//! A [`StyleBinding`] is owned by one UI node. Each render calls
//! [`use_sync`](StyleBinding::use_sync); the binding re-resolves only when
//! its inputs changed or the store told it something it depends on changed,
//! and otherwise hands back the previous result unchanged.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use atomwind_style::atom::{AtomRecord, LocalConditions};
//! use atomwind_style::binding::StyleBinding;
//! use atomwind_style::store::{AtomStore, Dimensions};
//!
//! let store = Arc::new(AtomStore::new());
//! store.replace(AtomRecord::from_css(
//!     ".text-white { color: white } @media (min-width: 640px) { .sm\\:p-4 { padding: 16px } }",
//! )?);
//!
//! let mut binding = StyleBinding::new(store.clone());
//! let first = binding.use_sync("text-white sm:p-4", &LocalConditions::new());
//! let again = binding.use_sync("text-white sm:p-4", &LocalConditions::new());
//! assert!(first.same_as(&again));
//!
//! store.set_dimensions(Dimensions::new(700.0, 900.0));
//! assert!(binding.is_dirty());
//! let wide = binding.use_sync("text-white sm:p-4", &LocalConditions::new());
//! assert_eq!(wide.styles().len(), 2);
//! # Ok::<(), atomwind_style::Error>(())
//! ```

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use atomwind_core::ConnectionGuard;
use atomwind_core::logging::targets;

use crate::atom::{LocalConditions, Topic};
use crate::resolve::ResolvedStyle;
use crate::store::{AtomStore, Invalidation};

type ChangeCallback = Arc<dyn Fn() + Send + Sync>;

/// One UI node's view of the store.
pub struct StyleBinding {
    store: Arc<AtomStore>,
    inputs: Option<(Vec<String>, LocalConditions)>,
    output: Option<ResolvedStyle>,
    generation: u64,
    dirty: Arc<AtomicBool>,
    subscription: Option<ConnectionGuard<Invalidation>>,
    subscribed: BTreeSet<Topic>,
    on_change: Option<ChangeCallback>,
    resolve_count: usize,
}

impl StyleBinding {
    /// Create a binding against `store`.
    pub fn new(store: Arc<AtomStore>) -> Self {
        Self {
            store,
            inputs: None,
            output: None,
            generation: 0,
            dirty: Arc::new(AtomicBool::new(false)),
            subscription: None,
            subscribed: BTreeSet::new(),
            on_change: None,
            resolve_count: 0,
        }
    }

    /// Builder: call `on_change` whenever a store notification makes the
    /// last result stale. This is where the host schedules a re-render.
    pub fn with_on_change<F>(mut self, on_change: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_change = Some(Arc::new(on_change));
        self
    }

    /// Return the style for `class_names` (whitespace separated) under
    /// `conditions`.
    ///
    /// Resolves on the first call, when the class list or conditions differ
    /// from the previous call, after a full invalidation, and after a topic
    /// invalidation this binding subscribed to. Otherwise returns the
    /// previous result. A re-resolution that yields an equal value also
    /// returns the previous result.
    pub fn use_sync(&mut self, class_names: &str, conditions: &LocalConditions) -> ResolvedStyle {
        let names: Vec<String> = class_names.split_whitespace().map(str::to_string).collect();
        let generation = self.store.generation();

        let inputs_changed = self
            .inputs
            .as_ref()
            .is_none_or(|(previous, previous_conditions)| *previous != names || previous_conditions != conditions);
        let invalidated = self.dirty.swap(false, Ordering::SeqCst) || generation != self.generation;

        if !inputs_changed
            && !invalidated
            && let Some(output) = &self.output
        {
            return output.clone();
        }

        tracing::trace!(
            target: targets::BINDING,
            inputs_changed,
            invalidated,
            "re-resolving '{}'",
            class_names
        );

        let mut output = self.store.resolve(&names, conditions);
        self.resolve_count += 1;

        if let Some(previous) = &self.output
            && *previous == output
        {
            output = previous.clone();
        }

        self.subscribe(output.topics(), generation);
        self.inputs = Some((names, conditions.clone()));
        self.generation = generation;
        self.output = Some(output.clone());
        output
    }

    fn subscribe(&mut self, topics: &BTreeSet<Topic>, generation: u64) {
        if self.subscription.is_some() && self.subscribed == *topics && self.generation == generation {
            return;
        }

        let dirty = self.dirty.clone();
        let on_change = self.on_change.clone();
        self.subscription = Some(self.store.subscribe_scoped(topics.iter().cloned(), move |_| {
            dirty.store(true, Ordering::SeqCst);
            if let Some(on_change) = &on_change {
                on_change();
            }
        }));
        self.subscribed = topics.clone();
        tracing::trace!(target: targets::BINDING, topics = ?self.subscribed, "subscribed");
    }

    /// Whether a notification arrived since the last resolution.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    /// How many times this binding called into the store.
    pub fn resolve_count(&self) -> usize {
        self.resolve_count
    }

    /// The last result, if any.
    pub fn last(&self) -> Option<&ResolvedStyle> {
        self.output.as_ref()
    }

    /// Topics the binding currently listens to.
    pub fn subscribed_topics(&self) -> &BTreeSet<Topic> {
        &self.subscribed
    }
}

impl std::fmt::Debug for StyleBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StyleBinding")
            .field("inputs", &self.inputs)
            .field("generation", &self.generation)
            .field("subscribed", &self.subscribed)
            .field("resolve_count", &self.resolve_count)
            .finish()
    }
}
