//! The process-wide registry of atoms and runtime state.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use atomwind_core::logging::targets;
use atomwind_core::{ConnectionGuard, ConnectionId, Property, Signal};
use parking_lot::RwLock;

use super::{ColorScheme, Dimensions, RuntimeState, RuntimeStatePatch, StoreConfig};
use crate::atom::{AtomRecord, LocalConditions, Topic};
use crate::expr::Expression;
use crate::resolve::{ResolutionEngine, ResolvedStyle};

/// What a store notification invalidates.
#[derive(Debug, Clone, PartialEq)]
pub enum Invalidation {
    /// Everything: the record was replaced or the store was reset.
    Full,
    /// Only results depending on these topics.
    Topics(BTreeSet<Topic>),
}

impl Invalidation {
    /// Whether a subscriber to `topics` must hear about this.
    pub fn touches(&self, topics: &BTreeSet<Topic>) -> bool {
        match self {
            Invalidation::Full => true,
            Invalidation::Topics(changed) => !changed.is_disjoint(topics),
        }
    }

    /// Whether this is a full invalidation.
    pub fn is_full(&self) -> bool {
        matches!(self, Invalidation::Full)
    }
}

/// Holds the current [`AtomRecord`] and [`RuntimeState`], resolves class
/// lists against them, and notifies subscribers when either changes.
///
/// Stores are ordinary values: create one per application (or per test) and
/// share it behind an `Arc`.
///
/// # Example
///
/// ```
/// use atomwind_style::atom::{AtomRecord, LocalConditions};
/// use atomwind_style::store::{AtomStore, ColorScheme};
///
/// let store = AtomStore::new();
/// store.replace(AtomRecord::from_css(
///     "@media (prefers-color-scheme: dark) { .dark\\:text-white { color: white } }",
/// )?);
///
/// let light = store.resolve(&["dark:text-white"], &LocalConditions::new());
/// assert!(light.styles().is_empty());
///
/// store.set_color_scheme(Some(ColorScheme::Dark));
/// let dark = store.resolve(&["dark:text-white"], &LocalConditions::new());
/// assert_eq!(dark.styles().len(), 1);
/// # Ok::<(), atomwind_style::Error>(())
/// ```
pub struct AtomStore {
    config: StoreConfig,
    record: RwLock<Arc<AtomRecord>>,
    state: Property<Arc<RuntimeState>>,
    generation: AtomicU64,
    engine: ResolutionEngine,
    invalidated: Arc<Signal<Invalidation>>,
}

impl AtomStore {
    /// Create a store with default configuration.
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Create a store whose runtime state starts from `config`.
    pub fn with_config(config: StoreConfig) -> Self {
        tracing::debug!(target: targets::STORE, platform = %config.platform, "creating atom store");
        Self {
            state: Property::new(Arc::new(RuntimeState::from_config(&config))),
            engine: ResolutionEngine::from_config(&config),
            record: RwLock::new(Arc::new(AtomRecord::new())),
            generation: AtomicU64::new(0),
            invalidated: Arc::new(Signal::new()),
            config,
        }
    }

    /// The configuration this store was created with.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// The current record.
    pub fn record(&self) -> Arc<AtomRecord> {
        self.record.read().clone()
    }

    /// The current runtime state.
    pub fn runtime_state(&self) -> Arc<RuntimeState> {
        self.state.get()
    }

    /// Incremented by every [`replace`](Self::replace) and
    /// [`reset`](Self::reset).
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Signal emitted once per invalidating change.
    pub fn invalidated(&self) -> &Arc<Signal<Invalidation>> {
        &self.invalidated
    }

    /// Atomically swap in a new record and notify every subscriber.
    pub fn replace(&self, record: AtomRecord) {
        {
            let mut current = self.record.write();
            *current = Arc::new(record);
            self.generation.fetch_add(1, Ordering::SeqCst);
        }
        self.engine.invalidate_all();
        tracing::debug!(
            target: targets::STORE,
            generation = self.generation(),
            "atom record replaced"
        );
        self.invalidated.emit(Invalidation::Full);
    }

    /// Merge `patch` into the runtime state.
    ///
    /// Returns the topics whose value changed, including variables whose
    /// definitions read a changed topic. Subscribers touching any of them
    /// are notified once.
    pub fn set_runtime_state(&self, patch: RuntimeStatePatch) -> BTreeSet<Topic> {
        if patch.is_empty() {
            return BTreeSet::new();
        }

        let previous = self.state.get();
        let mut next = RuntimeState::clone(&previous);
        let mut changed = next.apply(patch);
        if changed.is_empty() {
            tracing::trace!(target: targets::STORE, "runtime state unchanged");
            return changed;
        }

        let record = self.record();
        expand_dependents(&mut changed, &record, [previous.as_ref(), &next]);

        self.state.set(Arc::new(next));
        self.engine.invalidate_topics(&changed);
        tracing::debug!(target: targets::STORE, topics = ?changed, "runtime state changed");
        self.invalidated.emit(Invalidation::Topics(changed.clone()));
        changed
    }

    /// Set or clear the color scheme. Returns whether it changed.
    pub fn set_color_scheme(&self, color_scheme: Option<ColorScheme>) -> bool {
        !self
            .set_runtime_state(RuntimeStatePatch::new().color_scheme(color_scheme))
            .is_empty()
    }

    /// Switch to dark unless already dark, in which case switch to light.
    /// Returns the new scheme.
    pub fn toggle_color_scheme(&self) -> ColorScheme {
        let next = match self.state.with(|state| state.color_scheme) {
            Some(ColorScheme::Dark) => ColorScheme::Light,
            _ => ColorScheme::Dark,
        };
        self.set_color_scheme(Some(next));
        next
    }

    /// Set the dimensions. Returns whether they changed.
    pub fn set_dimensions(&self, dimensions: Dimensions) -> bool {
        !self
            .set_runtime_state(RuntimeStatePatch::new().dimensions(dimensions))
            .is_empty()
    }

    /// Assign consumer variables. Returns whether any changed.
    pub fn set_variables<K, V>(&self, variables: impl IntoIterator<Item = (K, V)>) -> bool
    where
        K: Into<String>,
        V: Into<Expression>,
    {
        let patch = variables
            .into_iter()
            .fold(RuntimeStatePatch::new(), |patch, (name, value)| patch.variable(name, value));
        !self.set_runtime_state(patch).is_empty()
    }

    /// Restore the configured runtime state, drop every atom, notify, then
    /// disconnect every subscriber.
    pub fn reset(&self) {
        self.state
            .set_silent(Arc::new(RuntimeState::from_config(&self.config)));
        {
            let mut current = self.record.write();
            *current = Arc::new(AtomRecord::new());
            self.generation.fetch_add(1, Ordering::SeqCst);
        }
        self.engine.invalidate_all();
        tracing::debug!(target: targets::STORE, "atom store reset");
        self.invalidated.emit(Invalidation::Full);
        self.invalidated.disconnect_all();
    }

    /// Resolve `class_names` against the current record and state.
    pub fn resolve<S: AsRef<str>>(&self, class_names: &[S], conditions: &LocalConditions) -> ResolvedStyle {
        let (record, generation) = {
            let current = self.record.read();
            (current.clone(), self.generation())
        };
        let state = self.runtime_state();
        self.engine
            .resolve(&record, &state, generation, class_names, conditions)
    }

    /// Number of memoized resolutions.
    pub fn cache_size(&self) -> usize {
        self.engine.cache_size()
    }

    /// Call `callback` on every full invalidation and on every topic
    /// invalidation touching `topics`.
    pub fn subscribe<F>(&self, topics: impl IntoIterator<Item = Topic>, callback: F) -> ConnectionId
    where
        F: Fn(&Invalidation) + Send + Sync + 'static,
    {
        let topics: BTreeSet<Topic> = topics.into_iter().collect();
        self.invalidated
            .connect_filtered(move |invalidation| invalidation.touches(&topics), callback)
    }

    /// Like [`subscribe`](Self::subscribe), disconnecting when the guard
    /// drops.
    pub fn subscribe_scoped<F>(
        &self,
        topics: impl IntoIterator<Item = Topic>,
        callback: F,
    ) -> ConnectionGuard<Invalidation>
    where
        F: Fn(&Invalidation) + Send + Sync + 'static,
    {
        let topics: BTreeSet<Topic> = topics.into_iter().collect();
        self.invalidated
            .connect_filtered_scoped(move |invalidation| invalidation.touches(&topics), callback)
    }

    /// Remove a subscription. Returns whether it existed.
    pub fn unsubscribe(&self, id: ConnectionId) -> bool {
        self.invalidated.disconnect(id)
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.invalidated.connection_count()
    }
}

impl Default for AtomStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AtomStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AtomStore")
            .field("atoms", &self.record.read().len())
            .field("generation", &self.generation())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Grow `changed` with every variable whose definition (in the record's root
/// scope or either runtime state) reads a changed topic, until nothing new
/// is added.
fn expand_dependents(changed: &mut BTreeSet<Topic>, record: &AtomRecord, states: [&RuntimeState; 2]) {
    let definitions: Vec<(&String, BTreeSet<Topic>)> = record
        .root_variables()
        .into_iter()
        .flatten()
        .chain(states.into_iter().flat_map(|state| state.variables.iter()))
        .map(|(name, expr)| (name, Topic::of_expression(expr)))
        .collect();

    loop {
        let mut grew = false;
        for (name, reads) in &definitions {
            let topic = Topic::variable(name.as_str());
            if !changed.contains(&topic) && !reads.is_disjoint(changed) {
                changed.insert(topic);
                grew = true;
            }
        }
        if !grew {
            break;
        }
    }
}
