//! Memoized resolutions.

use std::collections::{BTreeSet, HashMap};

use super::ResolvedStyle;
use crate::atom::{LocalConditions, Topic};
use crate::expr::Literal;
use crate::store::ColorScheme;

/// The value a topic had in the runtime state a resolution saw.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Projection {
    /// The active color scheme.
    ColorScheme(Option<ColorScheme>),
    /// A window dimension, as `f64` bits.
    Length(u64),
    /// A numeric variable value, as `f64` bits.
    Number(u64),
    /// A string variable value.
    Text(String),
    /// A variable that did not evaluate.
    Unset,
}

impl From<Option<Literal>> for Projection {
    fn from(value: Option<Literal>) -> Self {
        match value {
            Some(Literal::Number(n)) => Projection::Number(n.to_bits()),
            Some(Literal::String(text)) => Projection::Text(text),
            None => Projection::Unset,
        }
    }
}

/// Cache key for a resolution.
///
/// Holds the requested class list and everything the result depends on:
/// the caller's conditions, the projection of the runtime state onto the
/// resolved atoms' topics, and the store generation. Keys compare by value,
/// so distinct inputs never share an entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StyleCacheKey {
    class_names: Vec<String>,
    conditions: LocalConditions,
    state: Vec<(Topic, Projection)>,
    generation: u64,
}

impl StyleCacheKey {
    /// Create a new cache key.
    pub fn new(
        class_names: Vec<String>,
        conditions: LocalConditions,
        state: Vec<(Topic, Projection)>,
        generation: u64,
    ) -> Self {
        Self {
            class_names,
            conditions,
            state,
            generation,
        }
    }
}

/// Bounded cache of resolved styles.
#[derive(Debug)]
pub struct StyleCache {
    cache: HashMap<StyleCacheKey, ResolvedStyle>,
    max_size: usize,
}

impl StyleCache {
    /// Create a cache with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(crate::store::DEFAULT_CACHE_CAPACITY)
    }

    /// Create a cache with specific capacity. A capacity of zero disables
    /// caching.
    pub fn with_capacity(max_size: usize) -> Self {
        Self {
            cache: HashMap::with_capacity(max_size),
            max_size,
        }
    }

    /// Get a cached resolution.
    pub fn get(&self, key: &StyleCacheKey) -> Option<&ResolvedStyle> {
        self.cache.get(key)
    }

    /// Insert a resolution into the cache.
    pub fn insert(&mut self, key: StyleCacheKey, style: ResolvedStyle) {
        if self.max_size == 0 {
            return;
        }
        // Simple eviction: clear half when full
        if self.cache.len() >= self.max_size {
            self.evict_half();
        }
        self.cache.insert(key, style);
    }

    /// Drop every entry that depends on any of `topics`.
    pub fn invalidate_topics(&mut self, topics: &BTreeSet<Topic>) {
        self.cache
            .retain(|_, style| style.topics().is_disjoint(topics));
    }

    /// Invalidate all cached styles.
    pub fn invalidate_all(&mut self) {
        self.cache.clear();
    }

    /// Get the number of cached entries.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Evict half the entries.
    fn evict_half(&mut self) {
        let target = (self.cache.len() / 2).max(1);
        let keys: Vec<_> = self.cache.keys().take(target).cloned().collect();
        for key in keys {
            self.cache.remove(&key);
        }
    }
}

impl Default for StyleCache {
    fn default() -> Self {
        Self::new()
    }
}
