//! Atoms: the compiled description of everything one class name does.
//!
//! An [`AtomRecord`] maps class names to [`Atom`]s. It is produced wholesale
//! by the extractor (or decoded from JSON) and handed to
//! [`AtomStore::replace`](crate::store::AtomStore::replace).

mod condition;
mod rules;

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::expr::Expression;
use crate::{Error, Result};

pub use condition::{Condition, LocalConditions};
pub use rules::{RuleGroup, RuleKind, RulePredicate, Topic};

/// Key of the root variable scope (`:root` / `*` custom properties).
pub const ROOT_SCOPE: &str = ":root";

/// Reserved variable holding the root font size, used by `rem` units.
pub const REM_VARIABLE: &str = "--rem";

/// Suffix appended to a class name to name its child atom.
pub const CHILDREN_SUFFIX: &str = ":children";

/// One style fragment: property name → value, in declaration order.
pub type StyleFragment = IndexMap<String, Expression>;

/// Build a style fragment from `(property, value)` pairs.
///
/// # Example
///
/// ```
/// use atomwind_style::atom::fragment;
///
/// let style = fragment([("marginLeft", -8), ("marginTop", -8)]);
/// assert_eq!(style.len(), 2);
/// ```
pub fn fragment<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> StyleFragment
where
    K: Into<String>,
    V: Into<Expression>,
{
    entries
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect()
}

/// The compiled styling behavior of one class name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Atom {
    /// Style fragments, applied in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub styles: Vec<StyleFragment>,
    /// Local conditions that must all hold for any style to apply.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub conditions: BTreeSet<Condition>,
    /// Fragment index → rule groups. A fragment is included when any group
    /// matches; indices without an entry are unconditional.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub at_rules: BTreeMap<usize, Vec<RuleGroup>>,
    /// Runtime-state categories this atom depends on.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub topics: BTreeSet<Topic>,
    /// Classes that structural children must additionally resolve.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub child_classes: Vec<String>,
    /// Custom properties declared by a root scope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<IndexMap<String, Expression>>,
}

impl Atom {
    /// An empty atom.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an unconditional fragment.
    pub fn style(mut self, fragment: StyleFragment) -> Self {
        self.styles.push(fragment);
        self
    }

    /// Append a fragment gated by rule groups; topics are derived from the
    /// predicates.
    pub fn gated_style(mut self, fragment: StyleFragment, groups: Vec<RuleGroup>) -> Self {
        let index = self.styles.len();
        self.styles.push(fragment);
        self.topics.extend(groups.iter().flat_map(RuleGroup::topics));
        self.at_rules.insert(index, groups);
        self
    }

    /// Require a local condition.
    pub fn condition(mut self, condition: impl Into<Condition>) -> Self {
        self.conditions.insert(condition.into());
        self
    }

    /// Declare a topic dependency.
    pub fn topic(mut self, topic: impl Into<Topic>) -> Self {
        self.topics.insert(topic.into());
        self
    }

    /// Advertise a child class.
    pub fn child_class(mut self, class_name: impl Into<String>) -> Self {
        let class_name = class_name.into();
        if !self.child_classes.contains(&class_name) {
            self.child_classes.push(class_name);
        }
        self
    }

    /// Define a root-scope variable.
    pub fn variable(mut self, name: impl Into<String>, value: impl Into<Expression>) -> Self {
        self.variables
            .get_or_insert_with(IndexMap::new)
            .insert(name.into(), value.into());
        self
    }

    /// Rule groups gating the fragment at `index`, if any.
    ///
    /// An empty group list counts as ungated.
    pub fn rule_groups(&self, index: usize) -> Option<&[RuleGroup]> {
        self.at_rules
            .get(&index)
            .map(Vec::as_slice)
            .filter(|groups| !groups.is_empty())
    }
}

/// Class name → [`Atom`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AtomRecord {
    atoms: IndexMap<String, Atom>,
}

impl AtomRecord {
    /// An empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile CSS text into a record.
    ///
    /// # Example
    ///
    /// ```
    /// use atomwind_style::atom::AtomRecord;
    ///
    /// let record = AtomRecord::from_css(".text-white { color: #fff; }")?;
    /// assert_eq!(record.get("text-white").unwrap().styles[0]["color"].as_str(), Some("#fff"));
    /// # Ok::<(), atomwind_style::Error>(())
    /// ```
    pub fn from_css(css: &str) -> Result<Self> {
        let sheet = crate::css::parse_css(css)?;
        Ok(crate::extract::extract(&sheet))
    }

    /// Compile a CSS file into a record.
    pub fn from_css_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let css = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_css(&css)
    }

    /// Decode a serialized record.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the record.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serialize the record with indentation.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Look up an atom by class name.
    pub fn get(&self, class_name: &str) -> Option<&Atom> {
        self.atoms.get(class_name)
    }

    /// Mutable lookup.
    pub fn get_mut(&mut self, class_name: &str) -> Option<&mut Atom> {
        self.atoms.get_mut(class_name)
    }

    /// Get or create the atom for `class_name`.
    pub fn entry(&mut self, class_name: impl Into<String>) -> &mut Atom {
        self.atoms.entry(class_name.into()).or_default()
    }

    /// Insert an atom, returning the one it replaced.
    pub fn insert(&mut self, class_name: impl Into<String>, atom: Atom) -> Option<Atom> {
        self.atoms.insert(class_name.into(), atom)
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, class_name: impl Into<String>, atom: Atom) -> Self {
        self.insert(class_name, atom);
        self
    }

    /// Variables declared by the root scope.
    pub fn root_variables(&self) -> Option<&IndexMap<String, Expression>> {
        self.get(ROOT_SCOPE).and_then(|atom| atom.variables.as_ref())
    }

    /// Iterate atoms in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Atom)> {
        self.atoms.iter().map(|(name, atom)| (name.as_str(), atom))
    }

    /// Number of atoms.
    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    /// Check if the record is empty.
    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }
}

impl FromIterator<(String, Atom)> for AtomRecord {
    fn from_iter<I: IntoIterator<Item = (String, Atom)>>(iter: I) -> Self {
        Self {
            atoms: iter.into_iter().collect(),
        }
    }
}
