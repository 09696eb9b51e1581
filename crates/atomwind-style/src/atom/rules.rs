//! Runtime rule predicates and invalidation topics.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::REM_VARIABLE;
use crate::expr::{Expression, Literal};
use crate::store::RuntimeState;

/// A category of runtime state, used to scope invalidation.
///
/// Topics never participate in matching; they only decide which consumers
/// hear about a change.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Topic {
    /// `colorScheme` changed.
    ColorScheme,
    /// `dimensions.width` changed.
    DeviceWidth,
    /// `dimensions.height` changed.
    DeviceHeight,
    /// A custom variable (name includes the leading `--`) changed.
    Variable(String),
}

impl Topic {
    /// A custom-variable topic.
    pub fn variable(name: impl Into<String>) -> Self {
        Topic::Variable(name.into())
    }

    /// The topic's canonical name.
    pub fn as_str(&self) -> &str {
        match self {
            Topic::ColorScheme => "color-scheme",
            Topic::DeviceWidth => "device-width",
            Topic::DeviceHeight => "device-height",
            Topic::Variable(name) => name,
        }
    }

    /// Topics a unit function reads.
    pub fn of_unit(unit: &str) -> Vec<Topic> {
        match unit.to_ascii_lowercase().as_str() {
            "vw" => vec![Topic::DeviceWidth],
            "vh" => vec![Topic::DeviceHeight],
            "vmin" | "vmax" => vec![Topic::DeviceWidth, Topic::DeviceHeight],
            "rem" => vec![Topic::variable(REM_VARIABLE)],
            _ => vec![],
        }
    }

    /// Every topic the resolved value of `expr` depends on: the variables it
    /// names and the dimensions its units read.
    pub fn of_expression(expr: &Expression) -> BTreeSet<Topic> {
        let mut topics: BTreeSet<Topic> = expr
            .variable_refs()
            .into_iter()
            .map(Topic::variable)
            .collect();
        for unit in expr.unit_refs() {
            topics.extend(Topic::of_unit(unit));
        }
        topics
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Topic {
    fn from(name: &str) -> Self {
        match name {
            "color-scheme" => Topic::ColorScheme,
            "device-width" => Topic::DeviceWidth,
            "device-height" => Topic::DeviceHeight,
            other => Topic::Variable(other.to_string()),
        }
    }
}

impl From<String> for Topic {
    fn from(name: String) -> Self {
        Topic::from(name.as_str())
    }
}

impl From<Topic> for String {
    fn from(topic: Topic) -> Self {
        topic.as_str().to_string()
    }
}

/// The kind of an at-rule predicate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RuleKind {
    /// `prefers-color-scheme: light|dark`.
    PrefersColorScheme,
    /// `min-width: <number>`, inclusive.
    MinWidth,
    /// `max-width: <number>`, inclusive.
    MaxWidth,
    /// `min-height: <number>`, inclusive.
    MinHeight,
    /// `max-height: <number>`, inclusive.
    MaxHeight,
    /// Platform name; resolved statically.
    Platform,
    /// Preserved verbatim; never matches.
    Unknown(String),
}

impl RuleKind {
    /// The predicate's canonical name.
    pub fn as_str(&self) -> &str {
        match self {
            RuleKind::PrefersColorScheme => "prefers-color-scheme",
            RuleKind::MinWidth => "min-width",
            RuleKind::MaxWidth => "max-width",
            RuleKind::MinHeight => "min-height",
            RuleKind::MaxHeight => "max-height",
            RuleKind::Platform => "platform",
            RuleKind::Unknown(name) => name,
        }
    }

    /// The topic a predicate of this kind depends on. Platform predicates
    /// and unknown kinds have none.
    pub fn topic(&self) -> Option<Topic> {
        match self {
            RuleKind::PrefersColorScheme => Some(Topic::ColorScheme),
            RuleKind::MinWidth | RuleKind::MaxWidth => Some(Topic::DeviceWidth),
            RuleKind::MinHeight | RuleKind::MaxHeight => Some(Topic::DeviceHeight),
            RuleKind::Platform | RuleKind::Unknown(_) => None,
        }
    }
}

impl From<&str> for RuleKind {
    fn from(name: &str) -> Self {
        match name {
            "prefers-color-scheme" => RuleKind::PrefersColorScheme,
            "min-width" => RuleKind::MinWidth,
            "max-width" => RuleKind::MaxWidth,
            "min-height" => RuleKind::MinHeight,
            "max-height" => RuleKind::MaxHeight,
            "platform" => RuleKind::Platform,
            other => RuleKind::Unknown(other.to_string()),
        }
    }
}

impl From<String> for RuleKind {
    fn from(name: String) -> Self {
        RuleKind::from(name.as_str())
    }
}

impl From<RuleKind> for String {
    fn from(kind: RuleKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `(ruleKind, ruleValue)` predicate. Serialized as a two-element array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "(RuleKind, Literal)", into = "(RuleKind, Literal)")]
pub struct RulePredicate {
    /// What part of the runtime state this predicate inspects.
    pub kind: RuleKind,
    /// The value it is compared against.
    pub value: Literal,
}

impl RulePredicate {
    /// Create a predicate.
    pub fn new(kind: impl Into<RuleKind>, value: impl Into<Literal>) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
        }
    }

    /// Check this predicate against the current runtime state.
    pub fn matches(&self, state: &RuntimeState) -> bool {
        match (&self.kind, &self.value) {
            (RuleKind::PrefersColorScheme, Literal::String(scheme)) => state
                .color_scheme
                .is_some_and(|current| current.as_str() == scheme),
            (RuleKind::MinWidth, Literal::Number(n)) => state.dimensions.width >= *n,
            (RuleKind::MaxWidth, Literal::Number(n)) => state.dimensions.width <= *n,
            (RuleKind::MinHeight, Literal::Number(n)) => state.dimensions.height >= *n,
            (RuleKind::MaxHeight, Literal::Number(n)) => state.dimensions.height <= *n,
            (RuleKind::Platform, Literal::String(platform)) => state.platform == *platform,
            _ => false,
        }
    }
}

impl From<(RuleKind, Literal)> for RulePredicate {
    fn from((kind, value): (RuleKind, Literal)) -> Self {
        Self { kind, value }
    }
}

impl From<RulePredicate> for (RuleKind, Literal) {
    fn from(predicate: RulePredicate) -> Self {
        (predicate.kind, predicate.value)
    }
}

/// An ANDed list of predicates.
///
/// An empty group is vacuously satisfied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleGroup(pub Vec<RulePredicate>);

impl RuleGroup {
    /// Create a group from predicates.
    pub fn new(predicates: impl IntoIterator<Item = RulePredicate>) -> Self {
        Self(predicates.into_iter().collect())
    }

    /// Check that every predicate holds.
    pub fn matches(&self, state: &RuntimeState) -> bool {
        self.0.iter().all(|predicate| predicate.matches(state))
    }

    /// Topics of every predicate in the group.
    pub fn topics(&self) -> impl Iterator<Item = Topic> + '_ {
        self.0.iter().filter_map(|predicate| predicate.kind.topic())
    }
}

impl FromIterator<RulePredicate> for RuleGroup {
    fn from_iter<I: IntoIterator<Item = RulePredicate>>(iter: I) -> Self {
        Self::new(iter)
    }
}
