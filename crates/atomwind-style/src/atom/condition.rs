//! Consumer-local conditions (interaction and sibling-position state).

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A pseudo-state an Atom requires before it contributes any style.
///
/// Conditions are evaluated against the caller's [`LocalConditions`], never
/// against process-wide runtime state.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Condition {
    /// `:hover`
    Hover,
    /// `:active`
    Active,
    /// `:focus`
    Focus,
    /// `:disabled`
    Disabled,
    /// `:first-child`
    FirstChild,
    /// `:last-child`
    LastChild,
    /// `:only-child`
    OnlyChild,
    /// Every child except the first (`> * + *`).
    NotFirstChild,
    /// Every child except the last.
    NotLastChild,
    /// `:nth-child(odd)`, i.e. 1st, 3rd, ...
    Odd,
    /// `:nth-child(even)`, i.e. 2nd, 4th, ...
    Even,
    /// Any other name, satisfied by a flag of the same name.
    Named(String),
}

impl Condition {
    /// Map a pseudo-class name to a condition.
    pub fn from_name(name: &str) -> Self {
        match name {
            "hover" => Condition::Hover,
            "active" | "pressed" => Condition::Active,
            "focus" | "focused" => Condition::Focus,
            "disabled" => Condition::Disabled,
            "first-child" => Condition::FirstChild,
            "last-child" => Condition::LastChild,
            "only-child" => Condition::OnlyChild,
            "not-first-child" | "notFirstChild" => Condition::NotFirstChild,
            "not-last-child" | "notLastChild" => Condition::NotLastChild,
            "odd" => Condition::Odd,
            "even" => Condition::Even,
            other => Condition::Named(other.to_string()),
        }
    }

    /// The condition's canonical name.
    pub fn as_str(&self) -> &str {
        match self {
            Condition::Hover => "hover",
            Condition::Active => "active",
            Condition::Focus => "focus",
            Condition::Disabled => "disabled",
            Condition::FirstChild => "first-child",
            Condition::LastChild => "last-child",
            Condition::OnlyChild => "only-child",
            Condition::NotFirstChild => "not-first-child",
            Condition::NotLastChild => "not-last-child",
            Condition::Odd => "odd",
            Condition::Even => "even",
            Condition::Named(name) => name,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Condition {
    fn from(name: &str) -> Self {
        Condition::from_name(name)
    }
}

impl From<String> for Condition {
    fn from(name: String) -> Self {
        Condition::from_name(&name)
    }
}

impl From<Condition> for String {
    fn from(condition: Condition) -> Self {
        condition.as_str().to_string()
    }
}

/// The condition set supplied by one UI node for one render.
///
/// Boolean flags (`hover`, `active`, custom names) plus optional position
/// among siblings.
///
/// # Example
///
/// ```
/// use atomwind_style::atom::{Condition, LocalConditions};
///
/// let conditions = LocalConditions::new().with("hover").nth_child(1);
/// assert!(conditions.satisfies(&Condition::Hover));
/// assert!(conditions.satisfies(&Condition::NotFirstChild));
/// assert!(!conditions.satisfies(&Condition::FirstChild));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LocalConditions {
    flags: BTreeSet<String>,
    nth_child: Option<usize>,
    sibling_count: Option<usize>,
}

impl LocalConditions {
    /// An empty condition set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Turn a flag on.
    pub fn with(mut self, flag: impl Into<Condition>) -> Self {
        self.set(flag, true);
        self
    }

    /// Set the zero-based position among siblings.
    pub fn nth_child(mut self, index: usize) -> Self {
        self.nth_child = Some(index);
        self
    }

    /// Set the number of siblings (including this node).
    pub fn sibling_count(mut self, count: usize) -> Self {
        self.sibling_count = Some(count);
        self
    }

    /// Turn a flag on or off.
    pub fn set(&mut self, flag: impl Into<Condition>, active: bool) {
        let name = flag.into().as_str().to_string();
        if active {
            self.flags.insert(name);
        } else {
            self.flags.remove(&name);
        }
    }

    /// Check whether a flag is on.
    pub fn is_active(&self, flag: &str) -> bool {
        self.flags.contains(flag)
    }

    /// Check a single condition.
    pub fn satisfies(&self, condition: &Condition) -> bool {
        let position = self.nth_child;
        let is_last = match (position, self.sibling_count) {
            (Some(index), Some(count)) => Some(index + 1 == count),
            _ => None,
        };

        match condition {
            Condition::FirstChild => position == Some(0),
            Condition::NotFirstChild => position.is_some_and(|index| index > 0),
            Condition::LastChild => is_last == Some(true),
            Condition::NotLastChild => is_last == Some(false),
            Condition::OnlyChild => position == Some(0) && self.sibling_count == Some(1),
            Condition::Odd => position.is_some_and(|index| index % 2 == 0),
            Condition::Even => position.is_some_and(|index| index % 2 == 1),
            other => self.flags.contains(other.as_str()),
        }
    }

    /// Check that every condition holds.
    pub fn satisfies_all<'a>(&self, conditions: impl IntoIterator<Item = &'a Condition>) -> bool {
        conditions.into_iter().all(|condition| self.satisfies(condition))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_toggle() {
        let mut conditions = LocalConditions::new().with("hover");
        assert!(conditions.satisfies(&Condition::Hover));
        conditions.set("hover", false);
        assert!(!conditions.satisfies(&Condition::Hover));
    }

    #[test]
    fn named_conditions_use_flags() {
        let conditions = LocalConditions::new().with("group-hover");
        assert!(conditions.satisfies(&Condition::from_name("group-hover")));
        assert!(!conditions.satisfies(&Condition::from_name("peer-focus")));
    }

    #[test]
    fn positional_conditions() {
        let first = LocalConditions::new().nth_child(0).sibling_count(3);
        let second = LocalConditions::new().nth_child(1).sibling_count(3);
        let last = LocalConditions::new().nth_child(2).sibling_count(3);

        assert!(first.satisfies(&Condition::FirstChild));
        assert!(!first.satisfies(&Condition::NotFirstChild));
        assert!(second.satisfies(&Condition::NotFirstChild));
        assert!(second.satisfies(&Condition::Even));
        assert!(last.satisfies(&Condition::LastChild));
        assert!(last.satisfies(&Condition::Odd));
        assert!(first.satisfies(&Condition::NotLastChild));
        assert!(!first.satisfies(&Condition::OnlyChild));
    }

    #[test]
    fn position_unknown_fails_positional_conditions() {
        let conditions = LocalConditions::new();
        assert!(!conditions.satisfies(&Condition::FirstChild));
        assert!(!conditions.satisfies(&Condition::NotFirstChild));
        assert!(!conditions.satisfies(&Condition::LastChild));
    }

    #[test]
    fn aliases_normalize() {
        assert_eq!(Condition::from_name("notFirstChild"), Condition::NotFirstChild);
        assert_eq!(Condition::from_name("pressed"), Condition::Active);
        assert!(LocalConditions::new().with("pressed").satisfies(&Condition::Active));
    }

    #[test]
    fn equality_tracks_content() {
        let a = LocalConditions::new().with("hover");
        let b = LocalConditions::new().with("hover");
        let c = LocalConditions::new().with("focus");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(LocalConditions::new().nth_child(0), LocalConditions::new().nth_child(1));
    }
}
