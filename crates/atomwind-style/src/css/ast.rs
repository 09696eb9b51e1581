//! Declaration tree produced by the CSS front end.

use std::fmt;

use crate::atom::RuleGroup;

/// A parsed stylesheet: rule blocks in document order, with enclosing
/// at-rules already flattened onto each block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleSheet {
    /// The blocks, in source order.
    pub blocks: Vec<StyleBlock>,
}

impl StyleSheet {
    /// Number of blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Check if the sheet has no blocks.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// One `selector-list { declarations }` block.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleBlock {
    /// Every selector of the comma-separated list.
    pub selectors: Vec<Selector>,
    /// Enclosing at-rule scopes, outermost first. Each scope is a list of
    /// alternatives (ORed); a block applies when every scope has at least one
    /// matching alternative.
    pub at_rules: Vec<Vec<RuleGroup>>,
    /// Declarations in source order.
    pub declarations: Vec<Declaration>,
}

impl StyleBlock {
    /// A block with no enclosing at-rules.
    pub fn new(selectors: Vec<Selector>, declarations: Vec<Declaration>) -> Self {
        Self {
            selectors,
            at_rules: vec![],
            declarations,
        }
    }
}

/// A single `property: value` pair, with `!important` already stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Property name exactly as written (`margin-left`, `--number`).
    pub property: String,
    /// Raw value text, trimmed.
    pub value: String,
}

impl Declaration {
    /// Create a declaration.
    pub fn new(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
        }
    }

    /// Whether this declares a custom property (`--name`).
    pub fn is_custom_property(&self) -> bool {
        self.property.starts_with("--")
    }
}

/// The selector shapes the extractor understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// `.name:pseudo...`, optionally followed by a child marker.
    Class {
        /// The unescaped class name.
        name: String,
        /// Pseudo-classes on the class compound, in order.
        pseudo_classes: Vec<String>,
        /// Present when the selector targets the class's structural children
        /// (`.name:children`, `.name > *`).
        child: Option<ChildScope>,
    },
    /// `:root` or `*`: the global variable scope.
    Root,
    /// Anything else; kept as text for logging.
    Unsupported(String),
}

impl Selector {
    /// A plain class selector.
    pub fn class(name: impl Into<String>) -> Self {
        Selector::Class {
            name: name.into(),
            pseudo_classes: vec![],
            child: None,
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Class {
                name,
                pseudo_classes,
                child,
            } => {
                write!(f, ".{name}")?;
                for pseudo in pseudo_classes {
                    write!(f, ":{pseudo}")?;
                }
                if let Some(child) = child {
                    f.write_str(" > *")?;
                    for pseudo in &child.pseudo_classes {
                        write!(f, ":{pseudo}")?;
                    }
                }
                Ok(())
            }
            Selector::Root => f.write_str(":root"),
            Selector::Unsupported(text) => f.write_str(text),
        }
    }
}

/// Conditions that apply to the children targeted by a child marker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChildScope {
    /// Condition names for the child (`not-first-child` for `> * + *`).
    pub pseudo_classes: Vec<String>,
}
