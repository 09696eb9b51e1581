//! Atom extraction.
//!
//! Walks a flattened [`StyleSheet`] and groups declarations into an
//! [`AtomRecord`]:
//!
//! - each `.class` block appends one style fragment to the class's Atom,
//!   gated by the block's at-rule stack (one rule group per combination of
//!   alternatives);
//! - pseudo-classes become conditions, never topics;
//! - `.class:children` / `.class > *` blocks build the `class:children` Atom
//!   and link it from the parent via `childClasses`;
//! - root-scope blocks (`:root`, `*`) contribute variables, with `font-size`
//!   exposed as `--rem`;
//! - custom properties in an ungated class block become that Atom's own
//!   variables. Custom properties under at-rules are dropped.

mod values;

use atomwind_core::logging::{span_names, targets};

use crate::atom::{
    Atom, AtomRecord, CHILDREN_SUFFIX, Condition, REM_VARIABLE, ROOT_SCOPE, RuleGroup,
    StyleFragment, Topic,
};
use crate::css::{ChildScope, Selector, StyleBlock, StyleSheet};
use crate::expr::Expression;

pub use values::{property_name, value};

/// Build an [`AtomRecord`] from a parsed stylesheet.
///
/// # Example
///
/// ```
/// use atomwind_style::css::parse_css;
/// use atomwind_style::extract::extract;
///
/// let sheet = parse_css(".hover\\:text-red-500:hover { color: #ef4444; }")?;
/// let record = extract(&sheet);
/// let atom = record.get("hover:text-red-500").unwrap();
/// assert_eq!(atom.conditions.len(), 1);
/// # Ok::<(), atomwind_style::Error>(())
/// ```
pub fn extract(sheet: &StyleSheet) -> AtomRecord {
    let _span = tracing::debug_span!(target: targets::EXTRACT, span_names::EXTRACT, blocks = sheet.len())
        .entered();
    let mut extractor = Extractor::default();

    for block in &sheet.blocks {
        for selector in &block.selectors {
            match selector {
                Selector::Root => extractor.root_scope(block),
                Selector::Class {
                    name,
                    pseudo_classes,
                    child,
                } => extractor.class_block(name, pseudo_classes, child.as_ref(), block),
                Selector::Unsupported(text) => {
                    tracing::debug!(target: targets::EXTRACT, "skipping unsupported selector '{}'", text);
                }
            }
        }
    }

    tracing::debug!(target: targets::EXTRACT, "extracted {} atoms", extractor.record.len());
    extractor.record
}

#[derive(Default)]
struct Extractor {
    record: AtomRecord,
}

impl Extractor {
    fn root_scope(&mut self, block: &StyleBlock) {
        if !block.at_rules.is_empty() {
            tracing::debug!(target: targets::EXTRACT, "skipping root scope nested in at-rules");
            return;
        }

        let variables: Vec<_> = block
            .declarations
            .iter()
            .filter_map(|declaration| {
                if declaration.is_custom_property() {
                    Some((declaration.property.clone(), value(&declaration.value)))
                } else if declaration.property == "font-size" {
                    Some((REM_VARIABLE.to_string(), value(&declaration.value)))
                } else {
                    tracing::trace!(
                        target: targets::EXTRACT,
                        "ignoring '{}' in root scope",
                        declaration.property
                    );
                    None
                }
            })
            .collect();

        if variables.is_empty() {
            return;
        }

        let root = self.record.entry(ROOT_SCOPE);
        root.variables.get_or_insert_with(Default::default).extend(variables);
    }

    fn class_block(
        &mut self,
        name: &str,
        pseudo_classes: &[String],
        child: Option<&ChildScope>,
        block: &StyleBlock,
    ) {
        let (custom, declarations): (Vec<_>, Vec<_>) = block
            .declarations
            .iter()
            .partition(|declaration| declaration.is_custom_property());

        let variables: Vec<(String, Expression)> = if block.at_rules.is_empty() {
            custom
                .iter()
                .map(|declaration| (declaration.property.clone(), value(&declaration.value)))
                .collect()
        } else {
            for declaration in &custom {
                tracing::debug!(
                    target: targets::EXTRACT,
                    "skipping gated variable '{}' on '{}'",
                    declaration.property,
                    name
                );
            }
            vec![]
        };

        let fragment: StyleFragment = declarations
            .iter()
            .map(|declaration| (property_name(&declaration.property), value(&declaration.value)))
            .collect();

        if fragment.is_empty() && variables.is_empty() && child.is_none() {
            tracing::debug!(target: targets::EXTRACT, "no usable declarations for '{}'", name);
            return;
        }

        let (key, conditions) = match child {
            Some(child) => {
                let key = format!("{name}{CHILDREN_SUFFIX}");
                let parent = self.record.entry(name);
                parent
                    .conditions
                    .extend(pseudo_classes.iter().map(|pseudo| Condition::from_name(pseudo)));
                if !parent.child_classes.contains(&key) {
                    parent.child_classes.push(key.clone());
                }
                (key, child.pseudo_classes.as_slice())
            }
            None => (name.to_string(), pseudo_classes),
        };

        let atom = self.record.entry(key);
        atom.conditions
            .extend(conditions.iter().map(|pseudo| Condition::from_name(pseudo)));

        if !variables.is_empty() {
            for (_, expr) in &variables {
                atom.topics.extend(Topic::of_expression(expr));
            }
            atom.variables.get_or_insert_with(Default::default).extend(variables);
        }

        if fragment.is_empty() {
            return;
        }

        for expr in fragment.values() {
            atom.topics.extend(Topic::of_expression(expr));
        }
        push_fragment(atom, fragment, rule_groups(&block.at_rules));
    }
}

/// Append a fragment. A gated fragment identical to the previous gated one
/// adds its groups to that fragment instead (OR).
fn push_fragment(atom: &mut Atom, fragment: StyleFragment, groups: Vec<RuleGroup>) {
    atom.topics.extend(groups.iter().flat_map(RuleGroup::topics));

    if !groups.is_empty()
        && let Some(last) = atom.styles.len().checked_sub(1)
        && atom.styles[last] == fragment
        && let Some(existing) = atom.at_rules.get_mut(&last)
        && !existing.is_empty()
    {
        for group in groups {
            if !existing.contains(&group) {
                existing.push(group);
            }
        }
        return;
    }

    let index = atom.styles.len();
    atom.styles.push(fragment);
    if !groups.is_empty() {
        atom.at_rules.insert(index, groups);
    }
}

/// Combine an at-rule stack into rule groups: one group per choice of
/// alternative at every level.
fn rule_groups(scopes: &[Vec<RuleGroup>]) -> Vec<RuleGroup> {
    if scopes.is_empty() {
        return vec![];
    }

    scopes.iter().fold(vec![RuleGroup::default()], |groups, scope| {
        groups
            .iter()
            .flat_map(|prefix| {
                scope.iter().map(move |alternative| {
                    prefix
                        .0
                        .iter()
                        .chain(alternative.0.iter())
                        .cloned()
                        .collect::<RuleGroup>()
                })
            })
            .collect()
    })
}
