//! Main style resolution engine.

use std::collections::BTreeSet;

use atomwind_core::logging::{span_names, targets};
use parking_lot::Mutex;

use super::cache::{Projection, StyleCache, StyleCacheKey};
use super::evaluate::Evaluator;
use super::ResolvedStyle;
use crate::atom::{Atom, AtomRecord, LocalConditions, RuleGroup, StyleFragment, Topic};
use crate::expr::Expression;
use crate::store::{RuntimeState, StoreConfig};

/// Resolves class lists against an [`AtomRecord`] and a [`RuntimeState`].
///
/// The engine owns the memoization cache; record and state are passed per
/// call so the owning store decides what snapshot a resolution sees.
#[derive(Debug)]
pub struct ResolutionEngine {
    cache: Mutex<StyleCache>,
    rem: f64,
}

impl ResolutionEngine {
    /// Create an engine.
    pub fn new(rem: f64, cache_capacity: usize) -> Self {
        Self {
            cache: Mutex::new(StyleCache::with_capacity(cache_capacity)),
            rem,
        }
    }

    /// Create an engine with the settings from `config`.
    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(config.rem, config.cache_capacity)
    }

    /// Resolve `class_names` in order.
    ///
    /// Missing class names contribute nothing. An atom whose conditions are
    /// not all satisfied contributes no styles, but its child classes are
    /// still advertised. A fragment is included when it has no rule groups
    /// or any group matches. Properties whose values cannot be evaluated are
    /// omitted.
    ///
    /// Custom properties declared by the resolved atoms whose conditions are
    /// satisfied shadow runtime and root variables for this class list.
    pub fn resolve<S: AsRef<str>>(
        &self,
        record: &AtomRecord,
        state: &RuntimeState,
        generation: u64,
        class_names: &[S],
        conditions: &LocalConditions,
    ) -> ResolvedStyle {
        let _span =
            tracing::trace_span!(target: targets::RESOLVE, span_names::RESOLVE, classes = class_names.len())
                .entered();

        let atoms: Vec<&Atom> = class_names
            .iter()
            .filter_map(|name| {
                let atom = record.get(name.as_ref());
                if atom.is_none() {
                    tracing::trace!(target: targets::RESOLVE, "no atom for '{}'", name.as_ref());
                }
                atom
            })
            .collect();

        let evaluator = atoms
            .iter()
            .copied()
            .filter(|atom| conditions.satisfies_all(&atom.conditions))
            .filter_map(|atom| atom.variables.as_ref())
            .fold(Evaluator::new(record, state, self.rem), Evaluator::with_scope);

        let topics: BTreeSet<Topic> = atoms.iter().flat_map(|atom| atom_topics(atom)).collect();

        let key = StyleCacheKey::new(
            class_names.iter().map(|name| name.as_ref().to_string()).collect(),
            conditions.clone(),
            project(&topics, state, &evaluator),
            generation,
        );

        if let Some(cached) = self.cache.lock().get(&key) {
            tracing::trace!(target: targets::RESOLVE, "cache hit");
            return cached.clone();
        }

        let mut styles = Vec::new();
        let mut child_class_names = Vec::new();

        for atom in atoms {
            child_class_names.extend(atom.child_classes.iter().cloned());

            if !conditions.satisfies_all(&atom.conditions) {
                continue;
            }

            for (index, fragment) in atom.styles.iter().enumerate() {
                if let Some(groups) = atom.rule_groups(index)
                    && !groups.iter().any(|group| group.matches(state))
                {
                    continue;
                }
                styles.push(evaluate_fragment(fragment, &evaluator));
            }
        }

        tracing::trace!(
            target: targets::RESOLVE,
            fragments = styles.len(),
            children = child_class_names.len(),
            "resolved"
        );

        let resolved = ResolvedStyle::new(styles, child_class_names, topics);
        self.cache.lock().insert(key, resolved.clone());
        resolved
    }

    /// Drop memoized results that depend on any of `topics`.
    pub fn invalidate_topics(&self, topics: &BTreeSet<Topic>) {
        self.cache.lock().invalidate_topics(topics);
    }

    /// Drop every memoized result.
    pub fn invalidate_all(&self) {
        self.cache.lock().invalidate_all();
    }

    /// Number of memoized results.
    pub fn cache_size(&self) -> usize {
        self.cache.lock().len()
    }
}

/// Everything an atom's output can depend on: its declared topics, its rule
/// predicates, and the variables and units its values and local variables
/// read.
fn atom_topics(atom: &Atom) -> impl Iterator<Item = Topic> + '_ {
    let rules = atom
        .at_rules
        .values()
        .flatten()
        .flat_map(RuleGroup::topics);
    let values = atom
        .styles
        .iter()
        .flat_map(|fragment| fragment.values())
        .flat_map(Topic::of_expression);
    let variables = atom
        .variables
        .iter()
        .flat_map(|variables| variables.values())
        .flat_map(Topic::of_expression);
    atom.topics.iter().cloned().chain(rules).chain(values).chain(variables)
}

fn evaluate_fragment(fragment: &StyleFragment, evaluator: &Evaluator<'_>) -> StyleFragment {
    fragment
        .iter()
        .filter_map(|(property, value)| match evaluator.evaluate(value) {
            Some(literal) => Some((property.clone(), Expression::Literal(literal))),
            None => {
                tracing::debug!(target: targets::RESOLVE, "omitting unresolved '{}'", property);
                None
            }
        })
        .collect()
}

/// The state a resolution depends on: each topic paired with its current
/// value.
fn project(topics: &BTreeSet<Topic>, state: &RuntimeState, evaluator: &Evaluator<'_>) -> Vec<(Topic, Projection)> {
    topics
        .iter()
        .map(|topic| {
            let value = match topic {
                Topic::ColorScheme => Projection::ColorScheme(state.color_scheme),
                Topic::DeviceWidth => Projection::Length(state.dimensions.width.to_bits()),
                Topic::DeviceHeight => Projection::Length(state.dimensions.height.to_bits()),
                Topic::Variable(name) => Projection::from(evaluator.variable(name)),
            };
            (topic.clone(), value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::{fragment, RulePredicate, ROOT_SCOPE};
    use crate::store::{ColorScheme, Dimensions};

    fn engine() -> ResolutionEngine {
        ResolutionEngine::new(14.0, 64)
    }

    fn state(width: f64) -> RuntimeState {
        RuntimeState {
            dimensions: Dimensions::new(width, 800.0),
            platform: "ios".to_string(),
            ..Default::default()
        }
    }

    fn container() -> AtomRecord {
        AtomRecord::new().with(
            "container",
            Atom::new().style(fragment([("width", "100%")])).gated_style(
                fragment([("maxWidth", 640)]),
                vec![RuleGroup::new([RulePredicate::new("min-width", 640)])],
            ),
        )
    }

    #[test]
    fn ungated_fragments_always_apply() {
        let record = AtomRecord::new().with(
            "text-black",
            Atom::new().style(fragment([("color", "black")])),
        );
        let engine = engine();
        for width in [0.0, 500.0, 2000.0] {
            let style = engine.resolve(&record, &state(width), 0, &["text-black"], &LocalConditions::new());
            assert_eq!(style.styles().len(), 1);
        }
    }

    #[test]
    fn width_gating() {
        let record = container();
        let engine = engine();
        let wide = engine.resolve(&record, &state(700.0), 0, &["container"], &LocalConditions::new());
        let narrow = engine.resolve(&record, &state(600.0), 0, &["container"], &LocalConditions::new());
        assert_eq!(wide.styles().len(), 2);
        assert_eq!(narrow.styles().len(), 1);
        assert!(wide.topics().contains(&Topic::DeviceWidth));
    }

    #[test]
    fn memoized_results_share_storage() {
        let record = container();
        let engine = engine();
        let first = engine.resolve(&record, &state(700.0), 0, &["container"], &LocalConditions::new());
        let second = engine.resolve(&record, &state(700.0), 0, &["container"], &LocalConditions::new());
        assert!(first.same_as(&second));
        assert_eq!(engine.cache_size(), 1);
    }

    #[test]
    fn irrelevant_state_hits_cache() {
        let record = container();
        let engine = engine();
        let light = engine.resolve(&record, &state(700.0), 0, &["container"], &LocalConditions::new());

        let mut dark = state(700.0);
        dark.color_scheme = Some(ColorScheme::Dark);
        let again = engine.resolve(&record, &dark, 0, &["container"], &LocalConditions::new());
        assert!(light.same_as(&again));
    }

    #[test]
    fn generation_is_part_of_the_key() {
        let record = container();
        let engine = engine();
        let first = engine.resolve(&record, &state(700.0), 0, &["container"], &LocalConditions::new());
        let next = engine.resolve(&record, &state(700.0), 1, &["container"], &LocalConditions::new());
        assert!(!first.same_as(&next));
        assert_eq!(first, next);
    }

    #[test]
    fn missing_classes_contribute_nothing() {
        let record = container();
        let style = engine().resolve(&record, &state(0.0), 0, &["nope", "container"], &LocalConditions::new());
        assert_eq!(style.styles().len(), 1);
        assert_eq!(style.child_class_names(), None);
    }

    #[test]
    fn conditions_gate_styles_not_children() {
        let record = AtomRecord::new().with(
            "hover:gap-2",
            Atom::new()
                .style(fragment([("marginLeft", -8)]))
                .condition("hover")
                .child_class("hover:gap-2:children"),
        );
        let engine = engine();

        let idle = engine.resolve(&record, &state(0.0), 0, &["hover:gap-2"], &LocalConditions::new());
        assert!(idle.styles().is_empty());
        assert_eq!(idle.child_class_names(), Some(&["hover:gap-2:children".to_string()][..]));

        let hovered = engine.resolve(
            &record,
            &state(0.0),
            0,
            &["hover:gap-2"],
            &LocalConditions::new().with("hover"),
        );
        assert_eq!(hovered.styles().len(), 1);
    }

    #[test]
    fn each_condition_set_gets_its_own_entry() {
        let record = AtomRecord::new().with(
            "hover:text-red",
            Atom::new().style(fragment([("color", "red")])).condition("hover"),
        );
        let engine = engine();

        let hovered = LocalConditions::new().with("hover");
        let positioned = LocalConditions::new().nth_child(0);
        let a = engine.resolve(&record, &state(0.0), 0, &["hover:text-red"], &hovered);
        let b = engine.resolve(&record, &state(0.0), 0, &["hover:text-red"], &positioned);
        assert_eq!(a.styles().len(), 1);
        assert!(b.styles().is_empty());
        assert_eq!(engine.cache_size(), 2);

        let again = engine.resolve(&record, &state(0.0), 0, &["hover:text-red"], &hovered);
        assert!(a.same_as(&again));
    }

    #[test]
    fn atom_variables_scope_to_the_class_list() {
        let record = AtomRecord::new()
            .with(ROOT_SCOPE, Atom::new().variable("--o", 1))
            .with(
                "shadow",
                Atom::new().style(fragment([("boxShadow", crate::expr::parse("0 0 0 var(--o)"))])),
            )
            .with("shadow-faint", Atom::new().variable("--o", 0.25))
            .with(
                "hover:shadow-strong",
                Atom::new().variable("--o", 0.75).condition("hover"),
            );
        let engine = engine();
        let idle = LocalConditions::new();

        let plain = engine.resolve(&record, &state(0.0), 0, &["shadow"], &idle);
        assert_eq!(plain.get("boxShadow"), Some(&Expression::string("0 0 0 1")));

        let faint = engine.resolve(&record, &state(0.0), 0, &["shadow", "shadow-faint"], &idle);
        assert_eq!(faint.get("boxShadow"), Some(&Expression::string("0 0 0 0.25")));

        let classes = ["shadow", "shadow-faint", "hover:shadow-strong"];
        let unhovered = engine.resolve(&record, &state(0.0), 0, &classes, &idle);
        assert_eq!(unhovered.get("boxShadow"), Some(&Expression::string("0 0 0 0.25")));
        let hovered = engine.resolve(&record, &state(0.0), 0, &classes, &LocalConditions::new().with("hover"));
        assert_eq!(hovered.get("boxShadow"), Some(&Expression::string("0 0 0 0.75")));
    }

    #[test]
    fn values_are_evaluated() {
        let record = AtomRecord::new()
            .with(ROOT_SCOPE, Atom::new().variable("--number", 255))
            .with(
                "text-custom",
                Atom::new().style(fragment([
                    ("color", Expression::call("rgb", vec![255.into(), 255.into(), Expression::var("--number")])),
                    ("width", Expression::unit("vw", 50.0)),
                    ("height", Expression::var("--missing")),
                ])),
            );
        let style = engine().resolve(&record, &state(400.0), 0, &["text-custom"], &LocalConditions::new());

        assert_eq!(style.get("color"), Some(&Expression::string("rgb(255, 255, 255)")));
        assert_eq!(style.get("width"), Some(&Expression::number(200.0)));
        assert_eq!(style.get("height"), None);
        assert!(style.topics().contains(&Topic::variable("--number")));
        assert!(style.topics().contains(&Topic::DeviceWidth));
    }

    #[test]
    fn later_fragments_override() {
        let record = AtomRecord::new()
            .with("text-black", Atom::new().style(fragment([("color", "black")])))
            .with("text-white", Atom::new().style(fragment([("color", "white")])));
        let style = engine().resolve(
            &record,
            &state(0.0),
            0,
            &["text-black", "text-white"],
            &LocalConditions::new(),
        );
        assert_eq!(style.styles().len(), 2);
        assert_eq!(style.get("color"), Some(&Expression::string("white")));
    }

    #[test]
    fn topic_invalidation_drops_dependents() {
        let record = container();
        let engine = engine();
        let first = engine.resolve(&record, &state(700.0), 0, &["container"], &LocalConditions::new());

        engine.invalidate_topics(&BTreeSet::from([Topic::ColorScheme]));
        assert_eq!(engine.cache_size(), 1);

        engine.invalidate_topics(&BTreeSet::from([Topic::DeviceWidth]));
        assert_eq!(engine.cache_size(), 0);
        let second = engine.resolve(&record, &state(700.0), 0, &["container"], &LocalConditions::new());
        assert!(!first.same_as(&second));
    }
}
