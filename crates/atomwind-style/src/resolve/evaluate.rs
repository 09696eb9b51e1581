//! Runtime evaluation of expressions against the current state.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use atomwind_core::logging::targets;
use indexmap::IndexMap;

use crate::atom::{AtomRecord, REM_VARIABLE};
use crate::expr::{fold_math, join_components, Expression, Literal};
use crate::store::RuntimeState;

/// Maximum chain of nested variable lookups followed before giving up.
pub const MAX_VARIABLE_DEPTH: usize = 32;

const PLATFORM_COLOR: &str = "platformColor";
const DEFAULT_PLATFORM_PREFIX: &str = "default";

/// Per-evaluator variable results.
#[derive(Debug, Default)]
struct Memo {
    values: HashMap<String, Option<Literal>>,
    /// Variables currently being evaluated, outermost first.
    stack: Vec<String>,
    /// Variables found on a reference cycle. They evaluate to `None`.
    cyclic: HashSet<String>,
}

/// Evaluates expressions to literals.
///
/// Variables are looked up in the local scopes first (last added wins), then
/// the runtime state, then the record's root scope. `--rem` falls back to
/// the configured root font size. Evaluation returns `None` when a value
/// cannot be produced; callers omit the property.
///
/// Each variable is evaluated at most once per evaluator, so an evaluator
/// must not outlive the state it was created for. Every variable on a
/// reference cycle is invalid; `var()` fallbacks outside the cycle still
/// apply.
#[derive(Debug)]
pub struct Evaluator<'a> {
    record: &'a AtomRecord,
    state: &'a RuntimeState,
    rem: f64,
    scopes: Vec<&'a IndexMap<String, Expression>>,
    memo: RefCell<Memo>,
}

impl<'a> Evaluator<'a> {
    /// Create an evaluator.
    pub fn new(record: &'a AtomRecord, state: &'a RuntimeState, rem: f64) -> Self {
        Self {
            record,
            state,
            rem,
            scopes: Vec::new(),
            memo: RefCell::new(Memo::default()),
        }
    }

    /// Add variables declared on the element itself. They shadow runtime and
    /// root variables; later scopes shadow earlier ones.
    pub fn with_scope(mut self, variables: &'a IndexMap<String, Expression>) -> Self {
        self.scopes.push(variables);
        self
    }

    /// Evaluate an expression.
    ///
    /// # Example
    ///
    /// ```
    /// use atomwind_style::atom::{Atom, AtomRecord, ROOT_SCOPE};
    /// use atomwind_style::expr::{parse, Literal};
    /// use atomwind_style::resolve::Evaluator;
    /// use atomwind_style::store::RuntimeState;
    ///
    /// let record = AtomRecord::new().with(ROOT_SCOPE, Atom::new().variable("--number", 255));
    /// let state = RuntimeState::default();
    /// let evaluator = Evaluator::new(&record, &state, 14.0);
    ///
    /// assert_eq!(
    ///     evaluator.evaluate(&parse("rgb(255, 255, var(--number))")),
    ///     Some(Literal::from("rgb(255, 255, 255)"))
    /// );
    /// assert_eq!(evaluator.evaluate(&parse("var(--missing)")), None);
    /// ```
    pub fn evaluate(&self, expr: &Expression) -> Option<Literal> {
        self.eval(expr)
    }

    /// Evaluate the variable `name`.
    pub fn variable(&self, name: &str) -> Option<Literal> {
        self.lookup(name)
    }

    /// The raw definition of `name`.
    pub fn definition(&self, name: &str) -> Option<&'a Expression> {
        self.scopes
            .iter()
            .rev()
            .copied()
            .find_map(|scope| scope.get(name))
            .or_else(|| self.state.variables.get(name))
            .or_else(|| {
                self.record
                    .root_variables()
                    .and_then(|variables| variables.get(name))
            })
    }

    fn lookup(&self, name: &str) -> Option<Literal> {
        {
            let mut memo = self.memo.borrow_mut();
            if let Some(value) = memo.values.get(name) {
                return value.clone();
            }
            if let Some(start) = memo.stack.iter().position(|entry| entry == name) {
                tracing::debug!(target: targets::RESOLVE, "variable '{}' references itself", name);
                let Memo { stack, cyclic, .. } = &mut *memo;
                cyclic.extend(stack[start..].iter().cloned());
                return None;
            }
            if memo.stack.len() >= MAX_VARIABLE_DEPTH {
                tracing::debug!(
                    target: targets::RESOLVE,
                    "variable '{}' exceeds lookup depth {}",
                    name,
                    MAX_VARIABLE_DEPTH
                );
                return None;
            }
            memo.stack.push(name.to_string());
        }

        let value = match self.definition(name) {
            Some(expr) => self.eval(expr),
            None if name == REM_VARIABLE => Some(Literal::Number(self.rem)),
            None => None,
        };

        let mut memo = self.memo.borrow_mut();
        memo.stack.pop();
        let value = if memo.cyclic.contains(name) { None } else { value };
        memo.values.insert(name.to_string(), value.clone());
        value
    }

    fn eval(&self, expr: &Expression) -> Option<Literal> {
        match expr {
            Expression::Literal(literal) => Some(literal.clone()),
            Expression::VarRef { name, fallback } => {
                let value = self
                    .lookup(name)
                    .or_else(|| fallback.as_deref().and_then(|fallback| self.eval(fallback)));
                if value.is_none() {
                    tracing::trace!(target: targets::RESOLVE, "unresolved variable '{}'", name);
                }
                value
            }
            Expression::UnitCall { function, values } => {
                let [value] = values.as_slice() else {
                    tracing::debug!(
                        target: targets::RESOLVE,
                        "unit '{}' expects one argument, got {}",
                        function,
                        values.len()
                    );
                    return None;
                };
                let n = number(&self.eval(value)?)?;
                self.unit(function, n).map(Literal::Number)
            }
            Expression::InbuiltCall { function, values } if function == PLATFORM_COLOR => {
                self.platform_color(values)
            }
            Expression::InbuiltCall { function, values } => {
                let args = values
                    .iter()
                    .map(|value| self.eval(value))
                    .collect::<Option<Vec<_>>>()?;
                let numbers = args.iter().map(Literal::as_number).collect::<Option<Vec<_>>>();
                if let Some(n) = numbers.and_then(|numbers| fold_math(function, &numbers)) {
                    return Some(Literal::Number(n));
                }
                let texts: Vec<String> = args.iter().map(Literal::to_css).collect();
                Some(Literal::String(format!("{function}({})", texts.join(", "))))
            }
            Expression::Sequence(values) => {
                let items = values
                    .iter()
                    .map(|value| self.eval(value).map(|literal| literal.to_css()))
                    .collect::<Option<Vec<_>>>()?;
                Some(Literal::String(join_components(&items)))
            }
        }
    }

    fn unit(&self, unit: &str, n: f64) -> Option<f64> {
        let dimensions = self.state.dimensions;
        match unit.to_ascii_lowercase().as_str() {
            "vw" => Some(n * dimensions.width / 100.0),
            "vh" => Some(n * dimensions.height / 100.0),
            "vmin" => Some(n * dimensions.width.min(dimensions.height) / 100.0),
            "vmax" => Some(n * dimensions.width.max(dimensions.height) / 100.0),
            "rem" => {
                let rem = self
                    .lookup(REM_VARIABLE)
                    .as_ref()
                    .and_then(number)
                    .unwrap_or(self.rem);
                Some(n * rem)
            }
            other => {
                tracing::debug!(target: targets::RESOLVE, "unknown unit '{}'", other);
                None
            }
        }
    }

    /// `platformColor(ios__systemRed, default__red)`: pick the argument
    /// prefixed with the current platform, else the `default__` one.
    fn platform_color(&self, values: &[Expression]) -> Option<Literal> {
        let options = values
            .iter()
            .filter_map(|value| self.eval(value))
            .filter_map(|literal| match literal {
                Literal::String(text) => Some(text),
                Literal::Number(_) => None,
            })
            .collect::<Vec<_>>();

        let pick = |platform: &str| {
            options.iter().find_map(|option| {
                option
                    .split_once("__")
                    .filter(|(prefix, _)| *prefix == platform)
                    .map(|(_, color)| Literal::String(color.to_string()))
            })
        };

        pick(&self.state.platform).or_else(|| pick(DEFAULT_PLATFORM_PREFIX))
    }
}

/// A literal's numeric value; numeric strings count.
fn number(literal: &Literal) -> Option<f64> {
    match literal {
        Literal::Number(n) => Some(*n),
        Literal::String(text) => text.trim().parse().ok(),
    }
}
