//! Process-wide runtime state and partial updates to it.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::StoreConfig;
use crate::atom::Topic;
use crate::expr::Expression;

/// The active color scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    /// Light appearance.
    Light,
    /// Dark appearance.
    Dark,
}

impl ColorScheme {
    /// The scheme's name as used by `prefers-color-scheme`.
    pub fn as_str(self) -> &'static str {
        match self {
            ColorScheme::Light => "light",
            ColorScheme::Dark => "dark",
        }
    }
}

impl fmt::Display for ColorScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColorScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(ColorScheme::Light),
            "dark" => Ok(ColorScheme::Dark),
            other => Err(format!("unknown color scheme '{other}'")),
        }
    }
}

/// Window or screen dimensions in density-independent units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl Dimensions {
    /// Create dimensions.
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Runtime signals that rule groups and expressions are evaluated against.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeState {
    /// `None` until the host reports a scheme.
    pub color_scheme: Option<ColorScheme>,
    /// Current dimensions.
    pub dimensions: Dimensions,
    /// Platform name; fixed for the store's lifetime.
    pub platform: String,
    /// Consumer-supplied variables. These shadow root-scope variables of the
    /// same name.
    pub variables: IndexMap<String, Expression>,
}

impl RuntimeState {
    /// The initial state described by `config`.
    pub fn from_config(config: &StoreConfig) -> Self {
        Self {
            color_scheme: config.color_scheme,
            dimensions: Dimensions::new(config.width, config.height),
            platform: config.platform.clone(),
            variables: IndexMap::new(),
        }
    }

    /// Merge `patch` into this state and return the topics whose raw value
    /// changed. Assignments equal to the current value change nothing.
    pub fn apply(&mut self, patch: RuntimeStatePatch) -> BTreeSet<Topic> {
        let mut changed = BTreeSet::new();

        if let Some(color_scheme) = patch.color_scheme
            && color_scheme != self.color_scheme
        {
            self.color_scheme = color_scheme;
            changed.insert(Topic::ColorScheme);
        }

        if let Some(dimensions) = patch.dimensions {
            if dimensions.width != self.dimensions.width {
                changed.insert(Topic::DeviceWidth);
            }
            if dimensions.height != self.dimensions.height {
                changed.insert(Topic::DeviceHeight);
            }
            self.dimensions = dimensions;
        }

        for (name, value) in patch.variables {
            let previous = match value {
                Some(value) => self.variables.insert(name.clone(), value.clone()).filter(|old| *old == value),
                None => match self.variables.shift_remove(&name) {
                    Some(_) => None,
                    None => continue,
                },
            };
            if previous.is_none() {
                changed.insert(Topic::variable(name));
            }
        }

        changed
    }
}

impl Default for RuntimeState {
    fn default() -> Self {
        Self::from_config(&StoreConfig::default())
    }
}

/// A partial update to [`RuntimeState`].
///
/// Every field left unset keeps its current value. Platform is not
/// patchable.
///
/// # Example
///
/// ```
/// use atomwind_style::store::{ColorScheme, Dimensions, RuntimeStatePatch};
///
/// let patch = RuntimeStatePatch::new()
///     .color_scheme(Some(ColorScheme::Dark))
///     .dimensions(Dimensions::new(800.0, 600.0))
///     .variable("--hue", 120);
/// assert!(!patch.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuntimeStatePatch {
    /// `Some(None)` clears the scheme.
    pub color_scheme: Option<Option<ColorScheme>>,
    /// New dimensions.
    pub dimensions: Option<Dimensions>,
    /// Variable assignments, applied in order; `None` removes the variable.
    pub variables: Vec<(String, Option<Expression>)>,
}

impl RuntimeStatePatch {
    /// An empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or clear the color scheme.
    pub fn color_scheme(mut self, color_scheme: Option<ColorScheme>) -> Self {
        self.color_scheme = Some(color_scheme);
        self
    }

    /// Set the dimensions.
    pub fn dimensions(mut self, dimensions: Dimensions) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    /// Assign a variable.
    pub fn variable(mut self, name: impl Into<String>, value: impl Into<Expression>) -> Self {
        self.variables.push((name.into(), Some(value.into())));
        self
    }

    /// Remove a variable.
    pub fn remove_variable(mut self, name: impl Into<String>) -> Self {
        self.variables.push((name.into(), None));
        self
    }

    /// Whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.color_scheme.is_none() && self.dimensions.is_none() && self.variables.is_empty()
    }
}
