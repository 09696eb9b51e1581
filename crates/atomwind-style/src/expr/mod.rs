//! Declaration value expressions.
//!
//! Raw declaration text such as `rgb(255, 255, var(--number))` or `123vw` is
//! parsed into an [`Expression`] tree. Trees are finite and acyclic: a value
//! can name a variable, but the reference is only followed at resolution time.
//!
//! # Example
//!
//! ```
//! use atomwind_style::expr::{parse, Expression};
//!
//! let expr = parse("var(--size, 2)");
//! assert_eq!(
//!     expr,
//!     Expression::var_with_fallback("--size", Expression::number(2.0)),
//! );
//! assert_eq!(expr.to_string(), "var(--size, 2)");
//! ```
//!
//! [`Display`](std::fmt::Display) is the round-trip form and quotes strings
//! that would otherwise re-parse as something else. [`Expression::to_css`]
//! is the plain value text handed to consumers.

mod parser;

use std::fmt;

use cssparser::{Parser, ParserInput, Token};
use serde::{Deserialize, Serialize, Serializer};

pub use parser::parse;

/// Function names that represent a unit suffix (`123vw` ≡ `vw(123)`).
pub const UNIT_FUNCTIONS: &[&str] = &["vw", "vh", "vmin", "vmax", "rem"];

/// Inbuilt functions the resolution engine evaluates at runtime. Calls to
/// these are never folded into literal text ahead of time.
pub const RUNTIME_FUNCTIONS: &[&str] = &["platformColor"];

/// Check whether `name` is a reserved unit function.
pub fn is_unit_function(name: &str) -> bool {
    UNIT_FUNCTIONS.iter().any(|unit| unit.eq_ignore_ascii_case(name))
}

/// A literal value: a bare number or an opaque string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    /// A bare number.
    Number(f64),
    /// Any other text, passed through untouched.
    String(String),
}

impl Literal {
    /// The numeric value, if this is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Literal::Number(n) => Some(*n),
            Literal::String(_) => None,
        }
    }

    /// The string value, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Literal::Number(_) => None,
            Literal::String(s) => Some(s),
        }
    }

    /// Unquoted value text.
    pub fn to_css(&self) -> String {
        match self {
            Literal::Number(n) => n.to_string(),
            Literal::String(s) => s.clone(),
        }
    }
}

/// Strings that re-parse as themselves are written bare; everything else
/// (`"255"`, `"123vw"`, `"a, b"`, `""`) is written as a quoted CSS string.
impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Number(n) => write!(f, "{n}"),
            Literal::String(s) if is_bare(s) => f.write_str(s),
            Literal::String(s) => cssparser::serialize_string(s, f),
        }
    }
}

/// Whether `text` is a single token that [`parse`] reads back as the same
/// string literal.
fn is_bare(text: &str) -> bool {
    let mut input = ParserInput::new(text);
    let mut parser = Parser::new(&mut input);
    let single = matches!(
        parser.next_including_whitespace(),
        Ok(Token::Ident(_)
            | Token::Hash(_)
            | Token::IDHash(_)
            | Token::Percentage { .. }
            | Token::Dimension { .. }
            | Token::Delim(_))
    );
    single && parser.is_exhausted() && parse(text) == Expression::string(text)
}

/// Fold `min`, `max` and `clamp` over plain numbers.
///
/// ```
/// use atomwind_style::expr::fold_math;
///
/// assert_eq!(fold_math("max", &[8.0, 16.0]), Some(16.0));
/// assert_eq!(fold_math("clamp", &[0.0, 12.0, 10.0]), Some(10.0));
/// assert_eq!(fold_math("rgb", &[1.0, 2.0, 3.0]), None);
/// ```
pub fn fold_math(function: &str, args: &[f64]) -> Option<f64> {
    match (function.to_ascii_lowercase().as_str(), args) {
        ("min", [first, rest @ ..]) => Some(rest.iter().fold(*first, |acc, n| acc.min(*n))),
        ("max", [first, rest @ ..]) => Some(rest.iter().fold(*first, |acc, n| acc.max(*n))),
        ("clamp", [min, value, max]) => Some(value.max(*min).min(*max)),
        _ => None,
    }
}

/// Join evaluated sequence components with single spaces; commas attach to
/// the preceding component.
pub(crate) fn join_components<S: AsRef<str>>(items: &[S]) -> String {
    let mut out = String::new();
    for item in items {
        let item = item.as_ref();
        if !out.is_empty() && item != "," {
            out.push(' ');
        }
        out.push_str(item);
    }
    out
}

// Integral numbers serialize as JSON integers so serialized records read
// `255`, not `255.0`.
impl Serialize for Literal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Literal::Number(n) if n.fract() == 0.0 && n.abs() < 9.0e15 => {
                serializer.serialize_i64(*n as i64)
            }
            Literal::Number(n) => serializer.serialize_f64(*n),
            Literal::String(s) => serializer.serialize_str(s),
        }
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Literal::Number(value)
    }
}

impl From<i32> for Literal {
    fn from(value: i32) -> Self {
        Literal::Number(f64::from(value))
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::String(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Literal::String(value)
    }
}

/// A parsed declaration value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "ExprRepr", try_from = "ExprRepr")]
pub enum Expression {
    /// A number or opaque string.
    Literal(Literal),
    /// A unit applied to its arguments, e.g. `123vw`.
    UnitCall {
        /// The unit name (`vw`, `rem`, ...).
        function: String,
        /// The arguments, usually a single number.
        values: Vec<Expression>,
    },
    /// Any other function call, e.g. `rgb(...)` or `platformColor(...)`.
    InbuiltCall {
        /// The function name.
        function: String,
        /// The arguments, in order.
        values: Vec<Expression>,
    },
    /// A `var(--name)` reference with an optional fallback.
    VarRef {
        /// The variable name including the leading `--`.
        name: String,
        /// Used when the variable is undefined.
        fallback: Option<Box<Expression>>,
    },
    /// Space-separated components with at least one dynamic part, e.g.
    /// `0 0 0 var(--opacity)`. Delimiters such as `/` and `,` are string
    /// components.
    Sequence(Vec<Expression>),
}

impl Expression {
    /// A numeric literal.
    pub fn number(value: f64) -> Self {
        Expression::Literal(Literal::Number(value))
    }

    /// A string literal.
    pub fn string(value: impl Into<String>) -> Self {
        Expression::Literal(Literal::String(value.into()))
    }

    /// A unit call with a single numeric argument.
    pub fn unit(function: impl Into<String>, value: f64) -> Self {
        Expression::UnitCall {
            function: function.into(),
            values: vec![Expression::number(value)],
        }
    }

    /// An inbuilt function call.
    pub fn call(function: impl Into<String>, values: Vec<Expression>) -> Self {
        Expression::InbuiltCall {
            function: function.into(),
            values,
        }
    }

    /// A variable reference without fallback.
    pub fn var(name: impl Into<String>) -> Self {
        Expression::VarRef {
            name: name.into(),
            fallback: None,
        }
    }

    /// A variable reference with a fallback.
    pub fn var_with_fallback(name: impl Into<String>, fallback: Expression) -> Self {
        Expression::VarRef {
            name: name.into(),
            fallback: Some(Box::new(fallback)),
        }
    }

    /// A space-separated component list.
    pub fn sequence(values: Vec<Expression>) -> Self {
        Expression::Sequence(values)
    }

    /// The literal, if this is one.
    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Expression::Literal(literal) => Some(literal),
            _ => None,
        }
    }

    /// The numeric value, if this is a numeric literal.
    pub fn as_number(&self) -> Option<f64> {
        self.as_literal().and_then(Literal::as_number)
    }

    /// The string value, if this is a string literal.
    pub fn as_str(&self) -> Option<&str> {
        self.as_literal().and_then(Literal::as_str)
    }

    /// Names of every variable referenced anywhere in this tree, in
    /// first-seen order.
    pub fn variable_refs(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.walk(&mut |expr| {
            if let Expression::VarRef { name, .. } = expr
                && !names.contains(&name.as_str())
            {
                names.push(name.as_str());
            }
        });
        names
    }

    /// Names of every unit function used anywhere in this tree.
    pub fn unit_refs(&self) -> Vec<&str> {
        let mut units = Vec::new();
        self.walk(&mut |expr| {
            if let Expression::UnitCall { function, .. } = expr
                && !units.contains(&function.as_str())
            {
                units.push(function.as_str());
            }
        });
        units
    }

    /// Whether this tree can be replaced by its literal text ahead of time:
    /// no variables, no units, no runtime-evaluated functions.
    pub fn is_static(&self) -> bool {
        let mut dynamic = false;
        self.walk(&mut |expr| match expr {
            Expression::VarRef { .. } | Expression::UnitCall { .. } => dynamic = true,
            Expression::InbuiltCall { function, .. } if RUNTIME_FUNCTIONS.contains(&function.as_str()) => {
                dynamic = true
            }
            _ => {}
        });
        !dynamic
    }

    /// Visit this node and all descendants, parents first.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Expression)) {
        visit(self);
        match self {
            Expression::Literal(_) => {}
            Expression::UnitCall { values, .. }
            | Expression::InbuiltCall { values, .. }
            | Expression::Sequence(values) => {
                for value in values {
                    value.walk(visit);
                }
            }
            Expression::VarRef { fallback, .. } => {
                if let Some(fallback) = fallback {
                    fallback.walk(visit);
                }
            }
        }
    }

    /// Unquoted value text, e.g. `rgb(255, 0, 0)` or `0 0 0 var(--o)`.
    pub fn to_css(&self) -> String {
        match self {
            Expression::Literal(literal) => literal.to_css(),
            Expression::UnitCall { function, values } => match values.as_slice() {
                [Expression::Literal(Literal::Number(n))] => format!("{n}{function}"),
                _ => css_call(function, values),
            },
            Expression::InbuiltCall { function, values } => css_call(function, values),
            Expression::VarRef { name, fallback: None } => format!("var({name})"),
            Expression::VarRef {
                name,
                fallback: Some(fallback),
            } => format!("var({name}, {})", fallback.to_css()),
            Expression::Sequence(values) => {
                join_components(&values.iter().map(Expression::to_css).collect::<Vec<_>>())
            }
        }
    }
}

fn css_call(function: &str, values: &[Expression]) -> String {
    let args: Vec<String> = values.iter().map(Expression::to_css).collect();
    format!("{function}({})", args.join(", "))
}

fn write_call(f: &mut fmt::Formatter<'_>, function: &str, values: &[Expression]) -> fmt::Result {
    write!(f, "{function}(")?;
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{value}")?;
    }
    f.write_str(")")
}

/// Serializes back to declaration text that [`parse`] reads as the same tree.
impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(literal) => write!(f, "{literal}"),
            Expression::UnitCall { function, values } => match values.as_slice() {
                [Expression::Literal(Literal::Number(n))] => write!(f, "{n}{function}"),
                _ => write_call(f, function, values),
            },
            Expression::InbuiltCall { function, values } => write_call(f, function, values),
            Expression::VarRef { name, fallback: None } => write!(f, "var({name})"),
            Expression::VarRef {
                name,
                fallback: Some(fallback),
            } => write!(f, "var({name}, {fallback})"),
            Expression::Sequence(values) => {
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{value}")?;
                }
                Ok(())
            }
        }
    }
}

impl From<Literal> for Expression {
    fn from(value: Literal) -> Self {
        Expression::Literal(value)
    }
}

impl From<f64> for Expression {
    fn from(value: f64) -> Self {
        Expression::number(value)
    }
}

impl From<i32> for Expression {
    fn from(value: i32) -> Self {
        Expression::number(f64::from(value))
    }
}

impl From<&str> for Expression {
    fn from(value: &str) -> Self {
        Expression::string(value)
    }
}

impl From<String> for Expression {
    fn from(value: String) -> Self {
        Expression::string(value)
    }
}

/// Serialized form: literals stay literals, calls become
/// `{ "function": ..., "values": [...] }`. Unit calls and runtime functions
/// use their own name as the tag. Other inbuilt calls use
/// `function: "inbuilt"` with the call name first; variable references use
/// `function: "var"` with the variable name first; sequences use
/// `function: "sequence"`.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ExprRepr {
    Literal(Literal),
    Call {
        function: String,
        values: Vec<ExprRepr>,
    },
}

const INBUILT_TAG: &str = "inbuilt";
const VAR_TAG: &str = "var";
const SEQUENCE_TAG: &str = "sequence";

impl From<Expression> for ExprRepr {
    fn from(expr: Expression) -> Self {
        match expr {
            Expression::Literal(literal) => ExprRepr::Literal(literal),
            Expression::UnitCall { function, values } => ExprRepr::Call {
                function,
                values: values.into_iter().map(ExprRepr::from).collect(),
            },
            Expression::InbuiltCall { function, values } if RUNTIME_FUNCTIONS.contains(&function.as_str()) => {
                ExprRepr::Call {
                    function,
                    values: values.into_iter().map(ExprRepr::from).collect(),
                }
            }
            Expression::InbuiltCall { function, values } => ExprRepr::Call {
                function: INBUILT_TAG.to_string(),
                values: std::iter::once(ExprRepr::Literal(Literal::String(function)))
                    .chain(values.into_iter().map(ExprRepr::from))
                    .collect(),
            },
            Expression::VarRef { name, fallback } => ExprRepr::Call {
                function: VAR_TAG.to_string(),
                values: std::iter::once(ExprRepr::Literal(Literal::String(name)))
                    .chain(fallback.map(|fallback| ExprRepr::from(*fallback)))
                    .collect(),
            },
            Expression::Sequence(values) => ExprRepr::Call {
                function: SEQUENCE_TAG.to_string(),
                values: values.into_iter().map(ExprRepr::from).collect(),
            },
        }
    }
}

impl TryFrom<ExprRepr> for Expression {
    type Error = String;

    fn try_from(repr: ExprRepr) -> Result<Self, Self::Error> {
        let (function, values) = match repr {
            ExprRepr::Literal(literal) => return Ok(Expression::Literal(literal)),
            ExprRepr::Call { function, values } => (function, values),
        };

        let mut values = values
            .into_iter()
            .map(Expression::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        match function.as_str() {
            INBUILT_TAG | VAR_TAG => {
                if values.is_empty() {
                    return Err(format!("'{function}' expression is missing its name"));
                }
                let name = match values.remove(0) {
                    Expression::Literal(Literal::String(name)) => name,
                    other => return Err(format!("'{function}' expression has non-string name {other}")),
                };
                if function == INBUILT_TAG {
                    return Ok(Expression::InbuiltCall { function: name, values });
                }
                if values.len() > 1 {
                    return Err(format!("var({name}) has more than one fallback"));
                }
                Ok(Expression::VarRef {
                    name,
                    fallback: values.pop().map(Box::new),
                })
            }
            SEQUENCE_TAG => Ok(Expression::Sequence(values)),
            name if RUNTIME_FUNCTIONS.contains(&name) => Ok(Expression::InbuiltCall {
                function: name.to_string(),
                values,
            }),
            name if is_unit_function(name) => Ok(Expression::UnitCall {
                function: name.to_ascii_lowercase(),
                values,
            }),
            _ => Err(format!("unknown expression function '{function}'")),
        }
    }
}
