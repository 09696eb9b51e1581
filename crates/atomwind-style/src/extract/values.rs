//! Declaration normalization: property names and values.

use crate::expr::{self, Expression, Literal};

/// `margin-left` → `marginLeft`, `-webkit-line-clamp` → `WebkitLineClamp`.
pub fn property_name(property: &str) -> String {
    let mut name = String::with_capacity(property.len());
    let mut upper = false;

    for ch in property.chars() {
        if ch == '-' {
            upper = true;
        } else if upper {
            name.extend(ch.to_uppercase());
            upper = false;
        } else {
            name.push(ch);
        }
    }

    name
}

/// Parse a raw declaration value.
///
/// Pixel lengths anywhere in the tree become plain numbers (sequences keep
/// their text as written), and a top-level inbuilt call with nothing to
/// evaluate at runtime is folded to its number (`min`/`max`/`clamp`) or its
/// text.
pub fn value(raw: &str) -> Expression {
    fold_static(strip_px(expr::parse(raw)))
}

fn strip_px(expr: Expression) -> Expression {
    match expr {
        Expression::Literal(Literal::String(text)) => match px_number(&text) {
            Some(n) => Expression::number(n),
            None => Expression::string(text),
        },
        Expression::Literal(_) | Expression::Sequence(_) => expr,
        Expression::UnitCall { function, values } => Expression::UnitCall {
            function,
            values: values.into_iter().map(strip_px).collect(),
        },
        Expression::InbuiltCall { function, values } => Expression::InbuiltCall {
            function,
            values: values.into_iter().map(strip_px).collect(),
        },
        Expression::VarRef { name, fallback } => Expression::VarRef {
            name,
            fallback: fallback.map(|fallback| Box::new(strip_px(*fallback))),
        },
    }
}

fn px_number(text: &str) -> Option<f64> {
    text.strip_suffix("px")?.parse().ok()
}

fn fold_static(expr: Expression) -> Expression {
    match expr {
        Expression::InbuiltCall { ref function, ref values } if expr.is_static() => {
            let numbers = values.iter().map(Expression::as_number).collect::<Option<Vec<_>>>();
            match numbers.and_then(|numbers| expr::fold_math(function, &numbers)) {
                Some(n) => Expression::number(n),
                None => Expression::string(expr.to_css()),
            }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camel_cases_properties() {
        assert_eq!(property_name("color"), "color");
        assert_eq!(property_name("margin-left"), "marginLeft");
        assert_eq!(property_name("border-top-left-radius"), "borderTopLeftRadius");
        assert_eq!(property_name("-webkit-line-clamp"), "WebkitLineClamp");
    }

    #[test]
    fn pixels_become_numbers() {
        assert_eq!(value("-8px"), Expression::number(-8.0));
        assert_eq!(value("0.5px"), Expression::number(0.5));
        assert_eq!(
            value("max(8px, 2vw)"),
            Expression::call("max", vec![8.into(), Expression::unit("vw", 2.0)])
        );
        assert_eq!(value("1px solid red"), Expression::string("1px solid red"));
        assert_eq!(
            value("0 1px var(--shadow-color)"),
            Expression::sequence(vec![0.into(), "1px".into(), Expression::var("--shadow-color")])
        );
    }

    #[test]
    fn static_calls_fold() {
        assert_eq!(value("rgb(255, 255, 255)"), Expression::string("rgb(255, 255, 255)"));
        assert_eq!(value("rgb(255,255,255)"), Expression::string("rgb(255, 255, 255)"));
        assert_eq!(value("rgb(0 0 0 / 0.5)"), Expression::string("rgb(0 0 0 / 0.5)"));
        assert_eq!(value("format('255')"), Expression::string("format(255)"));
        assert_eq!(value("max(8px, 16px)"), Expression::number(16.0));
        assert_eq!(value("min(8px, 1px solid)"), Expression::string("min(8, 1px solid)"));
        assert!(matches!(value("rgb(255, 255, var(--number))"), Expression::InbuiltCall { .. }));
        assert!(matches!(
            value("platformColor(ios__systemRed, default__red)"),
            Expression::InbuiltCall { .. }
        ));
    }
}
