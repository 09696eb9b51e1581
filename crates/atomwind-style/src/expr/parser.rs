//! Expression parser built on the `cssparser` tokenizer.
//!
//! Parsing never fails: anything the grammar does not cover is returned as a
//! string literal of the raw (trimmed) text.

use atomwind_core::logging::targets;
use cssparser::{Delimiter, ParseError as CssParseError, Parser, ParserInput, Token};

use super::{is_unit_function, Expression};

type ParseResult<'i, T> = std::result::Result<T, CssParseError<'i, ()>>;

/// Parse a declaration value into an [`Expression`].
///
/// - `255` → number literal
/// - `string`, `#fff`, `100%` → string literal
/// - `123vw` → unit call `vw(123)`
/// - `rgb(1, 2, var(--x))` → inbuilt call with recursively parsed arguments
/// - `var(--x)` / `var(--x, fallback)` → variable reference
/// - `0 0 0 var(--x)` → sequence, when any component is dynamic
///
/// # Example
///
/// ```
/// use atomwind_style::expr::{parse, Expression};
///
/// assert_eq!(parse("123vw"), Expression::unit("vw", 123.0));
/// assert_eq!(parse(" 1px solid red "), Expression::string("1px solid red"));
/// ```
pub fn parse(text: &str) -> Expression {
    let text = text.trim();
    let mut input = ParserInput::new(text);
    let mut parser = Parser::new(&mut input);

    match parser.parse_entirely(parse_argument) {
        Ok(expr) => expr,
        Err(e) => {
            tracing::debug!(target: targets::EXPR, "keeping '{}' as literal: {:?}", text, e);
            Expression::string(text)
        }
    }
}

/// Parse one argument: a single term, a dynamic sequence, or the raw text of
/// everything up to the end of the (possibly delimited) input.
fn parse_argument<'i>(parser: &mut Parser<'i, '_>) -> ParseResult<'i, Expression> {
    parser.skip_whitespace();
    let start = parser.position();

    let single = parser.try_parse(|p| -> ParseResult<'i, Expression> {
        let expr = parse_term(p)?;
        p.expect_exhausted()?;
        Ok(expr)
    });
    if let Ok(expr) = single {
        return Ok(expr);
    }
    if let Ok(expr) = parser.try_parse(parse_sequence) {
        return Ok(expr);
    }

    while parser.next().is_ok() {}
    let raw = parser.slice_from(start).trim();
    tracing::trace!(target: targets::EXPR, "opaque value '{}'", raw);
    Ok(Expression::string(raw))
}

/// Whitespace-separated terms with `/` and `,` kept as string components.
/// Fails when nothing is dynamic, so static text stays a single literal.
fn parse_sequence<'i>(parser: &mut Parser<'i, '_>) -> ParseResult<'i, Expression> {
    let mut items = vec![];
    while !parser.is_exhausted() {
        let state = parser.state();
        let delimiter = match parser.next()? {
            Token::Delim(c) => Some(c.to_string()),
            Token::Comma => Some(",".to_string()),
            _ => None,
        };
        match delimiter {
            Some(text) => items.push(Expression::string(text)),
            None => {
                parser.reset(&state);
                items.push(parse_term(parser)?);
            }
        }
    }

    let sequence = Expression::sequence(items);
    if sequence.is_static() {
        return Err(parser.new_custom_error(()));
    }
    Ok(sequence)
}

fn parse_term<'i>(parser: &mut Parser<'i, '_>) -> ParseResult<'i, Expression> {
    let start = parser.position();
    let token = parser.next()?.clone();

    let expr = match token {
        Token::Number {
            int_value: Some(n), ..
        } => Expression::number(f64::from(n)),
        Token::Number { value, .. } => {
            let raw = parser.slice_from(start);
            Expression::number(raw.parse().unwrap_or(f64::from(value)))
        }
        Token::Dimension { value, unit, .. } => {
            let raw = parser.slice_from(start);
            if is_unit_function(&unit) {
                let number = raw
                    .get(..raw.len().saturating_sub(unit.len()))
                    .and_then(|n| n.parse().ok())
                    .unwrap_or(f64::from(value));
                Expression::unit(unit.to_ascii_lowercase(), number)
            } else {
                Expression::string(raw)
            }
        }
        Token::Ident(name) => Expression::string(name.as_ref()),
        Token::QuotedString(text) => Expression::string(text.as_ref()),
        Token::Percentage { .. } | Token::Hash(_) | Token::IDHash(_) => {
            Expression::string(parser.slice_from(start))
        }
        Token::Function(name) => {
            let name = name.to_string();
            parser.parse_nested_block(|p| parse_call(&name, p))?
        }
        _ => return Err(parser.new_custom_error(())),
    };

    Ok(expr)
}

/// Parse the arguments of `name(...)`; the parser is positioned inside the
/// parentheses.
fn parse_call<'i>(name: &str, parser: &mut Parser<'i, '_>) -> ParseResult<'i, Expression> {
    if name.eq_ignore_ascii_case("var") {
        let variable = parser.expect_ident()?.to_string();
        if !variable.starts_with("--") {
            return Err(parser.new_custom_error(()));
        }
        if parser.is_exhausted() {
            return Ok(Expression::var(variable));
        }
        parser.expect_comma()?;
        let fallback = parse_argument(parser)?;
        return Ok(Expression::var_with_fallback(variable, fallback));
    }

    let mut values = vec![];
    if !parser.is_exhausted() {
        loop {
            values.push(parser.parse_until_before(Delimiter::Comma, parse_argument)?);
            let is_comma = match parser.next() {
                Err(_) => break,
                Ok(token) => matches!(token, Token::Comma),
            };
            if !is_comma {
                return Err(parser.new_custom_error(()));
            }
        }
    }

    if is_unit_function(name) {
        Ok(Expression::UnitCall {
            function: name.to_ascii_lowercase(),
            values,
        })
    } else {
        Ok(Expression::call(name, values))
    }
}
