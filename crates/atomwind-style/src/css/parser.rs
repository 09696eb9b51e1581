//! CSS syntax parser using the `cssparser` crate.
//!
//! Produces a [`StyleSheet`] of flattened blocks: nested `@media` rules are
//! unwound so every block carries its enclosing at-rule stack.

use atomwind_core::logging::targets;
use cssparser::{
    Delimiter, ParseError as CssParseError, ParseErrorKind, Parser, ParserInput, Token,
};

use super::ast::{ChildScope, Declaration, Selector, StyleBlock, StyleSheet};
use crate::atom::{RuleGroup, RuleKind, RulePredicate};
use crate::expr::Literal;
use crate::{Error, Result};

/// Media types that name a platform.
const PLATFORM_MEDIA_TYPES: &[&str] = &["ios", "android", "web", "windows", "macos", "native"];

/// Media types that always match.
const TRANSPARENT_MEDIA_TYPES: &[&str] = &["screen", "all", "only", "and"];

type SelectorResult<'i, T> = std::result::Result<T, CssParseError<'i, Error>>;

/// Parse a CSS stylesheet string into a flattened [`StyleSheet`].
///
/// Rules that fail to parse are skipped with a warning and parsing resumes at
/// the next rule. Unknown at-rules (`@tailwind`, `@font-face`, ...) are
/// skipped.
///
/// # Example
///
/// ```
/// use atomwind_style::css::{parse_css, Selector};
///
/// let sheet = parse_css("@media (min-width: 640px) { .container { max-width: 640px; } }")?;
/// assert_eq!(sheet.blocks.len(), 1);
/// assert_eq!(sheet.blocks[0].selectors[0], Selector::class("container"));
/// assert_eq!(sheet.blocks[0].at_rules.len(), 1);
/// # Ok::<(), atomwind_style::Error>(())
/// ```
pub fn parse_css(css: &str) -> Result<StyleSheet> {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    let mut blocks = vec![];

    parse_rule_list(&mut parser, &[], &mut blocks);

    tracing::debug!(target: targets::CSS, "parsed {} style blocks", blocks.len());
    Ok(StyleSheet { blocks })
}

fn parse_rule_list(
    parser: &mut Parser<'_, '_>,
    at_rules: &[Vec<RuleGroup>],
    blocks: &mut Vec<StyleBlock>,
) {
    loop {
        parser.skip_whitespace();

        if parser.is_exhausted() {
            break;
        }

        let state = parser.state();
        let at_keyword = match parser.next() {
            Ok(Token::AtKeyword(name)) => Some(name.to_string()),
            _ => None,
        };

        let result = match at_keyword {
            Some(name) => parse_at_rule(parser, &name, at_rules, blocks),
            None => {
                parser.reset(&state);
                parse_rule(parser, at_rules).map(|block| blocks.push(block))
            }
        };

        if let Err(e) = result {
            tracing::warn!(target: targets::CSS, "CSS parse error: {}", e);
            skip_to_next_rule(parser);
        }
    }
}

/// Parse the remainder of an at-rule whose keyword was already consumed.
fn parse_at_rule<'i>(
    parser: &mut Parser<'i, '_>,
    name: &str,
    at_rules: &[Vec<RuleGroup>],
    blocks: &mut Vec<StyleBlock>,
) -> Result<()> {
    if !name.eq_ignore_ascii_case("media") {
        tracing::debug!(target: targets::CSS, "skipping @{} rule", name);
        skip_to_next_rule(parser);
        return Ok(());
    }

    let location = parser.current_source_location();
    let alternatives = parser
        .parse_until_before(Delimiter::CurlyBracketBlock, |p| {
            Ok::<_, CssParseError<'i, ()>>(parse_media_query_list(p))
        })
        .unwrap_or_default();

    if !matches!(parser.next(), Ok(Token::CurlyBracketBlock)) {
        return Err(Error::parse(
            "Expected '{' after @media prelude",
            location.line + 1,
            location.column,
        ));
    }

    let mut nested = at_rules.to_vec();
    // A query list that is vacuously true (e.g. `screen`) adds no gate.
    if alternatives.iter().any(|group| !group.0.is_empty()) {
        nested.push(alternatives);
    }

    parser
        .parse_nested_block(|p| {
            parse_rule_list(p, &nested, blocks);
            Ok::<_, CssParseError<'i, ()>>(())
        })
        .map_err(|e| {
            Error::parse(
                format!("Failed to parse @media block: {:?}", e.kind),
                e.location.line + 1,
                e.location.column,
            )
        })
}

/// `a, b and c` → `[[a], [b, c]]`.
fn parse_media_query_list(parser: &mut Parser<'_, '_>) -> Vec<RuleGroup> {
    let mut alternatives = vec![];

    loop {
        if let Ok(group) = parser.parse_until_before(Delimiter::Comma, |p| {
            Ok::<_, CssParseError<'_, ()>>(parse_media_query(p))
        }) {
            alternatives.push(group);
        }

        if parser.next().is_err() {
            break;
        }
    }

    alternatives
}

fn parse_media_query(parser: &mut Parser<'_, '_>) -> RuleGroup {
    let mut predicates = vec![];

    loop {
        let start = parser.position();
        let token = match parser.next() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };

        match token {
            Token::Ident(word) => {
                let word = word.to_ascii_lowercase();
                if TRANSPARENT_MEDIA_TYPES.contains(&word.as_str()) {
                    continue;
                }
                if PLATFORM_MEDIA_TYPES.contains(&word.as_str()) {
                    predicates.push(RulePredicate::new(RuleKind::Platform, word));
                } else if word == "not" {
                    while parser.next().is_ok() {}
                    let negated = parser.slice_from(start).trim_start_matches("not").trim();
                    predicates.push(RulePredicate::new("not", negated));
                } else {
                    tracing::debug!(target: targets::CSS, "unknown media type '{}'", word);
                    predicates.push(RulePredicate::new("media", word));
                }
            }
            Token::ParenthesisBlock => {
                match parser.parse_nested_block(parse_media_feature) {
                    Ok(predicate) => predicates.push(predicate),
                    Err(e) => {
                        tracing::debug!(target: targets::CSS, "unreadable media feature: {:?}", e.kind);
                    }
                }
            }
            other => {
                tracing::debug!(target: targets::CSS, "unexpected token in media query: {:?}", other);
            }
        }
    }

    RuleGroup(predicates)
}

/// `min-width: 640px` → `("min-width", 640)`. Pixel lengths become numbers;
/// other values are kept verbatim.
fn parse_media_feature<'i>(
    parser: &mut Parser<'i, '_>,
) -> std::result::Result<RulePredicate, CssParseError<'i, ()>> {
    let name = parser.expect_ident()?.to_ascii_lowercase();

    if parser.is_exhausted() {
        return Ok(RulePredicate::new(name, ""));
    }
    parser.expect_colon()?;
    parser.skip_whitespace();

    let start = parser.position();
    let token = parser.next()?.clone();
    let raw = parser.slice_from(start);
    let single_token = parser.is_exhausted();

    let value = match token {
        Token::Number { value, .. } => Literal::Number(raw.parse().unwrap_or(f64::from(value))),
        Token::Dimension { value, unit, .. } if unit.eq_ignore_ascii_case("px") => {
            let number = &raw[..raw.len().saturating_sub(unit.len())];
            Literal::Number(number.parse().unwrap_or(f64::from(value)))
        }
        Token::Ident(ident) if single_token => Literal::String(ident.to_ascii_lowercase()),
        _ => {
            while parser.next().is_ok() {}
            Literal::String(parser.slice_from(start).trim().to_string())
        }
    };

    Ok(RulePredicate::new(name, value))
}

/// Parse a single CSS rule: selector-list { declarations }
fn parse_rule(parser: &mut Parser<'_, '_>, at_rules: &[Vec<RuleGroup>]) -> Result<StyleBlock> {
    let location = parser.current_source_location();

    let selectors = parser
        .parse_until_before(Delimiter::CurlyBracketBlock, |p| {
            p.parse_comma_separated(parse_selector)
        })
        .map_err(|e| match e.kind {
            ParseErrorKind::Custom(err) => err,
            ParseErrorKind::Basic(basic) => Error::parse(
                format!("Failed to parse selector: {:?}", basic),
                location.line + 1,
                location.column,
            ),
        })?;

    let declarations = match parser.next() {
        Ok(Token::CurlyBracketBlock) => parser
            .parse_nested_block(|p| Ok::<_, CssParseError<'_, ()>>(parse_declarations(p)))
            .map_err(|e| {
                Error::parse(
                    format!("Failed to parse declaration block: {:?}", e.kind),
                    e.location.line + 1,
                    e.location.column,
                )
            })?,
        _ => {
            return Err(Error::parse(
                "Expected '{' after selector",
                location.line + 1,
                location.column,
            ));
        }
    };

    Ok(StyleBlock {
        selectors,
        at_rules: at_rules.to_vec(),
        declarations,
    })
}

/// Parse one selector of a selector list.
///
/// Shapes outside the supported set come back as [`Selector::Unsupported`]
/// rather than failing the whole list.
fn parse_selector<'i>(parser: &mut Parser<'i, '_>) -> SelectorResult<'i, Selector> {
    parser.skip_whitespace();
    let start = parser.position();

    let mut name: Option<String> = None;
    let mut pseudo_classes = vec![];
    let mut child: Option<ChildScope> = None;
    let mut root = false;
    let mut supported = true;
    let mut after_space = false;

    loop {
        let token = match parser.next_including_whitespace() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };

        match token {
            Token::WhiteSpace(_) => {
                after_space = true;
                continue;
            }
            Token::Delim('.') if name.is_none() && !root && !after_space => {
                let class = parser.expect_ident().ok().map(|class| class.to_string());
                match class {
                    Some(class) => name = Some(class),
                    None => {
                        return Err(parser.new_custom_error(Error::invalid_selector(
                            parser.slice_from(start),
                            "Expected class name after '.'",
                        )));
                    }
                }
            }
            Token::Delim('*') if name.is_none() && !root => root = true,
            Token::Delim('>') if name.is_some() && child.is_none() => {
                if matches!(parser.next()?, Token::Delim('*')) {
                    child = Some(ChildScope::default());
                } else {
                    supported = false;
                }
            }
            Token::Delim('+') if child.is_some() => {
                if matches!(parser.next()?, Token::Delim('*')) {
                    if let Some(child) = child.as_mut() {
                        child.pseudo_classes.push("not-first-child".to_string());
                    }
                } else {
                    supported = false;
                }
            }
            Token::Colon if !after_space => match parse_pseudo_class(parser)? {
                Some(pseudo) if pseudo == "root" && name.is_none() => root = true,
                Some(pseudo) if pseudo == "children" && name.is_some() && child.is_none() => {
                    child = Some(ChildScope::default());
                }
                Some(pseudo) => match child.as_mut() {
                    Some(child) => child.pseudo_classes.push(pseudo),
                    None => pseudo_classes.push(pseudo),
                },
                None => supported = false,
            },
            _ => supported = false,
        }

        after_space = false;
    }

    let text = parser.slice_from(start).trim().to_string();

    let selector = match name {
        _ if !supported => Selector::Unsupported(text),
        Some(name) if !root => Selector::Class {
            name,
            pseudo_classes,
            child,
        },
        None if root && pseudo_classes.is_empty() => Selector::Root,
        _ => Selector::Unsupported(text),
    };

    Ok(selector)
}

/// Read the name after `:`. Functional pseudo-classes are mapped to
/// condition names where one exists; `None` marks an unsupported pseudo.
fn parse_pseudo_class<'i>(parser: &mut Parser<'i, '_>) -> SelectorResult<'i, Option<String>> {
    let token = parser.next_including_whitespace()?.clone();

    match token {
        Token::Ident(name) => Ok(Some(name.to_string())),
        Token::Function(name) => {
            let name = name.to_ascii_lowercase();
            let argument = parser.parse_nested_block(|p| {
                let start = p.position();
                while p.next().is_ok() {}
                Ok::<_, CssParseError<'i, Error>>(p.slice_from(start).replace(char::is_whitespace, ""))
            })?;

            let condition = match (name.as_str(), argument.as_str()) {
                ("nth-child", "odd") | ("nth-child", "2n+1") => Some("odd"),
                ("nth-child", "even") | ("nth-child", "2n") => Some("even"),
                ("not", ":first-child") => Some("not-first-child"),
                ("not", ":last-child") => Some("not-last-child"),
                _ => None,
            };
            Ok(condition.map(str::to_string))
        }
        _ => Ok(None),
    }
}

/// Parse CSS declarations. Malformed declarations are skipped.
fn parse_declarations(parser: &mut Parser<'_, '_>) -> Vec<Declaration> {
    let mut declarations = vec![];

    loop {
        parser.skip_whitespace();

        if parser.is_exhausted() {
            break;
        }

        let property = parser.expect_ident().ok().map(|name| name.to_string());
        let Some(property) = property else {
            tracing::debug!(target: targets::CSS, "skipping malformed declaration");
            skip_declaration(parser);
            continue;
        };

        if parser.expect_colon().is_err() {
            tracing::debug!(target: targets::CSS, "expected ':' after '{}'", property);
            skip_declaration(parser);
            continue;
        }

        let value = parser.parse_until_after(Delimiter::Semicolon, |p| {
            let start = p.position();
            while p.next().is_ok() {}
            Ok::<_, CssParseError<'_, ()>>(p.slice_from(start).to_string())
        });

        match value {
            Ok(value) => {
                let value = strip_important(&value);
                if value.is_empty() {
                    tracing::debug!(target: targets::CSS, "skipping empty value for '{}'", property);
                } else {
                    declarations.push(Declaration::new(property, value));
                }
            }
            Err(e) => {
                tracing::warn!(target: targets::CSS, "Failed to parse property '{}': {:?}", property, e.kind);
            }
        }
    }

    declarations
}

/// Drop a trailing `!important` flag.
fn strip_important(value: &str) -> &str {
    let value = value.trim();
    if let Some(bang) = value.rfind('!')
        && value[bang + 1..].trim().eq_ignore_ascii_case("important")
    {
        return value[..bang].trim_end();
    }
    value
}

/// Skip to the end of the current rule (its block or a `;`).
fn skip_to_next_rule(parser: &mut Parser<'_, '_>) {
    loop {
        match parser.next() {
            Ok(Token::CurlyBracketBlock) => {
                let _ = parser.parse_nested_block(|p| {
                    while !p.is_exhausted() {
                        let _ = p.next();
                    }
                    Ok::<_, CssParseError<'_, ()>>(())
                });
                return;
            }
            Ok(Token::Semicolon) | Err(_) => return,
            _ => {}
        }
    }
}

/// Skip to the end of the current declaration.
fn skip_declaration(parser: &mut Parser<'_, '_>) {
    loop {
        match parser.next() {
            Ok(Token::Semicolon) | Err(_) => return,
            _ => {}
        }
    }
}
