//! CSS front end.
//!
//! Turns the style framework's generated CSS into a flat declaration tree:
//! ordered blocks, each with its selectors, its enclosing at-rule stack and
//! its raw declarations. Values stay unparsed here; the extractor runs them
//! through [`expr::parse`](crate::expr::parse).

mod ast;
mod parser;

pub use ast::{ChildScope, Declaration, Selector, StyleBlock, StyleSheet};
pub use parser::parse_css;
