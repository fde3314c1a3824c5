//! Value rules for recform directives.
//!
//! The rule half of a directive (`term|rule`) is either the name of a
//! registered converter or a one-parameter lambda in a small, closed
//! expression language:
//!
//! ```text
//! integer
//! converters.isodate
//! lambda x: x.replace(',', '')
//! lambda x: {0: "NEED", 1: "GOAL"}.get(x)
//! ```
//!
//! Rules are parsed into a [`Rule`] and applied to a single value with a
//! [`Converters`] registry in scope.

pub mod ast;
pub mod converters;
pub mod error;
mod eval;
mod lexer;
mod parser;
mod value;

use std::fmt;
use std::str::FromStr;

use recform_model::Node;

pub use converters::{Converter, Converters, ISO_FORMAT, parse_isodate};
pub use error::ConversionError;

use crate::ast::Expr;
use crate::eval::Scope;
use crate::parser::{Parsed, parse_rule};

/// A parsed value rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    source: String,
    body: Body,
}

#[derive(Debug, Clone, PartialEq)]
enum Body {
    Converter(String),
    Lambda { param: String, expr: Expr },
}

impl Rule {
    pub fn parse(source: &str) -> Result<Self, ConversionError> {
        let body = match parse_rule(source.trim())? {
            Parsed::Converter(name) => Body::Converter(name),
            Parsed::Lambda { param, body } => Body::Lambda { param, expr: body },
        };
        Ok(Self {
            source: source.trim().to_string(),
            body,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// The converter a named rule refers to, if it is not a lambda.
    pub fn converter_name(&self) -> Option<&str> {
        match &self.body {
            Body::Converter(name) => Some(name.as_str()),
            Body::Lambda { .. } => None,
        }
    }

    pub fn apply(&self, value: &Node, converters: &Converters) -> Result<Node, ConversionError> {
        match &self.body {
            Body::Converter(name) => converters.convert(name, value),
            Body::Lambda { param, expr } => Scope {
                param,
                value,
                converters,
            }
            .eval(expr),
        }
    }
}

impl FromStr for Rule {
    type Err = ConversionError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        Self::parse(source)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Parses and applies `source` in one step.
pub fn apply_rule(
    source: &str,
    value: &Node,
    converters: &Converters,
) -> Result<Node, ConversionError> {
    Rule::parse(source)?.apply(value, converters)
}
