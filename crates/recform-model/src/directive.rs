//! Schema directives: `<term>|<rule>`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Key under which a schema map carries its directive.
pub const DIRECTIVE_KEY: &str = "*";

/// Separator between the target term and the rule expression.
pub const RULE_SEPARATOR: char = '|';

/// A parsed directive. Either half may be empty: an empty term keeps the
/// original key, an empty rule passes the value through.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Directive {
    pub term: String,
    pub rule: String,
}

impl Directive {
    pub fn new(term: impl Into<String>, rule: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            rule: rule.into(),
        }
    }

    /// Parses a directive string. Never fails: a missing separator makes the
    /// whole string the term, and only the first `|` separates (rules may
    /// themselves contain `|`). Both halves are kept verbatim, so `"a |b"`
    /// renames to `"a "`.
    pub fn parse(raw: &str) -> Self {
        match raw.split_once(RULE_SEPARATOR) {
            Some((term, rule)) => Self::new(term, rule),
            None => Self::new(raw, ""),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.term.is_empty() && self.rule.is_empty()
    }

    pub fn term(&self) -> Option<&str> {
        (!self.term.is_empty()).then_some(self.term.as_str())
    }

    pub fn rule(&self) -> Option<&str> {
        (!self.rule.is_empty()).then_some(self.rule.as_str())
    }
}

impl FromStr for Directive {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

/// Renders back to the schema string form. A rule-less directive is written
/// as the bare term, so `Directive::parse(&d.to_string()) == d`.
impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rule.is_empty() {
            f.write_str(&self.term)
        } else {
            write!(f, "{}{RULE_SEPARATOR}{}", self.term, self.rule)
        }
    }
}
