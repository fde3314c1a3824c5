//! Named value converters.
//!
//! A [`Converters`] registry maps names such as `integer` or `isodate` to
//! conversion functions. Rules refer to them by name (`integer`,
//! `converters.integer`) or call them from a lambda body, and the key-suffix
//! formatter looks them up from the `#name` suffix of a key.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use recform_model::{Node, NodeKind, is_scalar};
use rust_decimal::Decimal;
use tracing::warn;

use crate::error::ConversionError;
use crate::value::{Num, display_string, num, to_float, to_int};

/// A conversion function stored in the registry.
pub type Converter = Arc<dyn Fn(&Node) -> Result<Node, ConversionError> + Send + Sync>;

/// Output layout of `isodate` and `unixtime`.
pub const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y%m%dT%H%M%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y%m%d", "%Y/%m/%d"];

/// Registry of named converters.
#[derive(Clone)]
pub struct Converters {
    entries: BTreeMap<String, Converter>,
}

impl Converters {
    /// A registry without any converters.
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// The built-in converters: `object`, `integer`, `rational`, `decimal`,
    /// `string`, `isodate`, `unixtime` and `url`.
    pub fn with_builtins() -> Self {
        let mut converters = Self::empty();
        converters.register("object", object);
        converters.register("integer", to_int);
        converters.register("rational", to_float);
        converters.register("decimal", decimal);
        converters.register("string", string);
        converters.register("isodate", isodate);
        converters.register("unixtime", unixtime);
        converters.register("url", url);
        converters
    }

    /// Adds or replaces a converter.
    pub fn register<F>(&mut self, name: impl Into<String>, converter: F)
    where
        F: Fn(&Node) -> Result<Node, ConversionError> + Send + Sync + 'static,
    {
        self.entries.insert(name.into(), Arc::new(converter));
    }

    #[must_use]
    pub fn with<F>(mut self, name: impl Into<String>, converter: F) -> Self
    where
        F: Fn(&Node) -> Result<Node, ConversionError> + Send + Sync + 'static,
    {
        self.register(name, converter);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Converter> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn convert(&self, name: &str, value: &Node) -> Result<Node, ConversionError> {
        let converter = self
            .get(name)
            .ok_or_else(|| ConversionError::UnknownConverter(name.to_string()))?;
        converter(value)
    }

    /// Converts `value`, falling back to the original on failure. Failures
    /// are logged unless `silent`.
    pub fn apply(&self, name: &str, value: &Node, silent: bool) -> Node {
        match self.convert(name, value) {
            Ok(converted) => converted,
            Err(error) => {
                if !silent {
                    warn!(converter = name, value = %value, %error, "conversion failed");
                }
                value.clone()
            }
        }
    }
}

impl Default for Converters {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for Converters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}

fn wrong_kind(function: &str, node: &Node) -> ConversionError {
    ConversionError::Argument {
        function: function.to_string(),
        kind: NodeKind::of(node),
    }
}

fn object(node: &Node) -> Result<Node, ConversionError> {
    match node {
        Node::Object(_) => Ok(node.clone()),
        other => Err(wrong_kind("object", other)),
    }
}

fn string(node: &Node) -> Result<Node, ConversionError> {
    if is_scalar(node) {
        Ok(Node::String(display_string(node)))
    } else {
        Err(wrong_kind("string", node))
    }
}

fn decimal(node: &Node) -> Result<Node, ConversionError> {
    let text = match node {
        Node::String(text) => text.trim().to_string(),
        Node::Number(number) => number.to_string(),
        other => return Err(wrong_kind("decimal", other)),
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map(|value| Node::String(value.to_string()))
        .map_err(|_| ConversionError::invalid("decimal", text))
}

fn url(node: &Node) -> Result<Node, ConversionError> {
    let text = node.as_str().ok_or_else(|| wrong_kind("url", node))?;
    url::Url::parse(text.trim())
        .map(|parsed| Node::String(parsed.to_string()))
        .map_err(|_| ConversionError::invalid("url", text))
}

fn isodate(node: &Node) -> Result<Node, ConversionError> {
    let text = node.as_str().ok_or_else(|| wrong_kind("isodate", node))?;
    parse_isodate(text.trim())
        .map(Node::String)
        .ok_or_else(|| ConversionError::invalid("isodate", text))
}

/// Parses an ISO-8601-like timestamp. Offsets are kept (RFC 3339 output);
/// naive values are emitted in [`ISO_FORMAT`].
pub fn parse_isodate(text: &str) -> Option<String> {
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(text) {
        return Some(with_offset.to_rfc3339());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|moment| moment.format(ISO_FORMAT).to_string())
}

fn unixtime(node: &Node) -> Result<Node, ConversionError> {
    let seconds = match node {
        Node::String(text) => text
            .trim()
            .parse::<f64>()
            .map(Num::Float)
            .map_err(|_| ConversionError::invalid("unixtime", text.as_str()))?,
        other => num(other).ok_or_else(|| wrong_kind("unixtime", other))?,
    };
    let moment = match seconds {
        Num::Int(whole) => DateTime::from_timestamp(whole, 0),
        Num::Float(value) if value.is_finite() => {
            let whole = value.floor();
            let nanos = ((value - whole) * 1e9).round() as u32;
            DateTime::from_timestamp(whole as i64, nanos.min(999_999_999))
        }
        Num::Float(_) => None,
    };
    moment
        .map(|moment| Node::String(moment.naive_utc().format(ISO_FORMAT).to_string()))
        .ok_or_else(|| ConversionError::invalid("unixtime", node.to_string()))
}
