//! Namespace shortening of term URLs.

use recform_model::NameShortener;

/// Rewrites known URL prefixes to `NS:rest`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixShortener {
    prefixes: Vec<(String, String)>,
}

impl PrefixShortener {
    /// A shortener without any prefixes.
    pub fn empty() -> Self {
        Self {
            prefixes: Vec::new(),
        }
    }

    /// Adds a `prefix` → `namespace` rule. Earlier rules win.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>, namespace: impl Into<String>) -> Self {
        self.prefixes.push((prefix.into(), namespace.into()));
        self
    }

    pub fn prefixes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.prefixes
            .iter()
            .map(|(prefix, namespace)| (prefix.as_str(), namespace.as_str()))
    }
}

impl Default for PrefixShortener {
    fn default() -> Self {
        Self::empty().with_prefix("https://www.wikidata.org/wiki/", "WD")
    }
}

impl NameShortener for PrefixShortener {
    fn shorten(&self, term: &str) -> String {
        self.prefixes
            .iter()
            .find_map(|(prefix, namespace)| {
                term.strip_prefix(prefix.as_str())
                    .filter(|rest| !rest.is_empty())
                    .map(|rest| format!("{namespace}:{rest}"))
            })
            .unwrap_or_else(|| term.to_string())
    }
}
