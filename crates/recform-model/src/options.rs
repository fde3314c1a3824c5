//! Configuration options for normalization and formatting.

use serde::{Deserialize, Serialize};

/// Options for schema normalization runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeOptions {
    /// Replace directive terms by their slug (and register the pair).
    pub slugify: bool,

    /// Shorten term URLs into namespaced names before anything else.
    pub namespace: bool,

    /// Bypass resolver caches when a schema has to be looked up.
    pub refresh: bool,
}

impl NormalizeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_slugify(mut self, enable: bool) -> Self {
        self.slugify = enable;
        self
    }

    #[must_use]
    pub fn with_namespace(mut self, enable: bool) -> Self {
        self.namespace = enable;
        self
    }

    #[must_use]
    pub fn with_refresh(mut self, enable: bool) -> Self {
        self.refresh = enable;
        self
    }
}

/// Options for the key-suffix formatter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatOptions {
    /// Keys (base name or full `base#converter` spelling) whose values are
    /// passed through unconverted. The suffix is still stripped.
    #[serde(default)]
    pub ignore: Vec<String>,

    /// Converter names treated as identity.
    #[serde(default)]
    pub skip: Vec<String>,

    /// Suppress conversion-failure diagnostics.
    #[serde(default)]
    pub silent: bool,
}

impl FormatOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_ignore(mut self, keys: Vec<String>) -> Self {
        self.ignore = keys;
        self
    }

    #[must_use]
    pub fn with_skip(mut self, converters: Vec<String>) -> Self {
        self.skip = converters;
        self
    }

    #[must_use]
    pub fn with_silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    pub fn ignores(&self, base: &str, full: &str) -> bool {
        self.ignore.iter().any(|key| key == base || key == full)
    }

    pub fn skips(&self, converter: &str) -> bool {
        self.skip.iter().any(|name| name == converter)
    }
}
