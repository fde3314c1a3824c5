//! Interfaces to the services the normalizer leans on.
//!
//! Implementations live elsewhere (in-memory ones in `recform-core`,
//! file-backed ones in `recform-ingest`); the core only sees these traits.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;
use crate::node::Node;

/// A slug together with the term it was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TermRecord {
    pub name: String,
    pub url: String,
}

/// Store of slug → original term pairs. Registration is best-effort.
pub trait TermRegistry: Send + Sync {
    /// Records `record`; a duplicate name is a [`RegistryError::Conflict`].
    fn register(&self, record: TermRecord) -> Result<(), RegistryError>;

    /// Looks up the original term for a slug.
    fn lookup(&self, name: &str) -> Option<TermRecord> {
        let _ = name;
        None
    }
}

/// Resolves a schema identifier (a URL or a short name) to a schema document.
pub trait SchemaResolver: Send + Sync {
    /// Returns `None` when no schema is known; `refresh` bypasses any cache.
    fn resolve(&self, identifier: &str, refresh: bool) -> Option<Node>;
}

/// A concept with its per-language aliases, most preferred first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concept {
    #[serde(default)]
    pub aliases: BTreeMap<String, Vec<String>>,
}

impl Concept {
    /// First alias in `lang`, if any.
    pub fn alias(&self, lang: &str) -> Option<&str> {
        self.aliases.get(lang)?.first().map(String::as_str)
    }
}

/// Resolves a key to its canonical concept.
pub trait ConceptResolver: Send + Sync {
    fn resolve_concept(&self, key: &str, refresh: bool) -> Option<Concept>;
}

/// Shortens long term URLs into namespaced names (`WD:Q82799`).
pub trait NameShortener: Send + Sync {
    fn shorten(&self, term: &str) -> String;
}
