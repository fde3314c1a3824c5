//! In-memory collaborators: a term registry and a concept table.

use std::collections::BTreeMap;
use std::sync::Mutex;

use recform_model::{Concept, ConceptResolver, Node, RegistryError, TermRecord, TermRegistry};

/// Term registry kept in memory. Duplicate names are rejected.
#[derive(Debug, Default)]
pub struct MemoryTermRegistry {
    records: Mutex<BTreeMap<String, TermRecord>>,
}

impl MemoryTermRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registered records ordered by name.
    pub fn records(&self) -> Vec<TermRecord> {
        self.records
            .lock()
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TermRegistry for MemoryTermRegistry {
    fn register(&self, record: TermRecord) -> Result<(), RegistryError> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| RegistryError::Unavailable("registry lock poisoned".to_string()))?;
        if records.contains_key(&record.name) {
            return Err(RegistryError::Conflict { name: record.name });
        }
        records.insert(record.name.clone(), record);
        Ok(())
    }

    fn lookup(&self, name: &str) -> Option<TermRecord> {
        self.records.lock().ok()?.get(name).cloned()
    }
}

/// Concept resolver over a fixed table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticConceptResolver {
    concepts: BTreeMap<String, Concept>,
}

impl StaticConceptResolver {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_concept(mut self, key: impl Into<String>, concept: Concept) -> Self {
        self.concepts.insert(key.into(), concept);
        self
    }

    /// Reads a `{key: {"aliases": {lang: [alias, ..]}}}` document.
    pub fn from_node(document: &Node) -> Result<Self, serde_json::Error> {
        let concepts = serde_json::from_value(document.clone())?;
        Ok(Self { concepts })
    }

    pub fn len(&self) -> usize {
        self.concepts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }
}

impl ConceptResolver for StaticConceptResolver {
    fn resolve_concept(&self, key: &str, _refresh: bool) -> Option<Concept> {
        self.concepts.get(key).cloned()
    }
}
