//! Term registry persisted as a JSON file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use recform_model::{RegistryError, TermRecord, TermRegistry};
use tracing::debug;

use crate::error::{IngestError, Result};

/// Term registry backed by a JSON array of `{name, url}` records.
///
/// The file is read once when the registry is opened and rewritten after
/// every successful registration. Duplicate names are rejected.
#[derive(Debug)]
pub struct JsonTermRegistry {
    path: PathBuf,
    records: Mutex<BTreeMap<String, TermRecord>>,
}

impl JsonTermRegistry {
    /// Opens the registry at `path`; a missing file is an empty registry.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let records = if path.exists() {
            let text =
                std::fs::read_to_string(&path).map_err(|source| IngestError::io(&path, source))?;
            let list: Vec<TermRecord> = if text.trim().is_empty() {
                Vec::new()
            } else {
                serde_json::from_str(&text).map_err(|source| IngestError::json(&path, source))?
            };
            list.into_iter()
                .map(|record| (record.name.clone(), record))
                .collect()
        } else {
            BTreeMap::new()
        };
        debug!(path = %path.display(), terms = records.len(), "opened term registry");
        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Registered records ordered by name.
    pub fn records(&self) -> Vec<TermRecord> {
        self.records
            .lock()
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default()
    }

    fn save(&self, records: &BTreeMap<String, TermRecord>) -> Result<()> {
        let list: Vec<&TermRecord> = records.values().collect();
        let text =
            serde_json::to_string_pretty(&list).map_err(|source| IngestError::json(&self.path, source))?;
        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| IngestError::io(parent, source))?;
        }
        std::fs::write(&self.path, text).map_err(|source| IngestError::io(&self.path, source))
    }
}

impl TermRegistry for JsonTermRegistry {
    fn register(&self, record: TermRecord) -> std::result::Result<(), RegistryError> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| RegistryError::Unavailable("term registry lock poisoned".to_string()))?;
        if records.contains_key(&record.name) {
            return Err(RegistryError::Conflict { name: record.name });
        }
        let name = record.name.clone();
        records.insert(name.clone(), record);
        if let Err(error) = self.save(&records) {
            records.remove(&name);
            return Err(RegistryError::Unavailable(error.to_string()));
        }
        Ok(())
    }

    fn lookup(&self, name: &str) -> Option<TermRecord> {
        self.records.lock().ok()?.get(name).cloned()
    }
}
