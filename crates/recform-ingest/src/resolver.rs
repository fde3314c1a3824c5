//! Schema documents looked up in a directory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use recform_model::{DIRECTIVE_KEY, Node, SchemaResolver, slug};
use tracing::{debug, warn};

use crate::document::load_document;

/// Schema key naming another schema whose fields this one extends.
pub const EXTENDS_KEY: &str = "_:extends";

const EXTENSIONS: &[&str] = &["json", "yaml", "yml"];
const MAX_EXTENDS_DEPTH: usize = 16;

/// Resolves schema identifiers to `<slug(identifier)>.{json,yaml,yml}` files
/// under a directory. For URL-like identifiers the slug of the last path
/// segment is tried as well.
///
/// A schema map carrying [`EXTENDS_KEY`] is laid over the schema it names:
/// the named schema's fields come first, the extending schema's own fields
/// replace them key by key.
#[derive(Debug)]
pub struct DirectorySchemaResolver {
    root: PathBuf,
    cache: Mutex<HashMap<String, Option<Node>>>,
}

impl DirectorySchemaResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Candidate files for `identifier`, in lookup order.
    pub fn candidates(&self, identifier: &str) -> Vec<PathBuf> {
        let identifier = identifier.trim().trim_end_matches('/');
        let mut stems = vec![slug(identifier)];
        if let Some((_, last)) = identifier.rsplit_once('/') {
            let short = slug(last);
            if !short.is_empty() && !stems.contains(&short) {
                stems.push(short);
            }
        }
        stems
            .iter()
            .filter(|stem| !stem.is_empty())
            .flat_map(|stem| {
                EXTENSIONS
                    .iter()
                    .map(move |extension| self.root.join(format!("{stem}.{extension}")))
            })
            .collect()
    }

    fn load(&self, identifier: &str, refresh: bool, depth: usize) -> Option<Node> {
        let path = self
            .candidates(identifier)
            .into_iter()
            .find(|candidate| candidate.is_file())?;
        let document = match load_document(&path) {
            Ok(document) => document,
            Err(error) => {
                warn!(%error, identifier, "schema document unreadable");
                return None;
            }
        };
        Some(self.extend(document, refresh, depth))
    }

    fn extend(&self, document: Node, refresh: bool, depth: usize) -> Node {
        let Node::Object(mut fields) = document else {
            return document;
        };
        let Some(parent) = fields.remove(EXTENDS_KEY) else {
            return Node::Object(fields);
        };
        let Some(parent) = parent.as_str() else {
            debug!("ignoring non-string schema extension");
            return Node::Object(fields);
        };
        if depth >= MAX_EXTENDS_DEPTH {
            warn!(parent, "schema extension chain too deep");
            return Node::Object(fields);
        }
        match self.lookup(parent, refresh, depth + 1) {
            Some(Node::Object(mut base)) => {
                base.remove(DIRECTIVE_KEY);
                base.extend(fields);
                Node::Object(base)
            }
            _ => {
                debug!(parent, "extended schema not found");
                Node::Object(fields)
            }
        }
    }

    fn lookup(&self, identifier: &str, refresh: bool, depth: usize) -> Option<Node> {
        if !refresh
            && let Ok(cache) = self.cache.lock()
            && let Some(cached) = cache.get(identifier)
        {
            return cached.clone();
        }
        let resolved = self.load(identifier, refresh, depth);
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(identifier.to_string(), resolved.clone());
        }
        resolved
    }
}

impl SchemaResolver for DirectorySchemaResolver {
    fn resolve(&self, identifier: &str, refresh: bool) -> Option<Node> {
        self.lookup(identifier, refresh, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidates_use_slugs() {
        let resolver = DirectorySchemaResolver::new("schemas");
        let names: Vec<_> = resolver
            .candidates("https://example.org/Schemas/People")
            .into_iter()
            .map(|path| path.strip_prefix("schemas").map(Path::to_path_buf).unwrap_or(path))
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("https-example-org-schemas-people.json"),
                PathBuf::from("https-example-org-schemas-people.yaml"),
                PathBuf::from("https-example-org-schemas-people.yml"),
                PathBuf::from("people.json"),
                PathBuf::from("people.yaml"),
                PathBuf::from("people.yml"),
            ]
        );
        assert!(resolver.candidates("   ").is_empty());
    }
}
