//! Zipping data trees against schema trees.
//!
//! Every node of the data tree is looked up in the schema by its schema path
//! (sequence indices collapsed to `0`). Where the schema has an entry, its
//! directive renames the key and converts the value; where it has none, the
//! node is left exactly as it was.

use std::sync::LazyLock;

use recform_model::{
    DIRECTIVE_KEY, NameShortener, Node, NormalizeOptions, Schema, SchemaResolver, TermRegistry,
};
use recform_rules::Converters;
use tracing::debug;

use crate::shorten::PrefixShortener;
use crate::walk::{Visit, walk};

static DEFAULT_SHORTENER: LazyLock<PrefixShortener> = LazyLock::new(PrefixShortener::default);

/// Schema normalizer with its collaborators.
///
/// ```
/// use recform_core::Normalizer;
/// use recform_model::{NormalizeOptions, Schema};
/// use serde_json::json;
///
/// let schema = Schema::from_node(&json!({"A": {"*": "a_b"}}));
/// let normalizer = Normalizer::new().with_options(NormalizeOptions::new().with_slugify(true));
/// assert_eq!(normalizer.normalize(&json!({"A": 1}), Some(&schema)), json!({"a-b": 1}));
/// ```
#[derive(Default)]
pub struct Normalizer<'a> {
    pub(crate) converters: Converters,
    pub(crate) options: NormalizeOptions,
    pub(crate) registry: Option<&'a dyn TermRegistry>,
    shortener: Option<&'a dyn NameShortener>,
    resolver: Option<&'a dyn SchemaResolver>,
}

impl<'a> Normalizer<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_converters(mut self, converters: Converters) -> Self {
        self.converters = converters;
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: NormalizeOptions) -> Self {
        self.options = options;
        self
    }

    /// Registry that receives `(slug, term)` pairs when slugging is on.
    #[must_use]
    pub fn with_registry(mut self, registry: &'a dyn TermRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Shortener used when namespace shortening is on. Defaults to
    /// [`PrefixShortener::default`].
    #[must_use]
    pub fn with_shortener(mut self, shortener: &'a dyn NameShortener) -> Self {
        self.shortener = Some(shortener);
        self
    }

    /// Resolver for schemas named by the data root's `*` field.
    #[must_use]
    pub fn with_resolver(mut self, resolver: &'a dyn SchemaResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn options(&self) -> &NormalizeOptions {
        &self.options
    }

    pub fn converters(&self) -> &Converters {
        &self.converters
    }

    pub(crate) fn shortener(&self) -> &dyn NameShortener {
        match self.shortener {
            Some(shortener) => shortener,
            None => &*DEFAULT_SHORTENER,
        }
    }

    /// Normalizes `data` against `schema`. Without a schema, one is resolved
    /// from the data root's `*` field; failing that, `data` is returned as is.
    pub fn normalize(&self, data: &Node, schema: Option<&Schema>) -> Node {
        let embedded;
        let schema = match schema {
            Some(schema) => schema,
            None => match self.embedded_schema(data) {
                Some(found) => {
                    embedded = found;
                    &embedded
                }
                None => return data.clone(),
            },
        };

        walk(data.clone(), |parent, key, value| {
            let Some(key) = key else {
                return Visit::Keep(value);
            };
            let location = parent.schema_path().child(key.to_schema());
            let Some(entry) = schema.get(&location).ok().and_then(Schema::representative) else {
                return Visit::Keep(value);
            };
            let (renamed, value) = self.convert(key, value, entry);
            Visit::entry(key, renamed, value)
        })
    }

    fn embedded_schema(&self, data: &Node) -> Option<Schema> {
        let identifier = data.as_object()?.get(DIRECTIVE_KEY)?.as_str()?;
        let Some(resolver) = self.resolver else {
            debug!(identifier, "no schema resolver configured");
            return None;
        };
        let document = resolver.resolve(identifier, self.options.refresh);
        if document.is_none() {
            debug!(identifier, "schema not found");
        }
        document.as_ref().map(Schema::from_node)
    }
}

/// Normalizes with default options, built-in converters and no collaborators.
pub fn normalize(data: &Node, schema: &Schema) -> Node {
    Normalizer::new().normalize(data, Some(schema))
}
