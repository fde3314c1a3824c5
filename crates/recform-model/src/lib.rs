//! Shared types for recform: record trees, paths, directives, schemas and
//! the collaborator interfaces the normalizer calls through.

pub mod collaborators;
pub mod directive;
pub mod error;
pub mod node;
pub mod options;
pub mod path;
pub mod schema;
pub mod slug;

pub use collaborators::{
    Concept, ConceptResolver, NameShortener, SchemaResolver, TermRecord, TermRegistry,
};
pub use directive::{DIRECTIVE_KEY, Directive, RULE_SEPARATOR};
pub use error::{PathError, RegistryError, Result};
pub use node::{Node, NodeKind, NodeMap, is_scalar, is_truthy};
pub use options::{FormatOptions, NormalizeOptions};
pub use path::{Path, Segment};
pub use schema::Schema;
pub use slug::{slug, slugify};
