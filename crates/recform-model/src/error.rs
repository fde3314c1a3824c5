use thiserror::Error;

use crate::node::NodeKind;
use crate::path::{Path, Segment};

/// A path could not be resolved against a tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("no entry `{segment}` under {at}")]
    Missing { at: Path, segment: Segment },

    #[error("cannot step into {kind} with `{segment}` at {at}")]
    TypeMismatch {
        at: Path,
        segment: Segment,
        kind: NodeKind,
    },
}

impl PathError {
    pub fn missing(at: &Path, segment: &Segment) -> Self {
        Self::Missing {
            at: at.clone(),
            segment: segment.clone(),
        }
    }

    pub fn mismatch(at: &Path, segment: &Segment, kind: NodeKind) -> Self {
        Self::TypeMismatch {
            at: at.clone(),
            segment: segment.clone(),
            kind,
        }
    }
}

/// Term registry failures. Callers in the normalizer swallow these.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("term `{name}` is already registered")]
    Conflict { name: String },

    #[error("term registry unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, PathError>;
