use recform_model::NodeKind;
use thiserror::Error;

/// A rule or converter could not produce a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    #[error("syntax error at offset {offset}: {message}")]
    Syntax { offset: usize, message: String },

    #[error("unknown converter `{0}`")]
    UnknownConverter(String),

    #[error("name `{0}` is not defined")]
    UnknownName(String),

    #[error("unsupported operands for `{op}`: {left} and {right}")]
    Operands {
        op: &'static str,
        left: NodeKind,
        right: NodeKind,
    },

    #[error("{function}() does not accept {kind}")]
    Argument { function: String, kind: NodeKind },

    #[error("{function}() takes {expected} argument(s), got {actual}")]
    Arity {
        function: String,
        expected: usize,
        actual: usize,
    },

    #[error("{kind} has no method `{method}`")]
    NoMethod { kind: NodeKind, method: String },

    #[error("cannot read {value:?} as {target}")]
    Invalid { target: &'static str, value: String },

    #[error("{0}")]
    Eval(String),
}

impl ConversionError {
    pub(crate) fn syntax(offset: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            offset,
            message: message.into(),
        }
    }

    pub(crate) fn invalid(target: &'static str, value: impl Into<String>) -> Self {
        Self::Invalid {
            target,
            value: value.into(),
        }
    }
}
