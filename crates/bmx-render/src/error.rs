use bmx_parser::{Position, SyntaxError};

use crate::function::FunctionError;
use crate::value::Kind;

/// Evaluation error. Every variant raised during a render names the
/// position of the tag that failed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("unknown helper `{name}` at {position}")]
    UnknownHelper { name: String, position: Position },

    #[error("unknown partial `{name}` at {position}")]
    UnknownPartial { name: String, position: Position },

    #[error("unknown decorator `{name}` at {position}")]
    UnknownDecorator { name: String, position: Position },

    #[error("helper `{name}` cannot open a block at {position}")]
    NotABlockHelper { name: String, position: Position },

    #[error("block helper `{name}` used as a value at {position}")]
    BlockHelperAsValue { name: String, position: Position },

    /// Mustaches refuse to print undefined values, lists and contexts.
    #[error("cannot print {kind} value at {position}")]
    Unprintable { kind: Kind, position: Position },

    #[error("partial name must be a string, found {kind} at {position}")]
    InvalidPartialName { kind: Kind, position: Position },

    #[error("helper `{name}` failed at {position}: {source}")]
    Helper {
        name: String,
        source: FunctionError,
        position: Position,
    },

    #[error("decorator `{name}` failed at {position}: {source}")]
    Decorator {
        name: String,
        source: FunctionError,
        position: Position,
    },

    /// Two entries with one name in the same registry.
    #[error("duplicate {registry} `{name}`")]
    Shadowing { registry: &'static str, name: String },

    #[error("render suspended outside an async runtime")]
    Suspended,
}

impl EvalError {
    pub fn position(&self) -> Option<Position> {
        match self {
            EvalError::UnknownHelper { position, .. }
            | EvalError::UnknownPartial { position, .. }
            | EvalError::UnknownDecorator { position, .. }
            | EvalError::NotABlockHelper { position, .. }
            | EvalError::BlockHelperAsValue { position, .. }
            | EvalError::Unprintable { position, .. }
            | EvalError::InvalidPartialName { position, .. }
            | EvalError::Helper { position, .. }
            | EvalError::Decorator { position, .. } => Some(*position),
            EvalError::Shadowing { .. } | EvalError::Suspended => None,
        }
    }
}

/// Any failure of `render_source`: the template did not parse, or it did
/// and rendering failed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BmxError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error(transparent)]
    Eval(#[from] EvalError),
}

impl BmxError {
    /// Byte offset of the failure in the template source, when known.
    pub fn offset(&self) -> Option<usize> {
        match self {
            BmxError::Syntax(e) => Some(e.offset()),
            BmxError::Eval(e) => e.position().map(|p| p.offset),
        }
    }
}
