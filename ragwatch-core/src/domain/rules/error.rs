// ragwatch-core/src/domain/rules/error.rs

use crate::domain::entity::RagIndicator;
use thiserror::Error;

/// Raised while turning expression text into an AST.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("expression is empty")]
    Empty,

    #[error("syntax error at offset {position}: {message}")]
    Syntax { position: usize, message: String },

    #[error("unknown identifier '{name}' at offset {position}")]
    UnknownIdentifier { name: String, position: usize },

    #[error("unknown member '{name}' at offset {position}")]
    UnknownMember { name: String, position: usize },

    #[error("'{method}' at offset {position} expects {expected}")]
    Arity {
        method: String,
        expected: &'static str,
        position: usize,
    },
}

/// Raised while running a compiled expression against a run set.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("type mismatch: {operation} is not defined for {found}")]
    TypeMismatch { operation: String, found: String },

    #[error("{0}() called on an empty sequence")]
    EmptySequence(&'static str),

    #[error("expression produced {0}, expected a boolean")]
    NotBoolean(String),

    #[error("{0} is out of range")]
    OutOfRange(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuleError {
    #[error("cannot compile `{expression}`: {source}")]
    Compile {
        expression: String,
        #[source]
        source: CompileError,
    },

    #[error("cannot evaluate `{expression}`: {source}")]
    Evaluation {
        expression: String,
        #[source]
        source: EvalError,
    },
}

impl RuleError {
    pub fn is_compile(&self) -> bool {
        matches!(self, RuleError::Compile { .. })
    }
}

/// A rule error tagged with the RAG expression it came from.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{indicator} expression: {source}")]
pub struct RuleFailure {
    pub indicator: RagIndicator,
    #[source]
    pub source: RuleError,
}
