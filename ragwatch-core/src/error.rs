// ragwatch-core/src/error.rs

use crate::domain::error::DomainError;
use crate::infrastructure::error::{InfrastructureError, TransportError};
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum RagwatchError {
    // --- DOMAIN ERRORS (configuration, strategy lookup, rules) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Domain(#[from] DomainError),

    // --- INFRASTRUCTURE ERRORS (transport, parsing, IO) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Infrastructure(#[from] InfrastructureError),

    // --- CYCLE CONTROL ---
    #[error("Aggregation cycle cancelled")]
    #[diagnostic(code(ragwatch::cancelled))]
    Cancelled,

    #[error("Internal Error: {0}")]
    InternalError(String),
}

impl RagwatchError {
    /// True when the error stems from an unregistered source kind.
    pub fn is_strategy_not_found(&self) -> bool {
        matches!(self, RagwatchError::Domain(DomainError::StrategyNotFound(_)))
    }
}

// Shortcuts so adapters can use `?` on transport and JSON failures directly.
impl From<TransportError> for RagwatchError {
    fn from(err: TransportError) -> Self {
        RagwatchError::Infrastructure(InfrastructureError::Transport(err))
    }
}

impl From<serde_json::Error> for RagwatchError {
    fn from(err: serde_json::Error) -> Self {
        RagwatchError::Infrastructure(InfrastructureError::Json(err))
    }
}

impl From<std::io::Error> for RagwatchError {
    fn from(err: std::io::Error) -> Self {
        RagwatchError::Infrastructure(InfrastructureError::Io(err))
    }
}
