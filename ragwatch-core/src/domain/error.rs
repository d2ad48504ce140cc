// ragwatch-core/src/domain/error.rs

use crate::domain::entity::RagIndicator;
use crate::domain::rules::RuleError;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DomainError {
    #[error("Configuration Error: {0}")]
    #[diagnostic(
        code(ragwatch::domain::configuration),
        help("Check the entity metadata JSON and the active environment name.")
    )]
    Configuration(String),

    #[error("No source strategy with name '{0}' is registered")]
    #[diagnostic(
        code(ragwatch::domain::strategy_not_found),
        help("Register the strategy at startup or fix the entity's source name.")
    )]
    StrategyNotFound(String),

    #[error("Invalid argument: {0}")]
    #[diagnostic(code(ragwatch::domain::invalid_argument))]
    InvalidArgument(String),

    #[error("{indicator} rule of '{entity}' failed: {source}")]
    #[diagnostic(
        code(ragwatch::domain::rule),
        help("Run `ragwatch check` to compile every configured expression.")
    )]
    RuleEvaluation {
        entity: String,
        indicator: RagIndicator,
        #[source]
        source: RuleError,
    },
}
