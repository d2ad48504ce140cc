// ragwatch-core/src/infrastructure/error.rs

use miette::Diagnostic;
use thiserror::Error;

/// Failure of one remote call. Strings only, so fakes can build them.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum TransportError {
    #[error("Request to '{url}' failed: {message}")]
    #[diagnostic(
        code(ragwatch::infra::transport::request),
        help("Check that the upstream service is reachable from this host.")
    )]
    Request { url: String, message: String },

    #[error("Request to '{url}' timed out")]
    #[diagnostic(
        code(ragwatch::infra::transport::timeout),
        help("Raise http.request_timeout_secs or RAGWATCH_REQUEST_TIMEOUT_SECS.")
    )]
    Timeout { url: String },

    #[error("'{url}' answered HTTP {status}")]
    #[diagnostic(code(ragwatch::infra::transport::status))]
    Status { url: String, status: u16 },

    #[error("GraphQL errors from '{url}': {messages}")]
    #[diagnostic(code(ragwatch::infra::transport::graphql))]
    GraphQl { url: String, messages: String },

    #[error("Cannot decode response from '{url}': {message}")]
    #[diagnostic(
        code(ragwatch::infra::transport::decode),
        help("The upstream payload no longer matches the expected shape.")
    )]
    Decode { url: String, message: String },
}

impl TransportError {
    pub fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        let url = url.to_string();
        if err.is_timeout() {
            TransportError::Timeout { url }
        } else if let Some(status) = err.status() {
            TransportError::Status {
                url,
                status: status.as_u16(),
            }
        } else if err.is_decode() {
            TransportError::Decode {
                url,
                message: err.to_string(),
            }
        } else {
            TransportError::Request {
                url,
                message: err.to_string(),
            }
        }
    }
}

#[derive(Error, Debug, Diagnostic)]
pub enum InfrastructureError {
    // --- REMOTE SOURCES ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Transport(#[from] TransportError),

    // --- FILESYSTEM (IO) ---
    #[error("File System Error: {0}")]
    #[diagnostic(
        code(ragwatch::infra::io),
        help("Check file permissions or path validity.")
    )]
    Io(#[from] std::io::Error),

    // --- SERIALIZATION ---
    #[error("JSON Error: {0}")]
    #[diagnostic(code(ragwatch::infra::json))]
    Json(#[from] serde_json::Error),

    #[error("YAML Parsing Error: {0}")]
    #[diagnostic(
        code(ragwatch::infra::yaml),
        help("Check your YAML syntax (indentation, types).")
    )]
    Yaml(#[from] serde_yaml::Error),

    // --- CONFIG ---
    #[error("Configuration Error: {0}")]
    ConfigError(String),

    #[error("Configuration not found at '{0}'")]
    #[diagnostic(code(ragwatch::infra::config_missing))]
    ConfigNotFound(String),

    #[error("Invalid configuration: {0}")]
    #[diagnostic(code(ragwatch::infra::validation))]
    Validation(#[from] validator::ValidationErrors),
}
