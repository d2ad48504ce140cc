// ragwatch-core/src/infrastructure/adapters/graphql_http.rs

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, instrument};

use crate::infrastructure::error::TransportError;
use crate::ports::transport::{GraphQlRequest, GraphQlTransport};

#[derive(Debug, Clone)]
pub struct HttpGraphQlTransport {
    client: reqwest::Client,
}

impl HttpGraphQlTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::from_reqwest("<client>", e))?;
        Ok(Self { client })
    }
}

#[derive(Debug, Deserialize)]
struct GraphQlEnvelope {
    #[serde(default)]
    data: Value,
    #[serde(default)]
    errors: Option<Vec<GraphQlErrorItem>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorItem {
    #[serde(default)]
    message: String,
}

/// Splits an envelope into `data`, turning a non-empty `errors` array into
/// a transport failure.
fn unwrap_envelope(url: &str, envelope: GraphQlEnvelope) -> Result<Value, TransportError> {
    let errors = envelope.errors.unwrap_or_default();
    if !errors.is_empty() {
        let messages = errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(TransportError::GraphQl {
            url: url.to_string(),
            messages,
        });
    }
    Ok(envelope.data)
}

/// `{base}/{path}` with exactly one slash between.
pub fn endpoint_url(base_url: &str, endpoint_path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        endpoint_path.trim_start_matches('/')
    )
}

#[async_trait]
impl GraphQlTransport for HttpGraphQlTransport {
    #[instrument(skip(self, request), fields(url = %request.url))]
    async fn execute(&self, request: &GraphQlRequest) -> Result<Value, TransportError> {
        debug!(query = %request.query, "POST GraphQL query");
        let body = json!({
            "query": request.query,
            "variables": request.variables,
        });

        let response = self
            .client
            .post(&request.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(&request.url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: request.url.clone(),
                status: status.as_u16(),
            });
        }

        let envelope: GraphQlEnvelope = response
            .json()
            .await
            .map_err(|e| TransportError::from_reqwest(&request.url, e))?;
        unwrap_envelope(&request.url, envelope)
    }
}
