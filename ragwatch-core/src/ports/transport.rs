// ragwatch-core/src/ports/transport.rs
//
// Wire-level contracts for the HTTP sources. Strategies only see these
// traits, so tests swap in in-memory fakes.

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::domain::entity::JobRun;
use crate::infrastructure::error::TransportError;

#[derive(Debug, Clone, PartialEq)]
pub struct JobStatsQuery {
    pub base_url: String,
    pub business_entities: Vec<String>,
    pub record_as_of_date: Option<NaiveDateTime>,
}

/// `GET {base}/api/JobStats`, decoded into canonical runs.
#[async_trait]
pub trait JobStatsApi: Send + Sync {
    async fn job_stats(&self, query: &JobStatsQuery) -> Result<Vec<JobRun>, TransportError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphQlRequest {
    pub url: String,
    pub query: String,
    pub variables: serde_json::Value,
}

#[async_trait]
pub trait GraphQlTransport: Send + Sync {
    /// Returns the `data` member. A non-empty `errors` array is reported as
    /// `TransportError::GraphQl`.
    async fn execute(&self, request: &GraphQlRequest) -> Result<serde_json::Value, TransportError>;
}
