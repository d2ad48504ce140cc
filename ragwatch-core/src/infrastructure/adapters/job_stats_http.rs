// ragwatch-core/src/infrastructure/adapters/job_stats_http.rs

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use tracing::{debug, instrument};

use crate::domain::entity::JobRun;
use crate::infrastructure::adapters::mapping::decode_job_stats;
use crate::infrastructure::error::TransportError;
use crate::ports::transport::{JobStatsApi, JobStatsQuery};

/// reqwest client for the data-load statistics service.
#[derive(Debug, Clone)]
pub struct HttpJobStatsApi {
    client: reqwest::Client,
}

impl HttpJobStatsApi {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::from_reqwest("<client>", e))?;
        Ok(Self { client })
    }
}

/// `{base}/api/JobStats?RecordAsOfDate=..&BusinessEntities=a&BusinessEntities=b`.
/// The date is only sent when the cycle carries an as-of filter.
pub fn job_stats_url(query: &JobStatsQuery) -> Result<Url, TransportError> {
    let base = format!("{}/", query.base_url.trim_end_matches('/'));
    let mut url = Url::parse(&base)
        .and_then(|b| b.join("api/JobStats"))
        .map_err(|e| TransportError::Request {
            url: query.base_url.clone(),
            message: format!("invalid base URL: {}", e),
        })?;

    {
        let mut pairs = url.query_pairs_mut();
        if let Some(as_of) = query.record_as_of_date {
            pairs.append_pair(
                "RecordAsOfDate",
                &as_of.format("%Y-%m-%dT%H:%M:%S").to_string(),
            );
        }
        for entity in &query.business_entities {
            pairs.append_pair("BusinessEntities", entity);
        }
    }
    Ok(url)
}

#[async_trait]
impl JobStatsApi for HttpJobStatsApi {
    #[instrument(skip(self, query), fields(entities = query.business_entities.len()))]
    async fn job_stats(&self, query: &JobStatsQuery) -> Result<Vec<JobRun>, TransportError> {
        let url = job_stats_url(query)?;
        let shown = url.to_string();
        debug!(url = %shown, "GET job stats");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(&shown, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: shown,
                status: status.as_u16(),
            });
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| TransportError::from_reqwest(&shown, e))?;

        decode_job_stats(body).map_err(|e| TransportError::Decode {
            url: shown,
            message: e.to_string(),
        })
    }
}
