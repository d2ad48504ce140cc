// ragwatch-core/src/infrastructure/strategies/statistics.rs

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveTime;
use futures::future::try_join_all;
use serde::Deserialize;
use tracing::{info, instrument};

use crate::domain::entity::{BusinessEntity, JobRun};
use crate::error::RagwatchError;
use crate::infrastructure::strategies::metadata::{
    EnvironmentConfig, parse_metadata, resolve_base_url,
};
use crate::ports::source::{FetchContext, SourceStrategy, check_group};
use crate::ports::transport::{JobStatsApi, JobStatsQuery};

pub const STATISTICS_SOURCE: &str = "Data Load Statistic Service";

#[derive(Debug, Deserialize)]
struct StatisticsMetadata {
    #[serde(default)]
    environments: Vec<EnvironmentConfig>,
}

/// Batched fetch from the data-load statistics API. Transport failures
/// abort the whole group.
pub struct StatisticsStrategy {
    api: Arc<dyn JobStatsApi>,
    environment: String,
}

impl StatisticsStrategy {
    pub fn new(api: Arc<dyn JobStatsApi>, environment: impl Into<String>) -> Self {
        Self {
            api,
            environment: environment.into(),
        }
    }

    fn base_url(&self, entity: &BusinessEntity) -> Result<String, RagwatchError> {
        let meta: StatisticsMetadata = parse_metadata(entity)?;
        Ok(resolve_base_url(&meta.environments, &self.environment, entity)?)
    }

    /// One query per distinct base URL, entity order preserved. Entities
    /// normally share one URL, which gives a single batched call.
    fn plan(
        &self,
        entities: &[BusinessEntity],
        ctx: &FetchContext,
    ) -> Result<Vec<JobStatsQuery>, RagwatchError> {
        let as_of = ctx.as_of.map(|d| d.and_time(NaiveTime::MIN));
        let mut queries: Vec<JobStatsQuery> = Vec::new();
        for entity in entities {
            let base_url = self.base_url(entity)?;
            match queries.iter_mut().find(|q| q.base_url == base_url) {
                Some(q) => q.business_entities.push(entity.name.clone()),
                None => queries.push(JobStatsQuery {
                    base_url,
                    business_entities: vec![entity.name.clone()],
                    record_as_of_date: as_of,
                }),
            }
        }
        Ok(queries)
    }
}

#[async_trait]
impl SourceStrategy for StatisticsStrategy {
    fn name(&self) -> &str {
        STATISTICS_SOURCE
    }

    fn validate(&self, entities: &[BusinessEntity]) -> Result<(), RagwatchError> {
        for entity in entities {
            self.base_url(entity)?;
        }
        Ok(())
    }

    #[instrument(skip_all, fields(strategy = STATISTICS_SOURCE, entities = entities.len()))]
    async fn fetch_runs(
        &self,
        entities: &[BusinessEntity],
        ctx: &FetchContext,
    ) -> Result<Vec<JobRun>, RagwatchError> {
        check_group(STATISTICS_SOURCE, entities)?;
        let queries = self.plan(entities, ctx)?;
        info!(calls = queries.len(), "Fetching job stats");

        let batches = try_join_all(queries.iter().map(|query| async move {
            let runs = ctx.cancel.guard(self.api.job_stats(query)).await??;
            Ok::<_, RagwatchError>(runs)
        }))
        .await?;

        Ok(batches.into_iter().flatten().collect())
    }
}
