// ragwatch-core/src/ports/source.rs

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use crate::domain::entity::{BusinessEntity, DataDomainConfig, DataMetric, JobRun};
use crate::domain::error::DomainError;
use crate::error::RagwatchError;
use crate::ports::cancellation::Cancellation;

/// Per-cycle parameters shared by every strategy call.
#[derive(Debug, Clone)]
pub struct FetchContext {
    /// Optional as-of filter forwarded to the upstream sources.
    pub as_of: Option<NaiveDate>,
    /// Cycle start, used to stamp synthetic and degraded records.
    pub requested_at: NaiveDateTime,
    pub cancel: Cancellation,
}

impl FetchContext {
    pub fn new(requested_at: NaiveDateTime) -> Self {
        Self {
            as_of: None,
            requested_at,
            cancel: Cancellation::never(),
        }
    }

    pub fn with_as_of(mut self, as_of: Option<NaiveDate>) -> Self {
        self.as_of = as_of;
        self
    }

    pub fn with_cancellation(mut self, cancel: Cancellation) -> Self {
        self.cancel = cancel;
        self
    }

    /// As-of date to stamp on records the upstream did not date itself.
    pub fn effective_as_of(&self) -> NaiveDate {
        self.as_of.unwrap_or_else(|| self.requested_at.date())
    }
}

/// One implementation per upstream source kind.
#[async_trait]
pub trait SourceStrategy: Send + Sync {
    /// Registry key, matched case-insensitively against `SourceConfig.name`.
    fn name(&self) -> &str;

    /// Offline pre-flight: metadata parses and the active environment
    /// resolves for every entity. No network I/O.
    fn validate(&self, entities: &[BusinessEntity]) -> Result<(), RagwatchError>;

    /// Fetches the runs of a whole group of entities sharing this source.
    async fn fetch_runs(
        &self,
        entities: &[BusinessEntity],
        ctx: &FetchContext,
    ) -> Result<Vec<JobRun>, RagwatchError>;

    /// Raw metrics of one data domain. Run-shaped sources report one metric
    /// per run; metric-shaped sources override this.
    async fn fetch_domain_metrics(
        &self,
        domain: &DataDomainConfig,
        ctx: &FetchContext,
    ) -> Result<Vec<DataMetric>, RagwatchError> {
        let entity = domain.as_business_entity();
        let runs = self.fetch_runs(std::slice::from_ref(&entity), ctx).await?;
        Ok(runs.iter().map(DataMetric::from_run).collect())
    }
}

/// Group precondition shared by all strategies: non-empty, and every
/// entity names the same source.
pub fn check_group(strategy: &str, entities: &[BusinessEntity]) -> Result<(), DomainError> {
    let Some(first) = entities.first() else {
        return Err(DomainError::InvalidArgument(format!(
            "'{}' requires at least one business entity",
            strategy
        )));
    };
    if let Some(stray) = entities
        .iter()
        .find(|e| !e.source.name.eq_ignore_ascii_case(&first.source.name))
    {
        return Err(DomainError::InvalidArgument(format!(
            "'{}' received a mixed group: '{}' uses source '{}', '{}' uses '{}'",
            strategy, first.name, first.source.name, stray.name, stray.source.name
        )));
    }
    Ok(())
}
