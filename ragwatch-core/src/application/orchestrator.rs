// ragwatch-core/src/application/orchestrator.rs

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::NaiveDate;
use futures::future::try_join_all;
use tracing::{debug, info, instrument};

use crate::application::registry::StrategyRegistry;
use crate::domain::entity::{
    BusinessEntity, DataDomain, DataDomainConfig, EntitySummary, JobRun, RagStatus,
};
use crate::domain::error::DomainError;
use crate::domain::rules::{RuleEvaluator, RuleFailure};
use crate::error::RagwatchError;
use crate::ports::cancellation::Cancellation;
use crate::ports::clock::Clock;
use crate::ports::repository::EntityRepository;
use crate::ports::source::{FetchContext, SourceStrategy};

/// Result of an offline configuration check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreflightReport {
    pub entities: usize,
    /// (strategy name, entity count), in first-seen order.
    pub sources: Vec<(String, usize)>,
    pub compiled_rules: usize,
}

/// Runs one aggregation cycle: load entities, fan out to source strategies,
/// collate runs per entity and evaluate the RAG rules.
///
/// Any failure aborts the cycle; partial summaries are never returned.
pub struct AggregationOrchestrator {
    repository: Arc<dyn EntityRepository>,
    registry: StrategyRegistry,
    evaluator: RuleEvaluator,
    clock: Arc<dyn Clock>,
    include_entities_without_runs: bool,
}

struct SourceGroup {
    strategy: Arc<dyn SourceStrategy>,
    entities: Vec<BusinessEntity>,
}

impl AggregationOrchestrator {
    pub fn new(
        repository: Arc<dyn EntityRepository>,
        registry: StrategyRegistry,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            registry,
            evaluator: RuleEvaluator::new(),
            clock,
            include_entities_without_runs: false,
        }
    }

    /// Entities without runs are evaluated over an empty run set instead of
    /// being left out of the result.
    pub fn with_entities_without_runs(mut self, include: bool) -> Self {
        self.include_entities_without_runs = include;
        self
    }

    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    pub fn evaluator(&self) -> &RuleEvaluator {
        &self.evaluator
    }

    pub async fn summarize(
        &self,
        cancel: &Cancellation,
    ) -> Result<Vec<EntitySummary>, RagwatchError> {
        self.summarize_as_of(None, cancel).await
    }

    /// Like [`summarize`](Self::summarize), forwarding `as_of` to every source.
    #[instrument(skip(self, cancel))]
    pub async fn summarize_as_of(
        &self,
        as_of: Option<NaiveDate>,
        cancel: &Cancellation,
    ) -> Result<Vec<EntitySummary>, RagwatchError> {
        let requested_at = self.clock.now();
        let reference = self.clock.today();

        let entities = cancel
            .guard(self.repository.load_active_business_entities())
            .await??;
        info!(entities = entities.len(), "Loaded active business entities");

        // Every strategy is resolved before the first remote call.
        let groups = self.plan(entities)?;

        let ctx = FetchContext::new(requested_at)
            .with_as_of(as_of)
            .with_cancellation(cancel.clone());

        let batches = try_join_all(groups.iter().map(|group| {
            let ctx = &ctx;
            async move {
                let runs = group.strategy.fetch_runs(&group.entities, ctx).await?;
                debug!(
                    strategy = group.strategy.name(),
                    runs = runs.len(),
                    "Source returned"
                );
                Ok::<_, RagwatchError>(runs)
            }
        }))
        .await?;

        if cancel.is_cancelled() {
            return Err(RagwatchError::Cancelled);
        }

        let mut runs_by_entity: HashMap<String, Vec<JobRun>> = HashMap::new();
        for run in batches.into_iter().flatten() {
            runs_by_entity
                .entry(run.business_entity.to_lowercase())
                .or_default()
                .push(run);
        }

        let mut entities: Vec<BusinessEntity> =
            groups.into_iter().flat_map(|g| g.entities).collect();
        entities.sort_by(|a, b| a.name.cmp(&b.name));

        let mut summaries = Vec::with_capacity(entities.len());
        for entity in &entities {
            let runs = runs_by_entity
                .remove(&entity.name.to_lowercase())
                .unwrap_or_default();
            if runs.is_empty() && !self.include_entities_without_runs {
                debug!(entity = %entity.name, "No runs, entity left out");
                continue;
            }

            let status = self
                .evaluator
                .evaluate(&runs, &entity.rag, reference)
                .map_err(|failure| rule_error(entity, failure))?;
            summaries.push(build_summary(entity, &runs, status));
        }

        for (unknown, runs) in &runs_by_entity {
            debug!(entity = %unknown, runs = runs.len(), "Dropping runs of an unknown entity");
        }

        info!(summaries = summaries.len(), "Aggregation cycle complete");
        Ok(summaries)
    }

    /// Collects the raw metrics of every active data domain, concurrently,
    /// sorted by domain name. No rules are evaluated.
    #[instrument(skip(self, cancel))]
    pub async fn domains(
        &self,
        as_of: Option<NaiveDate>,
        cancel: &Cancellation,
    ) -> Result<Vec<DataDomain>, RagwatchError> {
        let configs = cancel
            .guard(self.repository.load_active_data_domains())
            .await??;
        info!(domains = configs.len(), "Loaded active data domains");

        ensure_unique_names("Data domain", configs.iter().map(|d| d.name.as_str()))?;
        let planned = configs
            .into_iter()
            .map(|config| -> Result<_, DomainError> {
                Ok((self.registry.get(&config.source.name)?, config))
            })
            .collect::<Result<Vec<(Arc<dyn SourceStrategy>, DataDomainConfig)>, _>>()?;

        let ctx = FetchContext::new(self.clock.now())
            .with_as_of(as_of)
            .with_cancellation(cancel.clone());

        let mut domains = try_join_all(planned.iter().map(|(strategy, config)| {
            let ctx = &ctx;
            async move {
                let metrics = strategy.fetch_domain_metrics(config, ctx).await?;
                debug!(domain = %config.name, metrics = metrics.len(), "Domain collected");
                Ok::<_, RagwatchError>(DataDomain {
                    id: config.id,
                    name: config.name.clone(),
                    metrics,
                })
            }
        }))
        .await?;

        if cancel.is_cancelled() {
            return Err(RagwatchError::Cancelled);
        }

        domains.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(domains)
    }

    /// Offline check of the whole configuration: every source resolves, every
    /// strategy accepts its entities' metadata, every rule compiles.
    #[instrument(skip(self))]
    pub async fn preflight(&self) -> Result<PreflightReport, RagwatchError> {
        let entities = self.repository.load_active_business_entities().await?;
        let count = entities.len();
        let groups = self.plan(entities)?;

        let mut sources = Vec::with_capacity(groups.len());
        for group in &groups {
            group.strategy.validate(&group.entities)?;
            for entity in &group.entities {
                self.evaluator
                    .check(&entity.rag)
                    .map_err(|failure| rule_error(entity, failure))?;
            }
            sources.push((group.strategy.name().to_string(), group.entities.len()));
        }

        Ok(PreflightReport {
            entities: count,
            sources,
            compiled_rules: self.evaluator.cached_rules(),
        })
    }

    /// Groups entities by source name (case-insensitive, first-seen order)
    /// and resolves each group's strategy.
    fn plan(&self, entities: Vec<BusinessEntity>) -> Result<Vec<SourceGroup>, DomainError> {
        ensure_unique_names("Business entity", entities.iter().map(|e| e.name.as_str()))?;

        let mut order: Vec<String> = Vec::new();
        let mut by_source: HashMap<String, Vec<BusinessEntity>> = HashMap::new();
        for entity in entities {
            let key = entity.source.name.to_lowercase();
            if !by_source.contains_key(&key) {
                order.push(key.clone());
            }
            by_source.entry(key).or_default().push(entity);
        }

        order
            .into_iter()
            .filter_map(|key| by_source.remove(&key))
            .map(|entities| -> Result<SourceGroup, DomainError> {
                let name = entities
                    .first()
                    .map(|e| e.source.name.clone())
                    .unwrap_or_default();
                Ok(SourceGroup {
                    strategy: self.registry.get(&name)?,
                    entities,
                })
            })
            .collect()
    }
}

fn ensure_unique_names<'a>(
    kind: &str,
    names: impl IntoIterator<Item = &'a str>,
) -> Result<(), DomainError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name.to_lowercase()) {
            return Err(DomainError::Configuration(format!(
                "{} '{}' is configured more than once",
                kind, name
            )));
        }
    }
    Ok(())
}

fn rule_error(entity: &BusinessEntity, failure: RuleFailure) -> RagwatchError {
    DomainError::RuleEvaluation {
        entity: entity.name.clone(),
        indicator: failure.indicator,
        source: failure.source,
    }
    .into()
}

fn build_summary(entity: &BusinessEntity, runs: &[JobRun], rag_status: RagStatus) -> EntitySummary {
    EntitySummary {
        business_entity_id: entity.id,
        business_entity: entity.name.clone(),
        display_name: entity.display_name().to_string(),
        application_owner: entity.application_owner.clone(),
        latest_load_date: runs
            .iter()
            .filter(|r| !r.is_degraded())
            .map(|r| r.record_as_of_date)
            .max(),
        total_records_loaded: runs
            .iter()
            .fold(0u64, |total, r| total.saturating_add(r.record_loaded)),
        dependent_funcs: entity.dependent_funcs(),
        rag_status,
    }
}
