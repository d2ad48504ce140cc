// ragwatch/src/wiring.rs
//
// Dependency injection: adapters in, orchestrator out.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use ragwatch_core::application::{AggregationOrchestrator, StrategyRegistry};
use ragwatch_core::infrastructure::adapters::{HttpGraphQlTransport, HttpJobStatsApi};
use ragwatch_core::infrastructure::config::{Settings, YamlEntityRepository, load_settings};
use ragwatch_core::infrastructure::strategies::{
    GraphQlStrategy, StatisticsStrategy, SyntheticStrategy,
};
use ragwatch_core::ports::{SourceStrategy, SystemClock};

pub fn load(config_dir: &Path) -> anyhow::Result<Settings> {
    load_settings(config_dir).with_context(|| {
        format!(
            "Failed to load ragwatch configuration from {:?}",
            config_dir
        )
    })
}

pub fn build_orchestrator(
    settings: &Settings,
    config_dir: &Path,
) -> anyhow::Result<AggregationOrchestrator> {
    let timeout = settings.request_timeout();
    let job_stats =
        Arc::new(HttpJobStatsApi::new(timeout).context("Failed to build the statistics client")?);
    let graphql =
        Arc::new(HttpGraphQlTransport::new(timeout).context("Failed to build the GraphQL client")?);

    let strategies: Vec<Arc<dyn SourceStrategy>> = vec![
        Arc::new(StatisticsStrategy::new(job_stats, settings.environment.clone())),
        Arc::new(
            GraphQlStrategy::new(graphql, settings.environment.clone())
                .with_endpoints_without_effective_date(
                    settings.graphql.endpoints_without_effective_date.clone(),
                ),
        ),
        Arc::new(SyntheticStrategy::new()),
    ];
    let registry = StrategyRegistry::from_strategies(strategies)?;

    let repository = Arc::new(YamlEntityRepository::new(
        settings.entities_file(config_dir),
    ));

    Ok(
        AggregationOrchestrator::new(repository, registry, Arc::new(SystemClock))
            .with_entities_without_runs(settings.summary.include_entities_without_runs),
    )
}
