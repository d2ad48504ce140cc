// ragwatch-core/src/infrastructure/strategies/graphql.rs

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use futures::future::try_join_all;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{info, instrument, warn};

use crate::domain::entity::{BusinessEntity, DataDomainConfig, DataMetric, JobRun};
use crate::error::RagwatchError;
use crate::infrastructure::adapters::graphql_http::endpoint_url;
use crate::infrastructure::adapters::mapping::{
    decode_data_load_matrix, metric_from_row, run_from_metric,
};
use crate::infrastructure::error::TransportError;
use crate::infrastructure::strategies::metadata::{
    EnvironmentConfig, parse_metadata, resolve_base_url,
};
use crate::ports::source::{FetchContext, SourceStrategy, check_group};
use crate::ports::transport::{GraphQlRequest, GraphQlTransport};

pub const GRAPHQL_SOURCE: &str = "GraphQL";

const SELECTION: &str = "{ count effectiveDate entityKey }";

#[derive(Debug, Deserialize)]
struct GraphQlMetadata {
    #[serde(default)]
    environments: Vec<EnvironmentConfig>,
    #[serde(rename = "endpointpath", default = "default_endpoint_path")]
    endpoint_path: String,
    #[serde(rename = "entitykeys", default)]
    entity_keys: Vec<KeyMapping>,
}

fn default_endpoint_path() -> String {
    "graphql".to_string()
}

/// `"BENCHMARK"` or `{"key": "BENCHMARK", "entity": "Securities"}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum KeyMapping {
    Key(String),
    Mapped {
        key: String,
        #[serde(default)]
        entity: Option<String>,
    },
}

impl KeyMapping {
    fn key(&self) -> &str {
        match self {
            KeyMapping::Key(key) | KeyMapping::Mapped { key, .. } => key,
        }
    }

    fn entity(&self) -> Option<&str> {
        match self {
            KeyMapping::Key(_) => None,
            KeyMapping::Mapped { entity, .. } => entity.as_deref(),
        }
    }
}

/// A metric plus the business entity it is credited to.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyedMetric {
    pub business_entity: String,
    pub metric: DataMetric,
}

/// One `dataLoadMatrix` call and the entities its rows are credited to.
#[derive(Debug, Clone, PartialEq)]
struct SubQuery {
    url: String,
    key: Option<String>,
    /// Entities whose metadata listed this (url, key), in group order.
    /// An explicit `entity` mapping replaces them.
    owners: Vec<String>,
}

impl SubQuery {
    fn same_call(&self, url: &str, key: Option<&str>) -> bool {
        self.url == url && self.key.as_deref() == key
    }
}

/// `dataLoadMatrix` query text for the four argument combinations.
pub fn data_load_matrix_query(entity_name: bool, effective_date: bool) -> String {
    match (entity_name, effective_date) {
        (true, true) => format!(
            "query ($entityName: String!, $effectiveDate: DateTime) {{ dataLoadMatrix(entityName: $entityName, effectiveDate: $effectiveDate) {} }}",
            SELECTION
        ),
        (true, false) => format!(
            "query ($entityName: String!) {{ dataLoadMatrix(entityName: $entityName) {} }}",
            SELECTION
        ),
        (false, true) => format!(
            "query ($effectiveDate: DateTime) {{ dataLoadMatrix(effectiveDate: $effectiveDate) {} }}",
            SELECTION
        ),
        (false, false) => format!("query {{ dataLoadMatrix {} }}", SELECTION),
    }
}

/// Fans out one query per entity key. A failing key becomes a degraded
/// metric carrying the error text; the other keys are unaffected.
pub struct GraphQlStrategy {
    transport: Arc<dyn GraphQlTransport>,
    environment: String,
    endpoints_without_effective_date: Vec<String>,
}

impl GraphQlStrategy {
    pub fn new(transport: Arc<dyn GraphQlTransport>, environment: impl Into<String>) -> Self {
        Self {
            transport,
            environment: environment.into(),
            endpoints_without_effective_date: Vec::new(),
        }
    }

    /// Endpoints whose URL contains any of `patterns` (case-insensitive)
    /// never receive `effectiveDate`.
    pub fn with_endpoints_without_effective_date(mut self, patterns: Vec<String>) -> Self {
        self.endpoints_without_effective_date = patterns
            .into_iter()
            .map(|p| p.to_lowercase())
            .filter(|p| !p.trim().is_empty())
            .collect();
        self
    }

    fn accepts_effective_date(&self, url: &str) -> bool {
        let url = url.to_lowercase();
        !self
            .endpoints_without_effective_date
            .iter()
            .any(|p| url.contains(p.as_str()))
    }

    pub fn build_request(
        &self,
        url: &str,
        key: Option<&str>,
        effective_date: Option<NaiveDate>,
    ) -> GraphQlRequest {
        let effective_date = effective_date.filter(|_| self.accepts_effective_date(url));

        let mut variables = Map::new();
        if let Some(key) = key {
            variables.insert("entityName".into(), Value::String(key.to_string()));
        }
        if let Some(date) = effective_date {
            let stamp = date.and_time(NaiveTime::MIN).format("%Y-%m-%dT%H:%M:%S");
            variables.insert("effectiveDate".into(), Value::String(stamp.to_string()));
        }

        GraphQlRequest {
            url: url.to_string(),
            query: data_load_matrix_query(key.is_some(), effective_date.is_some()),
            variables: Value::Object(variables),
        }
    }

    /// Resolves every entity's endpoint and keys. Identical (url, key) pairs
    /// shared by several entities are queried once and credited to each of
    /// them.
    fn plan(&self, entities: &[BusinessEntity]) -> Result<Vec<SubQuery>, RagwatchError> {
        let mut plan: Vec<SubQuery> = Vec::new();
        for entity in entities {
            let meta: GraphQlMetadata = parse_metadata(entity)?;
            let base_url = resolve_base_url(&meta.environments, &self.environment, entity)?;
            let url = endpoint_url(&base_url, &meta.endpoint_path);

            let wanted: Vec<(Option<&str>, &str)> = if meta.entity_keys.is_empty() {
                vec![(None, entity.name.as_str())]
            } else {
                meta.entity_keys
                    .iter()
                    .map(|m| (Some(m.key()), m.entity().unwrap_or(&entity.name)))
                    .collect()
            };

            for (key, owner) in wanted {
                match plan.iter_mut().find(|q| q.same_call(&url, key)) {
                    Some(query) => {
                        if !query.owners.iter().any(|o| o == owner) {
                            query.owners.push(owner.to_string());
                        }
                    }
                    None => plan.push(SubQuery {
                        url: url.clone(),
                        key: key.map(str::to_string),
                        owners: vec![owner.to_string()],
                    }),
                }
            }
        }
        Ok(plan)
    }

    fn credit(owners: &[String], metric: DataMetric) -> impl Iterator<Item = KeyedMetric> + '_ {
        owners.iter().map(move |owner| KeyedMetric {
            business_entity: owner.clone(),
            metric: metric.clone(),
        })
    }

    async fn run_sub_query(
        &self,
        query: &SubQuery,
        ctx: &FetchContext,
    ) -> Result<Vec<KeyedMetric>, RagwatchError> {
        let request = self.build_request(&query.url, query.key.as_deref(), ctx.as_of);
        let label = query.key.clone().unwrap_or_default();

        let outcome = ctx
            .cancel
            .guard(self.transport.execute(&request))
            .await?
            .and_then(|data| {
                decode_data_load_matrix(&data).map_err(|e| TransportError::Decode {
                    url: request.url.clone(),
                    message: e.to_string(),
                })
            });

        match outcome {
            Ok(rows) => Ok(rows
                .into_iter()
                .flat_map(|row| {
                    Self::credit(&query.owners, metric_from_row(query.key.as_deref(), row))
                })
                .collect()),
            Err(err) => {
                warn!(key = %label, error = %err, "GraphQL sub-query failed, emitting degraded record");
                let message = if label.is_empty() {
                    err.to_string()
                } else {
                    format!("{}: {}", label, err)
                };
                Ok(Self::credit(&query.owners, DataMetric::degraded(label, message)).collect())
            }
        }
    }

    #[instrument(skip_all, fields(strategy = GRAPHQL_SOURCE, entities = entities.len()))]
    pub async fn fetch_metrics(
        &self,
        entities: &[BusinessEntity],
        ctx: &FetchContext,
    ) -> Result<Vec<KeyedMetric>, RagwatchError> {
        check_group(GRAPHQL_SOURCE, entities)?;
        let plan = self.plan(entities)?;
        info!(sub_queries = plan.len(), "Querying dataLoadMatrix");

        let results =
            try_join_all(plan.iter().map(|query| self.run_sub_query(query, ctx))).await?;
        Ok(results.into_iter().flatten().collect())
    }
}

#[async_trait]
impl SourceStrategy for GraphQlStrategy {
    fn name(&self) -> &str {
        GRAPHQL_SOURCE
    }

    fn validate(&self, entities: &[BusinessEntity]) -> Result<(), RagwatchError> {
        self.plan(entities).map(|_| ())
    }

    async fn fetch_runs(
        &self,
        entities: &[BusinessEntity],
        ctx: &FetchContext,
    ) -> Result<Vec<JobRun>, RagwatchError> {
        let fallback_as_of = ctx.effective_as_of();
        Ok(self
            .fetch_metrics(entities, ctx)
            .await?
            .iter()
            .map(|m| {
                run_from_metric(&m.business_entity, &m.metric, ctx.requested_at, fallback_as_of)
            })
            .collect())
    }

    /// Metrics are reported as queried, one per row and key.
    async fn fetch_domain_metrics(
        &self,
        domain: &DataDomainConfig,
        ctx: &FetchContext,
    ) -> Result<Vec<DataMetric>, RagwatchError> {
        let entity = domain.as_business_entity();
        Ok(self
            .fetch_metrics(std::slice::from_ref(&entity), ctx)
            .await?
            .into_iter()
            .map(|m| m.metric)
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::entity::{RagRuleConfig, SourceConfig};
    use crate::domain::error::DomainError;
    use crate::ports::cancellation::Cancellation;
    use chrono::NaiveDateTime;
    use serde_json::json;
    use std::sync::Mutex;
    use uuid::Uuid;

    /// Answers per `entityName`; keys listed in `failing` get a transport error.
    struct MockTransport {
        calls: Arc<Mutex<Vec<GraphQlRequest>>>,
        failing: Vec<&'static str>,
    }

    #[async_trait]
    impl GraphQlTransport for MockTransport {
        async fn execute(&self, request: &GraphQlRequest) -> Result<Value, TransportError> {
            self.calls.lock().unwrap().push(request.clone());
            let key = request.variables["entityName"].as_str().unwrap_or("ALL");
            if self.failing.contains(&key) {
                return Err(TransportError::Request {
                    url: request.url.clone(),
                    message: "connection reset by peer".into(),
                });
            }
            if key == "GARBLED" {
                return Ok(json!({ "dataLoadMatrix": [{ "count": "many" }] }));
            }
            Ok(json!({
                "dataLoadMatrix": [
                    { "count": 42, "effectiveDate": "2025-03-12T00:00:00", "entityKey": key }
                ]
            }))
        }
    }

    fn requested_at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 13)
            .unwrap()
            .and_hms_opt(7, 30, 0)
            .unwrap()
    }

    fn entity(name: &str, metadata: Value) -> BusinessEntity {
        BusinessEntity {
            id: Uuid::new_v4(),
            name: name.into(),
            display_name: None,
            application_owner: String::new(),
            dependent_functionalities: String::new(),
            is_active: true,
            source: SourceConfig::new(GRAPHQL_SOURCE, metadata.to_string()),
            rag: RagRuleConfig::default(),
        }
    }

    fn meta(keys: Value) -> Value {
        json!({
            "environments": [{ "name": "Dev", "baseUrl": "https://metrics.local/" }],
            "endpointPath": "/graphql",
            "entityKeys": keys
        })
    }

    fn strategy(failing: Vec<&'static str>) -> (GraphQlStrategy, Arc<Mutex<Vec<GraphQlRequest>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let transport = MockTransport {
            calls: calls.clone(),
            failing,
        };
        (GraphQlStrategy::new(Arc::new(transport), "Dev"), calls)
    }

    #[test]
    fn test_query_shapes() {
        insta::assert_snapshot!(data_load_matrix_query(true, true), @"query ($entityName: String!, $effectiveDate: DateTime) { dataLoadMatrix(entityName: $entityName, effectiveDate: $effectiveDate) { count effectiveDate entityKey } }");
        insta::assert_snapshot!(data_load_matrix_query(true, false), @"query ($entityName: String!) { dataLoadMatrix(entityName: $entityName) { count effectiveDate entityKey } }");
        insta::assert_snapshot!(data_load_matrix_query(false, true), @"query ($effectiveDate: DateTime) { dataLoadMatrix(effectiveDate: $effectiveDate) { count effectiveDate entityKey } }");
        insta::assert_snapshot!(data_load_matrix_query(false, false), @"query { dataLoadMatrix { count effectiveDate entityKey } }");
    }

    #[test]
    fn test_endpoint_quirk_drops_effective_date() {
        let (strategy, _) = strategy(vec![]);
        let strategy =
            strategy.with_endpoints_without_effective_date(vec!["Legacy-Metrics".into()]);
        let date = NaiveDate::from_ymd_opt(2025, 3, 12);

        let modern = strategy.build_request("https://metrics.local/graphql", Some("FXRATE"), date);
        assert_eq!(
            modern.variables,
            json!({ "entityName": "FXRATE", "effectiveDate": "2025-03-12T00:00:00" })
        );

        let legacy =
            strategy.build_request("https://host/legacy-metrics/graphql", Some("FXRATE"), date);
        assert_eq!(legacy.variables, json!({ "entityName": "FXRATE" }));
        assert_eq!(legacy.query, data_load_matrix_query(true, false));
    }

    #[tokio::test]
    async fn test_failed_key_degrades_other_keys_proceed() {
        let (strategy, calls) = strategy(vec!["FXRATE"]);
        let group = [entity("Securities", meta(json!(["BENCHMARK", "FXRATE"])))];
        let ctx = FetchContext::new(requested_at());

        let mut metrics = strategy.fetch_metrics(&group, &ctx).await.unwrap();
        metrics.sort_by(|a, b| a.metric.entity_key.cmp(&b.metric.entity_key));

        assert_eq!(calls.lock().unwrap().len(), 2);
        assert_eq!(metrics.len(), 2);

        assert_eq!(metrics[0].metric.entity_key, "BENCHMARK");
        assert_eq!(metrics[0].metric.count, 42);
        assert!(!metrics[0].metric.is_degraded());

        assert_eq!(metrics[1].metric.entity_key, "FXRATE");
        assert!(metrics[1].metric.is_degraded());
        assert!(metrics[1].metric.message.contains("connection reset"));
        assert!(metrics.iter().all(|m| m.business_entity == "Securities"));
    }

    #[tokio::test]
    async fn test_degraded_metric_becomes_degraded_run() {
        let (strategy, _) = strategy(vec!["FXRATE"]);
        let group = [entity("Securities", meta(json!(["BENCHMARK", "FXRATE"])))];

        let runs = strategy
            .fetch_runs(&group, &FetchContext::new(requested_at()))
            .await
            .unwrap();

        assert_eq!(runs.len(), 2);
        assert_eq!(runs.iter().filter(|r| r.is_degraded()).count(), 1);
        assert_eq!(runs.iter().map(|r| r.record_loaded).sum::<u64>(), 42);
    }

    #[tokio::test]
    async fn test_decode_failure_is_degraded_too() {
        let (strategy, _) = strategy(vec![]);
        let group = [entity("Securities", meta(json!(["GARBLED"])))];
        let metrics = strategy
            .fetch_metrics(&group, &FetchContext::new(requested_at()))
            .await
            .unwrap();
        assert_eq!(metrics.len(), 1);
        assert!(metrics[0].metric.message.contains("Cannot decode"));
    }

    #[tokio::test]
    async fn test_no_keys_issues_one_unfiltered_query() {
        let (strategy, calls) = strategy(vec![]);
        let group = [entity("Securities", meta(json!([])))];
        let ctx = FetchContext::new(requested_at()).with_as_of(NaiveDate::from_ymd_opt(2025, 3, 12));

        strategy.fetch_metrics(&group, &ctx).await.unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].url, "https://metrics.local/graphql");
        assert_eq!(calls[0].query, data_load_matrix_query(false, true));
        assert_eq!(calls[0].variables, json!({ "effectiveDate": "2025-03-12T00:00:00" }));
    }

    fn credited(metrics: &[KeyedMetric]) -> Vec<(String, String, bool)> {
        let mut credited: Vec<_> = metrics
            .iter()
            .map(|m| {
                (
                    m.business_entity.clone(),
                    m.metric.entity_key.clone(),
                    m.metric.is_degraded(),
                )
            })
            .collect();
        credited.sort();
        credited
    }

    #[tokio::test]
    async fn test_shared_key_is_queried_once_and_credited_to_each_owner() {
        let (strategy, calls) = strategy(vec![]);
        let shared = meta(json!(["BENCHMARK", { "key": "FXRATE", "entity": "FX Rate" }]));
        let group = [entity("Securities", shared.clone()), entity("FX Rate", shared)];

        let metrics = strategy
            .fetch_metrics(&group, &FetchContext::new(requested_at()))
            .await
            .unwrap();

        assert_eq!(calls.lock().unwrap().len(), 2);
        assert_eq!(
            credited(&metrics),
            vec![
                ("FX Rate".to_string(), "BENCHMARK".to_string(), false),
                ("FX Rate".to_string(), "FXRATE".to_string(), false),
                ("Securities".to_string(), "BENCHMARK".to_string(), false),
            ]
        );
    }

    #[tokio::test]
    async fn test_each_entity_keeps_its_own_keys() {
        let (strategy, calls) = strategy(vec!["FXRATE"]);
        let group = [
            entity("Securities", meta(json!(["BENCHMARK"]))),
            entity("FX Rate", meta(json!(["FXRATE"]))),
        ];

        let metrics = strategy
            .fetch_metrics(&group, &FetchContext::new(requested_at()))
            .await
            .unwrap();

        assert_eq!(calls.lock().unwrap().len(), 2);
        assert_eq!(
            credited(&metrics),
            vec![
                ("FX Rate".to_string(), "FXRATE".to_string(), true),
                ("Securities".to_string(), "BENCHMARK".to_string(), false),
            ]
        );
    }

    #[tokio::test]
    async fn test_unfiltered_query_is_credited_to_every_keyless_entity() {
        let (strategy, calls) = strategy(vec![]);
        let group = [
            entity("Securities", meta(json!([]))),
            entity("FX Rate", meta(json!([]))),
        ];

        let metrics = strategy
            .fetch_metrics(&group, &FetchContext::new(requested_at()))
            .await
            .unwrap();

        assert_eq!(calls.lock().unwrap().len(), 1);
        let owners: Vec<_> = credited(&metrics).into_iter().map(|c| c.0).collect();
        assert_eq!(owners, vec!["FX Rate", "Securities"]);
    }

    #[tokio::test]
    async fn test_domain_metrics_keep_their_keys() {
        let (strategy, _) = strategy(vec!["FXRATE"]);
        let domain = DataDomainConfig {
            id: Uuid::nil(),
            name: "Reference Data".into(),
            is_active: true,
            source: SourceConfig::new(
                GRAPHQL_SOURCE,
                meta(json!(["BENCHMARK", "FXRATE"])).to_string(),
            ),
        };

        let mut metrics = strategy
            .fetch_domain_metrics(&domain, &FetchContext::new(requested_at()))
            .await
            .unwrap();
        metrics.sort_by(|a, b| a.entity_key.cmp(&b.entity_key));

        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics[0].entity_key, "BENCHMARK");
        assert_eq!(metrics[0].count, 42);
        assert_eq!(metrics[0].date, NaiveDate::from_ymd_opt(2025, 3, 12));
        assert_eq!(metrics[1].entity_key, "FXRATE");
        assert!(metrics[1].is_degraded());
    }

    #[tokio::test]
    async fn test_cancellation_is_not_degraded() {
        let (strategy, _) = strategy(vec![]);
        let (handle, cancel) = Cancellation::new();
        handle.cancel();
        let group = [entity("Securities", meta(json!(["BENCHMARK"])))];
        let ctx = FetchContext::new(requested_at()).with_cancellation(cancel);

        let err = strategy.fetch_metrics(&group, &ctx).await.unwrap_err();
        assert!(matches!(err, RagwatchError::Cancelled));
    }

    #[test]
    fn test_validate_reports_missing_environment() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let transport = MockTransport {
            calls,
            failing: vec![],
        };
        let prod = GraphQlStrategy::new(Arc::new(transport), "Prod");
        let err = prod
            .validate(&[entity("Securities", meta(json!(["BENCHMARK"])))])
            .unwrap_err();
        assert!(matches!(err, RagwatchError::Domain(DomainError::Configuration(_))));
    }
}
