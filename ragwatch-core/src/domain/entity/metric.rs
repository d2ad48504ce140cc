// ragwatch-core/src/domain/entity/metric.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::entity::JobRun;

/// Count-per-date metric as reported by the GraphQL source, before it is
/// folded into the canonical `JobRun` shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataMetric {
    pub entity_key: String,
    pub count: u64,
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub message: String,
}

impl DataMetric {
    pub fn degraded(entity_key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            entity_key: entity_key.into(),
            count: 0,
            date: None,
            message: message.into(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        !self.message.is_empty()
    }

    /// Run-shaped sources report one metric per run, keyed by the entity
    /// the run was loaded for.
    pub fn from_run(run: &JobRun) -> Self {
        Self {
            entity_key: run.business_entity.clone(),
            count: run.record_loaded,
            date: Some(run.record_as_of_date),
            message: run.message.clone().unwrap_or_default(),
        }
    }
}
