// ragwatch-core/src/domain/entity/summary.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RagIndicator {
    Red,
    Amber,
    Green,
}

impl RagIndicator {
    /// Evaluation order: the first matching rule wins.
    pub const PRECEDENCE: [RagIndicator; 3] =
        [RagIndicator::Red, RagIndicator::Amber, RagIndicator::Green];
}

impl fmt::Display for RagIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RagIndicator::Red => "Red",
            RagIndicator::Amber => "Amber",
            RagIndicator::Green => "Green",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RagStatus {
    pub indicator: RagIndicator,
    pub description: String,
}

impl RagStatus {
    pub fn new(indicator: RagIndicator) -> Self {
        Self {
            indicator,
            description: indicator.to_string(),
        }
    }
}

/// Per-entity health summary emitted once per aggregation cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitySummary {
    pub business_entity_id: Uuid,
    pub business_entity: String,
    pub display_name: String,
    pub application_owner: String,
    /// `None` when every run of the entity is a degraded placeholder.
    pub latest_load_date: Option<NaiveDate>,
    pub total_records_loaded: u64,
    pub dependent_funcs: Vec<String>,
    pub rag_status: RagStatus,
}
