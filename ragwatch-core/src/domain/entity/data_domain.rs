// ragwatch-core/src/domain/entity/data_domain.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entity::business_entity::default_active;
use crate::domain::entity::{BusinessEntity, DataMetric, RagRuleConfig, SourceConfig};

/// A group of datasets reported as raw metrics, without RAG rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DataDomainConfig {
    #[serde(default = "Uuid::nil")]
    pub id: Uuid,
    pub name: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub source: SourceConfig,
}

impl DataDomainConfig {
    /// The domain seen through the entity-shaped strategy contract.
    pub fn as_business_entity(&self) -> BusinessEntity {
        BusinessEntity {
            id: self.id,
            name: self.name.clone(),
            display_name: None,
            application_owner: String::new(),
            dependent_functionalities: String::new(),
            is_active: self.is_active,
            source: self.source.clone(),
            rag: RagRuleConfig::default(),
        }
    }
}

/// Metrics collected for one data domain in one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataDomain {
    pub id: Uuid,
    pub name: String,
    pub metrics: Vec<DataMetric>,
}

impl DataDomain {
    pub fn total_count(&self) -> u64 {
        self.metrics
            .iter()
            .fold(0u64, |total, m| total.saturating_add(m.count))
    }

    pub fn degraded(&self) -> usize {
        self.metrics.iter().filter(|m| m.is_degraded()).count()
    }
}
