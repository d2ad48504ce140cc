// ragwatch-core/src/domain/entity/business_entity.rs

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// A named category of data whose load health is tracked.
/// Loaded read-only once per aggregation cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BusinessEntity {
    /// Nil until the loader derives one from the name, see [`derived_id`].
    #[serde(default = "Uuid::nil")]
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub application_owner: String,
    /// Free text, comma separated.
    #[serde(default)]
    pub dependent_functionalities: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub source: SourceConfig,
    pub rag: RagRuleConfig,
}

impl BusinessEntity {
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    /// Dependent functionalities as a trimmed, order-preserving list.
    pub fn dependent_funcs(&self) -> Vec<String> {
        parse_dependent_funcs(&self.dependent_functionalities)
    }
}

/// Which strategy serves an entity, plus the strategy's opaque JSON metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    #[serde(default, deserialize_with = "metadata_blob")]
    pub metadata: String,
}

impl SourceConfig {
    pub fn new(name: impl Into<String>, metadata: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            metadata: metadata.into(),
        }
    }
}

/// Red / Amber / Green expressions, evaluated in that order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RagRuleConfig {
    #[serde(default)]
    pub red: String,
    #[serde(default)]
    pub amber: String,
    #[serde(default)]
    pub green: String,
    #[serde(default)]
    pub description: String,
}

impl RagRuleConfig {
    pub fn new(red: &str, amber: &str, green: &str) -> Self {
        Self {
            red: red.to_string(),
            amber: amber.to_string(),
            green: green.to_string(),
            description: String::new(),
        }
    }
}

/// Stable id for configuration records that carry none: the same name
/// yields the same id on every load.
pub fn derived_id(name: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes())
}

pub fn parse_dependent_funcs(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

pub(crate) fn default_active() -> bool {
    true
}

/// Metadata is stored as JSON text. Config files may inline it as a mapping,
/// so any structured value is re-serialized to a string.
fn metadata_blob<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    })
}
