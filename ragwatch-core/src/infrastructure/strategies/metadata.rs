// ragwatch-core/src/infrastructure/strategies/metadata.rs
//
// Entity source metadata is opaque JSON owned by each strategy. Keys are
// matched case-insensitively, so structs here use lower-case names.

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::domain::entity::BusinessEntity;
use crate::domain::error::DomainError;
use crate::infrastructure::adapters::mapping::lowercase_keys;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EnvironmentConfig {
    pub name: String,
    #[serde(rename = "baseurl", alias = "base_url", default)]
    pub base_url: String,
}

/// Parses an entity's metadata. Blank or malformed JSON is a configuration
/// error naming the entity.
pub fn parse_metadata<T: DeserializeOwned>(entity: &BusinessEntity) -> Result<T, DomainError> {
    let raw = entity.source.metadata.trim();
    if raw.is_empty() {
        return Err(DomainError::Configuration(format!(
            "Source metadata of '{}' is empty",
            entity.name
        )));
    }
    let value: serde_json::Value = serde_json::from_str(raw).map_err(|e| {
        DomainError::Configuration(format!(
            "Invalid JSON in source metadata of '{}': {}",
            entity.name, e
        ))
    })?;
    serde_json::from_value(lowercase_keys(value)).map_err(|e| {
        DomainError::Configuration(format!(
            "Unexpected source metadata shape for '{}': {}",
            entity.name, e
        ))
    })
}

/// Like [`parse_metadata`], but blank metadata yields `T::default()`.
pub fn parse_optional_metadata<T: DeserializeOwned + Default>(
    entity: &BusinessEntity,
) -> Result<T, DomainError> {
    if entity.source.metadata.trim().is_empty() {
        return Ok(T::default());
    }
    parse_metadata(entity)
}

/// Picks the base URL of the active environment (case-insensitive).
pub fn resolve_base_url(
    environments: &[EnvironmentConfig],
    active: &str,
    entity: &BusinessEntity,
) -> Result<String, DomainError> {
    let env = environments
        .iter()
        .find(|e| e.name.eq_ignore_ascii_case(active))
        .ok_or_else(|| {
            DomainError::Configuration(format!(
                "Environment '{}' not found in source metadata of '{}'",
                active, entity.name
            ))
        })?;
    if env.base_url.trim().is_empty() {
        return Err(DomainError::Configuration(format!(
            "Environment '{}' of '{}' has no baseUrl",
            env.name, entity.name
        )));
    }
    Ok(env.base_url.trim().to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::entity::{RagRuleConfig, SourceConfig};
    use uuid::Uuid;

    #[derive(Debug, Deserialize)]
    struct Envs {
        #[serde(default)]
        environments: Vec<EnvironmentConfig>,
    }

    fn entity(metadata: &str) -> BusinessEntity {
        BusinessEntity {
            id: Uuid::new_v4(),
            name: "FX Rate".into(),
            display_name: None,
            application_owner: String::new(),
            dependent_functionalities: String::new(),
            is_active: true,
            source: SourceConfig::new("Data Load Statistic Service", metadata),
            rag: RagRuleConfig::default(),
        }
    }

    #[test]
    fn test_keys_are_case_insensitive() {
        let e = entity(r#"{"Environments":[{"Name":"Dev","BaseUrl":"http://dev"}]}"#);
        let meta: Envs = parse_metadata(&e).unwrap();
        assert_eq!(resolve_base_url(&meta.environments, "dev", &e).unwrap(), "http://dev");
    }

    #[test]
    fn test_blank_and_malformed_metadata() {
        let blank = parse_metadata::<Envs>(&entity("  "));
        assert!(matches!(blank, Err(DomainError::Configuration(m)) if m.contains("empty")));

        let broken = parse_metadata::<Envs>(&entity("{environments:"));
        assert!(matches!(broken, Err(DomainError::Configuration(m)) if m.contains("Invalid JSON")));

        let shape = parse_metadata::<Envs>(&entity(r#"{"environments":"Dev"}"#));
        assert!(matches!(shape, Err(DomainError::Configuration(_))));
    }

    #[test]
    fn test_missing_environment_and_blank_url() {
        let e = entity(r#"{"environments":[{"name":"Dev","baseUrl":" "}]}"#);
        let meta: Envs = parse_metadata(&e).unwrap();
        assert!(matches!(
            resolve_base_url(&meta.environments, "Prod", &e),
            Err(DomainError::Configuration(m)) if m.contains("'Prod' not found")
        ));
        assert!(matches!(
            resolve_base_url(&meta.environments, "Dev", &e),
            Err(DomainError::Configuration(m)) if m.contains("no baseUrl")
        ));
    }
}
