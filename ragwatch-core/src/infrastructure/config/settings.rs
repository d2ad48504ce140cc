// ragwatch-core/src/infrastructure/config/settings.rs

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, instrument};
use validator::Validate;

use crate::infrastructure::error::InfrastructureError;

pub const ENV_ENVIRONMENT: &str = "RAGWATCH_ENVIRONMENT";
pub const ENV_ENTITIES_PATH: &str = "RAGWATCH_ENTITIES_PATH";
pub const ENV_REQUEST_TIMEOUT: &str = "RAGWATCH_REQUEST_TIMEOUT_SECS";

const CONFIG_CANDIDATES: [&str; 2] = ["ragwatch_conf.yaml", "ragwatch.yaml"];

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Settings {
    #[validate(length(min = 1, message = "Project name cannot be empty"))]
    pub name: String,

    /// Selects the `environments[]` entry in each entity's source metadata.
    #[serde(default = "default_environment")]
    #[validate(length(min = 1, message = "Environment cannot be empty"))]
    pub environment: String,

    /// Relative paths are resolved against the config directory.
    #[serde(default = "default_entities_path")]
    pub entities_path: String,

    #[serde(default)]
    #[validate(nested)]
    pub http: HttpSettings,

    #[serde(default)]
    pub graphql: GraphQlSettings,

    #[serde(default)]
    pub summary: SummarySettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct HttpSettings {
    #[serde(default = "default_timeout_secs")]
    #[validate(range(min = 1, max = 600, message = "Timeout must be within 1..=600 seconds"))]
    pub request_timeout_secs: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphQlSettings {
    /// Endpoint paths containing any of these substrings never receive the
    /// `effectiveDate` argument.
    #[serde(default)]
    pub endpoints_without_effective_date: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummarySettings {
    /// Evaluate entities that produced no runs over an empty run set instead
    /// of leaving them out.
    #[serde(default)]
    pub include_entities_without_runs: bool,
}

impl Settings {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            environment: default_environment(),
            entities_path: default_entities_path(),
            http: HttpSettings::default(),
            graphql: GraphQlSettings::default(),
            summary: SummarySettings::default(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.http.request_timeout_secs)
    }

    pub fn entities_file(&self, config_dir: &Path) -> PathBuf {
        let path = Path::new(&self.entities_path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            config_dir.join(path)
        }
    }
}

fn default_environment() -> String {
    "Dev".to_string()
}
fn default_entities_path() -> String {
    "entities.yaml".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

#[instrument(skip(config_dir))]
pub fn load_settings(config_dir: &Path) -> Result<Settings, InfrastructureError> {
    let config_path = find_main_config(config_dir)?;
    info!(path = ?config_path, "Loading ragwatch settings");

    let content = fs::read_to_string(&config_path)?;
    let mut settings: Settings = serde_yaml::from_str(&content)?;

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok())?;
    settings.validate()?;

    Ok(settings)
}

fn find_main_config(root: &Path) -> Result<PathBuf, InfrastructureError> {
    for filename in CONFIG_CANDIDATES {
        let p = root.join(filename);
        if p.exists() {
            return Ok(p);
        }
    }
    Err(InfrastructureError::ConfigNotFound(format!(
        "No configuration file found in {:?}. Checked: {:?}",
        root, CONFIG_CANDIDATES
    )))
}

/// Layers `RAGWATCH_*` variables over the file values. `lookup` is
/// `std::env::var` in production.
pub fn apply_env_overrides<F>(settings: &mut Settings, lookup: F) -> Result<(), InfrastructureError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup(ENV_ENVIRONMENT) {
        info!(old = %settings.environment, new = %val, "Overriding environment via ENV");
        settings.environment = val;
    }
    if let Some(val) = lookup(ENV_ENTITIES_PATH) {
        info!(old = %settings.entities_path, new = %val, "Overriding entities path via ENV");
        settings.entities_path = val;
    }
    if let Some(val) = lookup(ENV_REQUEST_TIMEOUT) {
        let secs = val.trim().parse::<u64>().map_err(|_| {
            InfrastructureError::ConfigError(format!(
                "{} must be a whole number of seconds, got '{}'",
                ENV_REQUEST_TIMEOUT, val
            ))
        })?;
        info!(old = settings.http.request_timeout_secs, new = secs, "Overriding request timeout via ENV");
        settings.http.request_timeout_secs = secs;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_minimal_file_gets_defaults() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("ragwatch.yaml"), "name: ops-dashboard\n")?;

        let settings = load_settings(dir.path())?;
        assert_eq!(settings.name, "ops-dashboard");
        assert_eq!(settings.environment, "Dev");
        assert_eq!(settings.http.request_timeout_secs, 30);
        assert!(settings.graphql.endpoints_without_effective_date.is_empty());
        assert!(!settings.summary.include_entities_without_runs);
        assert_eq!(settings.entities_file(dir.path()), dir.path().join("entities.yaml"));
        Ok(())
    }

    #[test]
    fn test_conf_file_takes_precedence() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("ragwatch.yaml"), "name: plain\n")?;
        fs::write(
            dir.path().join("ragwatch_conf.yaml"),
            r#"
name: preferred
environment: Prod
graphql:
  endpoints_without_effective_date: ["legacy-metrics"]
summary:
  include_entities_without_runs: true
"#,
        )?;

        let settings = load_settings(dir.path())?;
        assert_eq!(settings.name, "preferred");
        assert_eq!(settings.environment, "Prod");
        assert_eq!(settings.graphql.endpoints_without_effective_date, vec!["legacy-metrics"]);
        assert!(settings.summary.include_entities_without_runs);
        Ok(())
    }

    #[test]
    fn test_missing_config() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            load_settings(dir.path()),
            Err(InfrastructureError::ConfigNotFound(_))
        ));
    }

    #[test]
    fn test_timeout_out_of_range_fails_validation() -> Result<()> {
        let dir = tempdir()?;
        fs::write(
            dir.path().join("ragwatch.yaml"),
            "name: x\nhttp:\n  request_timeout_secs: 0\n",
        )?;
        assert!(matches!(
            load_settings(dir.path()),
            Err(InfrastructureError::Validation(_))
        ));
        Ok(())
    }

    #[test]
    fn test_env_overrides_layer_over_file() {
        let mut settings = Settings::new("x");
        apply_env_overrides(
            &mut settings,
            env(&[
                (ENV_ENVIRONMENT, "UAT"),
                (ENV_ENTITIES_PATH, "/etc/ragwatch/entities.yaml"),
                (ENV_REQUEST_TIMEOUT, "5"),
            ]),
        )
        .unwrap();

        assert_eq!(settings.environment, "UAT");
        assert_eq!(settings.request_timeout(), Duration::from_secs(5));
        assert_eq!(
            settings.entities_file(Path::new("/srv")),
            PathBuf::from("/etc/ragwatch/entities.yaml")
        );
    }

    #[test]
    fn test_bad_timeout_override() {
        let mut settings = Settings::new("x");
        let err = apply_env_overrides(&mut settings, env(&[(ENV_REQUEST_TIMEOUT, "soon")]))
            .unwrap_err();
        assert!(matches!(err, InfrastructureError::ConfigError(_)));
    }
}
