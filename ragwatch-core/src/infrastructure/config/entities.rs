// ragwatch-core/src/infrastructure/config/entities.rs
//
// File-backed stand-in for the business-entity configuration database.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

use crate::domain::entity::{BusinessEntity, DataDomainConfig, derived_id};
use crate::error::RagwatchError;
use crate::infrastructure::error::InfrastructureError;
use crate::ports::repository::EntityRepository;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityFile {
    #[serde(default)]
    pub entities: Vec<BusinessEntity>,
    #[serde(default)]
    pub domains: Vec<DataDomainConfig>,
}

impl EntityFile {
    /// Records without an `id` get one derived from their name.
    pub fn parse(content: &str) -> Result<Self, InfrastructureError> {
        let mut file: EntityFile = serde_yaml::from_str(content)?;
        for entity in file.entities.iter_mut().filter(|e| e.id.is_nil()) {
            entity.id = derived_id(&entity.name);
        }
        for domain in file.domains.iter_mut().filter(|d| d.id.is_nil()) {
            domain.id = derived_id(&domain.name);
        }
        Ok(file)
    }
}

/// Reads `entities.yaml` on every call, so edits are picked up by the next
/// aggregation cycle.
#[derive(Debug, Clone)]
pub struct YamlEntityRepository {
    path: PathBuf,
}

impl YamlEntityRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<EntityFile, RagwatchError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(InfrastructureError::ConfigNotFound(
                    self.path.display().to_string(),
                )
                .into());
            }
            Err(e) => return Err(e.into()),
        };
        Ok(EntityFile::parse(&content)?)
    }
}

#[async_trait]
impl EntityRepository for YamlEntityRepository {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn load_active_business_entities(&self) -> Result<Vec<BusinessEntity>, RagwatchError> {
        let file = self.read().await?;
        let total = file.entities.len();
        let active: Vec<BusinessEntity> =
            file.entities.into_iter().filter(|e| e.is_active).collect();
        debug!(total, active = active.len(), "Business entities loaded");
        Ok(active)
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn load_active_data_domains(&self) -> Result<Vec<DataDomainConfig>, RagwatchError> {
        let file = self.read().await?;
        let total = file.domains.len();
        let active: Vec<DataDomainConfig> =
            file.domains.into_iter().filter(|d| d.is_active).collect();
        debug!(total, active = active.len(), "Data domains loaded");
        Ok(active)
    }
}
