// ragwatch-core/src/ports/repository.rs

use crate::domain::entity::{BusinessEntity, DataDomainConfig};
use crate::error::RagwatchError;
use async_trait::async_trait;

/// Read-only store of business-entity configuration.
#[async_trait]
pub trait EntityRepository: Send + Sync {
    async fn load_active_business_entities(&self) -> Result<Vec<BusinessEntity>, RagwatchError>;

    /// Stores without data domains report none.
    async fn load_active_data_domains(&self) -> Result<Vec<DataDomainConfig>, RagwatchError> {
        Ok(Vec::new())
    }
}
