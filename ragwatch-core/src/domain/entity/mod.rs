// ragwatch-core/src/domain/entity/mod.rs

pub mod business_entity;
pub mod data_domain;
pub mod job_run;
pub mod metric;
pub mod summary;
pub mod time;

pub use business_entity::{
    BusinessEntity, RagRuleConfig, SourceConfig, derived_id, parse_dependent_funcs,
};
pub use data_domain::{DataDomain, DataDomainConfig};
pub use job_run::JobRun;
pub use metric::DataMetric;
pub use summary::{EntitySummary, RagIndicator, RagStatus};
