// ragwatch-core/src/infrastructure/strategies/mod.rs

pub mod graphql;
pub mod metadata;
pub mod statistics;
pub mod synthetic;

pub use graphql::{GRAPHQL_SOURCE, GraphQlStrategy, KeyedMetric};
pub use statistics::{STATISTICS_SOURCE, StatisticsStrategy};
pub use synthetic::{SYNTHETIC_SOURCE, SyntheticStrategy};
