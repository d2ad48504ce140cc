// ragwatch-core/src/infrastructure/adapters/mod.rs

pub mod graphql_http;
pub mod job_stats_http;
pub mod mapping;

pub use graphql_http::HttpGraphQlTransport;
pub use job_stats_http::HttpJobStatsApi;
