// ragwatch-core/src/application/mod.rs

pub mod orchestrator;
pub mod registry;

// --- RE-EXPORTS (FACADE PATTERN) ---
// The CLI only needs `use ragwatch_core::application::{AggregationOrchestrator, StrategyRegistry};`

pub use orchestrator::{AggregationOrchestrator, PreflightReport};
pub use registry::StrategyRegistry;
