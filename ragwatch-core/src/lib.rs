// ragwatch-core/src/lib.rs

#![allow(missing_docs)]
// Memory safety
#![deny(unsafe_code)]
// Robustness
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
// Performance
#![warn(clippy::perf)]

// --- HEXAGONAL MODULES ---

// 1. Ports (async contracts towards the outside world)
// Source strategies, configuration store, HTTP transports.
pub mod ports;

// 2. Domain (business core)
// Entities, job runs, summaries and the RAG rule engine.
// Depends on nothing but itself.
pub mod domain;

// 3. Infrastructure (Adapters)
// reqwest transports, source strategies, YAML configuration.
pub mod infrastructure;

// 4. Application (Use Cases)
// Strategy registry and the aggregation orchestrator.
pub mod application;

// --- GLOBAL ERROR HANDLING ---
pub mod error;

// --- RE-EXPORTS (FACADE) ---
pub use error::RagwatchError;
