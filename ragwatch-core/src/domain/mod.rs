// ragwatch-core/src/domain/mod.rs

pub mod entity;
pub mod error;
pub mod rules;

// Convenience re-exports to keep imports short elsewhere
pub use error::DomainError;
