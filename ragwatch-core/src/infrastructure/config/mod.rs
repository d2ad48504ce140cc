// ragwatch-core/src/infrastructure/config/mod.rs

pub mod entities;
pub mod settings;

pub use entities::{EntityFile, YamlEntityRepository};
pub use settings::{
    GraphQlSettings, HttpSettings, Settings, SummarySettings, apply_env_overrides, load_settings,
};
