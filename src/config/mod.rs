/// Database configuration and connection management
pub mod database;

/// Ledger settings loading from config.toml
pub mod settings;

pub use settings::{AppConfig, load_config, load_default_config};
