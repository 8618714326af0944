use thiserror::Error;

pub mod app_config;
pub mod config;
pub mod inputs;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use inputs::{load_locations, load_profiles, LocationQuery, Profile};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for env var {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{path} contains no entries")]
    EmptyInput { path: String },
}
