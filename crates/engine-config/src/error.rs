use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid env file: {0}")]
    EnvFile(String),

    #[error("Environment variable '{0}' is not set")]
    MissingVariable(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
