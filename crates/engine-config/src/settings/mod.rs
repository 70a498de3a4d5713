//! On-disk configuration file, as written by the operator.

use crate::{env::EnvManager, error::ConfigError};
use serde::Deserialize;
use std::{fs, path::Path};
use tracing::info;

pub mod validated;

pub use validated::{Endpoint, StateBackend, ValidatedConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Postgres,
    MySql,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransferConfig {
    pub parallelism: Option<usize>,
    pub source: SourceConfig,
    pub destination: DestinationConfig,
    pub state: Option<StateConfig>,
    pub defaults: Option<Defaults>,
    #[serde(default)]
    pub tables: Vec<TableConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    pub kind: Option<SourceKind>,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DestinationConfig {
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateBackendKind {
    #[default]
    Destination,
    Sled,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StateConfig {
    #[serde(default)]
    pub backend: StateBackendKind,
    pub schema: Option<String>,
    pub table: Option<String>,
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Defaults {
    pub batch_size: Option<usize>,
    pub reporting_frequency: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableConfig {
    pub schema: String,
    pub table: String,
    pub cursor_column: String,
    pub filter: Option<String>,
    pub order_by: Option<String>,
    pub batch_size: Option<usize>,
    pub reporting_frequency: Option<usize>,
    pub upsert_keys: Option<Vec<String>>,
    pub target_schema: Option<String>,
    pub target_table: Option<String>,
    #[serde(default)]
    pub test_mode: bool,
}

impl TransferConfig {
    /// Expands `${VAR}` references, then parses.
    pub fn from_str_with_env(text: &str, env: &EnvManager) -> Result<Self, ConfigError> {
        let expanded = env.expand(text)?;
        Ok(toml::from_str(&expanded)?)
    }

    pub fn from_file(path: impl AsRef<Path>, env: &EnvManager) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_str_with_env(&text, env)
    }
}

/// Reads, expands and validates a config file in one step.
pub fn load(
    path: impl AsRef<Path>,
    env_file: Option<&Path>,
) -> Result<ValidatedConfig, ConfigError> {
    let mut env = EnvManager::new();
    if let Some(env_file) = env_file {
        env.load_from_file(env_file)?;
    }
    let path = path.as_ref();
    let config = TransferConfig::from_file(path, &env)?.validate()?;
    info!(
        path = %path.display(),
        tables = config.requests.len(),
        parallelism = config.parallelism,
        "Loaded transfer configuration"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SAMPLE: &str = r#"
parallelism = 2

[source]
kind = "postgres"
url = "${SOURCE_URL}"

[destination]
url = "postgres://dest/db"

[defaults]
batch_size = 1000

[[tables]]
schema = "dbo"
table = "Orders"
cursor_column = "UpdatedAt"
filter = "Status='Active'"
upsert_keys = ["Id"]
"#;

    #[test]
    fn parses_with_expanded_variables() {
        let env = EnvManager::from_vars(HashMap::from([(
            "SOURCE_URL".to_string(),
            "postgres://src/db".to_string(),
        )]));
        let config = TransferConfig::from_str_with_env(SAMPLE, &env).unwrap();
        assert_eq!(config.parallelism, Some(2));
        assert_eq!(config.source.kind, Some(SourceKind::Postgres));
        assert_eq!(config.source.url, "postgres://src/db");
        assert_eq!(config.tables.len(), 1);
        assert_eq!(config.tables[0].upsert_keys, Some(vec!["Id".to_string()]));
        assert!(!config.tables[0].test_mode);
    }

    #[test]
    fn missing_variable_fails_before_parsing() {
        let env = EnvManager::from_vars(HashMap::new());
        assert!(matches!(
            TransferConfig::from_str_with_env(SAMPLE, &env),
            Err(ConfigError::MissingVariable(_))
        ));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let env = EnvManager::from_vars(HashMap::new());
        let text = "[source]\nurl = \"postgres://a\"\ncolour = 1\n[destination]\nurl = \"postgres://b\"\n";
        assert!(matches!(
            TransferConfig::from_str_with_env(text, &env),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn loads_from_file_with_env_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("transfer.toml");
        let env_path = dir.path().join(".env");
        fs::write(&config_path, SAMPLE).unwrap();
        fs::write(&env_path, "SOURCE_URL=postgres://from-env/db\n").unwrap();

        let validated = load(&config_path, Some(&env_path)).unwrap();
        assert_eq!(validated.source.url, "postgres://from-env/db");
        assert_eq!(validated.requests[0].batch_size, 1000);
    }
}
