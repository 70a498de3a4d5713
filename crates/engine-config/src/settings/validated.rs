use crate::{
    error::ConfigError,
    settings::{SourceKind, StateBackendKind, StateConfig, TableConfig, TransferConfig},
};
use connectors::adapter::Driver;
use model::transfer::request::{
    DEFAULT_BATCH_SIZE, DEFAULT_REPORTING_FREQUENCY, TransferRequest, WriteMode,
};
use std::{collections::HashSet, path::PathBuf};

pub const DEFAULT_STATE_SCHEMA: &str = "public";
pub const DEFAULT_STATE_TABLE: &str = "transfer_watermarks";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub kind: SourceKind,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateBackend {
    /// Tracking table on the destination database.
    Destination { schema: String, table: String },
    Sled { path: PathBuf },
}

/// Immutable, validated configuration used by the runtime.
#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    pub parallelism: usize,
    pub source: Endpoint,
    pub destination: Endpoint,
    pub state: StateBackend,
    pub requests: Vec<TransferRequest>,
}

impl ValidatedConfig {
    /// Keeps only the requests named as `schema.table`; all when `names` is empty.
    pub fn select_tables(mut self, names: &[String]) -> Result<Self, ConfigError> {
        if names.is_empty() {
            return Ok(self);
        }

        let wanted: HashSet<String> = names.iter().map(|n| n.to_ascii_lowercase()).collect();
        self.requests
            .retain(|r| wanted.contains(&r.key().qualified_table().to_ascii_lowercase()));

        if self.requests.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "none of the selected tables are configured: {}",
                names.join(", ")
            )));
        }
        Ok(self)
    }

    pub fn force_test_mode(mut self) -> Self {
        for request in &mut self.requests {
            request.test_mode = true;
        }
        self
    }
}

impl TransferConfig {
    pub fn validate(self) -> Result<ValidatedConfig, ConfigError> {
        let parallelism = self.parallelism.unwrap_or(1);
        if parallelism == 0 {
            return Err(invalid("parallelism must be at least 1"));
        }

        let source = Endpoint {
            kind: resolve_kind(self.source.kind, &self.source.url, "source")?,
            url: self.source.url,
        };
        let destination = Endpoint {
            kind: resolve_kind(Some(SourceKind::Postgres), &self.destination.url, "destination")?,
            url: self.destination.url,
        };

        let state = resolve_state(self.state.unwrap_or_default())?;

        let defaults = self.defaults.unwrap_or_default();
        let default_batch = defaults.batch_size.unwrap_or(DEFAULT_BATCH_SIZE);
        let default_frequency = defaults
            .reporting_frequency
            .unwrap_or(DEFAULT_REPORTING_FREQUENCY);

        if self.tables.is_empty() {
            return Err(invalid("at least one [[tables]] entry is required"));
        }

        let mut seen = HashSet::new();
        let mut requests = Vec::with_capacity(self.tables.len());
        for table in self.tables {
            let request = build_request(table, default_batch, default_frequency)?;
            if !seen.insert(request.key()) {
                return Err(invalid(&format!("table {} is configured twice", request.key())));
            }
            requests.push(request);
        }

        Ok(ValidatedConfig {
            parallelism,
            source,
            destination,
            state,
            requests,
        })
    }
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::Invalid(message.to_string())
}

fn resolve_kind(
    declared: Option<SourceKind>,
    url: &str,
    role: &str,
) -> Result<SourceKind, ConfigError> {
    if url.trim().is_empty() {
        return Err(invalid(&format!("{role} url must not be empty")));
    }

    let detected = match Driver::from_url(url) {
        Ok(Driver::Postgres) => SourceKind::Postgres,
        Ok(Driver::MySql) => SourceKind::MySql,
        Err(e) => return Err(invalid(&format!("{role} url: {e}"))),
    };

    match declared {
        Some(kind) if kind != detected => Err(invalid(&format!(
            "{role} kind {kind:?} does not match url scheme"
        ))),
        _ => Ok(detected),
    }
}

fn resolve_state(state: StateConfig) -> Result<StateBackend, ConfigError> {
    match state.backend {
        StateBackendKind::Destination => {
            if state.path.is_some() {
                return Err(invalid("state.path only applies to the sled backend"));
            }
            Ok(StateBackend::Destination {
                schema: non_empty_or(state.schema, DEFAULT_STATE_SCHEMA, "state.schema")?,
                table: non_empty_or(state.table, DEFAULT_STATE_TABLE, "state.table")?,
            })
        }
        StateBackendKind::Sled => {
            let path = match state.path {
                Some(path) if !path.trim().is_empty() => PathBuf::from(path),
                Some(_) => return Err(invalid("state.path must not be empty")),
                None => dirs::home_dir()
                    .map(|home| home.join(".transfer/state"))
                    .ok_or_else(|| invalid("state.path is required: no home directory"))?,
            };
            Ok(StateBackend::Sled { path })
        }
    }
}

fn non_empty_or(value: Option<String>, default: &str, field: &str) -> Result<String, ConfigError> {
    match value {
        Some(v) if v.trim().is_empty() => Err(invalid(&format!("{field} must not be empty"))),
        Some(v) => Ok(v),
        None => Ok(default.to_string()),
    }
}

fn build_request(
    table: TableConfig,
    default_batch: usize,
    default_frequency: usize,
) -> Result<TransferRequest, ConfigError> {
    for (field, value) in [
        ("schema", &table.schema),
        ("table", &table.table),
        ("cursor_column", &table.cursor_column),
    ] {
        if value.trim().is_empty() {
            return Err(invalid(&format!("tables.{field} must not be empty")));
        }
    }

    let name = format!("{}.{}", table.schema, table.table);
    let batch_size = table.batch_size.unwrap_or(default_batch);
    if batch_size == 0 {
        return Err(invalid(&format!("{name}: batch_size must be at least 1")));
    }
    let frequency = table.reporting_frequency.unwrap_or(default_frequency);
    if frequency == 0 {
        return Err(invalid(&format!(
            "{name}: reporting_frequency must be at least 1"
        )));
    }

    let write_mode = match table.upsert_keys {
        Some(keys) if keys.is_empty() || keys.iter().any(|k| k.trim().is_empty()) => {
            return Err(invalid(&format!("{name}: upsert_keys must name columns")));
        }
        Some(keys) => WriteMode::Upsert { keys },
        None => WriteMode::Append,
    };

    let mut request = TransferRequest::new(table.schema, table.table, table.cursor_column)
        .with_batch_size(batch_size)
        .with_reporting_frequency(frequency)
        .with_test_mode(table.test_mode)
        .with_write_mode(write_mode)
        .with_target(table.target_schema, table.target_table);

    if let Some(filter) = table.filter.filter(|f| !f.trim().is_empty()) {
        request = request.with_filter(filter);
    }
    if let Some(order_by) = table.order_by.filter(|o| !o.trim().is_empty()) {
        request = request.with_order_by(order_by);
    }
    Ok(request)
}

/// Hides the password part of a connection URL for display.
pub fn redact_url(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    let Some((userinfo, host)) = rest.rsplit_once('@') else {
        return url.to_string();
    };
    match userinfo.split_once(':') {
        Some((user, _)) => format!("{scheme}://{user}:****@{host}"),
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{DestinationConfig, SourceConfig};

    fn table(name: &str) -> TableConfig {
        TableConfig {
            schema: "dbo".into(),
            table: name.into(),
            cursor_column: "UpdatedAt".into(),
            filter: None,
            order_by: None,
            batch_size: None,
            reporting_frequency: None,
            upsert_keys: None,
            target_schema: None,
            target_table: None,
            test_mode: false,
        }
    }

    fn config(tables: Vec<TableConfig>) -> TransferConfig {
        TransferConfig {
            parallelism: None,
            source: SourceConfig {
                kind: None,
                url: "mysql://root:pw@src/app".into(),
            },
            destination: DestinationConfig {
                url: "postgres://u:pw@dest/db".into(),
            },
            state: None,
            defaults: None,
            tables,
        }
    }

    #[test]
    fn applies_defaults() {
        let validated = config(vec![table("Orders")]).validate().unwrap();
        assert_eq!(validated.parallelism, 1);
        assert_eq!(validated.source.kind, SourceKind::MySql);
        assert_eq!(
            validated.state,
            StateBackend::Destination {
                schema: "public".into(),
                table: "transfer_watermarks".into()
            }
        );
        let req = &validated.requests[0];
        assert_eq!(req.batch_size, 5000);
        assert_eq!(req.reporting_frequency, 5);
        assert_eq!(req.write_mode, WriteMode::Append);
    }

    #[test]
    fn rejects_zero_batch_size_and_empty_names() {
        let mut t = table("Orders");
        t.batch_size = Some(0);
        assert!(matches!(config(vec![t]).validate(), Err(ConfigError::Invalid(_))));

        let mut t = table("Orders");
        t.cursor_column = " ".into();
        assert!(config(vec![t]).validate().is_err());

        assert!(config(vec![]).validate().is_err());
    }

    #[test]
    fn rejects_duplicates_and_mysql_destination() {
        assert!(config(vec![table("A"), table("A")]).validate().is_err());

        let mut cfg = config(vec![table("A")]);
        cfg.destination.url = "mysql://dest/db".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn declared_kind_must_match_scheme() {
        let mut cfg = config(vec![table("A")]);
        cfg.source.kind = Some(SourceKind::Postgres);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn upsert_keys_select_upsert_mode() {
        let mut t = table("Orders");
        t.upsert_keys = Some(vec!["Id".into()]);
        t.filter = Some("Status='Active'".into());
        let validated = config(vec![t]).validate().unwrap();
        let req = &validated.requests[0];
        assert_eq!(
            req.write_mode,
            WriteMode::Upsert {
                keys: vec!["Id".into()]
            }
        );
        assert_eq!(req.filter.as_deref(), Some("Status='Active'"));

        let mut t = table("Orders");
        t.upsert_keys = Some(vec![]);
        assert!(config(vec![t]).validate().is_err());
    }

    #[test]
    fn sled_backend_takes_explicit_path() {
        let mut cfg = config(vec![table("A")]);
        cfg.state = Some(StateConfig {
            backend: StateBackendKind::Sled,
            path: Some("/tmp/wm".into()),
            ..Default::default()
        });
        assert_eq!(
            cfg.validate().unwrap().state,
            StateBackend::Sled {
                path: PathBuf::from("/tmp/wm")
            }
        );
    }

    #[test]
    fn selects_tables_case_insensitively() {
        let validated = config(vec![table("Orders"), table("Customers")])
            .validate()
            .unwrap()
            .select_tables(&["DBO.orders".to_string()])
            .unwrap();
        assert_eq!(validated.requests.len(), 1);
        assert_eq!(validated.requests[0].table_name, "Orders");

        let err = config(vec![table("Orders")])
            .validate()
            .unwrap()
            .select_tables(&["dbo.Missing".to_string()]);
        assert!(err.is_err());
    }

    #[test]
    fn redacts_passwords() {
        assert_eq!(
            redact_url("postgres://app:s3cret@db:5432/x"),
            "postgres://app:****@db:5432/x"
        );
        assert_eq!(redact_url("postgres://db/x"), "postgres://db/x");
    }
}
