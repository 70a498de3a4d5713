use crate::error::CliError;
use connectors::adapter::{self, Driver};
use engine_config::settings::validated::redact_url;
use std::str::FromStr;
use tracing::{error, info};

/// What kind of connection to check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionKind {
    MySql,
    Postgres,
}

impl FromStr for ConnectionKind {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(ConnectionKind::MySql),
            "pg" | "postgres" | "postgresql" => Ok(ConnectionKind::Postgres),
            other => Err(CliError::InvalidConnectionKind(other.to_string())),
        }
    }
}

impl ConnectionKind {
    fn driver(self) -> Driver {
        match self {
            ConnectionKind::MySql => Driver::MySql,
            ConnectionKind::Postgres => Driver::Postgres,
        }
    }
}

/// Opens a source session on `url` and round-trips `SELECT 1`.
pub async fn ping(kind: ConnectionKind, url: &str) -> Result<(), CliError> {
    let shown = redact_url(url);
    let driver = Driver::from_url(url)?;
    if driver != kind.driver() {
        return Err(CliError::KindMismatch {
            expected: kind.driver().to_string(),
            actual: driver.to_string(),
        });
    }

    info!(url = %shown, %driver, "Pinging");
    let source = adapter::open_source(url).await.inspect_err(|e| {
        error!(url = %shown, error = %e, "Connection failed");
    })?;
    source.ping().await.inspect_err(|e| {
        error!(url = %shown, error = %e, "Ping query failed");
    })?;

    info!(url = %shown, "Ping succeeded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_kind_aliases() {
        assert_eq!(
            "PG".parse::<ConnectionKind>().unwrap(),
            ConnectionKind::Postgres
        );
        assert_eq!(
            "mariadb".parse::<ConnectionKind>().unwrap(),
            ConnectionKind::MySql
        );
        assert!(matches!(
            "ftp".parse::<ConnectionKind>(),
            Err(CliError::InvalidConnectionKind(k)) if k == "ftp"
        ));
    }

    #[tokio::test]
    async fn kind_must_match_url_scheme() {
        let err = ping(ConnectionKind::MySql, "postgres://localhost/db")
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::KindMismatch { .. }));
    }
}
