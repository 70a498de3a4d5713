use crate::sql::base::error::ConnectorError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    /// Failed to initialize a data connector.
    #[error("Connector error: {0}")]
    Connector(#[from] ConnectorError),

    /// Unsupported driver error.
    #[error("Unsupported driver: {0}")]
    UnsupportedDriver(String),

    /// The driver exists but cannot serve in the requested role.
    #[error("{driver} cannot be used as a {role}")]
    UnsupportedRole { driver: String, role: &'static str },
}
