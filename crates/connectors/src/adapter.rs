use crate::{
    error::AdapterError,
    sink::RowSink,
    source::RowSource,
    sql::{
        mysql::source::MySqlSource,
        postgres::{sink::PgSink, source::PgSource},
    },
};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Driver {
    Postgres,
    MySql,
}

impl Driver {
    /// Picks the driver from the URL scheme.
    pub fn from_url(url: &str) -> Result<Self, AdapterError> {
        let scheme = url
            .split_once("://")
            .map(|(scheme, _)| scheme.to_ascii_lowercase())
            .ok_or_else(|| AdapterError::UnsupportedDriver("missing URL scheme".to_string()))?;

        match scheme.as_str() {
            "postgres" | "postgresql" => Ok(Driver::Postgres),
            "mysql" => Ok(Driver::MySql),
            other => Err(AdapterError::UnsupportedDriver(other.to_string())),
        }
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Driver::Postgres => write!(f, "postgres"),
            Driver::MySql => write!(f, "mysql"),
        }
    }
}

pub async fn open_source(url: &str) -> Result<Box<dyn RowSource>, AdapterError> {
    match Driver::from_url(url)? {
        Driver::Postgres => Ok(Box::new(PgSource::connect(url).await?)),
        Driver::MySql => Ok(Box::new(MySqlSource::connect(url).await?)),
    }
}

pub async fn open_sink(url: &str) -> Result<Box<dyn RowSink>, AdapterError> {
    match Driver::from_url(url)? {
        Driver::Postgres => Ok(Box::new(PgSink::connect(url).await?)),
        driver => Err(AdapterError::UnsupportedRole {
            driver: driver.to_string(),
            role: "destination",
        }),
    }
}
