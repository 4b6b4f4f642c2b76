//! Dialect-specific SQL: identifier quoting, type mapping, DDL rendering and
//! catalog introspection for each supported database.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::db::DbSession;
use crate::errors::DbError;
use crate::models::connections::ConnectionConfig;
use crate::models::schema::ColumnType;

pub mod ddl;
pub mod introspect;
pub mod types;

pub use ddl::{DatabaseOptions, DdlGenerator};
pub use introspect::{ColumnDescription, Introspector};
pub use types::{NativeType, ParsedType, TypeMapper};

/// The closed set of supported databases, chosen once per adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    MySql,
    Postgres,
    Sqlite,
}

impl Dialect {
    pub fn name(&self) -> &'static str {
        match self {
            Dialect::MySql => "mysql",
            Dialect::Postgres => "postgres",
            Dialect::Sqlite => "sqlite",
        }
    }

    /// Quotes a single identifier, doubling any embedded quote character.
    pub fn quote_column_name(&self, name: &str) -> String {
        match self {
            Dialect::MySql => format!("`{}`", name.replace('`', "``")),
            Dialect::Postgres | Dialect::Sqlite => format!("\"{}\"", name.replace('"', "\"\"")),
        }
    }

    /// Quotes a possibly schema-qualified table name part by part.
    pub fn quote_table_name(&self, name: &str) -> String {
        name.split('.')
            .map(|part| self.quote_column_name(part))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Renders a string literal. MySQL also treats backslash as an escape.
    pub fn quote_string(&self, value: &str) -> String {
        match self {
            Dialect::MySql => format!("'{}'", value.replace('\\', "\\\\").replace('\'', "''")),
            Dialect::Postgres | Dialect::Sqlite => format!("'{}'", value.replace('\'', "''")),
        }
    }

    pub fn boolean_literal(&self, value: bool) -> &'static str {
        match (self, value) {
            (Dialect::Postgres, true) => "true",
            (Dialect::Postgres, false) => "false",
            (_, true) => "1",
            (_, false) => "0",
        }
    }

    /// Abstract types that accept an `unsigned` marker.
    pub fn is_signed_type(&self, column_type: ColumnType) -> bool {
        match self {
            Dialect::MySql => matches!(
                column_type,
                ColumnType::Integer
                    | ColumnType::BigInteger
                    | ColumnType::Float
                    | ColumnType::Decimal
            ),
            Dialect::Postgres | Dialect::Sqlite => false,
        }
    }

    pub fn has_transactions(&self) -> bool {
        true
    }

    pub fn begin_transaction_sql(&self) -> &'static str {
        match self {
            Dialect::MySql => "START TRANSACTION",
            Dialect::Postgres => "BEGIN",
            Dialect::Sqlite => "BEGIN TRANSACTION",
        }
    }

    pub fn commit_transaction_sql(&self) -> &'static str {
        "COMMIT"
    }

    pub fn rollback_transaction_sql(&self) -> &'static str {
        "ROLLBACK"
    }

    /// Opens a session with the driver compiled in for this dialect.
    pub async fn open_session(
        &self,
        config: &ConnectionConfig,
    ) -> Result<Box<dyn DbSession>, DbError> {
        match self {
            #[cfg(feature = "mysql")]
            Dialect::MySql => Ok(Box::new(
                crate::db::mysql::MySqlSession::connect(config).await?,
            )),
            #[cfg(feature = "postgres")]
            Dialect::Postgres => Ok(Box::new(
                crate::db::postgres::PgSession::connect(config).await?,
            )),
            #[cfg(feature = "sqlite")]
            Dialect::Sqlite => Ok(Box::new(
                crate::db::sqlite::SqliteSession::connect(config).await?,
            )),
            #[allow(unreachable_patterns)]
            other => {
                let _ = config;
                Err(DbError::DriverUnavailable(other.name().to_string()))
            }
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
