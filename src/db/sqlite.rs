use std::borrow::Cow;
use std::str::FromStr;

use async_trait::async_trait;
use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteConnection},
    Connection, Executor,
};
use tokio::sync::Mutex;

use crate::{errors::DbError, models::connections::ConnectionConfig};

use super::{decode_row, DbSession, Row};

pub struct SqliteSession {
    conn: Mutex<SqliteConnection>,
}

impl SqliteSession {
    /// Opens `config.name` as a database file (created when missing) or an
    /// in-memory database for `:memory:`. Driver options become pragmas.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self, DbError> {
        let mut options = if config.name == ":memory:" {
            SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
        } else {
            SqliteConnectOptions::new()
                .filename(&config.name)
                .create_if_missing(true)
        };
        for (key, value) in &config.driver_options {
            options = options.pragma(
                Cow::<'static, str>::Owned(key.clone()),
                Cow::<'static, str>::Owned(value.clone()),
            );
        }

        let conn = SqliteConnection::connect_with(&options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!("opened sqlite database {}", config.name);
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

#[async_trait]
impl DbSession for SqliteSession {
    async fn execute(&self, query: &str) -> Result<u64, DbError> {
        let mut conn = self.conn.lock().await;
        let result = (&mut *conn).execute(query).await?;
        Ok(result.rows_affected())
    }

    async fn query(&self, query: &str) -> Result<Vec<Row>, DbError> {
        let mut conn = self.conn.lock().await;
        let rows = (&mut *conn).fetch_all(query).await?;
        Ok(rows.iter().map(decode_row).collect())
    }

    async fn close(self: Box<Self>) -> Result<(), DbError> {
        self.conn.into_inner().close().await?;
        info!("sqlite session closed");
        Ok(())
    }
}
