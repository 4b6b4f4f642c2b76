use async_trait::async_trait;
use log::info;
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::{
    mysql::{MySqlConnectOptions, MySqlConnection, MySqlRow},
    ConnectOptions, Connection, Executor, Row as _,
};
use tokio::sync::Mutex;

use crate::{errors::DbError, models::connections::ConnectionConfig};

use super::{decode_row_with, DbSession, Row};

/// A single MySQL connection. Statements go over the text protocol so DDL
/// and `SHOW` commands work unprepared.
pub struct MySqlSession {
    conn: Mutex<MySqlConnection>,
}

impl MySqlSession {
    pub async fn connect(config: &ConnectionConfig) -> Result<Self, DbError> {
        let url = config.connect_url()?;
        let options = MySqlConnectOptions::from_url(&url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
        let conn = MySqlConnection::connect_with(&options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(
            "connected to mysql database {} on {}:{}",
            config.name,
            config.host,
            config.port_or_default()
        );
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

#[async_trait]
impl DbSession for MySqlSession {
    async fn execute(&self, query: &str) -> Result<u64, DbError> {
        let mut conn = self.conn.lock().await;
        let result = (&mut *conn).execute(query).await?;
        Ok(result.rows_affected())
    }

    async fn query(&self, query: &str) -> Result<Vec<Row>, DbError> {
        let mut conn = self.conn.lock().await;
        let rows = (&mut *conn).fetch_all(query).await?;
        Ok(rows.iter().map(|row| decode_row_with(row, mysql_cell)).collect())
    }

    async fn close(self: Box<Self>) -> Result<(), DbError> {
        self.conn.into_inner().close().await?;
        info!("mysql session closed");
        Ok(())
    }
}

/// Unsigned integers and `DECIMAL` have no portable decoder.
fn mysql_cell(row: &MySqlRow, index: usize) -> Option<Value> {
    if let Ok(value) = row.try_get::<u64, _>(index) {
        return Some(Value::from(value));
    }
    row.try_get::<Decimal, _>(index)
        .ok()
        .map(|value| Value::String(value.to_string()))
}
