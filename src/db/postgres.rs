use async_trait::async_trait;
use log::info;
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::{
    postgres::{PgConnectOptions, PgConnection, PgRow},
    ConnectOptions, Connection, Executor, Row as _,
};
use tokio::sync::Mutex;

use crate::{errors::DbError, models::connections::ConnectionConfig};

use super::{decode_row_with, DbSession, Row};

/// A single PostgreSQL connection. Statements use the simple query protocol,
/// so multi-statement DDL runs unprepared.
pub struct PgSession {
    conn: Mutex<PgConnection>,
}

impl PgSession {
    pub async fn connect(config: &ConnectionConfig) -> Result<Self, DbError> {
        let url = config.connect_url()?;
        let options = PgConnectOptions::from_url(&url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
        let conn = PgConnection::connect_with(&options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(
            "connected to postgres database {} on {}:{}",
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
impl DbSession for PgSession {
    async fn execute(&self, query: &str) -> Result<u64, DbError> {
        let mut conn = self.conn.lock().await;
        let result = (&mut *conn).execute(query).await?;
        Ok(result.rows_affected())
    }

    async fn query(&self, query: &str) -> Result<Vec<Row>, DbError> {
        let mut conn = self.conn.lock().await;
        let rows = (&mut *conn).fetch_all(query).await?;
        Ok(rows.iter().map(|row| decode_row_with(row, pg_cell)).collect())
    }

    async fn close(self: Box<Self>) -> Result<(), DbError> {
        self.conn.into_inner().close().await?;
        info!("postgres session closed");
        Ok(())
    }
}

/// `NUMERIC` keeps its scale by travelling as text.
fn pg_cell(row: &PgRow, index: usize) -> Option<Value> {
    row.try_get::<Decimal, _>(index)
        .ok()
        .map(|value| Value::String(value.to_string()))
}
