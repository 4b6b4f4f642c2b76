use std::future::Future;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::NaiveDateTime;
use indexmap::IndexMap;
use log::info;

use super::command::Command;
use super::SchemaAdapter;
use crate::db::Row;
use crate::dialect::{DatabaseOptions, Dialect, NativeType};
use crate::errors::DbError;
use crate::models::connections::ConnectionConfig;
use crate::models::migration::{Direction, Migration, MigrationRecord};
use crate::models::schema::{Column, ColumnType, ForeignKey, Index, Table};

/// What a wrapper does with an intercepted command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Forward,
    Skip,
}

/// Hook consulted by [`AdapterWrapper`] for every mutating command.
pub trait Interceptor: Send + Sync {
    fn intercept(&self, command: &Command) -> Disposition;

    /// Called after a forwarded command finishes, successful or not.
    fn completed(&self, _command: &Command, _elapsed: Duration) {}
}

/// Forwards everything untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct Passthrough;

impl Interceptor for Passthrough {
    fn intercept(&self, _command: &Command) -> Disposition {
        Disposition::Forward
    }
}

/// Records how long each forwarded command took.
#[derive(Debug, Default)]
pub struct TimingInterceptor {
    timings: Mutex<Vec<(Command, Duration)>>,
}

impl TimingInterceptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timings(&self) -> Vec<(Command, Duration)> {
        self.timings
            .lock()
            .map(|timings| timings.clone())
            .unwrap_or_default()
    }
}

impl Interceptor for TimingInterceptor {
    fn intercept(&self, _command: &Command) -> Disposition {
        Disposition::Forward
    }

    fn completed(&self, command: &Command, elapsed: Duration) {
        info!("{} took {:.4}s", command, elapsed.as_secs_f64());
        if let Ok(mut timings) = self.timings.lock() {
            timings.push((command.clone(), elapsed));
        }
    }
}

/// Logs every mutating command, version bookkeeping included, and runs none.
#[derive(Debug, Default)]
pub struct DryRunInterceptor {
    skipped: Mutex<Vec<Command>>,
}

impl DryRunInterceptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skipped(&self) -> Vec<Command> {
        self.skipped
            .lock()
            .map(|skipped| skipped.clone())
            .unwrap_or_default()
    }
}

impl Interceptor for DryRunInterceptor {
    fn intercept(&self, command: &Command) -> Disposition {
        info!("[dry-run] {}", command);
        if let Ok(mut skipped) = self.skipped.lock() {
            skipped.push(command.clone());
        }
        Disposition::Skip
    }
}

/// Decorates another adapter (possibly another wrapper). Reads pass straight
/// through; mutating commands go through the interceptor first.
pub struct AdapterWrapper<I: Interceptor> {
    inner: Box<dyn SchemaAdapter>,
    interceptor: I,
}

impl<I: Interceptor> AdapterWrapper<I> {
    pub fn new(inner: Box<dyn SchemaAdapter>, interceptor: I) -> Self {
        Self { inner, interceptor }
    }

    pub fn inner(&self) -> &dyn SchemaAdapter {
        self.inner.as_ref()
    }

    pub fn interceptor(&self) -> &I {
        &self.interceptor
    }

    pub fn into_inner(self) -> Box<dyn SchemaAdapter> {
        self.inner
    }

    /// `forward` is lazy, so a skipped command never reaches the inner adapter.
    async fn intercepted<T, F>(&self, command: Command, skipped: T, forward: F) -> Result<T, DbError>
    where
        F: Future<Output = Result<T, DbError>>,
    {
        if self.interceptor.intercept(&command) == Disposition::Skip {
            return Ok(skipped);
        }
        let started = Instant::now();
        let result = forward.await;
        self.interceptor.completed(&command, started.elapsed());
        result
    }
}

#[async_trait]
impl<I: Interceptor> SchemaAdapter for AdapterWrapper<I> {
    fn dialect(&self) -> Dialect {
        self.inner.dialect()
    }

    fn config(&self) -> &ConnectionConfig {
        self.inner.config()
    }

    fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }

    async fn connect(&mut self) -> Result<(), DbError> {
        self.inner.connect().await
    }

    async fn disconnect(&mut self) -> Result<(), DbError> {
        self.inner.disconnect().await
    }

    async fn execute(&self, sql: &str) -> Result<u64, DbError> {
        self.intercepted(Command::execute(sql), 0, self.inner.execute(sql))
            .await
    }

    async fn query(&self, sql: &str) -> Result<Vec<Row>, DbError> {
        self.inner.query(sql).await
    }

    async fn fetch_row(&self, sql: &str) -> Result<Option<Row>, DbError> {
        self.inner.fetch_row(sql).await
    }

    async fn fetch_all(&self, sql: &str) -> Result<Vec<Row>, DbError> {
        self.inner.fetch_all(sql).await
    }

    async fn get_versions(&self) -> Result<Vec<i64>, DbError> {
        self.inner.get_versions().await
    }

    async fn get_version_log(&self) -> Result<Vec<MigrationRecord>, DbError> {
        self.inner.get_version_log().await
    }

    async fn migrated(
        &self,
        migration: &dyn Migration,
        direction: Direction,
        start_time: NaiveDateTime,
        end_time: NaiveDateTime,
    ) -> Result<(), DbError> {
        self.intercepted(
            Command::migrated(migration.version(), &direction.to_string()),
            (),
            self.inner.migrated(migration, direction, start_time, end_time),
        )
        .await
    }

    async fn toggle_breakpoint(&self, version: i64) -> Result<(), DbError> {
        self.intercepted(
            Command::toggle_breakpoint(version),
            (),
            self.inner.toggle_breakpoint(version),
        )
        .await
    }

    async fn reset_all_breakpoints(&self) -> Result<u64, DbError> {
        self.intercepted(
            Command::reset_all_breakpoints(),
            0,
            self.inner.reset_all_breakpoints(),
        )
        .await
    }

    async fn has_schema_table(&self) -> Result<bool, DbError> {
        self.inner.has_schema_table().await
    }

    async fn create_schema_table(&self) -> Result<(), DbError> {
        self.intercepted(
            Command::create_schema_table(&self.inner.config().schema_table),
            (),
            self.inner.create_schema_table(),
        )
        .await
    }

    fn column_types(&self) -> Vec<ColumnType> {
        self.inner.column_types()
    }

    fn is_valid_column_type(&self, column: &Column) -> bool {
        self.inner.is_valid_column_type(column)
    }

    fn sql_type(&self, column_type: ColumnType, limit: Option<u32>) -> Result<NativeType, DbError> {
        self.inner.sql_type(column_type, limit)
    }

    fn has_transactions(&self) -> bool {
        self.inner.has_transactions()
    }

    async fn begin_transaction(&self) -> Result<(), DbError> {
        self.inner.begin_transaction().await
    }

    async fn commit_transaction(&self) -> Result<(), DbError> {
        self.inner.commit_transaction().await
    }

    async fn rollback_transaction(&self) -> Result<(), DbError> {
        self.inner.rollback_transaction().await
    }

    fn quote_table_name(&self, name: &str) -> String {
        self.inner.quote_table_name(name)
    }

    fn quote_column_name(&self, name: &str) -> String {
        self.inner.quote_column_name(name)
    }

    async fn has_table(&self, table: &str) -> Result<bool, DbError> {
        self.inner.has_table(table).await
    }

    async fn create_table(&self, table: Table) -> Result<(), DbError> {
        let command = Command::create_table(&table.name);
        self.intercepted(command, (), self.inner.create_table(table))
            .await
    }

    async fn rename_table(&self, table: &str, new_name: &str) -> Result<(), DbError> {
        self.intercepted(
            Command::rename_table(table, new_name),
            (),
            self.inner.rename_table(table, new_name),
        )
        .await
    }

    async fn drop_table(&self, table: &str) -> Result<(), DbError> {
        self.intercepted(Command::drop_table(table), (), self.inner.drop_table(table))
            .await
    }

    async fn describe_table(&self, table: &str) -> Result<Option<Row>, DbError> {
        self.inner.describe_table(table).await
    }

    async fn get_columns(&self, table: &str) -> Result<Vec<Column>, DbError> {
        self.inner.get_columns(table).await
    }

    async fn has_column(&self, table: &str, column: &str) -> Result<bool, DbError> {
        self.inner.has_column(table, column).await
    }

    async fn add_column(&self, table: &str, column: &Column) -> Result<(), DbError> {
        self.intercepted(
            Command::add_column(table, &column.name),
            (),
            self.inner.add_column(table, column),
        )
        .await
    }

    async fn rename_column(&self, table: &str, column: &str, new_name: &str) -> Result<(), DbError> {
        self.intercepted(
            Command::rename_column(table, column, new_name),
            (),
            self.inner.rename_column(table, column, new_name),
        )
        .await
    }

    async fn change_column(&self, table: &str, column: &str, new_column: &Column) -> Result<(), DbError> {
        self.intercepted(
            Command::change_column(table, column),
            (),
            self.inner.change_column(table, column, new_column),
        )
        .await
    }

    async fn drop_column(&self, table: &str, column: &str) -> Result<(), DbError> {
        self.intercepted(
            Command::drop_column(table, column),
            (),
            self.inner.drop_column(table, column),
        )
        .await
    }

    async fn get_indexes(&self, table: &str) -> Result<IndexMap<String, Index>, DbError> {
        self.inner.get_indexes(table).await
    }

    async fn has_index(&self, table: &str, columns: &[&str]) -> Result<bool, DbError> {
        self.inner.has_index(table, columns).await
    }

    async fn add_index(&self, table: &str, index: &Index) -> Result<(), DbError> {
        self.intercepted(
            Command::add_index(table, &index.columns),
            (),
            self.inner.add_index(table, index),
        )
        .await
    }

    async fn drop_index(&self, table: &str, columns: &[&str]) -> Result<(), DbError> {
        self.intercepted(
            Command::drop_index(table, columns),
            (),
            self.inner.drop_index(table, columns),
        )
        .await
    }

    async fn drop_index_by_name(&self, table: &str, name: &str) -> Result<(), DbError> {
        self.intercepted(
            Command::drop_index_by_name(table, name),
            (),
            self.inner.drop_index_by_name(table, name),
        )
        .await
    }

    async fn get_foreign_keys(&self, table: &str) -> Result<IndexMap<String, ForeignKey>, DbError> {
        self.inner.get_foreign_keys(table).await
    }

    async fn has_foreign_key(
        &self,
        table: &str,
        columns: &[&str],
        constraint: Option<&str>,
    ) -> Result<bool, DbError> {
        self.inner.has_foreign_key(table, columns, constraint).await
    }

    async fn add_foreign_key(&self, table: &str, foreign_key: &ForeignKey) -> Result<(), DbError> {
        self.intercepted(
            Command::add_foreign_key(table, foreign_key.columns()),
            (),
            self.inner.add_foreign_key(table, foreign_key),
        )
        .await
    }

    async fn drop_foreign_key(
        &self,
        table: &str,
        columns: &[&str],
        constraint: Option<&str>,
    ) -> Result<(), DbError> {
        self.intercepted(
            Command::drop_foreign_key(table, columns, constraint),
            (),
            self.inner.drop_foreign_key(table, columns, constraint),
        )
        .await
    }

    async fn create_database(&self, name: &str, options: &DatabaseOptions) -> Result<(), DbError> {
        self.intercepted(
            Command::create_database(name),
            (),
            self.inner.create_database(name, options),
        )
        .await
    }

    async fn has_database(&self, name: &str) -> Result<bool, DbError> {
        self.inner.has_database(name).await
    }

    async fn drop_database(&self, name: &str) -> Result<(), DbError> {
        self.intercepted(
            Command::drop_database(name),
            (),
            self.inner.drop_database(name),
        )
        .await
    }
}
