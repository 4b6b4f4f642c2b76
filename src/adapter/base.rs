use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use indexmap::IndexMap;
use log::{debug, info, warn};

use super::command::{Command, CommandObserver, LogObserver};
use super::SchemaAdapter;
use crate::db::{DbSession, Row};
use crate::dialect::introspect::find_index;
use crate::dialect::{DatabaseOptions, DdlGenerator, Dialect, Introspector, NativeType, TypeMapper};
use crate::errors::DbError;
use crate::models::connections::ConnectionConfig;
use crate::models::migration::{parse_timestamp, Direction, Migration, MigrationRecord};
use crate::models::schema::{Column, ColumnType, ForeignKey, Index, Table};

/// Where an adapter is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterState {
    Disconnected,
    /// Session open, version table not yet verified.
    Connected,
    /// Session open and version table present.
    Ready,
}

fn owned(columns: &[&str]) -> Vec<String> {
    columns.iter().map(|column| column.to_string()).collect()
}

/// The dialect-backed implementation of [`SchemaAdapter`].
pub struct Adapter {
    config: ConnectionConfig,
    dialect: Dialect,
    types: TypeMapper,
    ddl: DdlGenerator,
    introspector: Introspector,
    session: Option<Box<dyn DbSession>>,
    schema_ready: bool,
    observer: Arc<dyn CommandObserver>,
}

impl Adapter {
    pub fn new(config: ConnectionConfig) -> Self {
        let dialect = config.dialect;
        Self {
            config,
            dialect,
            types: TypeMapper::new(dialect),
            ddl: DdlGenerator::new(dialect),
            introspector: Introspector::new(dialect),
            session: None,
            schema_ready: false,
            observer: Arc::new(LogObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn CommandObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn state(&self) -> AdapterState {
        match (&self.session, self.schema_ready) {
            (None, _) => AdapterState::Disconnected,
            (Some(_), false) => AdapterState::Connected,
            (Some(_), true) => AdapterState::Ready,
        }
    }

    pub fn ddl(&self) -> &DdlGenerator {
        &self.ddl
    }

    /// Adopts an already open session and runs the same bootstrap as
    /// `connect`. On failure the session is closed and the adapter stays
    /// disconnected.
    pub async fn attach(&mut self, session: Box<dyn DbSession>) -> Result<(), DbError> {
        if let Some(previous) = self.session.take() {
            previous.close().await?;
        }
        self.session = Some(session);
        self.schema_ready = false;

        match self.bootstrap().await {
            Ok(()) => {
                self.schema_ready = true;
                info!("{} adapter ready ({})", self.dialect, self.config.name);
                Ok(())
            }
            Err(e) => {
                if let Some(session) = self.session.take() {
                    if let Err(close_error) = session.close().await {
                        warn!("failed to close session after bootstrap error: {}", close_error);
                    }
                }
                Err(e)
            }
        }
    }

    async fn bootstrap(&self) -> Result<(), DbError> {
        if !self.has_schema_table().await? {
            info!("creating version table {}", self.config.schema_table);
            self.create_schema_table().await?;
        }
        Ok(())
    }

    fn session(&self) -> Result<&dyn DbSession, DbError> {
        self.session.as_deref().ok_or(DbError::NotConnected)
    }

    async fn run(&self, sql: &str) -> Result<u64, DbError> {
        let session = self.session()?;
        debug!("{}", sql);
        session.execute(sql).await
    }

    async fn run_all(&self, statements: &[String]) -> Result<(), DbError> {
        for statement in statements {
            self.run(statement).await?;
        }
        Ok(())
    }

    /// Reports `command` to the observer and times `work`, from statement
    /// generation through execution.
    async fn instrument<F>(&self, command: Command, work: F) -> Result<(), DbError>
    where
        F: Future<Output = Result<(), DbError>>,
    {
        self.session()?;
        self.observer.before(&command);
        let started = Instant::now();
        let result = work.await;
        self.observer.after(&command, started.elapsed());
        result
    }
}

#[async_trait]
impl SchemaAdapter for Adapter {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    async fn connect(&mut self) -> Result<(), DbError> {
        if self.session.is_some() {
            return Ok(());
        }
        let session = self.dialect.open_session(&self.config).await?;
        self.attach(session).await
    }

    async fn disconnect(&mut self) -> Result<(), DbError> {
        self.schema_ready = false;
        if let Some(session) = self.session.take() {
            session.close().await?;
            info!("disconnected from {}", self.config.name);
        }
        Ok(())
    }

    async fn execute(&self, sql: &str) -> Result<u64, DbError> {
        self.run(sql).await
    }

    async fn query(&self, sql: &str) -> Result<Vec<Row>, DbError> {
        let session = self.session()?;
        debug!("{}", sql);
        session.query(sql).await
    }

    async fn fetch_row(&self, sql: &str) -> Result<Option<Row>, DbError> {
        let session = self.session()?;
        debug!("{}", sql);
        session.fetch_row(sql).await
    }

    async fn fetch_all(&self, sql: &str) -> Result<Vec<Row>, DbError> {
        let session = self.session()?;
        debug!("{}", sql);
        session.fetch_all(sql).await
    }

    async fn get_versions(&self) -> Result<Vec<i64>, DbError> {
        Ok(self
            .get_version_log()
            .await?
            .into_iter()
            .map(|record| record.version)
            .collect())
    }

    async fn get_version_log(&self) -> Result<Vec<MigrationRecord>, DbError> {
        let rows = self
            .fetch_all(&self.ddl.versions_query(&self.config.schema_table))
            .await?;
        Ok(rows
            .iter()
            .filter_map(|row| {
                Some(MigrationRecord {
                    version: row.get_i64("version")?,
                    migration_name: row.get_str("migration_name"),
                    start_time: row.get_str("start_time").and_then(|t| parse_timestamp(&t)),
                    end_time: row.get_str("end_time").and_then(|t| parse_timestamp(&t)),
                    breakpoint: row.get_bool("breakpoint").unwrap_or(false),
                })
            })
            .collect())
    }

    async fn migrated(
        &self,
        migration: &dyn Migration,
        direction: Direction,
        start_time: NaiveDateTime,
        end_time: NaiveDateTime,
    ) -> Result<(), DbError> {
        let table = &self.config.schema_table;
        let sql = match direction {
            Direction::Up => self.ddl.insert_version(table, migration, start_time, end_time),
            Direction::Down => self.ddl.delete_version(table, migration.version()),
        };
        self.run(&sql).await?;
        Ok(())
    }

    async fn toggle_breakpoint(&self, version: i64) -> Result<(), DbError> {
        self.run(&self.ddl.toggle_breakpoint(&self.config.schema_table, version))
            .await?;
        Ok(())
    }

    async fn reset_all_breakpoints(&self) -> Result<u64, DbError> {
        self.run(&self.ddl.reset_all_breakpoints(&self.config.schema_table))
            .await
    }

    async fn has_schema_table(&self) -> Result<bool, DbError> {
        self.has_table(&self.config.schema_table).await
    }

    async fn create_schema_table(&self) -> Result<(), DbError> {
        let table = self.ddl.version_table(&self.config.schema_table);
        self.run_all(&self.ddl.create_table(&table)?).await
    }

    fn column_types(&self) -> Vec<ColumnType> {
        self.types.column_types()
    }

    fn is_valid_column_type(&self, column: &Column) -> bool {
        self.column_types().contains(&column.column_type)
    }

    fn sql_type(&self, column_type: ColumnType, limit: Option<u32>) -> Result<NativeType, DbError> {
        self.types.to_native(column_type, limit)
    }

    fn has_transactions(&self) -> bool {
        self.dialect.has_transactions()
    }

    async fn begin_transaction(&self) -> Result<(), DbError> {
        self.run(self.dialect.begin_transaction_sql()).await?;
        Ok(())
    }

    async fn commit_transaction(&self) -> Result<(), DbError> {
        self.run(self.dialect.commit_transaction_sql()).await?;
        Ok(())
    }

    async fn rollback_transaction(&self) -> Result<(), DbError> {
        self.run(self.dialect.rollback_transaction_sql()).await?;
        Ok(())
    }

    fn quote_table_name(&self, name: &str) -> String {
        self.dialect.quote_table_name(name)
    }

    fn quote_column_name(&self, name: &str) -> String {
        self.dialect.quote_column_name(name)
    }

    async fn has_table(&self, table: &str) -> Result<bool, DbError> {
        self.introspector
            .table_exists(self.session()?, &self.config.name, table)
            .await
    }

    async fn create_table(&self, table: Table) -> Result<(), DbError> {
        self.instrument(Command::create_table(&table.name), async {
            let statements = self.ddl.create_table(&table)?;
            self.run_all(&statements).await
        })
        .await
    }

    async fn rename_table(&self, table: &str, new_name: &str) -> Result<(), DbError> {
        self.instrument(Command::rename_table(table, new_name), async {
            self.run(&self.ddl.rename_table(table, new_name)).await?;
            Ok(())
        })
        .await
    }

    async fn drop_table(&self, table: &str) -> Result<(), DbError> {
        self.instrument(Command::drop_table(table), async {
            self.run(&self.ddl.drop_table(table)).await?;
            Ok(())
        })
        .await
    }

    async fn describe_table(&self, table: &str) -> Result<Option<Row>, DbError> {
        self.fetch_row(&self.introspector.describe_table_query(&self.config.name, table))
            .await
    }

    async fn get_columns(&self, table: &str) -> Result<Vec<Column>, DbError> {
        self.introspector.list_columns(self.session()?, table).await
    }

    async fn has_column(&self, table: &str, column: &str) -> Result<bool, DbError> {
        self.introspector
            .column_exists(self.session()?, table, column)
            .await
    }

    async fn add_column(&self, table: &str, column: &Column) -> Result<(), DbError> {
        self.instrument(Command::add_column(table, &column.name), async {
            self.run_all(&self.ddl.add_column(table, column)?).await
        })
        .await
    }

    async fn rename_column(&self, table: &str, column: &str, new_name: &str) -> Result<(), DbError> {
        self.instrument(Command::rename_column(table, column, new_name), async {
            let descriptions = self
                .introspector
                .describe_columns(self.session()?, table)
                .await?;
            let current = descriptions
                .iter()
                .find(|description| description.name.eq_ignore_ascii_case(column))
                .ok_or_else(|| DbError::column_not_found(table, column))?;
            self.run(&self.ddl.rename_column(table, &current.name, new_name, current))
                .await?;
            Ok(())
        })
        .await
    }

    async fn change_column(&self, table: &str, column: &str, new_column: &Column) -> Result<(), DbError> {
        self.instrument(Command::change_column(table, column), async {
            self.run_all(&self.ddl.change_column(table, column, new_column)?)
                .await
        })
        .await
    }

    async fn drop_column(&self, table: &str, column: &str) -> Result<(), DbError> {
        self.instrument(Command::drop_column(table, column), async {
            self.run(&self.ddl.drop_column(table, column)).await?;
            Ok(())
        })
        .await
    }

    async fn get_indexes(&self, table: &str) -> Result<IndexMap<String, Index>, DbError> {
        self.introspector.list_indexes(self.session()?, table).await
    }

    async fn has_index(&self, table: &str, columns: &[&str]) -> Result<bool, DbError> {
        self.introspector
            .index_matches(self.session()?, table, &owned(columns))
            .await
    }

    async fn add_index(&self, table: &str, index: &Index) -> Result<(), DbError> {
        self.instrument(Command::add_index(table, &index.columns), async {
            self.run(&self.ddl.add_index(table, index)).await?;
            Ok(())
        })
        .await
    }

    async fn drop_index(&self, table: &str, columns: &[&str]) -> Result<(), DbError> {
        self.instrument(Command::drop_index(table, columns), async {
            if columns.is_empty() {
                debug!("no columns given, leaving the indexes on {} alone", table);
                return Ok(());
            }
            let indexes = self.introspector.list_indexes(self.session()?, table).await?;
            if let Some(name) = find_index(&indexes, &owned(columns)) {
                self.run(&self.ddl.drop_index(table, name)).await?;
            }
            Ok(())
        })
        .await
    }

    async fn drop_index_by_name(&self, table: &str, name: &str) -> Result<(), DbError> {
        self.instrument(Command::drop_index_by_name(table, name), async {
            let indexes = self.introspector.list_indexes(self.session()?, table).await?;
            if indexes.contains_key(name) {
                self.run(&self.ddl.drop_index(table, name)).await?;
            }
            Ok(())
        })
        .await
    }

    async fn get_foreign_keys(&self, table: &str) -> Result<IndexMap<String, ForeignKey>, DbError> {
        self.introspector
            .list_foreign_keys(self.session()?, table)
            .await
    }

    async fn has_foreign_key(
        &self,
        table: &str,
        columns: &[&str],
        constraint: Option<&str>,
    ) -> Result<bool, DbError> {
        self.introspector
            .foreign_key_matches(self.session()?, table, &owned(columns), constraint)
            .await
    }

    async fn add_foreign_key(&self, table: &str, foreign_key: &ForeignKey) -> Result<(), DbError> {
        self.instrument(Command::add_foreign_key(table, foreign_key.columns()), async {
            self.run(&self.ddl.add_foreign_key(table, foreign_key)?).await?;
            Ok(())
        })
        .await
    }

    /// With a constraint name, drops exactly that constraint. Otherwise
    /// drops every constraint touching any of `columns`, each once.
    async fn drop_foreign_key(
        &self,
        table: &str,
        columns: &[&str],
        constraint: Option<&str>,
    ) -> Result<(), DbError> {
        self.instrument(Command::drop_foreign_key(table, columns, constraint), async {
            if let Some(constraint) = constraint {
                self.run(&self.ddl.drop_foreign_key(table, constraint)?).await?;
                return Ok(());
            }

            let keys = self
                .introspector
                .list_foreign_keys(self.session()?, table)
                .await?;
            let mut names: Vec<&str> = Vec::new();
            for column in columns {
                for (name, key) in &keys {
                    let touches = key
                        .columns()
                        .iter()
                        .any(|have| have.eq_ignore_ascii_case(column));
                    if touches && !names.contains(&name.as_str()) {
                        names.push(name);
                    }
                }
            }
            for name in names {
                self.run(&self.ddl.drop_foreign_key(table, name)?).await?;
            }
            Ok(())
        })
        .await
    }

    async fn create_database(&self, name: &str, options: &DatabaseOptions) -> Result<(), DbError> {
        self.instrument(Command::create_database(name), async {
            self.run(&self.ddl.create_database(name, options)?).await?;
            Ok(())
        })
        .await
    }

    async fn has_database(&self, name: &str) -> Result<bool, DbError> {
        let rows = self
            .fetch_all(&self.introspector.database_query(name))
            .await?;
        Ok(!rows.is_empty())
    }

    async fn drop_database(&self, name: &str) -> Result<(), DbError> {
        self.instrument(Command::drop_database(name), async {
            self.run(&self.ddl.drop_database(name)?).await?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_new_adapter_is_disconnected() {
        let adapter = Adapter::new(ConnectionConfig::sqlite_memory());
        assert_eq!(adapter.state(), AdapterState::Disconnected);
        assert!(!adapter.is_connected());
    }

    #[tokio::test]
    async fn test_mutations_require_a_session() {
        let adapter = Adapter::new(ConnectionConfig::new(Dialect::MySql, "app"));

        assert!(matches!(
            adapter.drop_table("users").await,
            Err(DbError::NotConnected)
        ));
        assert!(matches!(
            adapter.create_table(Table::new("users")).await,
            Err(DbError::NotConnected)
        ));
        assert!(matches!(
            adapter.has_table("users").await,
            Err(DbError::NotConnected)
        ));
        assert!(matches!(
            adapter.get_versions().await,
            Err(DbError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_disconnect_when_disconnected_is_a_no_op() {
        let mut adapter = Adapter::new(ConnectionConfig::sqlite_memory());
        assert!(adapter.disconnect().await.is_ok());
        assert_eq!(adapter.state(), AdapterState::Disconnected);
    }

    #[test]
    fn test_column_type_validation() {
        let adapter = Adapter::new(ConnectionConfig::sqlite_memory());
        assert!(adapter.is_valid_column_type(&Column::new("title", ColumnType::String)));
        assert!(!adapter.is_valid_column_type(&Column::new("area", ColumnType::Polygon)));
        assert_eq!(
            adapter.sql_type(ColumnType::String, None).unwrap().to_string(),
            "varchar(255)"
        );
    }
}
