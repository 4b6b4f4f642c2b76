//! The capability surface a migration runner drives, the dialect-backed
//! adapter implementing it, and the decorators that wrap it.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use indexmap::IndexMap;

use crate::db::Row;
use crate::dialect::{DatabaseOptions, Dialect, NativeType};
use crate::errors::DbError;
use crate::models::connections::ConnectionConfig;
use crate::models::migration::{Direction, Migration, MigrationRecord};
use crate::models::schema::{Column, ColumnType, ForeignKey, Index, Table};

pub mod base;
pub mod command;
pub mod wrapper;

pub use base::{Adapter, AdapterState};
pub use command::{Command, CommandObserver, LogObserver, Operation};
pub use wrapper::{
    AdapterWrapper, Disposition, DryRunInterceptor, Interceptor, Passthrough, TimingInterceptor,
};

#[async_trait]
pub trait SchemaAdapter: Send + Sync {
    fn dialect(&self) -> Dialect;
    fn config(&self) -> &ConnectionConfig;
    fn is_connected(&self) -> bool;

    /// Opens the session and makes sure the version table exists. A no-op
    /// when already connected.
    async fn connect(&mut self) -> Result<(), DbError>;
    async fn disconnect(&mut self) -> Result<(), DbError>;

    async fn execute(&self, sql: &str) -> Result<u64, DbError>;
    async fn query(&self, sql: &str) -> Result<Vec<Row>, DbError>;
    async fn fetch_row(&self, sql: &str) -> Result<Option<Row>, DbError>;
    async fn fetch_all(&self, sql: &str) -> Result<Vec<Row>, DbError>;

    // Version bookkeeping.
    async fn get_versions(&self) -> Result<Vec<i64>, DbError>;
    async fn get_version_log(&self) -> Result<Vec<MigrationRecord>, DbError>;
    async fn migrated(
        &self,
        migration: &dyn Migration,
        direction: Direction,
        start_time: NaiveDateTime,
        end_time: NaiveDateTime,
    ) -> Result<(), DbError>;
    async fn toggle_breakpoint(&self, version: i64) -> Result<(), DbError>;
    async fn reset_all_breakpoints(&self) -> Result<u64, DbError>;
    async fn has_schema_table(&self) -> Result<bool, DbError>;
    async fn create_schema_table(&self) -> Result<(), DbError>;

    fn column_types(&self) -> Vec<ColumnType>;
    fn is_valid_column_type(&self, column: &Column) -> bool;
    fn sql_type(&self, column_type: ColumnType, limit: Option<u32>) -> Result<NativeType, DbError>;

    fn has_transactions(&self) -> bool;
    async fn begin_transaction(&self) -> Result<(), DbError>;
    async fn commit_transaction(&self) -> Result<(), DbError>;
    async fn rollback_transaction(&self) -> Result<(), DbError>;

    fn quote_table_name(&self, name: &str) -> String;
    fn quote_column_name(&self, name: &str) -> String;

    async fn has_table(&self, table: &str) -> Result<bool, DbError>;
    async fn create_table(&self, table: Table) -> Result<(), DbError>;
    async fn rename_table(&self, table: &str, new_name: &str) -> Result<(), DbError>;
    async fn drop_table(&self, table: &str) -> Result<(), DbError>;
    async fn describe_table(&self, table: &str) -> Result<Option<Row>, DbError>;

    async fn get_columns(&self, table: &str) -> Result<Vec<Column>, DbError>;
    async fn has_column(&self, table: &str, column: &str) -> Result<bool, DbError>;
    async fn add_column(&self, table: &str, column: &Column) -> Result<(), DbError>;
    async fn rename_column(&self, table: &str, column: &str, new_name: &str) -> Result<(), DbError>;
    async fn change_column(&self, table: &str, column: &str, new_column: &Column) -> Result<(), DbError>;
    async fn drop_column(&self, table: &str, column: &str) -> Result<(), DbError>;

    async fn get_indexes(&self, table: &str) -> Result<IndexMap<String, Index>, DbError>;
    async fn has_index(&self, table: &str, columns: &[&str]) -> Result<bool, DbError>;
    async fn add_index(&self, table: &str, index: &Index) -> Result<(), DbError>;
    async fn drop_index(&self, table: &str, columns: &[&str]) -> Result<(), DbError>;
    async fn drop_index_by_name(&self, table: &str, name: &str) -> Result<(), DbError>;

    async fn get_foreign_keys(&self, table: &str) -> Result<IndexMap<String, ForeignKey>, DbError>;
    async fn has_foreign_key(
        &self,
        table: &str,
        columns: &[&str],
        constraint: Option<&str>,
    ) -> Result<bool, DbError>;
    async fn add_foreign_key(&self, table: &str, foreign_key: &ForeignKey) -> Result<(), DbError>;
    async fn drop_foreign_key(
        &self,
        table: &str,
        columns: &[&str],
        constraint: Option<&str>,
    ) -> Result<(), DbError>;

    async fn create_database(&self, name: &str, options: &DatabaseOptions) -> Result<(), DbError>;
    async fn has_database(&self, name: &str) -> Result<bool, DbError>;
    async fn drop_database(&self, name: &str) -> Result<(), DbError>;
}
