//! Database adapter layer for schema migrations.
//!
//! An [`Adapter`] speaks one [`Dialect`] over one [`DbSession`]: it renders
//! schema changes to DDL, introspects the catalog and keeps the version table
//! that records applied migrations. [`AdapterWrapper`] decorates any
//! [`SchemaAdapter`] to time, log or skip mutating commands.

pub mod adapter;
pub mod db;
pub mod dialect;
pub mod errors;
pub mod models;

pub use adapter::{
    Adapter, AdapterState, AdapterWrapper, Command, CommandObserver, Disposition,
    DryRunInterceptor, Interceptor, LogObserver, Operation, Passthrough, SchemaAdapter,
    TimingInterceptor,
};
pub use db::{DbSession, Row};
pub use dialect::{DatabaseOptions, Dialect};
pub use errors::{DbError, Result};
pub use models::connections::ConnectionConfig;
pub use models::migration::{Direction, Migration, MigrationRecord};
pub use models::schema::{
    Column, ColumnType, DefaultValue, ForeignKey, ForeignKeyAction, IdColumn, Index, Table,
    TableOptions,
};
