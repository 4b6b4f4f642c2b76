use std::fmt;
use std::time::Duration;

use log::{debug, info};

/// Schema and bookkeeping operations that change the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateTable,
    RenameTable,
    DropTable,
    AddColumn,
    RenameColumn,
    ChangeColumn,
    DropColumn,
    AddIndex,
    DropIndex,
    DropIndexByName,
    AddForeignKey,
    DropForeignKey,
    CreateDatabase,
    DropDatabase,
    Migrated,
    ToggleBreakpoint,
    ResetAllBreakpoints,
    CreateSchemaTable,
    Execute,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::CreateTable => "create_table",
            Operation::RenameTable => "rename_table",
            Operation::DropTable => "drop_table",
            Operation::AddColumn => "add_column",
            Operation::RenameColumn => "rename_column",
            Operation::ChangeColumn => "change_column",
            Operation::DropColumn => "drop_column",
            Operation::AddIndex => "add_index",
            Operation::DropIndex => "drop_index",
            Operation::DropIndexByName => "drop_index_by_name",
            Operation::AddForeignKey => "add_foreign_key",
            Operation::DropForeignKey => "drop_foreign_key",
            Operation::CreateDatabase => "create_database",
            Operation::DropDatabase => "drop_database",
            Operation::Migrated => "migrated",
            Operation::ToggleBreakpoint => "toggle_breakpoint",
            Operation::ResetAllBreakpoints => "reset_all_breakpoints",
            Operation::CreateSchemaTable => "create_schema_table",
            Operation::Execute => "execute",
        }
    }

    /// Version table writes, as opposed to schema changes.
    pub fn is_bookkeeping(&self) -> bool {
        matches!(
            self,
            Operation::Migrated
                | Operation::ToggleBreakpoint
                | Operation::ResetAllBreakpoints
                | Operation::CreateSchemaTable
        )
    }
}

/// A mutating call and its arguments, as reported to observers and interceptors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub operation: Operation,
    pub args: Vec<String>,
}

fn list(columns: &[&str]) -> String {
    format!("[{}]", columns.join(", "))
}

impl Command {
    pub fn new<I, S>(operation: Operation, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            operation,
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn create_table(table: &str) -> Self {
        Self::new(Operation::CreateTable, [table])
    }

    pub fn rename_table(table: &str, new_name: &str) -> Self {
        Self::new(Operation::RenameTable, [table, new_name])
    }

    pub fn drop_table(table: &str) -> Self {
        Self::new(Operation::DropTable, [table])
    }

    pub fn add_column(table: &str, column: &str) -> Self {
        Self::new(Operation::AddColumn, [table, column])
    }

    pub fn rename_column(table: &str, column: &str, new_name: &str) -> Self {
        Self::new(Operation::RenameColumn, [table, column, new_name])
    }

    pub fn change_column(table: &str, column: &str) -> Self {
        Self::new(Operation::ChangeColumn, [table, column])
    }

    pub fn drop_column(table: &str, column: &str) -> Self {
        Self::new(Operation::DropColumn, [table, column])
    }

    pub fn add_index(table: &str, columns: &[String]) -> Self {
        let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
        Self::new(Operation::AddIndex, [table.to_string(), list(&columns)])
    }

    pub fn drop_index(table: &str, columns: &[&str]) -> Self {
        Self::new(Operation::DropIndex, [table.to_string(), list(columns)])
    }

    pub fn drop_index_by_name(table: &str, name: &str) -> Self {
        Self::new(Operation::DropIndexByName, [table, name])
    }

    pub fn add_foreign_key(table: &str, columns: &[String]) -> Self {
        let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
        Self::new(Operation::AddForeignKey, [table.to_string(), list(&columns)])
    }

    pub fn drop_foreign_key(table: &str, columns: &[&str], constraint: Option<&str>) -> Self {
        let mut args = vec![table.to_string(), list(columns)];
        args.extend(constraint.map(str::to_string));
        Self::new(Operation::DropForeignKey, args)
    }

    pub fn create_database(name: &str) -> Self {
        Self::new(Operation::CreateDatabase, [name])
    }

    pub fn drop_database(name: &str) -> Self {
        Self::new(Operation::DropDatabase, [name])
    }

    pub fn migrated(version: i64, direction: &str) -> Self {
        Self::new(Operation::Migrated, [version.to_string(), direction.to_string()])
    }

    pub fn toggle_breakpoint(version: i64) -> Self {
        Self::new(Operation::ToggleBreakpoint, [version.to_string()])
    }

    pub fn reset_all_breakpoints() -> Self {
        Self::new(Operation::ResetAllBreakpoints, Vec::<String>::new())
    }

    pub fn create_schema_table(table: &str) -> Self {
        Self::new(Operation::CreateSchemaTable, [table])
    }

    /// Raw SQL handed straight to the session.
    pub fn execute(sql: &str) -> Self {
        Self::new(Operation::Execute, [sql])
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.operation.as_str(), self.args.join(", "))
    }
}

/// Told about every schema-mutating command the adapter runs.
pub trait CommandObserver: Send + Sync {
    fn before(&self, command: &Command);
    fn after(&self, command: &Command, elapsed: Duration);
}

/// Writes commands and their timings through the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl CommandObserver for LogObserver {
    fn before(&self, command: &Command) {
        info!("== {}", command);
    }

    fn after(&self, command: &Command, elapsed: Duration) {
        debug!("-> {} {:.4}s", command.operation.as_str(), elapsed.as_secs_f64());
    }
}
