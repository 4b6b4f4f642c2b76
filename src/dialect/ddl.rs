use chrono::NaiveDateTime;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::introspect::ColumnDescription;
use super::types::TypeMapper;
use super::Dialect;
use crate::errors::DbError;
use crate::models::migration::{Migration, TIMESTAMP_FORMAT};
use crate::models::schema::{
    is_numeric_literal, Column, ColumnType, DefaultValue, ForeignKey, IdColumn, Index, Table,
    TableOptions,
};

/// Longest migration name the version table stores.
pub const MIGRATION_NAME_LIMIT: usize = 100;

fn default_charset() -> String {
    "utf8".to_string()
}

/// Options for `create_database`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseOptions {
    #[serde(default = "default_charset")]
    pub charset: String,
    #[serde(default)]
    pub collation: Option<String>,
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        Self {
            charset: default_charset(),
            collation: None,
        }
    }
}

/// Renders schema changes as SQL statements for one dialect.
///
/// Every method is pure: statements come back as strings and the caller
/// decides when to execute them. Operations the dialect cannot express
/// fail with `UnsupportedOperation`.
#[derive(Debug, Clone, Copy)]
pub struct DdlGenerator {
    dialect: Dialect,
    types: TypeMapper,
}

impl DdlGenerator {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            types: TypeMapper::new(dialect),
        }
    }

    fn quote(&self, name: &str) -> String {
        self.dialect.quote_column_name(name)
    }

    fn quote_table(&self, name: &str) -> String {
        self.dialect.quote_table_name(name)
    }

    fn quote_list(&self, columns: &[String]) -> String {
        columns
            .iter()
            .map(|column| self.quote(column))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn unsupported(&self, operation: &str) -> DbError {
        DbError::unsupported(self.dialect.name(), operation)
    }

    /// Native type with its arguments, e.g. `INT(11) unsigned` or `DECIMAL(10,2)`.
    fn type_sql(&self, column: &Column, allow_serial: bool) -> Result<String, DbError> {
        if allow_serial && column.identity && self.dialect == Dialect::Postgres {
            match column.column_type {
                ColumnType::Integer => return Ok("SERIAL".to_string()),
                ColumnType::BigInteger => return Ok("BIGSERIAL".to_string()),
                _ => {}
            }
        }

        let native = self.types.to_native(column.column_type, column.limit)?;
        let mut sql = native.name.to_ascii_uppercase();
        match (column.precision, column.scale) {
            (Some(precision), Some(scale)) => {
                sql.push_str(&format!("({},{})", precision, scale));
            }
            _ => {
                if let Some(limit) = native.limit {
                    sql.push_str(&format!("({})", limit));
                }
            }
        }
        if !column.signed && self.dialect.is_signed_type(column.column_type) {
            sql.push_str(" unsigned");
        }
        Ok(sql)
    }

    fn default_sql(&self, default: &DefaultValue) -> String {
        match default {
            DefaultValue::Literal(value) => self.dialect.quote_string(value),
            DefaultValue::Numeric(value) if is_numeric_literal(value) => value.trim().to_string(),
            DefaultValue::Numeric(value) => self.dialect.quote_string(value),
            DefaultValue::Boolean(value) => self.dialect.boolean_literal(*value).to_string(),
            DefaultValue::CurrentTimestamp => "CURRENT_TIMESTAMP".to_string(),
        }
    }

    /// Everything after the column name. `inline_primary_key` is only
    /// honoured on SQLite, where the identity key has to be declared inline.
    pub fn column_definition(&self, column: &Column, inline_primary_key: bool) -> Result<String, DbError> {
        if column.identity
            && !matches!(column.column_type, ColumnType::Integer | ColumnType::BigInteger)
        {
            return Err(DbError::InvalidDefinition(format!(
                "identity column {} must be an integer, not {}",
                column.name, column.column_type
            )));
        }
        let inline = inline_primary_key && self.dialect == Dialect::Sqlite;
        let mut sql = if inline {
            "INTEGER".to_string()
        } else {
            self.type_sql(column, true)?
        };

        sql.push_str(if column.is_nullable() { " NULL" } else { " NOT NULL" });

        match self.dialect {
            Dialect::MySql if column.identity => sql.push_str(" AUTO_INCREMENT"),
            Dialect::Sqlite if inline => sql.push_str(" PRIMARY KEY AUTOINCREMENT"),
            _ => {}
        }

        if let Some(default) = &column.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(&self.default_sql(default));
        }

        if self.dialect == Dialect::MySql {
            if let Some(comment) = &column.comment {
                sql.push_str(" COMMENT ");
                sql.push_str(&self.dialect.quote_string(comment));
            }
            if let Some(update) = &column.update {
                sql.push_str(" ON UPDATE ");
                sql.push_str(update);
            }
        } else {
            if column.update.is_some() {
                warn!(
                    "{} has no ON UPDATE clause, ignored for column {}",
                    self.dialect, column.name
                );
            }
            if column.comment.is_some() && self.dialect == Dialect::Sqlite {
                debug!("sqlite does not store column comments ({})", column.name);
            }
        }

        Ok(sql)
    }

    /// Inline MySQL index clause: `UNIQUE KEY `name` (`a`, `b`)`.
    fn index_definition(&self, index: &Index) -> String {
        let mut sql = String::new();
        if index.unique {
            sql.push_str("UNIQUE ");
        }
        sql.push_str("KEY");
        if let Some(name) = &index.name {
            sql.push(' ');
            sql.push_str(&self.quote(name));
        }
        sql.push_str(&format!(" ({})", self.quote_list(&index.columns)));
        sql
    }

    /// `<table>_<col>_<col>`, used where an index must be named.
    pub fn default_index_name(&self, table: &str, index: &Index) -> String {
        let table = table.rsplit('.').next().unwrap_or(table);
        let mut name = table.to_string();
        for column in &index.columns {
            name.push('_');
            name.push_str(column);
        }
        name
    }

    fn create_index(&self, table: &str, index: &Index) -> String {
        let name = index
            .name
            .clone()
            .unwrap_or_else(|| self.default_index_name(table, index));
        format!(
            "CREATE {}INDEX {} ON {} ({})",
            if index.unique { "UNIQUE " } else { "" },
            self.quote(&name),
            self.quote_table(table),
            self.quote_list(&index.columns)
        )
    }

    pub fn foreign_key_definition(&self, foreign_key: &ForeignKey) -> String {
        let mut sql = String::new();
        if let Some(constraint) = &foreign_key.constraint {
            sql.push_str(&format!("CONSTRAINT {} ", self.quote(constraint)));
        }
        sql.push_str(&format!(
            "FOREIGN KEY ({}) REFERENCES {} ({})",
            self.quote_list(foreign_key.columns()),
            self.quote_table(foreign_key.referenced_table()),
            self.quote_list(foreign_key.referenced_columns())
        ));
        if let Some(action) = foreign_key.on_delete {
            sql.push_str(" ON DELETE ");
            sql.push_str(action.as_sql());
        }
        if let Some(action) = foreign_key.on_update {
            sql.push_str(" ON UPDATE ");
            sql.push_str(action.as_sql());
        }
        sql
    }

    fn table_options(&self, options: &TableOptions) -> String {
        let charset = options
            .collation
            .split('_')
            .next()
            .unwrap_or(&options.collation);
        let mut sql = format!(
            " ENGINE = {} CHARACTER SET {} COLLATE {}",
            options.engine, charset, options.collation
        );
        if let Some(comment) = &options.comment {
            sql.push_str(&format!(" COMMENT={}", self.dialect.quote_string(comment)));
        }
        sql
    }

    fn column_comment(&self, table: &str, column: &str, comment: &str) -> String {
        format!(
            "COMMENT ON COLUMN {}.{} IS {}",
            self.quote_table(table),
            self.quote(column),
            self.dialect.quote_string(comment)
        )
    }

    /// The `CREATE TABLE` statement followed by whatever the dialect needs
    /// as separate statements (PostgreSQL comments, non-MySQL indexes).
    pub fn create_table(&self, table: &Table) -> Result<Vec<String>, DbError> {
        let (columns, primary_key) = table.resolved_columns();
        if columns.is_empty() {
            return Err(DbError::InvalidDefinition(format!(
                "table {} has no columns",
                table.name
            )));
        }

        let inline_key = match primary_key.as_slice() {
            [key] if self.dialect == Dialect::Sqlite => columns
                .iter()
                .any(|column| column.identity && &column.name == key),
            _ => false,
        };

        let mut definitions = Vec::with_capacity(columns.len() + 1);
        for column in &columns {
            let inline = inline_key && primary_key.first() == Some(&column.name);
            if column.identity && self.dialect == Dialect::Sqlite && !inline {
                warn!(
                    "sqlite only auto-increments a sole integer primary key, {} is a plain column",
                    column.name
                );
            }
            definitions.push(format!(
                "{} {}",
                self.quote(&column.name),
                self.column_definition(column, inline)?
            ));
        }
        if !primary_key.is_empty() && !inline_key {
            definitions.push(format!("PRIMARY KEY ({})", self.quote_list(&primary_key)));
        }
        if self.dialect == Dialect::MySql {
            for index in &table.indexes {
                definitions.push(self.index_definition(index));
            }
        }
        for foreign_key in &table.foreign_keys {
            definitions.push(self.foreign_key_definition(foreign_key));
        }

        let mut sql = format!(
            "CREATE TABLE {} ({})",
            self.quote_table(&table.name),
            definitions.join(", ")
        );
        if self.dialect == Dialect::MySql {
            sql.push_str(&self.table_options(&table.options));
        }

        let mut statements = vec![sql];
        if self.dialect == Dialect::Postgres {
            if let Some(comment) = &table.options.comment {
                statements.push(format!(
                    "COMMENT ON TABLE {} IS {}",
                    self.quote_table(&table.name),
                    self.dialect.quote_string(comment)
                ));
            }
            for column in &columns {
                if let Some(comment) = &column.comment {
                    statements.push(self.column_comment(&table.name, &column.name, comment));
                }
            }
        }
        if self.dialect != Dialect::MySql {
            for index in &table.indexes {
                statements.push(self.create_index(&table.name, index));
            }
        }
        Ok(statements)
    }

    pub fn rename_table(&self, table: &str, new_name: &str) -> String {
        match self.dialect {
            Dialect::MySql => format!(
                "RENAME TABLE {} TO {}",
                self.quote_table(table),
                self.quote_table(new_name)
            ),
            Dialect::Postgres | Dialect::Sqlite => format!(
                "ALTER TABLE {} RENAME TO {}",
                self.quote_table(table),
                self.quote(new_name)
            ),
        }
    }

    pub fn drop_table(&self, table: &str) -> String {
        format!("DROP TABLE {}", self.quote_table(table))
    }

    pub fn add_column(&self, table: &str, column: &Column) -> Result<Vec<String>, DbError> {
        let definition = self.column_definition(column, false)?;
        match self.dialect {
            Dialect::MySql => {
                let mut sql = format!(
                    "ALTER TABLE {} ADD {} {}",
                    self.quote_table(table),
                    self.quote(&column.name),
                    definition
                );
                if let Some(after) = &column.after {
                    sql.push_str(&format!(" AFTER {}", self.quote(after)));
                }
                Ok(vec![sql])
            }
            Dialect::Postgres | Dialect::Sqlite => {
                if let Some(after) = &column.after {
                    warn!(
                        "{} cannot position columns, ignoring AFTER {} for {}",
                        self.dialect, after, column.name
                    );
                }
                let mut statements = vec![format!(
                    "ALTER TABLE {} ADD COLUMN {} {}",
                    self.quote_table(table),
                    self.quote(&column.name),
                    definition
                )];
                if let (Dialect::Postgres, Some(comment)) = (self.dialect, &column.comment) {
                    statements.push(self.column_comment(table, &column.name, comment));
                }
                Ok(statements)
            }
        }
    }

    /// MySQL restates the full definition on rename, so it is rebuilt from
    /// the catalog description of the current column.
    pub fn rename_column(
        &self,
        table: &str,
        column: &str,
        new_name: &str,
        current: &ColumnDescription,
    ) -> String {
        match self.dialect {
            Dialect::MySql => {
                let mut definition = format!(
                    "{} {}",
                    current.native_type,
                    if current.nullable { "NULL" } else { "NOT NULL" }
                );
                let extra = current.extra.trim();
                if !extra.is_empty() {
                    definition.push(' ');
                    definition.push_str(&extra.to_ascii_uppercase());
                }
                format!(
                    "ALTER TABLE {} CHANGE COLUMN {} {} {}",
                    self.quote_table(table),
                    self.quote(column),
                    self.quote(new_name),
                    definition
                )
            }
            Dialect::Postgres | Dialect::Sqlite => format!(
                "ALTER TABLE {} RENAME COLUMN {} TO {}",
                self.quote_table(table),
                self.quote(column),
                self.quote(new_name)
            ),
        }
    }

    pub fn change_column(&self, table: &str, column: &str, new_column: &Column) -> Result<Vec<String>, DbError> {
        let quoted_table = self.quote_table(table);
        match self.dialect {
            Dialect::MySql => {
                let mut sql = format!(
                    "ALTER TABLE {} CHANGE {} {} {}",
                    quoted_table,
                    self.quote(column),
                    self.quote(&new_column.name),
                    self.column_definition(new_column, false)?
                );
                if let Some(after) = &new_column.after {
                    sql.push_str(&format!(" AFTER {}", self.quote(after)));
                }
                Ok(vec![sql])
            }
            Dialect::Postgres => {
                let quoted = self.quote(column);
                let mut statements = vec![format!(
                    "ALTER TABLE {} ALTER COLUMN {} TYPE {}",
                    quoted_table,
                    quoted,
                    self.type_sql(new_column, false)?
                )];
                statements.push(format!(
                    "ALTER TABLE {} ALTER COLUMN {} {} NOT NULL",
                    quoted_table,
                    quoted,
                    if new_column.is_nullable() { "DROP" } else { "SET" }
                ));
                statements.push(match &new_column.default {
                    Some(default) => format!(
                        "ALTER TABLE {} ALTER COLUMN {} SET DEFAULT {}",
                        quoted_table,
                        quoted,
                        self.default_sql(default)
                    ),
                    None => format!(
                        "ALTER TABLE {} ALTER COLUMN {} DROP DEFAULT",
                        quoted_table, quoted
                    ),
                });
                if column != new_column.name {
                    statements.push(format!(
                        "ALTER TABLE {} RENAME COLUMN {} TO {}",
                        quoted_table,
                        quoted,
                        self.quote(&new_column.name)
                    ));
                }
                if let Some(comment) = &new_column.comment {
                    statements.push(self.column_comment(table, &new_column.name, comment));
                }
                Ok(statements)
            }
            Dialect::Sqlite => Err(self.unsupported("change_column")),
        }
    }

    pub fn drop_column(&self, table: &str, column: &str) -> String {
        format!(
            "ALTER TABLE {} DROP COLUMN {}",
            self.quote_table(table),
            self.quote(column)
        )
    }

    pub fn add_index(&self, table: &str, index: &Index) -> String {
        match self.dialect {
            Dialect::MySql => format!(
                "ALTER TABLE {} ADD {}",
                self.quote_table(table),
                self.index_definition(index)
            ),
            Dialect::Postgres | Dialect::Sqlite => self.create_index(table, index),
        }
    }

    pub fn drop_index(&self, table: &str, name: &str) -> String {
        match self.dialect {
            Dialect::MySql => format!(
                "ALTER TABLE {} DROP INDEX {}",
                self.quote_table(table),
                self.quote(name)
            ),
            Dialect::Postgres | Dialect::Sqlite => format!("DROP INDEX {}", self.quote(name)),
        }
    }

    pub fn add_foreign_key(&self, table: &str, foreign_key: &ForeignKey) -> Result<String, DbError> {
        match self.dialect {
            Dialect::MySql | Dialect::Postgres => Ok(format!(
                "ALTER TABLE {} ADD {}",
                self.quote_table(table),
                self.foreign_key_definition(foreign_key)
            )),
            Dialect::Sqlite => Err(self.unsupported("add_foreign_key")),
        }
    }

    pub fn drop_foreign_key(&self, table: &str, constraint: &str) -> Result<String, DbError> {
        match self.dialect {
            Dialect::MySql => Ok(format!(
                "ALTER TABLE {} DROP FOREIGN KEY {}",
                self.quote_table(table),
                self.quote(constraint)
            )),
            Dialect::Postgres => Ok(format!(
                "ALTER TABLE {} DROP CONSTRAINT {}",
                self.quote_table(table),
                self.quote(constraint)
            )),
            Dialect::Sqlite => Err(self.unsupported("drop_foreign_key")),
        }
    }

    pub fn create_database(&self, name: &str, options: &DatabaseOptions) -> Result<String, DbError> {
        match self.dialect {
            Dialect::MySql => {
                let mut sql = format!(
                    "CREATE DATABASE {} DEFAULT CHARACTER SET {}",
                    self.quote(name),
                    self.quote(&options.charset)
                );
                if let Some(collation) = &options.collation {
                    sql.push_str(&format!(" COLLATE {}", self.quote(collation)));
                }
                Ok(sql)
            }
            Dialect::Postgres => {
                let mut sql = format!(
                    "CREATE DATABASE {} WITH ENCODING = {}",
                    self.quote(name),
                    self.dialect.quote_string(&options.charset)
                );
                if let Some(collation) = &options.collation {
                    sql.push_str(&format!(" LC_COLLATE = {}", self.dialect.quote_string(collation)));
                }
                Ok(sql)
            }
            Dialect::Sqlite => Err(self.unsupported("create_database")),
        }
    }

    pub fn drop_database(&self, name: &str) -> Result<String, DbError> {
        match self.dialect {
            Dialect::MySql | Dialect::Postgres => {
                Ok(format!("DROP DATABASE IF EXISTS {}", self.quote(name)))
            }
            Dialect::Sqlite => Err(self.unsupported("drop_database")),
        }
    }

    /// Layout of the version table.
    pub fn version_table(&self, name: &str) -> Table {
        let options = TableOptions {
            id: IdColumn::Disabled,
            primary_key: vec!["version".to_string()],
            ..Default::default()
        };
        Table::with_options(name, options)
            .column(Column::new("version", ColumnType::BigInteger))
            .column(
                Column::new("migration_name", ColumnType::String)
                    .limit(MIGRATION_NAME_LIMIT as u32)
                    .null(true),
            )
            .column(Column::new("start_time", ColumnType::Timestamp).null(true))
            .column(Column::new("end_time", ColumnType::Timestamp).null(true))
            .column(Column::new("breakpoint", ColumnType::Boolean).default_value(false))
    }

    pub fn insert_version(
        &self,
        table: &str,
        migration: &dyn Migration,
        start_time: NaiveDateTime,
        end_time: NaiveDateTime,
    ) -> String {
        let name: String = migration.name().chars().take(MIGRATION_NAME_LIMIT).collect();
        format!(
            "INSERT INTO {} ({}, {}, {}, {}, {}) VALUES ({}, {}, {}, {}, {})",
            self.quote_table(table),
            self.quote("version"),
            self.quote("migration_name"),
            self.quote("start_time"),
            self.quote("end_time"),
            self.quote("breakpoint"),
            migration.version(),
            self.dialect.quote_string(&name),
            self.dialect
                .quote_string(&start_time.format(TIMESTAMP_FORMAT).to_string()),
            self.dialect
                .quote_string(&end_time.format(TIMESTAMP_FORMAT).to_string()),
            self.dialect.boolean_literal(false)
        )
    }

    pub fn delete_version(&self, table: &str, version: i64) -> String {
        format!(
            "DELETE FROM {} WHERE {} = {}",
            self.quote_table(table),
            self.quote("version"),
            version
        )
    }

    /// Timestamps come back as text so every driver decodes them the same way.
    pub fn versions_query(&self, table: &str) -> String {
        let text = match self.dialect {
            Dialect::MySql => "CHAR",
            Dialect::Postgres | Dialect::Sqlite => "TEXT",
        };
        format!(
            "SELECT {version}, {name}, CAST({start} AS {text}) AS {start}, CAST({end} AS {text}) AS {end}, {breakpoint} FROM {table} ORDER BY {version} ASC",
            version = self.quote("version"),
            name = self.quote("migration_name"),
            start = self.quote("start_time"),
            end = self.quote("end_time"),
            breakpoint = self.quote("breakpoint"),
            text = text,
            table = self.quote_table(table)
        )
    }

    pub fn toggle_breakpoint(&self, table: &str, version: i64) -> String {
        let breakpoint = self.quote("breakpoint");
        format!(
            "UPDATE {} SET {} = NOT {} WHERE {} = {}",
            self.quote_table(table),
            breakpoint,
            breakpoint,
            self.quote("version"),
            version
        )
    }

    pub fn reset_all_breakpoints(&self, table: &str) -> String {
        let breakpoint = self.quote("breakpoint");
        let off = self.dialect.boolean_literal(false);
        format!(
            "UPDATE {} SET {} = {} WHERE {} <> {}",
            self.quote_table(table),
            breakpoint,
            off,
            breakpoint,
            off
        )
    }
}
