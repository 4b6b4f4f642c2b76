use std::sync::OnceLock;

use indexmap::IndexMap;
use regex::Regex;

use super::types::TypeMapper;
use super::Dialect;
use crate::db::{DbSession, Row};
use crate::errors::DbError;
use crate::models::schema::{covers, is_numeric_literal, Column, DefaultValue, ForeignKey, Index};

/// A column as the catalog reports it, before type mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescription {
    pub name: String,
    pub native_type: String,
    pub nullable: bool,
    pub default: Option<String>,
    /// MySQL `Extra` text; other dialects report `auto_increment` for
    /// identity columns and nothing else.
    pub extra: String,
    pub comment: Option<String>,
    pub primary_key: bool,
}

impl ColumnDescription {
    pub fn is_identity(&self) -> bool {
        self.extra.to_ascii_lowercase().contains("auto_increment")
    }
}

fn quoted_literal() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r#"^'((?:[^']|'')*)'(?:::([\w\s"\[\]]+))?$"#).ok())
        .as_ref()
}

/// PostgreSQL quotes negative numeric defaults and casts them back.
fn is_numeric_cast(cast: &str) -> bool {
    matches!(
        cast.trim().to_ascii_lowercase().as_str(),
        "integer" | "bigint" | "smallint" | "numeric" | "real" | "double precision"
    )
}

fn last_segment(table: &str) -> &str {
    table.rsplit('.').next().unwrap_or(table)
}

/// Reads table, column, index and foreign key metadata from the catalog.
///
/// Query builders and row folds are pure; the async helpers run them
/// against a session.
#[derive(Debug, Clone, Copy)]
pub struct Introspector {
    dialect: Dialect,
    types: TypeMapper,
}

impl Introspector {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            types: TypeMapper::new(dialect),
        }
    }

    fn literal(&self, value: &str) -> String {
        self.dialect.quote_string(value)
    }

    /// `'"schema"."table"'`, ready for a PostgreSQL `::regclass` cast.
    fn regclass(&self, table: &str) -> String {
        self.literal(&self.dialect.quote_table_name(table))
    }

    pub fn tables_query(&self, database: &str) -> String {
        match self.dialect {
            Dialect::MySql => format!("SHOW TABLES IN {}", self.dialect.quote_column_name(database)),
            Dialect::Postgres => "SELECT table_name::text AS table_name FROM information_schema.tables \
                 WHERE table_schema = current_schema() AND table_type = 'BASE TABLE'"
                .to_string(),
            Dialect::Sqlite => "SELECT name FROM sqlite_master \
                 WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name"
                .to_string(),
        }
    }

    pub fn table_names(&self, rows: &[Row]) -> Vec<String> {
        rows.iter().filter_map(|row| row.str_at(0)).collect()
    }

    pub fn columns_query(&self, table: &str) -> String {
        match self.dialect {
            Dialect::MySql => format!(
                "SHOW FULL COLUMNS FROM {}",
                self.dialect.quote_table_name(table)
            ),
            Dialect::Postgres => format!(
                "SELECT a.attname::text AS column_name, \
                 format_type(a.atttypid, a.atttypmod) AS column_type, \
                 (NOT a.attnotnull) AS is_nullable, \
                 pg_get_expr(d.adbin, d.adrelid) AS column_default, \
                 (a.attidentity <> '') AS is_identity, \
                 col_description(a.attrelid, a.attnum) AS column_comment, \
                 EXISTS (SELECT 1 FROM pg_index i WHERE i.indrelid = a.attrelid \
                 AND i.indisprimary AND a.attnum = ANY(i.indkey)) AS is_primary \
                 FROM pg_attribute a \
                 LEFT JOIN pg_attrdef d ON d.adrelid = a.attrelid AND d.adnum = a.attnum \
                 WHERE a.attrelid = {}::regclass AND a.attnum > 0 AND NOT a.attisdropped \
                 ORDER BY a.attnum",
                self.regclass(table)
            ),
            Dialect::Sqlite => format!(
                "SELECT name, type, \"notnull\", dflt_value, pk FROM pragma_table_info({}) ORDER BY cid",
                self.literal(table)
            ),
        }
    }

    pub fn parse_columns(&self, rows: &[Row]) -> Vec<ColumnDescription> {
        match self.dialect {
            Dialect::MySql => rows
                .iter()
                .filter_map(|row| {
                    Some(ColumnDescription {
                        name: row.get_str("Field")?,
                        native_type: row.get_str("Type")?,
                        nullable: row.get_str("Null").is_some_and(|n| n.eq_ignore_ascii_case("YES")),
                        default: row.get_str("Default"),
                        extra: row.get_str("Extra").unwrap_or_default(),
                        comment: row.get_str("Comment").filter(|c| !c.is_empty()),
                        primary_key: row.get_str("Key").is_some_and(|k| k == "PRI"),
                    })
                })
                .collect(),
            Dialect::Postgres => rows
                .iter()
                .filter_map(|row| {
                    let default = row.get_str("column_default");
                    let serial = default
                        .as_deref()
                        .is_some_and(|d| d.starts_with("nextval("));
                    let identity = serial || row.get_bool("is_identity").unwrap_or(false);
                    Some(ColumnDescription {
                        name: row.get_str("column_name")?,
                        native_type: row.get_str("column_type")?,
                        nullable: row.get_bool("is_nullable").unwrap_or(true),
                        default: if serial { None } else { default },
                        extra: if identity { "auto_increment".to_string() } else { String::new() },
                        comment: row.get_str("column_comment"),
                        primary_key: row.get_bool("is_primary").unwrap_or(false),
                    })
                })
                .collect(),
            Dialect::Sqlite => {
                let key_columns = rows
                    .iter()
                    .filter(|row| row.get_i64("pk").unwrap_or(0) > 0)
                    .count();
                rows.iter()
                    .filter_map(|row| {
                        let native_type = row.get_str("type")?;
                        let primary_key = row.get_i64("pk").unwrap_or(0) > 0;
                        // A sole INTEGER primary key aliases the rowid.
                        let identity = primary_key
                            && key_columns == 1
                            && native_type.eq_ignore_ascii_case("integer");
                        Some(ColumnDescription {
                            name: row.get_str("name")?,
                            native_type,
                            nullable: row.get_i64("notnull").unwrap_or(0) == 0 && !primary_key,
                            default: row.get_str("dflt_value"),
                            extra: if identity { "auto_increment".to_string() } else { String::new() },
                            comment: None,
                            primary_key,
                        })
                    })
                    .collect()
            }
        }
    }

    /// Reads a catalog default back into a `DefaultValue`.
    pub fn parse_default(&self, text: &str) -> Option<DefaultValue> {
        let trimmed = text.trim();
        let lowered = trimmed.to_ascii_lowercase();
        if lowered == "null" || lowered.starts_with("null::") {
            return None;
        }
        if self.dialect != Dialect::MySql {
            if let Some(captures) = quoted_literal().and_then(|p| p.captures(trimmed)) {
                let inner = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
                let numeric_cast = captures
                    .get(2)
                    .is_some_and(|cast| is_numeric_cast(cast.as_str()));
                if numeric_cast && is_numeric_literal(inner) {
                    return Some(DefaultValue::Numeric(inner.trim().to_string()));
                }
                return Some(DefaultValue::Literal(inner.replace("''", "'")));
            }
            match lowered.as_str() {
                "true" => return Some(DefaultValue::Boolean(true)),
                "false" => return Some(DefaultValue::Boolean(false)),
                _ => {}
            }
        }
        Some(DefaultValue::from_text(text))
    }

    pub fn to_column(&self, description: &ColumnDescription) -> Result<Column, DbError> {
        let parsed = self.types.from_native(&description.native_type)?;
        let mut column = Column::new(description.name.clone(), parsed.column_type);
        column.null = description.nullable;
        column.limit = parsed.limit;
        column.precision = parsed.precision;
        column.scale = parsed.scale;
        column.signed = !parsed.unsigned;
        column.identity = description.is_identity();
        column.default = description
            .default
            .as_deref()
            .and_then(|text| self.parse_default(text));
        column.comment = description.comment.clone();

        let extra = description.extra.to_ascii_lowercase();
        if let Some(position) = extra.find("on update ") {
            let clause = description.extra[position + "on update ".len()..].trim();
            if !clause.is_empty() {
                column.update = Some(clause.to_string());
            }
        }
        Ok(column)
    }

    pub fn indexes_query(&self, table: &str) -> String {
        match self.dialect {
            Dialect::MySql => format!("SHOW INDEXES FROM {}", self.dialect.quote_table_name(table)),
            Dialect::Postgres => format!(
                "SELECT ic.relname::text AS index_name, a.attname::text AS column_name, \
                 ix.indisunique AS is_unique \
                 FROM pg_index ix \
                 JOIN pg_class ic ON ic.oid = ix.indexrelid \
                 JOIN pg_attribute a ON a.attrelid = ix.indrelid AND a.attnum = ANY(ix.indkey) \
                 WHERE ix.indrelid = {}::regclass \
                 ORDER BY ix.indexrelid, array_position(ix.indkey::int2[], a.attnum)",
                self.regclass(table)
            ),
            Dialect::Sqlite => format!(
                "SELECT il.name AS index_name, il.\"unique\" AS is_unique, ii.name AS column_name \
                 FROM pragma_index_list({}) AS il, pragma_index_info(il.name) AS ii \
                 ORDER BY il.seq, ii.seqno",
                self.literal(table)
            ),
        }
    }

    /// Groups one-row-per-column catalog output by index name, keeping the
    /// first-seen order of indexes and columns. Column names are lower-cased.
    pub fn fold_indexes(&self, rows: &[Row]) -> IndexMap<String, Index> {
        let mut indexes: IndexMap<String, Index> = IndexMap::new();
        for row in rows {
            let (name, column, unique) = match self.dialect {
                Dialect::MySql => (
                    row.get_str("Key_name"),
                    row.get_str("Column_name"),
                    row.get_i64("Non_unique").map(|non_unique| non_unique == 0),
                ),
                Dialect::Postgres | Dialect::Sqlite => (
                    row.get_str("index_name"),
                    row.get_str("column_name"),
                    row.get_bool("is_unique"),
                ),
            };
            let (Some(name), Some(column)) = (name, column) else {
                continue;
            };
            indexes
                .entry(name.clone())
                .or_insert_with(|| {
                    Index::new(Vec::<String>::new())
                        .unique(unique.unwrap_or(false))
                        .named(name)
                })
                .columns
                .push(column.to_lowercase());
        }
        indexes
    }

    pub fn foreign_keys_query(&self, table: &str) -> String {
        match self.dialect {
            Dialect::MySql => format!(
                "SELECT CONSTRAINT_NAME, COLUMN_NAME, REFERENCED_TABLE_NAME, REFERENCED_COLUMN_NAME \
                 FROM information_schema.KEY_COLUMN_USAGE \
                 WHERE TABLE_SCHEMA = DATABASE() AND REFERENCED_TABLE_NAME IS NOT NULL \
                 AND TABLE_NAME = {} \
                 ORDER BY CONSTRAINT_NAME, ORDINAL_POSITION",
                self.literal(last_segment(table))
            ),
            Dialect::Postgres => format!(
                "SELECT c.conname::text AS constraint_name, a.attname::text AS column_name, \
                 c.confrelid::regclass::text AS referenced_table_name, \
                 af.attname::text AS referenced_column_name \
                 FROM pg_constraint c \
                 CROSS JOIN LATERAL unnest(c.conkey, c.confkey) WITH ORDINALITY AS k(attnum, refnum, position) \
                 JOIN pg_attribute a ON a.attrelid = c.conrelid AND a.attnum = k.attnum \
                 JOIN pg_attribute af ON af.attrelid = c.confrelid AND af.attnum = k.refnum \
                 WHERE c.conrelid = {}::regclass AND c.contype = 'f' \
                 ORDER BY c.conname, k.position",
                self.regclass(table)
            ),
            Dialect::Sqlite => format!(
                "SELECT id, seq, \"table\" AS referenced_table_name, \"from\" AS column_name, \
                 \"to\" AS referenced_column_name \
                 FROM pragma_foreign_key_list({}) ORDER BY id, seq",
                self.literal(table)
            ),
        }
    }

    /// Groups foreign key rows by constraint. SQLite has no constraint
    /// names, so they are synthesized as `<table>_fk_<id>`.
    pub fn fold_foreign_keys(&self, table: &str, rows: &[Row]) -> Result<IndexMap<String, ForeignKey>, DbError> {
        let mut keys: IndexMap<String, ForeignKey> = IndexMap::new();
        for row in rows {
            let name = match self.dialect {
                Dialect::Sqlite => row
                    .get_i64("id")
                    .map(|id| format!("{}_fk_{}", last_segment(table), id)),
                Dialect::MySql | Dialect::Postgres => row.get_str("constraint_name"),
            };
            let (Some(name), Some(column), Some(referenced_table)) = (
                name,
                row.get_str("column_name"),
                row.get_str("referenced_table_name"),
            ) else {
                continue;
            };
            let referenced_column = row.get_str("referenced_column_name").unwrap_or_default();

            match keys.get_mut(&name) {
                Some(key) => key.push_pair(column, referenced_column),
                None => {
                    let key = ForeignKey::new([column], referenced_table, [referenced_column])?
                        .constraint(name.clone());
                    keys.insert(name, key);
                }
            }
        }
        Ok(keys)
    }

    pub fn database_query(&self, name: &str) -> String {
        match self.dialect {
            Dialect::MySql => format!(
                "SELECT SCHEMA_NAME FROM INFORMATION_SCHEMA.SCHEMATA WHERE SCHEMA_NAME = {}",
                self.literal(name)
            ),
            Dialect::Postgres => format!(
                "SELECT datname::text AS datname FROM pg_database WHERE datname = {}",
                self.literal(name)
            ),
            Dialect::Sqlite => format!(
                "SELECT name FROM pragma_database_list WHERE name = {}",
                self.literal(name)
            ),
        }
    }

    pub fn describe_table_query(&self, database: &str, table: &str) -> String {
        match self.dialect {
            Dialect::MySql => format!(
                "SELECT * FROM information_schema.tables WHERE table_schema = {} AND table_name = {}",
                self.literal(database),
                self.literal(last_segment(table))
            ),
            Dialect::Postgres => format!(
                "SELECT table_catalog::text AS table_catalog, table_schema::text AS table_schema, \
                 table_name::text AS table_name, table_type::text AS table_type \
                 FROM information_schema.tables \
                 WHERE table_schema = current_schema() AND table_name = {}",
                self.literal(last_segment(table))
            ),
            Dialect::Sqlite => format!(
                "SELECT type, name, tbl_name, sql FROM sqlite_master WHERE type = 'table' AND name = {}",
                self.literal(table)
            ),
        }
    }

    pub async fn table_exists(&self, session: &dyn DbSession, database: &str, table: &str) -> Result<bool, DbError> {
        let rows = session.fetch_all(&self.tables_query(database)).await?;
        let wanted = last_segment(table);
        Ok(self
            .table_names(&rows)
            .iter()
            .any(|name| name.eq_ignore_ascii_case(wanted)))
    }

    pub async fn describe_columns(&self, session: &dyn DbSession, table: &str) -> Result<Vec<ColumnDescription>, DbError> {
        let rows = session.fetch_all(&self.columns_query(table)).await?;
        Ok(self.parse_columns(&rows))
    }

    /// Columns in table order.
    pub async fn list_columns(&self, session: &dyn DbSession, table: &str) -> Result<Vec<Column>, DbError> {
        self.describe_columns(session, table)
            .await?
            .iter()
            .map(|description| self.to_column(description))
            .collect()
    }

    pub async fn column_exists(&self, session: &dyn DbSession, table: &str, column: &str) -> Result<bool, DbError> {
        Ok(self
            .describe_columns(session, table)
            .await?
            .iter()
            .any(|description| description.name.eq_ignore_ascii_case(column)))
    }

    pub async fn list_indexes(&self, session: &dyn DbSession, table: &str) -> Result<IndexMap<String, Index>, DbError> {
        let rows = session.fetch_all(&self.indexes_query(table)).await?;
        Ok(self.fold_indexes(&rows))
    }

    pub async fn index_matches(&self, session: &dyn DbSession, table: &str, columns: &[String]) -> Result<bool, DbError> {
        let indexes = self.list_indexes(session, table).await?;
        Ok(find_index(&indexes, columns).is_some())
    }

    pub async fn list_foreign_keys(&self, session: &dyn DbSession, table: &str) -> Result<IndexMap<String, ForeignKey>, DbError> {
        let rows = session.fetch_all(&self.foreign_keys_query(table)).await?;
        self.fold_foreign_keys(table, &rows)
    }

    /// Exact constraint name when given, otherwise any key covering `columns`.
    pub async fn foreign_key_matches(
        &self,
        session: &dyn DbSession,
        table: &str,
        columns: &[String],
        constraint: Option<&str>,
    ) -> Result<bool, DbError> {
        let keys = self.list_foreign_keys(session, table).await?;
        Ok(match constraint {
            Some(name) => keys.contains_key(name),
            None => keys.values().any(|key| covers(key.columns(), columns)),
        })
    }
}

/// Name of the first index whose column set covers `columns`.
pub fn find_index<'a>(indexes: &'a IndexMap<String, Index>, columns: &[String]) -> Option<&'a str> {
    let wanted: Vec<String> = columns.iter().map(|c| c.to_lowercase()).collect();
    indexes
        .iter()
        .find(|(_, index)| index.covers(&wanted))
        .map(|(name, _)| name.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::schema::ColumnType;
    use serde_json::json;

    fn mysql_index_row(key: &str, column: &str, non_unique: i64) -> Row {
        Row::from_pairs([
            ("Table", json!("users")),
            ("Non_unique", json!(non_unique)),
            ("Key_name", json!(key)),
            ("Column_name", json!(column)),
        ])
    }

    #[test]
    fn test_fold_indexes_groups_by_name_in_order() {
        let introspector = Introspector::new(Dialect::MySql);
        let rows = vec![
            mysql_index_row("PRIMARY", "id", 0),
            mysql_index_row("name_idx", "First_Name", 1),
            mysql_index_row("name_idx", "last_name", 1),
            mysql_index_row("email", "email", 0),
        ];

        let indexes = introspector.fold_indexes(&rows);
        let names: Vec<&str> = indexes.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["PRIMARY", "name_idx", "email"]);
        assert_eq!(indexes["name_idx"].columns, vec!["first_name", "last_name"]);
        assert!(!indexes["name_idx"].unique);
        assert!(indexes["email"].unique);
    }

    #[test]
    fn test_find_index_ignores_order_and_case() {
        let introspector = Introspector::new(Dialect::MySql);
        let indexes = introspector.fold_indexes(&[
            mysql_index_row("name_idx", "first_name", 1),
            mysql_index_row("name_idx", "last_name", 1),
        ]);

        let wanted = vec!["LAST_NAME".to_string(), "First_Name".to_string()];
        assert_eq!(find_index(&indexes, &wanted), Some("name_idx"));
        assert_eq!(find_index(&indexes, &["email".to_string()]), None);
    }

    #[test]
    fn test_fold_foreign_keys_pairs_columns() {
        let introspector = Introspector::new(Dialect::Postgres);
        let row = |column: &str, referenced: &str| {
            Row::from_pairs([
                ("constraint_name", json!("orders_customer_fk")),
                ("column_name", json!(column)),
                ("referenced_table_name", json!("customers")),
                ("referenced_column_name", json!(referenced)),
            ])
        };
        let keys = introspector
            .fold_foreign_keys("orders", &[row("customer_id", "id"), row("region", "region")])
            .unwrap();

        assert_eq!(keys.len(), 1);
        let key = &keys["orders_customer_fk"];
        assert_eq!(key.columns(), ["customer_id", "region"]);
        assert_eq!(key.referenced_columns(), ["id", "region"]);
        assert_eq!(key.referenced_table(), "customers");
        assert_eq!(key.constraint.as_deref(), Some("orders_customer_fk"));
    }

    #[test]
    fn test_sqlite_foreign_key_names_are_synthesized() {
        let introspector = Introspector::new(Dialect::Sqlite);
        let rows = vec![Row::from_pairs([
            ("id", json!(0)),
            ("seq", json!(0)),
            ("referenced_table_name", json!("users")),
            ("column_name", json!("user_id")),
            ("referenced_column_name", json!("id")),
        ])];

        let keys = introspector.fold_foreign_keys("posts", &rows).unwrap();
        assert!(keys.contains_key("posts_fk_0"));
    }

    #[test]
    fn test_mysql_column_description_to_column() {
        let introspector = Introspector::new(Dialect::MySql);
        let rows = vec![
            Row::from_pairs([
                ("Field", json!("id")),
                ("Type", json!("int(10) unsigned")),
                ("Null", json!("NO")),
                ("Key", json!("PRI")),
                ("Default", json!(null)),
                ("Extra", json!("auto_increment")),
                ("Comment", json!("")),
            ]),
            Row::from_pairs([
                ("Field", json!("updated_at")),
                ("Type", json!("timestamp")),
                ("Null", json!("YES")),
                ("Key", json!("")),
                ("Default", json!("CURRENT_TIMESTAMP")),
                ("Extra", json!("DEFAULT_GENERATED on update CURRENT_TIMESTAMP")),
                ("Comment", json!("last change")),
            ]),
        ];

        let descriptions = introspector.parse_columns(&rows);
        assert_eq!(descriptions.len(), 2);
        assert!(descriptions[0].primary_key);

        let id = introspector.to_column(&descriptions[0]).unwrap();
        assert_eq!(id.column_type, ColumnType::Integer);
        assert_eq!(id.limit, Some(10));
        assert!(id.identity);
        assert!(!id.signed);
        assert!(!id.null);

        let updated = introspector.to_column(&descriptions[1]).unwrap();
        assert!(updated.null);
        assert_eq!(updated.default, Some(DefaultValue::CurrentTimestamp));
        assert_eq!(updated.update.as_deref(), Some("CURRENT_TIMESTAMP"));
        assert_eq!(updated.comment.as_deref(), Some("last change"));
    }

    #[test]
    fn test_postgres_defaults() {
        let introspector = Introspector::new(Dialect::Postgres);
        assert_eq!(
            introspector.parse_default("'it''s'::character varying"),
            Some(DefaultValue::Literal("it's".to_string()))
        );
        assert_eq!(
            introspector.parse_default("false"),
            Some(DefaultValue::Boolean(false))
        );
        assert_eq!(
            introspector.parse_default("now()"),
            Some(DefaultValue::CurrentTimestamp)
        );
        assert_eq!(introspector.parse_default("NULL::character varying"), None);
        assert_eq!(
            introspector.parse_default("'-5'::integer"),
            Some(DefaultValue::Numeric("-5".to_string()))
        );
        assert_eq!(
            introspector.parse_default("'-1.5'::numeric"),
            Some(DefaultValue::Numeric("-1.5".to_string()))
        );
        assert_eq!(
            introspector.parse_default("'-5'::character varying"),
            Some(DefaultValue::Literal("-5".to_string()))
        );
        assert_eq!(
            introspector.parse_default("'NaN'::numeric"),
            Some(DefaultValue::Literal("NaN".to_string()))
        );

        let rows = vec![Row::from_pairs([
            ("column_name", json!("id")),
            ("column_type", json!("integer")),
            ("is_nullable", json!(false)),
            ("column_default", json!("nextval('users_id_seq'::regclass)")),
            ("is_identity", json!(false)),
            ("column_comment", json!(null)),
            ("is_primary", json!(true)),
        ])];
        let descriptions = introspector.parse_columns(&rows);
        assert!(descriptions[0].is_identity());
        assert_eq!(descriptions[0].default, None);
    }

    #[test]
    fn test_sqlite_rowid_alias_is_identity() {
        let introspector = Introspector::new(Dialect::Sqlite);
        let rows = vec![
            Row::from_pairs([
                ("name", json!("id")),
                ("type", json!("INTEGER")),
                ("notnull", json!(1)),
                ("dflt_value", json!(null)),
                ("pk", json!(1)),
            ]),
            Row::from_pairs([
                ("name", json!("title")),
                ("type", json!("VARCHAR(255)")),
                ("notnull", json!(0)),
                ("dflt_value", json!("'untitled'")),
                ("pk", json!(0)),
            ]),
        ];

        let columns: Vec<Column> = introspector
            .parse_columns(&rows)
            .iter()
            .map(|d| introspector.to_column(d).unwrap())
            .collect();
        assert!(columns[0].identity);
        assert!(!columns[1].identity);
        assert!(columns[1].null);
        assert_eq!(columns[1].limit, None);
        assert_eq!(
            columns[1].default,
            Some(DefaultValue::Literal("untitled".to_string()))
        );
    }

    #[test]
    fn test_catalog_queries_quote_names() {
        let introspector = Introspector::new(Dialect::MySql);
        assert_eq!(introspector.tables_query("app"), "SHOW TABLES IN `app`");
        assert_eq!(
            introspector.columns_query("users"),
            "SHOW FULL COLUMNS FROM `users`"
        );
        assert!(introspector
            .foreign_keys_query("o'rders")
            .contains("TABLE_NAME = 'o''rders'"));

        let introspector = Introspector::new(Dialect::Postgres);
        assert!(introspector
            .indexes_query("Users")
            .contains("'\"Users\"'::regclass"));
    }
}
