use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DbError;

/// Dialect-independent column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Char,
    Text,
    Integer,
    BigInteger,
    Float,
    Decimal,
    DateTime,
    Timestamp,
    Time,
    Date,
    Binary,
    Boolean,
    Geometry,
    Point,
    LineString,
    Polygon,
}

impl ColumnType {
    pub const ALL: [ColumnType; 17] = [
        ColumnType::String,
        ColumnType::Char,
        ColumnType::Text,
        ColumnType::Integer,
        ColumnType::BigInteger,
        ColumnType::Float,
        ColumnType::Decimal,
        ColumnType::DateTime,
        ColumnType::Timestamp,
        ColumnType::Time,
        ColumnType::Date,
        ColumnType::Binary,
        ColumnType::Boolean,
        ColumnType::Geometry,
        ColumnType::Point,
        ColumnType::LineString,
        ColumnType::Polygon,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::String => "string",
            ColumnType::Char => "char",
            ColumnType::Text => "text",
            ColumnType::Integer => "integer",
            ColumnType::BigInteger => "biginteger",
            ColumnType::Float => "float",
            ColumnType::Decimal => "decimal",
            ColumnType::DateTime => "datetime",
            ColumnType::Timestamp => "timestamp",
            ColumnType::Time => "time",
            ColumnType::Date => "date",
            ColumnType::Binary => "binary",
            ColumnType::Boolean => "boolean",
            ColumnType::Geometry => "geometry",
            ColumnType::Point => "point",
            ColumnType::LineString => "linestring",
            ColumnType::Polygon => "polygon",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnType {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_ascii_lowercase();
        ColumnType::ALL
            .into_iter()
            .find(|ty| ty.as_str() == lowered)
            .ok_or_else(|| DbError::UnsupportedType(s.to_string()))
    }
}

/// Column default value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DefaultValue {
    /// Rendered as a quoted string literal.
    Literal(String),
    /// Rendered verbatim.
    Numeric(String),
    Boolean(bool),
    CurrentTimestamp,
}

impl DefaultValue {
    /// Classifies raw default text the way catalogs report it: numbers and
    /// `CURRENT_TIMESTAMP` are recognised, anything else is a literal.
    pub fn from_text(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed.eq_ignore_ascii_case("CURRENT_TIMESTAMP")
            || trimmed.eq_ignore_ascii_case("CURRENT_TIMESTAMP()")
            || trimmed.eq_ignore_ascii_case("now()")
        {
            DefaultValue::CurrentTimestamp
        } else if is_numeric_literal(trimmed) {
            DefaultValue::Numeric(trimmed.to_string())
        } else {
            DefaultValue::Literal(text.to_string())
        }
    }
}

/// True for plain SQL number literals: an optional sign, ASCII digits with an
/// optional fraction, and an optional exponent. `NaN` and `inf` are not.
pub fn is_numeric_literal(text: &str) -> bool {
    fn digits(part: &str) -> bool {
        !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit())
    }

    let text = text.trim();
    let unsigned = text.strip_prefix(|c| c == '-' || c == '+').unwrap_or(text);
    let (mantissa, exponent) = match unsigned.find(|c| c == 'e' || c == 'E') {
        Some(at) => (&unsigned[..at], Some(&unsigned[at + 1..])),
        None => (unsigned, None),
    };
    let mantissa_ok = match mantissa.split_once('.') {
        Some((whole, fraction)) => {
            (digits(whole) || whole.is_empty())
                && (digits(fraction) || fraction.is_empty())
                && !(whole.is_empty() && fraction.is_empty())
        }
        None => digits(mantissa),
    };
    let exponent_ok = exponent.map_or(true, |exponent| {
        digits(exponent.strip_prefix(|c| c == '-' || c == '+').unwrap_or(exponent))
    });
    mantissa_ok && exponent_ok
}

impl From<&str> for DefaultValue {
    fn from(value: &str) -> Self {
        DefaultValue::Literal(value.to_string())
    }
}

impl From<String> for DefaultValue {
    fn from(value: String) -> Self {
        DefaultValue::Literal(value)
    }
}

impl From<i64> for DefaultValue {
    fn from(value: i64) -> Self {
        DefaultValue::Numeric(value.to_string())
    }
}

impl From<f64> for DefaultValue {
    fn from(value: f64) -> Self {
        DefaultValue::Numeric(value.to_string())
    }
}

impl From<bool> for DefaultValue {
    fn from(value: bool) -> Self {
        DefaultValue::Boolean(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
    pub null: bool,
    pub default: Option<DefaultValue>,
    pub limit: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub signed: bool,
    pub identity: bool,
    pub comment: Option<String>,
    pub after: Option<String>,
    pub update: Option<String>,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            null: false,
            default: None,
            limit: None,
            precision: None,
            scale: None,
            signed: true,
            identity: false,
            comment: None,
            after: None,
            update: None,
        }
    }

    pub fn null(mut self, null: bool) -> Self {
        self.null = null;
        self
    }

    pub fn default_value(mut self, default: impl Into<DefaultValue>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn precision(mut self, precision: u32, scale: u32) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    pub fn signed(mut self, signed: bool) -> Self {
        self.signed = signed;
        self
    }

    /// Identity columns are never nullable.
    pub fn identity(mut self, identity: bool) -> Self {
        self.identity = identity;
        if identity {
            self.null = false;
        }
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn after(mut self, column: impl Into<String>) -> Self {
        self.after = Some(column.into());
        self
    }

    pub fn on_update(mut self, clause: impl Into<String>) -> Self {
        self.update = Some(clause.into());
        self
    }

    pub fn is_nullable(&self) -> bool {
        self.null && !self.identity
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    pub columns: Vec<String>,
    pub unique: bool,
    pub name: Option<String>,
}

impl Index {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            unique: false,
            name: None,
        }
    }

    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// True when every requested column (case-insensitive) is covered by this index.
    pub fn covers(&self, columns: &[String]) -> bool {
        covers(&self.columns, columns)
    }
}

/// Empty set-difference test shared by index and foreign key lookups.
pub(crate) fn covers(existing: &[String], requested: &[String]) -> bool {
    requested.iter().all(|wanted| {
        existing
            .iter()
            .any(|have| have.eq_ignore_ascii_case(wanted))
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForeignKeyAction {
    Cascade,
    Restrict,
    SetNull,
    SetDefault,
    NoAction,
}

impl ForeignKeyAction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            ForeignKeyAction::Cascade => "CASCADE",
            ForeignKeyAction::Restrict => "RESTRICT",
            ForeignKeyAction::SetNull => "SET NULL",
            ForeignKeyAction::SetDefault => "SET DEFAULT",
            ForeignKeyAction::NoAction => "NO ACTION",
        }
    }
}

impl FromStr for ForeignKeyAction {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('_', " ").as_str() {
            "CASCADE" => Ok(ForeignKeyAction::Cascade),
            "RESTRICT" => Ok(ForeignKeyAction::Restrict),
            "SET NULL" => Ok(ForeignKeyAction::SetNull),
            "SET DEFAULT" => Ok(ForeignKeyAction::SetDefault),
            "NO ACTION" => Ok(ForeignKeyAction::NoAction),
            other => Err(DbError::InvalidDefinition(format!(
                "unknown foreign key action: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    columns: Vec<String>,
    referenced_table: String,
    referenced_columns: Vec<String>,
    pub constraint: Option<String>,
    pub on_delete: Option<ForeignKeyAction>,
    pub on_update: Option<ForeignKeyAction>,
}

impl ForeignKey {
    /// Local and referenced columns are paired by position, so both lists
    /// must be non-empty and of equal length.
    pub fn new<I, J, S, T>(
        columns: I,
        referenced_table: impl Into<String>,
        referenced_columns: J,
    ) -> Result<Self, DbError>
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let referenced_columns: Vec<String> =
            referenced_columns.into_iter().map(Into::into).collect();
        let referenced_table = referenced_table.into();

        if columns.is_empty() {
            return Err(DbError::InvalidDefinition(format!(
                "foreign key referencing {} has no columns",
                referenced_table
            )));
        }
        if columns.len() != referenced_columns.len() {
            return Err(DbError::InvalidDefinition(format!(
                "foreign key referencing {} pairs {} column(s) with {} referenced column(s)",
                referenced_table,
                columns.len(),
                referenced_columns.len()
            )));
        }

        Ok(Self {
            columns,
            referenced_table,
            referenced_columns,
            constraint: None,
            on_delete: None,
            on_update: None,
        })
    }

    pub fn constraint(mut self, name: impl Into<String>) -> Self {
        self.constraint = Some(name.into());
        self
    }

    pub fn on_delete(mut self, action: ForeignKeyAction) -> Self {
        self.on_delete = Some(action);
        self
    }

    pub fn on_update(mut self, action: ForeignKeyAction) -> Self {
        self.on_update = Some(action);
        self
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn referenced_table(&self) -> &str {
        &self.referenced_table
    }

    pub fn referenced_columns(&self) -> &[String] {
        &self.referenced_columns
    }

    pub(crate) fn push_pair(&mut self, column: String, referenced_column: String) {
        self.columns.push(column);
        self.referenced_columns.push(referenced_column);
    }
}

/// How `create_table` treats the implicit identity primary key.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IdColumn {
    /// Prepend an unsigned identity integer named `id`.
    #[default]
    Implicit,
    /// Prepend an identity integer with the given name.
    Named(String),
    /// No implicit key; `TableOptions::primary_key` applies as given.
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableOptions {
    pub id: IdColumn,
    pub primary_key: Vec<String>,
    pub engine: String,
    pub collation: String,
    pub comment: Option<String>,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            id: IdColumn::Implicit,
            primary_key: Vec::new(),
            engine: "InnoDB".to_string(),
            collation: "utf8_general_ci".to_string(),
            comment: None,
        }
    }
}

/// In-memory description of a table to be created. Consumed by `create_table`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    pub indexes: Vec<Index>,
    pub foreign_keys: Vec<ForeignKey>,
    pub options: TableOptions,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_options(name, TableOptions::default())
    }

    pub fn with_options(name: impl Into<String>, options: TableOptions) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
            options,
        }
    }

    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn index(mut self, index: Index) -> Self {
        self.indexes.push(index);
        self
    }

    pub fn foreign_key(mut self, foreign_key: ForeignKey) -> Self {
        self.foreign_keys.push(foreign_key);
        self
    }

    /// Columns in creation order, with the implicit identity key prepended,
    /// and the primary key those options resolve to.
    pub fn resolved_columns(&self) -> (Vec<Column>, Vec<String>) {
        let mut columns = self.columns.clone();
        let primary_key = match &self.options.id {
            IdColumn::Implicit => {
                columns.insert(
                    0,
                    Column::new("id", ColumnType::Integer)
                        .signed(false)
                        .identity(true),
                );
                vec!["id".to_string()]
            }
            IdColumn::Named(name) => {
                columns.insert(0, Column::new(name.clone(), ColumnType::Integer).identity(true));
                vec![name.clone()]
            }
            IdColumn::Disabled => self.options.primary_key.clone(),
        };
        (columns, primary_key)
    }
}
