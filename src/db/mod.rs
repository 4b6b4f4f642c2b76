use async_trait::async_trait;
#[cfg(any(feature = "mysql", feature = "postgres", feature = "sqlite"))]
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::{Map, Value};

use crate::errors::DbError;

#[cfg(feature = "mysql")]
pub mod mysql;
#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

/// One open database session. Statements are raw SQL assembled by the
/// adapter; nothing is parameterized.
#[async_trait]
pub trait DbSession: Send + Sync {
    /// Runs a statement and returns the number of affected rows.
    async fn execute(&self, query: &str) -> Result<u64, DbError>;
    async fn query(&self, query: &str) -> Result<Vec<Row>, DbError>;

    async fn fetch_all(&self, query: &str) -> Result<Vec<Row>, DbError> {
        self.query(query).await
    }

    async fn fetch_row(&self, query: &str) -> Result<Option<Row>, DbError> {
        Ok(self.query(query).await?.into_iter().next())
    }

    async fn close(self: Box<Self>) -> Result<(), DbError>;
}

/// A result row: column names in select order, each mapped to a JSON value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self {
            cells: pairs
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        }
    }

    pub fn push(&mut self, column: impl Into<String>, value: Value) {
        self.cells.push((column.into(), value));
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    /// Exact match first, then a case-insensitive one; catalogs disagree on
    /// the case of their column names.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .or_else(|| {
                self.cells
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(column))
            })
            .map(|(_, value)| value)
    }

    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.cells.get(index).map(|(_, value)| value)
    }

    pub fn get_str(&self, column: &str) -> Option<String> {
        self.get(column).and_then(text)
    }

    pub fn str_at(&self, index: usize) -> Option<String> {
        self.get_index(index).and_then(text)
    }

    pub fn get_i64(&self, column: &str) -> Option<i64> {
        match self.get(column)? {
            Value::Number(number) => number
                .as_i64()
                .or_else(|| number.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    /// Lenient: accepts booleans, numbers and the usual textual spellings.
    pub fn get_bool(&self, column: &str) -> Option<bool> {
        match self.get(column)? {
            Value::Bool(b) => Some(*b),
            Value::Number(number) => number.as_f64().map(|f| f != 0.0),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "t" | "true" | "1" | "y" | "yes" => Some(true),
                "f" | "false" | "0" | "n" | "no" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn into_json(self) -> Value {
        Value::Object(self.cells.into_iter().collect::<Map<String, Value>>())
    }
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Converts a driver row cell by cell. Types are tried from most to least
/// specific; a cell no decoder accepts falls back to its text form.
#[cfg(any(feature = "mysql", feature = "postgres", feature = "sqlite"))]
pub(crate) fn decode_row<R>(row: &R) -> Row
where
    R: sqlx::Row,
    usize: sqlx::ColumnIndex<R>,
    String: for<'r> sqlx::Decode<'r, R::Database> + sqlx::Type<R::Database>,
    i64: for<'r> sqlx::Decode<'r, R::Database> + sqlx::Type<R::Database>,
    i32: for<'r> sqlx::Decode<'r, R::Database> + sqlx::Type<R::Database>,
    i16: for<'r> sqlx::Decode<'r, R::Database> + sqlx::Type<R::Database>,
    f64: for<'r> sqlx::Decode<'r, R::Database> + sqlx::Type<R::Database>,
    f32: for<'r> sqlx::Decode<'r, R::Database> + sqlx::Type<R::Database>,
    bool: for<'r> sqlx::Decode<'r, R::Database> + sqlx::Type<R::Database>,
    NaiveDateTime: for<'r> sqlx::Decode<'r, R::Database> + sqlx::Type<R::Database>,
    DateTime<Utc>: for<'r> sqlx::Decode<'r, R::Database> + sqlx::Type<R::Database>,
    NaiveDate: for<'r> sqlx::Decode<'r, R::Database> + sqlx::Type<R::Database>,
    NaiveTime: for<'r> sqlx::Decode<'r, R::Database> + sqlx::Type<R::Database>,
    Vec<u8>: for<'r> sqlx::Decode<'r, R::Database> + sqlx::Type<R::Database>,
{
    decode_row_with(row, |_, _| None)
}

/// Like [`decode_row`], with a driver specific decoder consulted after the
/// integer types.
#[cfg(any(feature = "mysql", feature = "postgres", feature = "sqlite"))]
pub(crate) fn decode_row_with<R, F>(row: &R, extra: F) -> Row
where
    R: sqlx::Row,
    F: Fn(&R, usize) -> Option<Value>,
    usize: sqlx::ColumnIndex<R>,
    String: for<'r> sqlx::Decode<'r, R::Database> + sqlx::Type<R::Database>,
    i64: for<'r> sqlx::Decode<'r, R::Database> + sqlx::Type<R::Database>,
    i32: for<'r> sqlx::Decode<'r, R::Database> + sqlx::Type<R::Database>,
    i16: for<'r> sqlx::Decode<'r, R::Database> + sqlx::Type<R::Database>,
    f64: for<'r> sqlx::Decode<'r, R::Database> + sqlx::Type<R::Database>,
    f32: for<'r> sqlx::Decode<'r, R::Database> + sqlx::Type<R::Database>,
    bool: for<'r> sqlx::Decode<'r, R::Database> + sqlx::Type<R::Database>,
    NaiveDateTime: for<'r> sqlx::Decode<'r, R::Database> + sqlx::Type<R::Database>,
    DateTime<Utc>: for<'r> sqlx::Decode<'r, R::Database> + sqlx::Type<R::Database>,
    NaiveDate: for<'r> sqlx::Decode<'r, R::Database> + sqlx::Type<R::Database>,
    NaiveTime: for<'r> sqlx::Decode<'r, R::Database> + sqlx::Type<R::Database>,
    Vec<u8>: for<'r> sqlx::Decode<'r, R::Database> + sqlx::Type<R::Database>,
{
    use sqlx::{Column as _, ValueRef as _};

    let mut decoded = Row::new();
    for (index, column) in row.columns().iter().enumerate() {
        let is_null = row.try_get_raw(index).map(|raw| raw.is_null()).unwrap_or(true);
        let value = if is_null {
            Value::Null
        } else if let Ok(value) = row.try_get::<String, _>(index) {
            Value::String(value)
        } else if let Ok(value) = row.try_get::<i64, _>(index) {
            Value::from(value)
        } else if let Ok(value) = row.try_get::<i32, _>(index) {
            Value::from(value)
        } else if let Ok(value) = row.try_get::<i16, _>(index) {
            Value::from(value)
        } else if let Some(value) = extra(row, index) {
            value
        } else if let Ok(value) = row.try_get::<bool, _>(index) {
            Value::Bool(value)
        } else if let Ok(value) = row.try_get::<f64, _>(index) {
            Value::from(value)
        } else if let Ok(value) = row.try_get::<f32, _>(index) {
            Value::from(value)
        } else if let Ok(value) = row.try_get::<NaiveDateTime, _>(index) {
            Value::String(value.to_string())
        } else if let Ok(value) = row.try_get::<DateTime<Utc>, _>(index) {
            Value::String(value.naive_utc().to_string())
        } else if let Ok(value) = row.try_get::<NaiveDate, _>(index) {
            Value::String(value.to_string())
        } else if let Ok(value) = row.try_get::<NaiveTime, _>(index) {
            Value::String(value.to_string())
        } else if let Ok(value) = row.try_get::<Vec<u8>, _>(index) {
            Value::String(String::from_utf8_lossy(&value).into_owned())
        } else {
            // Text protocol results carry every cell as text, so an unchecked
            // read recovers types with no decoder above, such as uuid.
            row.try_get_unchecked::<String, _>(index)
                .map(Value::String)
                .unwrap_or(Value::Null)
        };
        decoded.push(column.name(), value);
    }
    decoded
}
