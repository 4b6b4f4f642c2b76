use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use super::Dialect;
use crate::errors::DbError;
use crate::models::schema::ColumnType;

/// A native type name (lower case) and the limit it renders with, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeType {
    pub name: String,
    pub limit: Option<u32>,
}

impl NativeType {
    fn new(name: &str, limit: Option<u32>) -> Self {
        Self {
            name: name.to_string(),
            limit,
        }
    }
}

impl fmt::Display for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.limit {
            Some(limit) => write!(f, "{}({})", self.name, limit),
            None => f.write_str(&self.name),
        }
    }
}

/// The abstract reading of a native column type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedType {
    pub column_type: ColumnType,
    pub limit: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub unsigned: bool,
}

impl ParsedType {
    fn new(column_type: ColumnType) -> Self {
        Self {
            column_type,
            limit: None,
            precision: None,
            scale: None,
            unsigned: false,
        }
    }

    fn limit(mut self, limit: Option<u32>) -> Self {
        self.limit = limit;
        self
    }
}

fn native_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^(\w+)(?:\((\d+)?(?:\s*,\s*(\d+))?\))?\s*(.*)$").ok())
        .as_ref()
}

/// Drops a limit that merely restates the dialect default.
fn normalized(limit: Option<u32>, default: u32) -> Option<u32> {
    limit.filter(|value| *value != default)
}

/// Maps abstract column types to native ones and back for one dialect.
#[derive(Debug, Clone, Copy)]
pub struct TypeMapper {
    dialect: Dialect,
}

impl TypeMapper {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Abstract types this dialect can store.
    pub fn column_types(&self) -> Vec<ColumnType> {
        ColumnType::ALL
            .into_iter()
            .filter(|ty| self.to_native(*ty, None).is_ok())
            .collect()
    }

    pub fn to_native(&self, column_type: ColumnType, limit: Option<u32>) -> Result<NativeType, DbError> {
        match self.dialect {
            Dialect::MySql => self.to_mysql(column_type, limit),
            Dialect::Postgres => self.to_postgres(column_type, limit),
            Dialect::Sqlite => self.to_sqlite(column_type, limit),
        }
    }

    fn unsupported(&self, column_type: ColumnType) -> DbError {
        DbError::UnsupportedType(format!("{} ({})", column_type, self.dialect))
    }

    fn to_mysql(&self, column_type: ColumnType, limit: Option<u32>) -> Result<NativeType, DbError> {
        let native = match column_type {
            ColumnType::String => NativeType::new("varchar", limit.or(Some(255))),
            ColumnType::Char => NativeType::new("char", limit.or(Some(255))),
            ColumnType::Text => NativeType::new("text", limit),
            ColumnType::Integer => NativeType::new("int", limit.or(Some(11))),
            ColumnType::BigInteger => NativeType::new("bigint", limit.or(Some(20))),
            ColumnType::Float => NativeType::new("float", limit),
            ColumnType::Decimal => NativeType::new("decimal", limit),
            ColumnType::DateTime => NativeType::new("datetime", limit),
            ColumnType::Timestamp => NativeType::new("timestamp", limit),
            ColumnType::Time => NativeType::new("time", limit),
            ColumnType::Date => NativeType::new("date", limit),
            ColumnType::Binary => NativeType::new("blob", limit),
            ColumnType::Boolean => NativeType::new("tinyint", limit.or(Some(1))),
            ColumnType::Geometry => NativeType::new("geometry", limit),
            ColumnType::Point => NativeType::new("point", limit),
            ColumnType::LineString => NativeType::new("linestring", limit),
            ColumnType::Polygon => NativeType::new("polygon", limit),
        };
        Ok(native)
    }

    // Only character types carry a length; integers never have a display width.
    fn to_postgres(&self, column_type: ColumnType, limit: Option<u32>) -> Result<NativeType, DbError> {
        let native = match column_type {
            ColumnType::String => NativeType::new("varchar", limit.or(Some(255))),
            ColumnType::Char => NativeType::new("char", limit.or(Some(255))),
            ColumnType::Text => NativeType::new("text", None),
            ColumnType::Integer => NativeType::new("integer", None),
            ColumnType::BigInteger => NativeType::new("bigint", None),
            ColumnType::Float => NativeType::new("real", None),
            ColumnType::Decimal => NativeType::new("decimal", None),
            ColumnType::DateTime | ColumnType::Timestamp => NativeType::new("timestamp", None),
            ColumnType::Time => NativeType::new("time", None),
            ColumnType::Date => NativeType::new("date", None),
            ColumnType::Binary => NativeType::new("bytea", None),
            ColumnType::Boolean => NativeType::new("boolean", None),
            ColumnType::Point => NativeType::new("point", None),
            ColumnType::LineString => NativeType::new("path", None),
            ColumnType::Polygon => NativeType::new("polygon", None),
            ColumnType::Geometry => return Err(self.unsupported(column_type)),
        };
        Ok(native)
    }

    fn to_sqlite(&self, column_type: ColumnType, limit: Option<u32>) -> Result<NativeType, DbError> {
        let native = match column_type {
            ColumnType::String => NativeType::new("varchar", limit.or(Some(255))),
            ColumnType::Char => NativeType::new("char", limit.or(Some(255))),
            ColumnType::Text => NativeType::new("text", None),
            ColumnType::Integer => NativeType::new("integer", None),
            ColumnType::BigInteger => NativeType::new("bigint", None),
            ColumnType::Float => NativeType::new("float", None),
            ColumnType::Decimal => NativeType::new("decimal", None),
            ColumnType::DateTime => NativeType::new("datetime", None),
            ColumnType::Timestamp => NativeType::new("timestamp", None),
            ColumnType::Time => NativeType::new("time", None),
            ColumnType::Date => NativeType::new("date", None),
            ColumnType::Binary => NativeType::new("blob", None),
            ColumnType::Boolean => NativeType::new("boolean", None),
            ColumnType::Geometry
            | ColumnType::Point
            | ColumnType::LineString
            | ColumnType::Polygon => return Err(self.unsupported(column_type)),
        };
        Ok(native)
    }

    /// Parses a catalog type such as `int(10) unsigned` or `decimal(10,2)`.
    pub fn from_native(&self, definition: &str) -> Result<ParsedType, DbError> {
        let lowered = definition.trim().to_ascii_lowercase();
        let lowered = match self.dialect {
            Dialect::Postgres => postgres_aliases(&lowered),
            _ => lowered,
        };

        let captures = native_pattern()
            .and_then(|pattern| pattern.captures(&lowered))
            .ok_or_else(|| DbError::UnsupportedType(definition.to_string()))?;
        let name = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
        let first = captures.get(2).and_then(|m| m.as_str().parse::<u32>().ok());
        let second = captures.get(3).and_then(|m| m.as_str().parse::<u32>().ok());
        let modifiers = captures.get(4).map(|m| m.as_str()).unwrap_or_default();

        let parsed = match self.dialect {
            Dialect::MySql => mysql_type(name, first, second),
            Dialect::Postgres => postgres_type(name, first, second),
            Dialect::Sqlite => sqlite_type(name, first, second),
        };

        parsed
            .map(|mut parsed| {
                parsed.unsigned = modifiers.split_whitespace().any(|m| m == "unsigned");
                parsed
            })
            .ok_or_else(|| DbError::UnsupportedType(definition.to_string()))
    }
}

fn fixed_point(column_type: ColumnType, precision: Option<u32>, scale: Option<u32>) -> ParsedType {
    let mut parsed = ParsedType::new(column_type);
    parsed.precision = precision;
    parsed.scale = scale;
    parsed
}

fn mysql_type(name: &str, first: Option<u32>, second: Option<u32>) -> Option<ParsedType> {
    let parsed = match name {
        "varchar" => ParsedType::new(ColumnType::String).limit(normalized(first, 255)),
        "char" => ParsedType::new(ColumnType::Char).limit(normalized(first, 255)),
        "text" | "tinytext" | "mediumtext" | "longtext" => {
            ParsedType::new(ColumnType::Text).limit(first)
        }
        "int" | "integer" | "mediumint" | "smallint" => {
            ParsedType::new(ColumnType::Integer).limit(normalized(first, 11))
        }
        "tinyint" if first == Some(1) => ParsedType::new(ColumnType::Boolean),
        "tinyint" => ParsedType::new(ColumnType::Integer).limit(first),
        "bigint" => ParsedType::new(ColumnType::BigInteger).limit(normalized(first, 20)),
        "float" | "double" | "real" => match (first, second) {
            (Some(_), Some(_)) => fixed_point(ColumnType::Float, first, second),
            _ => ParsedType::new(ColumnType::Float).limit(first),
        },
        "decimal" | "numeric" => fixed_point(ColumnType::Decimal, first, second),
        "datetime" => ParsedType::new(ColumnType::DateTime),
        "timestamp" => ParsedType::new(ColumnType::Timestamp),
        "time" => ParsedType::new(ColumnType::Time),
        "date" => ParsedType::new(ColumnType::Date),
        "blob" | "tinyblob" | "mediumblob" | "longblob" | "binary" | "varbinary" => {
            ParsedType::new(ColumnType::Binary).limit(first)
        }
        "geometry" => ParsedType::new(ColumnType::Geometry),
        "point" => ParsedType::new(ColumnType::Point),
        "linestring" => ParsedType::new(ColumnType::LineString),
        "polygon" => ParsedType::new(ColumnType::Polygon),
        _ => return None,
    };
    Some(parsed)
}

/// Rewrites multi-word PostgreSQL type names to single identifiers.
fn postgres_aliases(lowered: &str) -> String {
    const ALIASES: [(&str, &str); 4] = [
        ("character varying", "varchar"),
        ("character", "char"),
        ("double precision", "float8"),
        ("bit varying", "varbit"),
    ];
    for (long, short) in ALIASES {
        if let Some(rest) = lowered.strip_prefix(long) {
            return format!("{}{}", short, rest);
        }
    }
    lowered.to_string()
}

fn postgres_type(name: &str, first: Option<u32>, second: Option<u32>) -> Option<ParsedType> {
    let parsed = match name {
        "varchar" => ParsedType::new(ColumnType::String).limit(normalized(first, 255)),
        "char" | "bpchar" => ParsedType::new(ColumnType::Char).limit(normalized(first, 255)),
        "text" => ParsedType::new(ColumnType::Text),
        "integer" | "int" | "int4" | "smallint" | "int2" | "serial" => {
            ParsedType::new(ColumnType::Integer)
        }
        "bigint" | "int8" | "bigserial" => ParsedType::new(ColumnType::BigInteger),
        "real" | "float4" | "float8" | "float" | "double" => ParsedType::new(ColumnType::Float),
        "decimal" | "numeric" => fixed_point(ColumnType::Decimal, first, second),
        "timestamp" | "timestamptz" => ParsedType::new(ColumnType::Timestamp),
        "time" | "timetz" => ParsedType::new(ColumnType::Time),
        "date" => ParsedType::new(ColumnType::Date),
        "bytea" => ParsedType::new(ColumnType::Binary),
        "boolean" | "bool" => ParsedType::new(ColumnType::Boolean),
        "point" => ParsedType::new(ColumnType::Point),
        "path" => ParsedType::new(ColumnType::LineString),
        "polygon" => ParsedType::new(ColumnType::Polygon),
        _ => return None,
    };
    Some(parsed)
}

fn sqlite_type(name: &str, first: Option<u32>, second: Option<u32>) -> Option<ParsedType> {
    let parsed = match name {
        "varchar" => ParsedType::new(ColumnType::String).limit(normalized(first, 255)),
        "char" => ParsedType::new(ColumnType::Char).limit(normalized(first, 255)),
        "text" | "clob" => ParsedType::new(ColumnType::Text),
        "integer" | "int" => ParsedType::new(ColumnType::Integer),
        "bigint" => ParsedType::new(ColumnType::BigInteger),
        "float" | "real" | "double" => ParsedType::new(ColumnType::Float),
        "decimal" | "numeric" => fixed_point(ColumnType::Decimal, first, second),
        "datetime" => ParsedType::new(ColumnType::DateTime),
        "timestamp" => ParsedType::new(ColumnType::Timestamp),
        "time" => ParsedType::new(ColumnType::Time),
        "date" => ParsedType::new(ColumnType::Date),
        "blob" => ParsedType::new(ColumnType::Binary),
        "boolean" => ParsedType::new(ColumnType::Boolean),
        _ => return None,
    };
    Some(parsed)
}
