//! Error taxonomy shared by the adapter, value and record layers.
//!
//! # Responsibility
//! - Classify every failure the persistence core can surface.
//! - Keep the failing SQL text or column next to the driver error.
//!
//! # Invariants
//! - Adapter-attributable errors are logged once, by `Adapter::oops`, at the
//!   point of detection. `Context` wrapping never logs again.
//! - Not-found is its own variant, never inferred from message text.

use crate::timestamp::TimestampError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub type DbResult<T> = Result<T, DbError>;

/// Stage of the single-statement write transaction that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementStage {
    Begin,
    Prepare,
    Exec,
    LastInsertId,
    AffectedRows,
    Commit,
}

impl StatementStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Begin => "begin transaction",
            Self::Prepare => "prepare statement",
            Self::Exec => "exec statement",
            Self::LastInsertId => "get last insert id",
            Self::AffectedRows => "get rows affected",
            Self::Commit => "commit transaction",
        }
    }
}

impl Display for StatementStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw column value did not parse as the requested type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionError {
    pub column: String,
    pub raw: String,
    pub expected: &'static str,
    pub reason: String,
}

impl Display for ConversionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "cannot convert column `{}` value `{}` to {}: {}",
            self.column, self.raw, self.expected, self.reason
        )
    }
}

impl Error for ConversionError {}

impl ConversionError {
    pub(crate) fn from_timestamp(column: &str, raw: &str, err: TimestampError) -> Self {
        Self {
            column: column.to_string(),
            raw: raw.to_string(),
            expected: "timestamp",
            reason: err.to_string(),
        }
    }
}

/// Adapter configuration could not be loaded.
#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(serde_yaml::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "could not read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "malformed adapter config: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
        }
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(value: serde_yaml::Error) -> Self {
        Self::Parse(value)
    }
}

/// Persistence core error.
#[derive(Debug)]
pub enum DbError {
    /// Opening or pinging the database failed.
    Connection {
        target: String,
        source: rusqlite::Error,
    },
    /// An operation ran before `Adapter::open` succeeded.
    NotOpened,
    /// A read query failed to prepare or stream.
    Query {
        sql: String,
        source: rusqlite::Error,
    },
    /// One stage of a write transaction failed.
    Statement {
        stage: StatementStage,
        sql: String,
        source: rusqlite::Error,
    },
    Conversion(ConversionError),
    MissingColumn(String),
    /// A finder matched zero rows.
    NotFound {
        table: String,
        column: String,
        value: String,
    },
    Config(ConfigError),
    Context {
        context: String,
        source: Box<DbError>,
    },
}

impl DbError {
    /// Wraps this error with one line of caller context.
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Returns the innermost error, looking through any `Context` layers.
    pub fn root(&self) -> &DbError {
        match self {
            Self::Context { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.root(), Self::NotFound { .. })
    }

    pub fn is_conversion(&self) -> bool {
        matches!(self.root(), Self::Conversion(_))
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connection { target, source } => write!(f, "{source} with {target}"),
            Self::NotOpened => write!(f, "you must first open the connection"),
            Self::Query { sql, source } => write!(f, "query `{sql}` failed: {source}"),
            Self::Statement { stage, source, .. } => write!(f, "could not {stage}: {source}"),
            Self::Conversion(err) => write!(f, "{err}"),
            Self::MissingColumn(column) => write!(f, "result row has no column `{column}`"),
            Self::NotFound {
                table,
                column,
                value,
            } => write!(f, "not found: no row in {table} where {column} = {value}"),
            Self::Config(err) => write!(f, "{err}"),
            Self::Context { context, source } => write!(f, "{context} led to {source}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Connection { source, .. } => Some(source),
            Self::Query { source, .. } => Some(source),
            Self::Statement { source, .. } => Some(source),
            Self::Conversion(err) => Some(err),
            Self::Config(err) => Some(err),
            Self::Context { source, .. } => Some(source.as_ref()),
            Self::NotOpened | Self::MissingColumn(_) | Self::NotFound { .. } => None,
        }
    }
}

impl From<ConversionError> for DbError {
    fn from(value: ConversionError) -> Self {
        Self::Conversion(value)
    }
}

impl From<ConfigError> for DbError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}
