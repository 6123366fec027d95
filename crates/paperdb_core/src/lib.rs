//! Relational persistence core for PaperDB.
//! Owns the database connection, typed coercion of raw query results and the
//! active-record contract every entity follows.

pub mod adapter;
pub mod config;
pub mod error;
pub mod logging;
pub mod record;
pub mod timestamp;
pub mod value;

pub use adapter::{
    Adapter, AdapterLogger, ConnectionTarget, ExecOutcome, LogFilter, LogSink, Severity,
};
pub use config::AdapterConfig;
pub use error::{ConfigError, ConversionError, DbError, DbResult, StatementStage};
pub use logging::{default_log_level, init_logging, LoggingError};
pub use record::{Changeset, Entity, Field, Record, Table};
pub use timestamp::{Timestamp, TimestampError};
pub use value::{ResultRow, TypedValue};

/// Bind values accepted by `Adapter::query` and `Adapter::execute`.
pub use rusqlite::types::Value;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
