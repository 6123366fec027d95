//! Connection adapter: the single owner of the live database connection.
//!
//! # Responsibility
//! - Open/close the connection in its local or network form.
//! - Run read queries into rows of `TypedValue` and single-statement writes.
//! - Funnel every failure through `oops` so it lands in the error sink.
//!
//! # Invariants
//! - `query`/`execute` fail with `NotOpened` until `open` succeeded.
//! - Every `execute` runs in its own transaction; any early exit rolls back.
//! - The adapter is `Send` but not `Sync`: use one adapter per worker.

mod logger;
mod open;

pub use self::logger::{AdapterLogger, LogFilter, LogSink, Severity};
pub use self::open::ConnectionTarget;

use crate::config::AdapterConfig;
use crate::error::{DbError, DbResult, StatementStage};
use crate::value::{ResultRow, TypedValue};
use log::{info, warn};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::cell::Cell;
use std::panic::Location;
use std::path::Path;
use std::sync::Arc;

/// What one successful `execute` did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecOutcome {
    /// Rowid generated by the statement's insert, if any. SQLite keeps the
    /// previous value for statements that insert nothing.
    pub last_insert_id: i64,
    pub affected_rows: u64,
}

#[derive(Debug)]
pub struct Adapter {
    config: AdapterConfig,
    conn: Option<Connection>,
    logger: Arc<AdapterLogger>,
    last: Cell<ExecOutcome>,
}

impl Adapter {
    /// Creates a closed adapter. Call `open` or `open_configured` before use.
    pub fn new(config: AdapterConfig, logger: AdapterLogger) -> Self {
        Self {
            config,
            conn: None,
            logger: Arc::new(logger),
            last: Cell::new(ExecOutcome::default()),
        }
    }

    /// Loads the YAML config at `path`, applies it and opens the connection.
    ///
    /// # Errors
    /// - `DbError::Config(ConfigError::Read)` when the file cannot be read.
    /// - `DbError::Config(ConfigError::Parse)` when the document is malformed.
    /// - `DbError::Connection` when open or ping fails.
    #[track_caller]
    pub fn from_config_file(path: impl AsRef<Path>, logger: AdapterLogger) -> DbResult<Self> {
        let caller = Location::caller();
        let config = match AdapterConfig::load(path) {
            Ok(config) => config,
            Err(err) => return Err(logger.oops_at(caller, err.into())),
        };
        let mut adapter = Self::new(config, logger);
        adapter.open_configured_at(caller)?;
        Ok(adapter)
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    pub fn database_prefix(&self) -> &str {
        &self.config.prefix
    }

    pub fn logger(&self) -> &AdapterLogger {
        &self.logger
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// Opens with the host/user/pass/database held in `config()`.
    #[track_caller]
    pub fn open_configured(&mut self) -> DbResult<()> {
        self.open_configured_at(Location::caller())
    }

    fn open_configured_at(&mut self, caller: &'static Location<'static>) -> DbResult<()> {
        let AdapterConfig {
            host,
            user,
            pass,
            database,
            ..
        } = self.config.clone();
        self.open_at(caller, &host, &user, &pass, &database)
    }

    /// Opens and pings the connection. `host == "localhost"` opens `database`
    /// as a local file; other hosts resolve `<host>/<database>`, which must exist.
    ///
    /// On failure the adapter stays closed and the error is logged.
    #[track_caller]
    pub fn open(&mut self, host: &str, user: &str, pass: &str, database: &str) -> DbResult<()> {
        self.open_at(Location::caller(), host, user, pass, database)
    }

    fn open_at(
        &mut self,
        caller: &'static Location<'static>,
        host: &str,
        user: &str,
        pass: &str,
        database: &str,
    ) -> DbResult<()> {
        self.conn = None;
        self.config.host = host.to_string();
        self.config.user = user.to_string();
        self.config.pass = pass.to_string();
        self.config.database = database.to_string();

        let target = ConnectionTarget::resolve(host, user, database);
        match open::open_connection(&target) {
            Ok(conn) => {
                self.conn = Some(conn);
                Ok(())
            }
            Err(source) => Err(self.logger.oops_at(
                caller,
                DbError::Connection {
                    target: target.to_string(),
                    source,
                },
            )),
        }
    }

    /// Releases the connection. Closing a closed adapter is a no-op.
    #[track_caller]
    pub fn close(&mut self) {
        let caller = Location::caller();
        let Some(conn) = self.conn.take() else {
            return;
        };
        match conn.close() {
            Ok(()) => info!("event=db_close module=adapter status=ok"),
            Err((_conn, err)) => {
                warn!("event=db_close module=adapter status=error error={err}");
                self.logger.log_at(
                    Severity::Error,
                    caller,
                    &format!("could not close connection: {err}"),
                );
            }
        }
    }

    /// Pings the open connection.
    #[track_caller]
    pub fn ping(&self) -> DbResult<()> {
        let caller = Location::caller();
        let conn = self.connection(caller)?;
        open::ping(conn).map_err(|source| {
            self.logger.oops_at(
                caller,
                DbError::Connection {
                    target: ConnectionTarget::resolve(
                        &self.config.host,
                        &self.config.user,
                        &self.config.database,
                    )
                    .to_string(),
                    source,
                },
            )
        })
    }

    /// Runs a read query. Zero matching rows is an empty `Vec`, not an error.
    #[track_caller]
    pub fn query(&self, sql: &str, params: &[Value]) -> DbResult<Vec<ResultRow>> {
        self.query_at(Location::caller(), sql, params)
    }

    pub(crate) fn query_at(
        &self,
        caller: &'static Location<'static>,
        sql: &str,
        params: &[Value],
    ) -> DbResult<Vec<ResultRow>> {
        let conn = self.connection(caller)?;
        self.logger.log_at(Severity::Info, caller, sql);

        self.collect_rows(conn, sql, params)
            .map_err(|err| self.logger.oops_at(caller, err))
    }

    // Driver failures become `DbError::Query`; undecodable text is a conversion error.
    fn collect_rows(
        &self,
        conn: &Connection,
        sql: &str,
        params: &[Value],
    ) -> DbResult<Vec<ResultRow>> {
        let query_err = |source: rusqlite::Error| DbError::Query {
            sql: sql.to_string(),
            source,
        };
        let mut stmt = conn.prepare(sql).map_err(query_err)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let mut rows = stmt
            .query(params_from_iter(params.iter()))
            .map_err(query_err)?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().map_err(query_err)? {
            let mut result = ResultRow::new(Arc::clone(&self.logger));
            for (index, column) in columns.iter().enumerate() {
                let value = row.get_ref(index).map_err(query_err)?;
                result.insert(TypedValue::from_sql(
                    Arc::clone(&self.logger),
                    column,
                    value,
                )?);
            }
            results.push(result);
        }
        Ok(results)
    }

    /// Runs one write statement inside its own transaction:
    /// begin, prepare, exec, read id and count, commit.
    ///
    /// Dropping the transaction on any early return rolls it back.
    #[track_caller]
    pub fn execute(&self, sql: &str, params: &[Value]) -> DbResult<ExecOutcome> {
        self.execute_at(Location::caller(), sql, params)
    }

    pub(crate) fn execute_at(
        &self,
        caller: &'static Location<'static>,
        sql: &str,
        params: &[Value],
    ) -> DbResult<ExecOutcome> {
        let conn = self.connection(caller)?;
        let stage_err = |stage: StatementStage, source: rusqlite::Error| {
            self.logger.oops_at(
                caller,
                DbError::Statement {
                    stage,
                    sql: sql.to_string(),
                    source,
                },
            )
        };

        let tx = conn
            .unchecked_transaction()
            .map_err(|err| stage_err(StatementStage::Begin, err))?;
        let outcome = {
            let mut stmt = tx
                .prepare(sql)
                .map_err(|err| stage_err(StatementStage::Prepare, err))?;
            self.logger.log_at(Severity::Info, caller, sql);
            stmt.execute(params_from_iter(params.iter()))
                .map_err(|err| stage_err(StatementStage::Exec, err))?;

            let last_insert_id = tx
                .query_row("SELECT last_insert_rowid();", [], |row| row.get::<_, i64>(0))
                .map_err(|err| stage_err(StatementStage::LastInsertId, err))?;
            self.logger.log_at(
                Severity::Info,
                caller,
                &format!("LastInsertedId is {last_insert_id}"),
            );
            let affected_rows = tx
                .query_row("SELECT changes();", [], |row| row.get::<_, i64>(0))
                .map_err(|err| stage_err(StatementStage::AffectedRows, err))?;
            ExecOutcome {
                last_insert_id,
                affected_rows: u64::try_from(affected_rows).unwrap_or_default(),
            }
        };
        tx.commit()
            .map_err(|err| stage_err(StatementStage::Commit, err))?;

        self.last.set(outcome);
        Ok(outcome)
    }

    /// Rowid recorded by the most recent successful `execute`.
    pub fn last_inserted_id(&self) -> i64 {
        self.last.get().last_insert_id
    }

    /// Row count recorded by the most recent successful `execute`.
    pub fn affected_rows(&self) -> u64 {
        self.last.get().affected_rows
    }

    #[track_caller]
    pub fn log_info(&self, message: &str) {
        self.logger.log_at(Severity::Info, Location::caller(), message);
    }

    #[track_caller]
    pub fn log_error(&self, err: &DbError) {
        self.logger
            .log_at(Severity::Error, Location::caller(), &err.to_string());
    }

    #[track_caller]
    pub fn log_debug(&self, message: &str) {
        self.logger.log_at(Severity::Debug, Location::caller(), message);
    }

    /// Logs `err` through the error sink and returns it.
    #[track_caller]
    pub fn oops(&self, err: DbError) -> DbError {
        self.logger.oops_at(Location::caller(), err)
    }

    /// Builds a value bound to this adapter, as the query path does.
    pub fn new_value(&self, column: impl Into<String>, raw: impl Into<String>) -> TypedValue {
        TypedValue::new(Arc::clone(&self.logger), column, raw)
    }

    pub fn new_row(&self) -> ResultRow {
        ResultRow::new(Arc::clone(&self.logger))
    }

    fn connection(&self, caller: &'static Location<'static>) -> DbResult<&Connection> {
        self.conn
            .as_ref()
            .ok_or_else(|| self.logger.oops_at(caller, DbError::NotOpened))
    }
}
