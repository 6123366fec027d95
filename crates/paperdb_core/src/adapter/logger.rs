//! Adapter-scoped log sinks with an injected filter.
//!
//! # Responsibility
//! - Route info/error/debug messages to three independent sinks.
//! - Apply the filter strategy before anything is written.
//!
//! # Invariants
//! - The filter is fixed when the logger is built; it cannot change mid-lifetime.
//! - An empty string returned by the filter suppresses the line.
//! - Logging never fails the caller; sink write errors are dropped.

use crate::error::DbError;
use std::fmt::{Debug, Formatter};
use std::io::Write;
use std::panic::Location;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

const FACADE_TARGET: &str = "paperdb::adapter";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Info,
    Error,
    Debug,
}

impl Severity {
    pub fn label(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Error => "ERROR",
            Self::Debug => "DEBUG",
        }
    }

    fn level(self) -> log::Level {
        match self {
            Self::Info => log::Level::Info,
            Self::Error => log::Level::Error,
            Self::Debug => log::Level::Debug,
        }
    }
}

/// Rewrites or suppresses adapter log lines.
pub trait LogFilter: Send + Sync {
    fn filter(&self, severity: Severity, message: &str) -> String;
}

impl<F> LogFilter for F
where
    F: Fn(Severity, &str) -> String + Send + Sync,
{
    fn filter(&self, severity: Severity, message: &str) -> String {
        self(severity, message)
    }
}

/// Destination of one severity's lines.
#[derive(Clone, Default)]
pub enum LogSink {
    /// Forward to the `log` facade (the process log file once `init_logging` ran).
    #[default]
    Facade,
    /// Render `[SEVERITY]:date time file:line: message` into a writer.
    Writer(Arc<Mutex<Box<dyn Write + Send>>>),
    Discard,
}

impl LogSink {
    /// Wraps a writer so it can be shared by several severities.
    pub fn writer(writer: impl Write + Send + 'static) -> Self {
        Self::Writer(Arc::new(Mutex::new(Box::new(writer))))
    }
}

impl Debug for LogSink {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Facade => f.write_str("Facade"),
            Self::Writer(_) => f.write_str("Writer(..)"),
            Self::Discard => f.write_str("Discard"),
        }
    }
}

#[derive(Default)]
pub struct AdapterLogger {
    info: LogSink,
    error: LogSink,
    debug: LogSink,
    filter: Option<Box<dyn LogFilter>>,
}

impl AdapterLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// A logger that writes nothing anywhere.
    pub fn discard() -> Self {
        Self::new().with_sinks(LogSink::Discard)
    }

    pub fn with_info_sink(mut self, sink: LogSink) -> Self {
        self.info = sink;
        self
    }

    pub fn with_error_sink(mut self, sink: LogSink) -> Self {
        self.error = sink;
        self
    }

    pub fn with_debug_sink(mut self, sink: LogSink) -> Self {
        self.debug = sink;
        self
    }

    /// Points all three severities at the same sink.
    pub fn with_sinks(self, sink: LogSink) -> Self {
        self.with_info_sink(sink.clone())
            .with_error_sink(sink.clone())
            .with_debug_sink(sink)
    }

    pub fn with_filter(mut self, filter: impl LogFilter + 'static) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }

    #[track_caller]
    pub fn info(&self, message: &str) {
        self.log_at(Severity::Info, Location::caller(), message);
    }

    #[track_caller]
    pub fn error(&self, err: &DbError) {
        self.log_at(Severity::Error, Location::caller(), &err.to_string());
    }

    #[track_caller]
    pub fn debug(&self, message: &str) {
        self.log_at(Severity::Debug, Location::caller(), message);
    }

    /// Logs `err` through the error sink and hands it back.
    #[track_caller]
    pub fn oops(&self, err: DbError) -> DbError {
        self.oops_at(Location::caller(), err)
    }

    pub(crate) fn oops_at(&self, caller: &'static Location<'static>, err: DbError) -> DbError {
        self.log_at(Severity::Error, caller, &err.to_string());
        err
    }

    pub(crate) fn log_at(
        &self,
        severity: Severity,
        caller: &'static Location<'static>,
        message: &str,
    ) {
        let message = match &self.filter {
            Some(filter) => filter.filter(severity, message),
            None => message.to_string(),
        };
        if message.is_empty() {
            return;
        }

        let message = single_line(&message);
        let file = short_file(caller.file());
        match self.sink(severity) {
            LogSink::Facade => log::log!(
                target: FACADE_TARGET,
                severity.level(),
                "{file}:{}: {message}",
                caller.line()
            ),
            LogSink::Writer(writer) => {
                let mut writer = writer.lock().unwrap_or_else(PoisonError::into_inner);
                let _ = writeln!(
                    writer,
                    "[{}]:{} {file}:{}: {message}",
                    severity.label(),
                    chrono::Local::now().format("%Y/%m/%d %H:%M:%S"),
                    caller.line()
                );
                let _ = writer.flush();
            }
            LogSink::Discard => {}
        }
    }

    fn sink(&self, severity: Severity) -> &LogSink {
        match severity {
            Severity::Info => &self.info,
            Severity::Error => &self.error,
            Severity::Debug => &self.debug,
        }
    }
}

impl Debug for AdapterLogger {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterLogger")
            .field("info", &self.info)
            .field("error", &self.error)
            .field("debug", &self.debug)
            .field("filtered", &self.filter.is_some())
            .finish()
    }
}

fn single_line(message: &str) -> String {
    message.trim_end().replace(['\n', '\r'], " ")
}

fn short_file(file: &str) -> &str {
    Path::new(file)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(file)
}
