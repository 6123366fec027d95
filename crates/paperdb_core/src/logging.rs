//! Process-wide file logging.
//!
//! # Responsibility
//! - Start the rotating `flexi_logger` backend that receives `log` facade
//!   records, including adapter sinks left at `LogSink::Facade`.
//! - Write file lines in the adapter's `[LEVEL]:date time` shape.
//! - Record panics as one error line.
//!
//! # Invariants
//! - The backend starts at most once per process.
//! - A second call with the same level and directory is a no-op; any other
//!   combination is `LoggingError::Conflict`.

use flexi_logger::{
    Cleanup, Criterion, DeferredNow, FileSpec, FlexiLoggerError, Logger, LoggerHandle, Naming,
    WriteMode,
};
use log::{error, info, LevelFilter, Record};
use once_cell::sync::OnceCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::Write;
use std::path::{Path, PathBuf};

const LOG_FILE_BASENAME: &str = "paperdb";
const ROTATE_AT_BYTES: u64 = 10 * 1024 * 1024;
const KEEP_ROTATED_FILES: usize = 5;

static ACTIVE: OnceCell<ActiveLogger> = OnceCell::new();

struct ActiveLogger {
    level: LevelFilter,
    log_dir: PathBuf,
    _handle: LoggerHandle,
}

#[derive(Debug)]
pub enum LoggingError {
    Directory {
        path: PathBuf,
        source: std::io::Error,
    },
    Backend(FlexiLoggerError),
    Conflict {
        level: LevelFilter,
        log_dir: PathBuf,
    },
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Directory { path, source } => {
                write!(f, "could not create log directory `{}`: {source}", path.display())
            }
            Self::Backend(err) => write!(f, "could not start file logging: {err}"),
            Self::Conflict { level, log_dir } => write!(
                f,
                "file logging already runs at {level} in `{}`",
                log_dir.display()
            ),
        }
    }
}

impl Error for LoggingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Directory { source, .. } => Some(source),
            Self::Backend(err) => Some(err),
            Self::Conflict { .. } => None,
        }
    }
}

/// Starts rotating file logging at `level` under `log_dir`.
///
/// Relative directories resolve against the working directory at first call.
pub fn init_logging(level: LevelFilter, log_dir: impl AsRef<Path>) -> Result<(), LoggingError> {
    let log_dir = std::path::absolute(log_dir.as_ref()).map_err(|source| {
        LoggingError::Directory {
            path: log_dir.as_ref().to_path_buf(),
            source,
        }
    })?;

    let active = ACTIVE.get_or_try_init(|| start(level, &log_dir))?;
    if active.level != level || active.log_dir != log_dir {
        return Err(LoggingError::Conflict {
            level: active.level,
            log_dir: active.log_dir.clone(),
        });
    }
    Ok(())
}

/// `Debug` for debug builds, `Info` for release builds.
pub fn default_log_level() -> LevelFilter {
    if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

fn start(level: LevelFilter, log_dir: &Path) -> Result<ActiveLogger, LoggingError> {
    std::fs::create_dir_all(log_dir).map_err(|source| LoggingError::Directory {
        path: log_dir.to_path_buf(),
        source,
    })?;

    let handle = Logger::with(level)
        .log_to_file(
            FileSpec::default()
                .directory(log_dir)
                .basename(LOG_FILE_BASENAME),
        )
        .rotate(
            Criterion::Size(ROTATE_AT_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(KEEP_ROTATED_FILES),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(line_format)
        .start()
        .map_err(LoggingError::Backend)?;

    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        error!(
            "event=panic module=logging {}",
            panic.to_string().replace(['\n', '\r'], " ")
        );
        previous(panic);
    }));
    info!(
        "event=logging_start module=logging level={level} log_dir={} version={}",
        log_dir.display(),
        env!("CARGO_PKG_VERSION")
    );

    Ok(ActiveLogger {
        level,
        log_dir: log_dir.to_path_buf(),
        _handle: handle,
    })
}

fn line_format(
    w: &mut dyn Write,
    now: &mut DeferredNow,
    record: &Record<'_>,
) -> std::io::Result<()> {
    write!(
        w,
        "[{}]:{} {}: {}",
        record.level(),
        now.format("%Y/%m/%d %H:%M:%S"),
        record.target(),
        record.args()
    )
}
