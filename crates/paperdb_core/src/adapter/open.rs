//! Connection bootstrap for the two supported connection forms.
//!
//! # Responsibility
//! - Turn `(host, user, pass, database)` into a concrete SQLite target.
//! - Open, configure and ping the connection.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON` and answered a ping.
//! - Connection descriptions never contain the password.

use crate::config::LOCAL_HOST;
use log::{error, info};
use rusqlite::{Connection, OpenFlags};
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Where a connection points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionTarget {
    /// `localhost`: the database name is a local file path, created on demand.
    Local { user: String, path: PathBuf },
    /// Any other host: `<host>/<database>` must already exist.
    Network {
        user: String,
        host: String,
        path: PathBuf,
    },
}

impl ConnectionTarget {
    pub fn resolve(host: &str, user: &str, database: &str) -> Self {
        if host == LOCAL_HOST {
            Self::Local {
                user: user.to_string(),
                path: PathBuf::from(database),
            }
        } else {
            Self::Network {
                user: user.to_string(),
                host: host.to_string(),
                path: PathBuf::from(host).join(database),
            }
        }
    }

    pub fn mode(&self) -> &'static str {
        match self {
            Self::Local { .. } => "local",
            Self::Network { .. } => "network",
        }
    }

    fn flags(&self) -> OpenFlags {
        let base = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        match self {
            Self::Local { .. } => base | OpenFlags::SQLITE_OPEN_CREATE,
            Self::Network { .. } => base,
        }
    }

    fn path(&self) -> &PathBuf {
        match self {
            Self::Local { path, .. } | Self::Network { path, .. } => path,
        }
    }
}

impl Display for ConnectionTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local { user, path } => write!(f, "{user}:***@/{}", path.display()),
            Self::Network { user, host, path } => {
                write!(f, "{user}:***@tcp({host})/{}", path.display())
            }
        }
    }
}

/// Opens and pings a connection for `target`.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub(crate) fn open_connection(target: &ConnectionTarget) -> rusqlite::Result<Connection> {
    let started_at = Instant::now();
    info!(
        "event=db_open module=adapter status=start mode={}",
        target.mode()
    );

    let result = Connection::open_with_flags(target.path(), target.flags()).and_then(|conn| {
        bootstrap_connection(&conn)?;
        Ok(conn)
    });

    match &result {
        Ok(_) => info!(
            "event=db_open module=adapter status=ok mode={} duration_ms={}",
            target.mode(),
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=db_open module=adapter status=error mode={} duration_ms={} error={}",
            target.mode(),
            started_at.elapsed().as_millis(),
            err
        ),
    }
    result
}

fn bootstrap_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    ping(conn)
}

pub(crate) fn ping(conn: &Connection) -> rusqlite::Result<()> {
    conn.query_row("SELECT 1;", [], |row| row.get::<_, i64>(0))
        .map(|_| ())
}
