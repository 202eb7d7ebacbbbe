//! SQLite pool construction.

use std::path::PathBuf;
use std::str::FromStr;

use sea_orm::{DatabaseConnection, SqlxSqliteConnector};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

use crate::{ConnectOpts, Result};

/// `sqlite::memory:`, `sqlite://memory:` or any DSN with `mode=memory`.
pub fn is_memory_dsn(dsn: &str) -> bool {
    dsn.contains("::memory:") || dsn.contains("//memory:") || dsn.contains("mode=memory")
}

pub(crate) async fn connect(dsn: &str, opts: &ConnectOpts) -> Result<DatabaseConnection> {
    let memory = is_memory_dsn(dsn);
    if !memory && opts.create_sqlite_dirs {
        prepare_sqlite_path(dsn)?;
    }

    let mut conn = SqliteConnectOptions::from_str(dsn)?.foreign_keys(true);
    if !memory {
        conn = conn.create_if_missing(true).journal_mode(SqliteJournalMode::Wal);
    }
    if let Some(t) = opts.sqlite_busy_timeout {
        conn = conn.busy_timeout(t);
    }

    // Every pooled connection to `:memory:` opens a fresh database, so pin
    // the pool to one connection that is never recycled.
    let pool_opts = if memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        let mut o = SqlitePoolOptions::new();
        if let Some(n) = opts.max_conns {
            o = o.max_connections(n);
        }
        if let Some(n) = opts.min_conns {
            o = o.min_connections(n);
        }
        o.idle_timeout(opts.idle_timeout)
            .max_lifetime(opts.max_lifetime)
    };
    let pool_opts = match opts.acquire_timeout {
        Some(t) => pool_opts.acquire_timeout(t),
        None => pool_opts,
    };

    let pool = pool_opts.connect_with(conn).await?;
    Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
}

/// Create the parent directory of a file-backed SQLite DSN.
pub(crate) fn prepare_sqlite_path(dsn: &str) -> std::io::Result<()> {
    if let Some(path) = file_path_from_dsn(dsn) {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn file_path_from_dsn(dsn: &str) -> Option<PathBuf> {
    if is_memory_dsn(dsn) {
        return None;
    }
    let rest = dsn.strip_prefix("sqlite:")?;
    let rest = match rest.strip_prefix("//") {
        Some(r) => r,
        None => rest,
    };
    let path = rest.split('?').next().unwrap_or_default();
    if path.is_empty() {
        None
    } else {
        Some(PathBuf::from(path))
    }
}
