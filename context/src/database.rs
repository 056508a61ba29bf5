//! The application database: opening, schema state, and migrations.
//!
//! The schema version lives in `PRAGMA user_version`. A fresh file gets the
//! full current schema at once; an older file reports
//! [`DatabaseState::UpgradeNeeded`] and is brought forward by
//! [`Database::upgrade`], during which [`Database::is_upgrading`] is true.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use rusqlite::Connection;

use crate::StorageError;
use crate::sqlite_util::open_secure_db;

/// Schema version written by this build.
pub const SCHEMA_VERSION: i64 = 2;

const SCHEMA_V1: &str = "
CREATE TABLE IF NOT EXISTS origin (
    id          INTEGER PRIMARY KEY,
    name        TEXT NOT NULL UNIQUE,
    kind        TEXT NOT NULL,
    text_limit  INTEGER NOT NULL DEFAULT 0
);
CREATE TABLE IF NOT EXISTS user (
    id          INTEGER PRIMARY KEY,
    origin_id   INTEGER NOT NULL REFERENCES origin(id),
    username    TEXT NOT NULL,
    real_name   TEXT,
    avatar_file TEXT
);
CREATE TABLE IF NOT EXISTS msg (
    id          INTEGER PRIMARY KEY,
    origin_id   INTEGER NOT NULL REFERENCES origin(id),
    author_id   INTEGER NOT NULL REFERENCES user(id),
    sender_id   INTEGER NOT NULL REFERENCES user(id),
    body        TEXT NOT NULL DEFAULT '',
    sent_date   INTEGER NOT NULL DEFAULT 0
);
CREATE TABLE IF NOT EXISTS account (
    name        TEXT PRIMARY KEY,
    user_id     INTEGER NOT NULL REFERENCES user(id),
    origin_id   INTEGER NOT NULL REFERENCES origin(id),
    credentials TEXT NOT NULL DEFAULT 'never'
);
";

const SCHEMA_V2: &str = "
CREATE TABLE IF NOT EXISTS latest_timeline_item (
    timeline_type   TEXT NOT NULL,
    user_id         INTEGER NOT NULL,
    item_date       INTEGER NOT NULL DEFAULT 0,
    downloaded_date INTEGER NOT NULL DEFAULT 0,
    position        TEXT NOT NULL DEFAULT '',
    PRIMARY KEY (timeline_type, user_id)
);
CREATE TABLE IF NOT EXISTS outbox (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    command_id   INTEGER NOT NULL,
    kind         TEXT NOT NULL,
    data         TEXT NOT NULL,
    queued_at    INTEGER NOT NULL,
    completed_at INTEGER,
    result       TEXT
);
";

/// Migrations indexed by the version they produce.
const MIGRATIONS: &[(i64, &str)] = &[(1, SCHEMA_V1), (2, SCHEMA_V2)];

/// What the storage layer found when it was checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseState {
    Ready,
    /// The file predates this build's schema; run [`Database::upgrade`].
    UpgradeNeeded { found: i64 },
}

#[derive(Debug)]
pub struct Database {
    path: PathBuf,
    conn: Mutex<Connection>,
    upgrading: AtomicBool,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let conn = open_secure_db(path).map_err(|reason| StorageError::Open {
            path: path.to_path_buf(),
            reason,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            conn: Mutex::new(conn),
            upgrading: AtomicBool::new(false),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn conn(&self) -> MutexGuard<'_, Connection> {
        // A panic while holding the lock cannot leave SQLite half-written:
        // every multi-statement write runs in a transaction.
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Verify the schema, creating it on a fresh file.
    pub fn check_state(&self) -> Result<DatabaseState, StorageError> {
        let conn = self.conn();
        let version = user_version(&conn)?;
        if version > SCHEMA_VERSION {
            return Err(StorageError::SchemaTooNew {
                found: version,
                supported: SCHEMA_VERSION,
            });
        }
        if version == 0 {
            let tx = conn.unchecked_transaction()?;
            for (_, sql) in MIGRATIONS {
                tx.execute_batch(sql)?;
            }
            tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
            tx.commit()?;
            tracing::info!(path = %self.path.display(), "Created database schema v{SCHEMA_VERSION}");
            return Ok(DatabaseState::Ready);
        }
        if version < SCHEMA_VERSION {
            return Ok(DatabaseState::UpgradeNeeded { found: version });
        }
        Ok(DatabaseState::Ready)
    }

    /// Apply every migration newer than the stored version.
    pub fn upgrade(&self) -> Result<(), StorageError> {
        self.upgrading.store(true, Ordering::SeqCst);
        let outcome = self.run_migrations();
        self.upgrading.store(false, Ordering::SeqCst);
        outcome
    }

    fn run_migrations(&self) -> Result<(), StorageError> {
        let conn = self.conn();
        let from = user_version(&conn)?;
        let tx = conn.unchecked_transaction()?;
        for (version, sql) in MIGRATIONS.iter().filter(|(v, _)| *v > from) {
            tracing::info!(from, to = version, "Upgrading database schema");
            tx.execute_batch(sql)?;
            tx.pragma_update(None, "user_version", version)?;
        }
        tx.commit()?;
        Ok(())
    }

    /// True while a schema migration is running.
    #[must_use]
    pub fn is_upgrading(&self) -> bool {
        self.upgrading.load(Ordering::SeqCst)
    }

    /// Create a database file at an older schema version. Test support for
    /// exercising the upgrade path.
    #[doc(hidden)]
    pub fn create_at_version(path: &Path, version: i64) -> Result<(), StorageError> {
        let db = Self::open(path)?;
        let conn = db.conn();
        for (v, sql) in MIGRATIONS.iter().filter(|(v, _)| *v <= version) {
            conn.execute_batch(sql)?;
            conn.pragma_update(None, "user_version", v)?;
        }
        Ok(())
    }
}

fn user_version(conn: &Connection) -> Result<i64, StorageError> {
    Ok(conn.query_row("PRAGMA user_version", [], |row| row.get(0))?)
}
