//! SQLite-backed storage for Warble.
//!
//! # Architecture
//!
//! ```text
//! Database (one connection, schema version in PRAGMA user_version)
//! ├── PersistentOrigins   origin table, built-ins inserted on first use
//! ├── PersistentAccounts  account table, resolved against origins
//! ├── users / msg         name lookups for reply and direct-message labels
//! ├── AvatarFile          avatar file names, files live in the cache dir
//! ├── LatestTimelineItem  per-timeline "last seen" bookkeeping
//! └── outbox              commands queued for the command layer
//! ```

mod accounts;
mod avatar;
mod database;
mod error;
mod origins;
mod outbox;
mod sqlite_util;
mod timeline;
mod users;

pub use accounts::PersistentAccounts;
pub use avatar::AvatarFile;
pub use database::{Database, DatabaseState, SCHEMA_VERSION};
pub use error::StorageError;
pub use origins::PersistentOrigins;
pub use outbox::OutboxEntry;
pub use timeline::LatestTimelineItem;
pub use users::MsgUserColumn;
