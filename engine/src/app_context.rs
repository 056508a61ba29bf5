//! Initialized application state: storage plus the stores built on it.
//!
//! An [`AppContext`] is effectively immutable once built and is shared as
//! `Arc<AppContext>`. When something it captured goes stale (preferences
//! changed, accounts added) it is marked expired and the
//! [`ContextHolder`](crate::ContextHolder) builds a replacement.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use warble_config::Preferences;
use warble_context::{
    AvatarFile, Database, DatabaseState, MsgUserColumn, PersistentAccounts, PersistentOrigins,
    StorageError,
};
use warble_types::{Account, MessageId, UserId};

use crate::{ForegroundTracker, LogSwitch, UserDirectory};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    /// Created, but initialization has not been attempted.
    Empty,
    Ready,
    /// Storage needs a schema migration before it can be used.
    Upgrading,
    /// Storage could not be opened; build a new context to retry.
    Error,
}

impl ContextState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Ready => "ready",
            Self::Upgrading => "upgrading",
            Self::Error => "error",
        }
    }
}

#[derive(Debug)]
pub struct AppContext {
    state: ContextState,
    initialized_by: String,
    preferences: Preferences,
    database: Option<Database>,
    accounts: PersistentAccounts,
    origins: PersistentOrigins,
    expired: AtomicBool,
    foreground: Arc<ForegroundTracker>,
    log_switch: LogSwitch,
}

impl AppContext {
    /// A context that only knows who created it. Nothing is opened.
    #[must_use]
    pub fn new_creator(
        preferences: Preferences,
        initializer_name: &str,
        foreground: Arc<ForegroundTracker>,
        log_switch: LogSwitch,
    ) -> Self {
        Self {
            state: ContextState::Empty,
            initialized_by: initializer_name.to_string(),
            preferences,
            database: None,
            accounts: PersistentAccounts::empty(),
            origins: PersistentOrigins::empty(),
            expired: AtomicBool::new(false),
            foreground,
            log_switch,
        }
    }

    /// Open storage and, only if it is ready, load origins then accounts.
    ///
    /// Never fails: problems are reflected in [`AppContext::state`].
    #[must_use]
    pub fn new_initialized(
        preferences: Preferences,
        initializer_name: &str,
        foreground: Arc<ForegroundTracker>,
        log_switch: LogSwitch,
    ) -> Self {
        let mut ctx = Self::new_creator(preferences, initializer_name, foreground, log_switch);
        tracing::debug!(initializer = initializer_name, "Starting initialization");

        let db_path = ctx.preferences.database_path();
        let opened = Database::open(&db_path).and_then(|db| {
            let state = db.check_state()?;
            Ok((db, state))
        });
        match opened {
            Ok((db, DatabaseState::Ready)) => match ctx.load_stores(&db) {
                Ok(()) => {
                    ctx.database = Some(db);
                    ctx.state = ContextState::Ready;
                }
                Err(e) => {
                    tracing::error!("Failed to load accounts: {e}");
                    ctx.state = ContextState::Error;
                }
            },
            Ok((db, DatabaseState::UpgradeNeeded { found })) => {
                tracing::warn!(found, "Database needs an upgrade");
                ctx.database = Some(db);
                ctx.state = ContextState::Upgrading;
            }
            Err(e) => {
                tracing::error!("Failed to open database: {e}");
                ctx.state = ContextState::Error;
            }
        }

        tracing::info!("{ctx}");
        ctx
    }

    fn load_stores(&mut self, db: &Database) -> Result<(), StorageError> {
        self.origins.initialize(db)?;
        self.accounts.initialize(
            db,
            &self.origins,
            self.preferences.current_account.as_deref(),
        )?;
        Ok(())
    }

    #[must_use]
    pub fn initialized(&self) -> bool {
        self.state != ContextState::Empty
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state == ContextState::Ready
            && self.database.as_ref().is_some_and(|db| !db.is_upgrading())
    }

    #[must_use]
    pub fn state(&self) -> ContextState {
        self.state
    }

    #[must_use]
    pub fn initialized_by(&self) -> &str {
        &self.initialized_by
    }

    #[must_use]
    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    #[must_use]
    pub fn preferences_change_time(&self) -> SystemTime {
        self.preferences.change_time
    }

    #[must_use]
    pub fn database(&self) -> Option<&Database> {
        self.database.as_ref()
    }

    #[must_use]
    pub fn persistent_accounts(&self) -> &PersistentAccounts {
        &self.accounts
    }

    #[must_use]
    pub fn persistent_origins(&self) -> &PersistentOrigins {
        &self.origins
    }

    /// Run the pending schema migration. The context stays `Upgrading`;
    /// expire it and build a new one to pick up the migrated storage.
    pub fn upgrade_database(&self) -> Result<(), StorageError> {
        match (&self.database, self.state) {
            (Some(db), ContextState::Upgrading) => db.upgrade(),
            _ => Ok(()),
        }
    }

    /// Storage is deliberately left open: handles to it may still be in use
    /// by commands that outlive this context. Only auxiliary log state is reset.
    pub fn release(&self) {
        self.log_switch.forget();
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expired.load(Ordering::Acquire)
    }

    pub fn set_expired(&self) {
        if !self.expired.swap(true, Ordering::AcqRel) {
            tracing::debug!(initializer = %self.initialized_by, "Context expired");
        }
    }

    #[must_use]
    pub fn is_in_foreground(&self) -> bool {
        self.foreground.is_in_foreground()
    }

    pub fn set_in_foreground(&self, in_foreground: bool) {
        self.foreground.set_in_foreground(in_foreground);
    }

    #[must_use]
    pub fn foreground(&self) -> &Arc<ForegroundTracker> {
        &self.foreground
    }

    #[must_use]
    pub fn log_switch(&self) -> &LogSwitch {
        &self.log_switch
    }

    /// Avatar file of `user_id`; a lookup failure is treated as "no file".
    #[must_use]
    pub fn avatar_file(&self, user_id: UserId) -> AvatarFile {
        let avatar_dir = self.preferences.avatar_dir();
        let Some(db) = &self.database else {
            return AvatarFile::new(&avatar_dir, None);
        };
        AvatarFile::for_user(db, &avatar_dir, user_id).unwrap_or_else(|e| {
            tracing::warn!(user = %user_id, "Avatar lookup failed: {e}");
            AvatarFile::new(&avatar_dir, None)
        })
    }
}

impl fmt::Display for AppContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AppContext initialized by {}; state={}; ",
            self.initialized_by,
            self.state.as_str()
        )?;
        match &self.database {
            Some(db) => write!(f, "database={}", db.path().display()),
            None => f.write_str("no database"),
        }
    }
}

impl UserDirectory for AppContext {
    fn message_author_name(&self, msg_id: MessageId) -> Option<String> {
        let db = self.database.as_ref()?;
        db.msg_id_to_username(MsgUserColumn::Author, msg_id)
            .unwrap_or_else(|e| {
                tracing::warn!(msg = %msg_id, "Author lookup failed: {e}");
                None
            })
    }

    fn user_name(&self, user_id: UserId) -> Option<String> {
        let db = self.database.as_ref()?;
        db.user_id_to_name(user_id).unwrap_or_else(|e| {
            tracing::warn!(user = %user_id, "User lookup failed: {e}");
            None
        })
    }

    fn account_by_name(&self, name: &str) -> Option<Account> {
        self.accounts.from_account_name(name).cloned()
    }

    fn current_account(&self) -> Option<Account> {
        self.accounts.current_account().cloned()
    }
}
