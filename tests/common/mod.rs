//! Shared test utilities and fixtures
//!
//! Every fixture runs against a real SQLite database in a temp data dir.

#![allow(dead_code)]

use std::mem;
use std::sync::{Arc, Mutex};

use tempfile::TempDir;
use warble_config::Preferences;
use warble_engine::{CommandDispatcher, ContextHolder, UserDirectory};
use warble_types::{
    Account, AccountName, CommandData, CredentialsStatus, MessageId, OriginId, UserId,
};

/// A data dir plus a holder initialized against it.
pub struct TestEnv {
    pub dir: TempDir,
    pub holder: Arc<ContextHolder>,
}

impl TestEnv {
    pub fn new() -> Self {
        Self::with_preferences(|_| {})
    }

    pub fn with_preferences(adjust: impl FnOnce(&mut Preferences)) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut prefs = Preferences::with_data_dir(dir.path());
        adjust(&mut prefs);
        let holder = Arc::new(ContextHolder::new(prefs));
        assert!(holder.initialize("test").is_ready());
        Self { dir, holder }
    }

    pub fn origin_id(&self, origin_name: &str) -> OriginId {
        self.holder
            .get()
            .persistent_origins()
            .from_name(origin_name)
            .unwrap()
            .id
    }

    /// Store an account and rebuild the context so it is visible.
    pub fn add_account(
        &self,
        username: &str,
        origin_name: &str,
        credentials: CredentialsStatus,
    ) -> Account {
        let ctx = self.holder.get();
        let db = ctx.database().unwrap();
        let origin = ctx
            .persistent_origins()
            .from_name(origin_name)
            .unwrap()
            .clone();
        let user_id = db.insert_user(origin.id, username, None).unwrap();
        let account = Account::new(
            AccountName::new(username, origin_name).unwrap(),
            user_id,
            origin,
            credentials,
        );
        let mut accounts = ctx.persistent_accounts().clone();
        accounts.save(db, account.clone()).unwrap();

        ctx.set_expired();
        assert!(self.holder.initialize("test add_account").is_ready());
        account
    }

    pub fn add_user(&self, origin_name: &str, username: &str) -> UserId {
        let origin = self.origin_id(origin_name);
        self.holder
            .get()
            .database()
            .unwrap()
            .insert_user(origin, username, None)
            .unwrap()
    }

    /// A message authored by a new user `author`.
    pub fn add_message(&self, origin_name: &str, author: &str, body: &str) -> MessageId {
        let origin = self.origin_id(origin_name);
        let author_id = self.add_user(origin_name, author);
        self.holder
            .get()
            .database()
            .unwrap()
            .insert_msg(origin, author_id, author_id, body, 1_000)
            .unwrap()
    }

    pub fn directory(&self) -> Arc<dyn UserDirectory> {
        self.holder.clone()
    }
}

/// Captures dispatched commands instead of running them.
#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    commands: Mutex<Vec<CommandData>>,
}

impl RecordingDispatcher {
    pub fn take(&self) -> Vec<CommandData> {
        mem::take(&mut *self.commands.lock().unwrap())
    }
}

impl CommandDispatcher for RecordingDispatcher {
    fn send_foreground_command(&self, command: CommandData) {
        self.commands.lock().unwrap().push(command);
    }
}
