//! Application state and the message editor for Warble.
//!
//! This crate has no UI dependencies. A front end owns a [`ContextHolder`],
//! builds a [`MessageEditor`] against it, and forwards user input; commands
//! leave through a [`CommandDispatcher`] and their outcomes come back on an
//! outcome channel.

mod app_context;
mod avatar;
mod directory;
mod dispatch;
mod editor;
mod execution;
mod foreground;
mod holder;
mod log_switch;

pub use app_context::{AppContext, ContextState};
pub use avatar::{Avatar, AvatarDrawable, Theme};
pub use directory::UserDirectory;
pub use dispatch::{
    CommandDispatcher, CommandQueue, OutcomeReceiver, OutcomeSender, outcome_channel,
};
pub use editor::{
    CreateMessageButton, EditorNotice, EditorSettings, EditorSnapshot, EditorVisibility,
    InputSurface, MessageEditor, SendAttempt,
};
pub use execution::{CommandExecutionContext, ExecStepError, ExecStepStack};
pub use foreground::ForegroundTracker;
pub use holder::ContextHolder;
pub use log_switch::LogSwitch;

pub use warble_config::Preferences;
pub use warble_context::{Database, LatestTimelineItem, StorageError};

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::HashMap;
    use std::mem;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use tempfile::TempDir;
    use warble_config::Preferences;
    use warble_context::{Database, DatabaseState, PersistentAccounts, PersistentOrigins};
    use warble_types::{
        Account, AccountName, CommandData, CredentialsStatus, MessageId, Origin, OriginId,
        OriginKind, UserId,
    };

    use crate::{AppContext, CommandDispatcher, ForegroundTracker, LogSwitch, UserDirectory};

    /// Captures dispatched commands instead of running them.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingDispatcher {
        commands: Mutex<Vec<CommandData>>,
    }

    impl RecordingDispatcher {
        pub(crate) fn take(&self) -> Vec<CommandData> {
            mem::take(&mut *self.commands.lock().unwrap())
        }
    }

    impl CommandDispatcher for RecordingDispatcher {
        fn send_foreground_command(&self, command: CommandData) {
            self.commands.lock().unwrap().push(command);
        }
    }

    /// In-memory [`UserDirectory`].
    #[derive(Debug, Default)]
    pub(crate) struct FakeDirectory {
        accounts: Vec<Account>,
        current: Option<String>,
        authors: HashMap<MessageId, String>,
        users: HashMap<UserId, String>,
    }

    impl FakeDirectory {
        pub(crate) fn with_account(mut self, account: Account) -> Self {
            self.accounts.push(account);
            self
        }

        pub(crate) fn with_current(mut self, name: &str) -> Self {
            self.current = Some(name.to_string());
            self
        }

        pub(crate) fn with_author(mut self, msg_id: MessageId, name: &str) -> Self {
            self.authors.insert(msg_id, name.to_string());
            self
        }

        pub(crate) fn with_user(mut self, user_id: UserId, name: &str) -> Self {
            self.users.insert(user_id, name.to_string());
            self
        }
    }

    impl UserDirectory for FakeDirectory {
        fn message_author_name(&self, msg_id: MessageId) -> Option<String> {
            self.authors.get(&msg_id).cloned()
        }

        fn user_name(&self, user_id: UserId) -> Option<String> {
            self.users.get(&user_id).cloned()
        }

        fn account_by_name(&self, name: &str) -> Option<Account> {
            self.accounts
                .iter()
                .find(|a| a.account_name().as_str() == name)
                .cloned()
        }

        fn current_account(&self) -> Option<Account> {
            self.account_by_name(self.current.as_deref()?)
        }
    }

    pub(crate) fn account(username: &str, kind: OriginKind, credentials: CredentialsStatus) -> Account {
        let origin = Origin::new(OriginId::new(1), kind.as_str(), kind);
        Account::new(
            AccountName::new(username, kind.as_str()).unwrap(),
            UserId::new(100),
            origin,
            credentials,
        )
    }

    /// A ready context whose storage holds the given `(username, origin,
    /// credentials)` accounts.
    pub(crate) fn seeded_context(
        accounts: &[(&str, &str, CredentialsStatus)],
    ) -> (TempDir, Arc<AppContext>) {
        let dir = tempfile::tempdir().unwrap();
        let prefs = Preferences::with_data_dir(dir.path());
        {
            let db = Database::open(&prefs.database_path()).unwrap();
            assert_eq!(db.check_state().unwrap(), DatabaseState::Ready);
            let mut origins = PersistentOrigins::empty();
            origins.initialize(&db).unwrap();
            let mut persistent = PersistentAccounts::empty();
            for (username, origin_name, credentials) in accounts {
                let origin = origins.from_name(origin_name).unwrap().clone();
                let user_id = db.insert_user(origin.id, username, None).unwrap();
                let name = AccountName::new(username, origin_name).unwrap();
                persistent
                    .save(&db, Account::new(name, user_id, origin, *credentials))
                    .unwrap();
            }
        }
        let ctx = AppContext::new_initialized(
            prefs,
            "test",
            Arc::new(ForegroundTracker::new(Duration::from_secs(20))),
            LogSwitch::new(),
        );
        assert!(ctx.is_ready());
        (dir, Arc::new(ctx))
    }
}
