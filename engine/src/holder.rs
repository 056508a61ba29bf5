//! Owner of the current [`AppContext`].
//!
//! Readers take a snapshot with [`ContextHolder::get`] and keep it for the
//! duration of one operation. Replacement is construct-and-swap: a new
//! context is fully built before it becomes visible, and the old one is
//! released afterwards.

use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;
use warble_config::Preferences;
use warble_types::{Account, MessageId, UserId};

use crate::{AppContext, ForegroundTracker, LogSwitch, UserDirectory};

#[derive(Debug)]
pub struct ContextHolder {
    current: ArcSwap<AppContext>,
    preferences: ArcSwap<Preferences>,
    foreground: Arc<ForegroundTracker>,
    log_switch: LogSwitch,
    /// Serializes construction so concurrent `initialize` calls build once.
    init_lock: Mutex<()>,
}

impl ContextHolder {
    /// Holder with an `Empty` context; call [`ContextHolder::initialize`]
    /// before use.
    #[must_use]
    pub fn new(preferences: Preferences) -> Self {
        let foreground = Arc::new(ForegroundTracker::new(preferences.background_grace));
        let log_switch = LogSwitch::new();
        let empty = AppContext::new_creator(
            preferences.clone(),
            "holder",
            Arc::clone(&foreground),
            log_switch.clone(),
        );
        Self {
            current: ArcSwap::from_pointee(empty),
            preferences: ArcSwap::from_pointee(preferences),
            foreground,
            log_switch,
            init_lock: Mutex::new(()),
        }
    }

    /// The current context. May be `Empty`, `Error` or expired; check before use.
    #[must_use]
    pub fn get(&self) -> Arc<AppContext> {
        self.current.load_full()
    }

    /// Make sure a usable context is installed and return it.
    ///
    /// A context that was never initialized or has been expired is replaced
    /// by a freshly built one. A context in `Error` state is kept: callers
    /// that want to retry expire it first.
    pub fn initialize(&self, initializer_name: &str) -> Arc<AppContext> {
        let _guard = self.init_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let current = self.current.load_full();
        if current.initialized() && !current.is_expired() {
            return current;
        }

        let preferences = Preferences::clone(&self.preferences.load());
        let fresh = Arc::new(AppContext::new_initialized(
            preferences,
            initializer_name,
            Arc::clone(&self.foreground),
            self.log_switch.clone(),
        ));
        let previous = self.current.swap(Arc::clone(&fresh));
        previous.release();
        fresh
    }

    /// Install new preferences and rebuild the context against them.
    pub fn reload(&self, preferences: Preferences, initializer_name: &str) -> Arc<AppContext> {
        self.preferences.store(Arc::new(preferences));
        self.current.load().set_expired();
        self.initialize(initializer_name)
    }

    #[must_use]
    pub fn preferences(&self) -> Arc<Preferences> {
        self.preferences.load_full()
    }

    #[must_use]
    pub fn foreground(&self) -> &Arc<ForegroundTracker> {
        &self.foreground
    }

    #[must_use]
    pub fn log_switch(&self) -> &LogSwitch {
        &self.log_switch
    }
}

impl UserDirectory for ContextHolder {
    fn message_author_name(&self, msg_id: MessageId) -> Option<String> {
        self.get().message_author_name(msg_id)
    }

    fn user_name(&self, user_id: UserId) -> Option<String> {
        self.get().user_name(user_id)
    }

    fn account_by_name(&self, name: &str) -> Option<Account> {
        self.get().account_by_name(name)
    }

    fn current_account(&self) -> Option<Account> {
        self.get().current_account()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::time::Duration;

    use super::*;
    use crate::ContextState;

    #[test]
    fn starts_empty_then_initializes_once() {
        let dir = tempfile::tempdir().unwrap();
        let holder = ContextHolder::new(Preferences::with_data_dir(dir.path()));
        assert_eq!(holder.get().state(), ContextState::Empty);

        let first = holder.initialize("first");
        assert!(first.is_ready());
        let again = holder.initialize("second");
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(holder.get().initialized_by(), "first");
    }

    #[test]
    fn expired_context_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let holder = ContextHolder::new(Preferences::with_data_dir(dir.path()));
        let first = holder.initialize("first");
        first.set_expired();

        let second = holder.initialize("second");
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(!second.is_expired());
        assert_eq!(second.initialized_by(), "second");
        // Old handles stay usable for whoever still holds them.
        assert!(first.database().is_some());
    }

    #[test]
    fn foreground_flag_survives_replacement() {
        let dir = tempfile::tempdir().unwrap();
        let mut prefs = Preferences::with_data_dir(dir.path());
        prefs.background_grace = Duration::ZERO;
        let holder = ContextHolder::new(prefs);

        holder.initialize("first").set_in_foreground(true);
        holder.get().set_expired();
        let second = holder.initialize("second");
        assert!(second.is_in_foreground());
    }

    #[test]
    fn reload_applies_new_preferences() {
        let dir = tempfile::tempdir().unwrap();
        let holder = ContextHolder::new(Preferences::with_data_dir(dir.path()));
        let first = holder.initialize("first");
        assert!(!first.preferences().light_theme);

        let mut prefs = Preferences::with_data_dir(dir.path());
        prefs.light_theme = true;
        let second = holder.reload(prefs, "reload");
        assert!(first.is_expired());
        assert!(second.preferences().light_theme);
        assert!(holder.preferences().light_theme);
    }

    #[test]
    fn error_context_is_kept_until_expired() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"x").unwrap();
        let holder = ContextHolder::new(Preferences::with_data_dir(&blocker));

        let failed = holder.initialize("first");
        assert_eq!(failed.state(), ContextState::Error);
        assert!(Arc::ptr_eq(&failed, &holder.initialize("again")));

        failed.set_expired();
        let retried = holder.initialize("retry");
        assert!(!Arc::ptr_eq(&failed, &retried));
    }
}
