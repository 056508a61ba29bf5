//! Application context lifecycle through the holder

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use warble_config::Preferences;
use warble_context::Database;
use warble_engine::{ContextHolder, ContextState, UserDirectory};
use warble_types::CredentialsStatus;

use crate::common::TestEnv;

#[test]
fn preferred_current_account_wins_over_first_verified() {
    let env = TestEnv::new();
    env.add_account("alice", "twitter", CredentialsStatus::Succeeded);
    env.add_account("bob", "twitter", CredentialsStatus::Succeeded);
    assert_eq!(
        env.holder.current_account().unwrap().account_name().as_str(),
        "alice@twitter"
    );

    let mut prefs = Preferences::with_data_dir(env.dir.path());
    prefs.current_account = Some("bob@twitter".to_string());
    env.holder.reload(prefs, "switch");
    assert_eq!(
        env.holder.current_account().unwrap().account_name().as_str(),
        "bob@twitter"
    );
}

#[test]
fn unknown_preferred_account_falls_back() {
    let env = TestEnv::with_preferences(|prefs| {
        prefs.current_account = Some("ghost@twitter".to_string());
    });
    env.add_account("alice", "twitter", CredentialsStatus::Succeeded);
    assert_eq!(
        env.holder.current_account().unwrap().account_name().as_str(),
        "alice@twitter"
    );
}

#[test]
fn unverified_accounts_are_not_made_current() {
    let env = TestEnv::new();
    env.add_account("eve", "twitter", CredentialsStatus::Failed);
    assert!(env.holder.current_account().is_none());
    assert!(env.holder.account_by_name("eve@twitter").is_some());
}

#[test]
fn directory_resolves_names_from_storage() {
    let env = TestEnv::new();
    let msg = env.add_message("twitter", "carol", "hello");
    let dave = env.add_user("twitter", "dave");
    assert_eq!(env.holder.message_author_name(msg).as_deref(), Some("carol"));
    assert_eq!(env.holder.user_name(dave).as_deref(), Some("dave"));
}

#[test]
fn old_schema_goes_through_upgrading() {
    let dir = tempfile::tempdir().unwrap();
    let prefs = Preferences::with_data_dir(dir.path());
    Database::create_at_version(&prefs.database_path(), 1).unwrap();
    let holder = ContextHolder::new(prefs);

    let ctx = holder.initialize("first");
    assert_eq!(ctx.state(), ContextState::Upgrading);
    assert!(!ctx.is_ready());

    ctx.upgrade_database().unwrap();
    ctx.set_expired();
    let upgraded = holder.initialize("after upgrade");
    assert!(upgraded.is_ready());
    assert!(!Arc::ptr_eq(&ctx, &upgraded));
}

#[test]
fn foreground_grace_window_spans_contexts() {
    let env = TestEnv::with_preferences(|prefs| prefs.background_grace = Duration::from_secs(20));
    let tracker = env.holder.foreground().clone();
    let start = Instant::now();
    tracker.set_in_foreground_at(true, start);
    tracker.set_in_foreground_at(false, start);

    env.holder.get().set_expired();
    let ctx = env.holder.initialize("replacement");
    assert!(Arc::ptr_eq(ctx.foreground(), &tracker));
    assert!(tracker.is_in_foreground_at(start + Duration::from_secs(19)));
    assert!(!tracker.is_in_foreground_at(start + Duration::from_secs(21)));
}

#[test]
fn concurrent_initialize_builds_one_context() {
    let dir = tempfile::tempdir().unwrap();
    let holder = Arc::new(ContextHolder::new(Preferences::with_data_dir(dir.path())));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let holder = Arc::clone(&holder);
            thread::spawn(move || holder.initialize(&format!("thread {i}")))
        })
        .collect();
    let contexts: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(contexts.iter().all(|c| Arc::ptr_eq(c, &contexts[0])));
}
