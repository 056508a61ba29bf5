//! Config file driving the context and the editor

use std::fs;
use std::time::{Duration, SystemTime};

use warble_config::WarbleConfig;
use warble_engine::{ContextHolder, EditorSettings, UserDirectory};
use warble_types::CredentialsStatus;

use crate::common::TestEnv;

#[test]
fn config_file_resolves_into_context() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    let data_dir = dir.path().join("data");
    fs::write(
        &path,
        format!(
            "[app]\ndata_dir = {:?}\nenter_sends_message = false\nbackground_grace_seconds = 3\n",
            data_dir.display().to_string()
        ),
    )
    .unwrap();

    let prefs = WarbleConfig::load_from(&path)
        .unwrap()
        .unwrap()
        .resolve(Some(&path));
    let holder = ContextHolder::new(prefs);
    let ctx = holder.initialize("config test");

    assert!(ctx.is_ready());
    assert!(data_dir.join("warble.sqlite").exists());
    assert!(ctx.preferences_change_time() > SystemTime::UNIX_EPOCH);
    assert_eq!(holder.foreground().grace(), Duration::from_secs(3));
    assert!(!EditorSettings::from(ctx.preferences()).enter_sends_message);
}

#[test]
fn persisted_current_account_is_used_after_reload() {
    let env = TestEnv::new();
    env.add_account("alice", "twitter", CredentialsStatus::Succeeded);
    env.add_account("bob", "statusnet", CredentialsStatus::Succeeded);

    let path = env.dir.path().join("config.toml");
    fs::write(
        &path,
        format!("[app]\ndata_dir = {:?}\n", env.dir.path().display().to_string()),
    )
    .unwrap();
    WarbleConfig::persist_current_account(&path, "bob@statusnet").unwrap();

    let prefs = WarbleConfig::load_from(&path)
        .unwrap()
        .unwrap()
        .resolve(Some(&path));
    let ctx = env.holder.reload(prefs, "config changed");
    assert_eq!(
        ctx.current_account().unwrap().account_name().as_str(),
        "bob@statusnet"
    );
}
