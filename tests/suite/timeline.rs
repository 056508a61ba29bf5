//! "Last seen" bookkeeping per timeline

use chrono::Utc;
use warble_context::LatestTimelineItem;
use warble_types::{CredentialsStatus, TimelinePosition, TimelineType};

use crate::common::TestEnv;

fn one_timeline_type(env: &TestEnv, timeline_type: TimelineType, account_name: &str) {
    let ctx = env.holder.get();
    let account = ctx
        .persistent_accounts()
        .from_account_name(account_name)
        .unwrap();
    assert_eq!(account.account_name().as_str(), account_name);
    let db = ctx.database().unwrap();

    let mut latest = LatestTimelineItem::load(db, timeline_type, account.user_id()).unwrap();
    latest.on_timeline_downloaded();
    let sent = Utc::now().timestamp_millis() - 10_000;
    latest.on_new_msg(
        TimelinePosition::new(format!("position_{timeline_type}_{account_name}")),
        sent,
    );
    latest.save(db).unwrap();

    let reloaded = LatestTimelineItem::load(db, timeline_type, account.user_id()).unwrap();
    if timeline_type == TimelineType::Public {
        assert_eq!(reloaded.timeline_item_date(), 0, "public dates are not remembered");
        assert_eq!(reloaded.timeline_downloaded_date(), 0);
    } else {
        assert_eq!(reloaded.timeline_item_date(), sent);
        assert!(reloaded.timeline_downloaded_date() > 0);
        assert_eq!(
            reloaded.position().as_str(),
            format!("position_{timeline_type}_{account_name}")
        );
    }
}

fn timeline_for_account(origin: &str) {
    let env = TestEnv::new();
    let account = env.add_account("tester", origin, CredentialsStatus::Succeeded);
    let name = account.account_name().to_string();
    one_timeline_type(&env, TimelineType::Public, &name);
    one_timeline_type(&env, TimelineType::Home, &name);
}

#[test]
fn statusnet_timeline() {
    timeline_for_account("statusnet");
}

#[test]
fn twitter_timeline() {
    timeline_for_account("twitter");
}

#[test]
fn timelines_are_kept_apart() {
    let env = TestEnv::new();
    let account = env.add_account("tester", "twitter", CredentialsStatus::Succeeded);
    let ctx = env.holder.get();
    let db = ctx.database().unwrap();

    let mut home = LatestTimelineItem::load(db, TimelineType::Home, account.user_id()).unwrap();
    home.on_new_msg(TimelinePosition::new("h1"), 5_000);
    home.save(db).unwrap();

    let mentions =
        LatestTimelineItem::load(db, TimelineType::Mentions, account.user_id()).unwrap();
    assert!(mentions.position().is_empty());
    assert_eq!(mentions.timeline_item_date(), 0);
}
