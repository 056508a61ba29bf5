//! Message editor driven against a real context

use std::sync::Arc;

use serde_json::{Map, Value};
use warble_engine::{
    CommandQueue, CreateMessageButton, EditorNotice, EditorSettings, MessageEditor, SendAttempt,
    outcome_channel,
};
use warble_types::{
    CommandKind, CommandOutcome, CommandResult, CredentialsStatus, MessageId, TimelineType, UserId,
};

use crate::common::{RecordingDispatcher, TestEnv};

fn editor_for(env: &TestEnv) -> (MessageEditor, Arc<RecordingDispatcher>) {
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let editor = MessageEditor::new(
        env.directory(),
        dispatcher.clone(),
        EditorSettings::from(env.holder.preferences().as_ref()),
        env.holder.log_switch().clone(),
    );
    (editor, dispatcher)
}

#[test]
fn reply_flow_from_stored_message() {
    let env = TestEnv::new();
    let alice = env.add_account("alice", "twitter", CredentialsStatus::Succeeded);
    let msg = env.add_message("twitter", "carol", "what's up?");
    let (mut editor, dispatcher) = editor_for(&env);

    editor.start_editing_message("", msg, UserId::NONE, Some(alice.clone()), true);
    assert_eq!(editor.body_text(), "@carol ");
    assert_eq!(editor.detail_label(), Some("alice@twitter in reply to carol"));
    assert_eq!(editor.characters_left(), Some(133));

    editor.set_body_text("@carol not much");
    let SendAttempt::Sent(id) = editor.send_message_and_close_editor() else {
        panic!("expected send");
    };
    let commands = dispatcher.take();
    assert_eq!(commands.len(), 2);
    assert!(matches!(commands[0].kind, CommandKind::RateLimitStatus));
    assert_eq!(commands[1].id(), id);
    assert_eq!(
        commands[1].kind,
        CommandKind::UpdateStatus {
            text: "@carol not much".to_string(),
            reply_to: msg,
            recipient: UserId::NONE,
        }
    );
    assert!(!editor.is_visible());
    assert!(editor.account().is_none());
}

#[test]
fn direct_message_to_stored_user() {
    let env = TestEnv::new();
    let alice = env.add_account("alice", "statusnet", CredentialsStatus::Succeeded);
    let dave = env.add_user("statusnet", "dave");
    let (mut editor, _dispatcher) = editor_for(&env);

    editor.start_editing_message("", MessageId::NONE, dave, Some(alice), false);
    assert_eq!(editor.detail_label(), Some("to dave"));
    assert_eq!(editor.body_text(), "");
}

#[test]
fn create_button_uses_current_account_from_storage() {
    let env = TestEnv::new();
    let (mut editor, _dispatcher) = editor_for(&env);
    editor.set_timeline(TimelineType::Home, true);
    assert_eq!(editor.create_message_button(), CreateMessageButton::Hidden);

    env.add_account("alice", "twitter", CredentialsStatus::Succeeded);
    assert_eq!(editor.create_message_button(), CreateMessageButton::Create);
    editor.on_create_message_button();
    assert!(editor.is_visible());
    assert_eq!(editor.detail_label(), Some("alice@twitter"));
    assert_eq!(editor.create_message_button(), CreateMessageButton::Hide);
}

#[test]
fn draft_survives_editor_recreation() {
    let env = TestEnv::new();
    let alice = env.add_account("alice", "twitter", CredentialsStatus::Succeeded);
    let (mut editor, _dispatcher) = editor_for(&env);
    editor.start_editing_message("", MessageId::NONE, UserId::NONE, Some(alice), true);
    editor.set_body_text("half a thought");

    let mut bundle = Map::new();
    assert!(editor.save_state_to(&mut bundle));
    drop(editor);
    let stored = serde_json::to_string(&Value::Object(bundle)).unwrap();

    let restored: Value = serde_json::from_str(&stored).unwrap();
    let (mut editor, _dispatcher) = editor_for(&env);
    assert!(editor.load_state_from(restored.as_object().unwrap()));
    editor.continue_editing_loaded_state();
    assert!(editor.is_visible());
    assert_eq!(editor.body_text(), "half a thought");
    assert!(editor.show_account_label());

    editor.continue_editing_loaded_state();
    assert!(!editor.is_state_loaded());
}

#[test]
fn long_message_respects_origin_limit() {
    let env = TestEnv::new();
    let alice = env.add_account("alice", "twitter", CredentialsStatus::Succeeded);
    let (mut editor, dispatcher) = editor_for(&env);
    editor.start_editing_message("", MessageId::NONE, UserId::NONE, Some(alice), false);
    dispatcher.take();

    editor.set_body_text("é".repeat(141));
    assert_eq!(
        editor.send_message_and_close_editor(),
        SendAttempt::Rejected(EditorNotice::MessageTooLong {
            characters_left: -1
        })
    );
    assert!(editor.is_visible());
    assert!(dispatcher.take().is_empty());
}

#[tokio::test]
async fn failed_send_is_reopened_from_outcome_channel() {
    let env = TestEnv::new();
    let alice = env.add_account("alice", "twitter", CredentialsStatus::Succeeded);
    let (queue, mut commands) = CommandQueue::channel();
    let (outcomes_tx, mut outcomes_rx) = outcome_channel();
    let mut editor = MessageEditor::new(
        env.directory(),
        Arc::new(queue),
        EditorSettings::default(),
        env.holder.log_switch().clone(),
    );

    editor.start_editing_message("", MessageId::NONE, UserId::NONE, Some(alice), false);
    editor.set_body_text("will fail");
    editor.send_message_and_close_editor();

    // A stand-in command service: fail every status update.
    let service = tokio::spawn(async move {
        while let Some(command) = commands.recv().await {
            assert!(command.in_foreground);
            if let CommandKind::UpdateStatus { .. } = command.kind {
                let result = CommandResult {
                    io_errors: 1,
                    ..CommandResult::default()
                };
                outcomes_tx
                    .send(CommandOutcome::new(command.id(), result))
                    .unwrap();
                break;
            }
        }
    });
    service.await.unwrap();

    assert_eq!(editor.drain_outcomes(&mut outcomes_rx), 1);
    assert!(matches!(
        editor.take_notices().as_slice(),
        [EditorNotice::SendFailed { .. }]
    ));
    editor.continue_editing_loaded_state();
    assert_eq!(editor.body_text(), "will fail");
    assert!(editor.is_visible());
}
