//! Commands persisted for the command service

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;
use warble_engine::{
    AppContext, CommandExecutionContext, CommandQueue, EditorSettings, MessageEditor, SendAttempt,
};
use warble_types::{CommandData, CommandKind, CredentialsStatus, MessageId, TimelineType, UserId};

use crate::common::TestEnv;

async fn persist_all(
    ctx: Arc<AppContext>,
    mut commands: UnboundedReceiver<CommandData>,
) -> usize {
    let mut written = 0;
    while let Some(command) = commands.recv().await {
        ctx.database().unwrap().enqueue_command(&command).unwrap();
        written += 1;
    }
    written
}

#[tokio::test]
async fn editor_commands_land_in_outbox() {
    let env = TestEnv::new();
    let alice = env.add_account("alice", "twitter", CredentialsStatus::Succeeded);
    let (queue, receiver) = CommandQueue::channel();
    let writer = tokio::spawn(persist_all(env.holder.get(), receiver));

    let mut editor = MessageEditor::new(
        env.directory(),
        Arc::new(queue),
        EditorSettings::default(),
        env.holder.log_switch().clone(),
    );
    editor.start_editing_message("hello world", MessageId::NONE, UserId::NONE, Some(alice), false);
    let SendAttempt::Sent(id) = editor.send_message_and_close_editor() else {
        panic!("expected send");
    };
    drop(editor);
    assert_eq!(writer.await.unwrap(), 2);

    let ctx = env.holder.get();
    let db = ctx.database().unwrap();
    let pending = db.pending_commands().unwrap();
    assert_eq!(pending.len(), 2);
    assert!(matches!(pending[0].command.kind, CommandKind::RateLimitStatus));
    assert_eq!(pending[1].command.id(), id);
    assert!(pending[1].command.in_foreground);

    let row = db.pending_row_for(id).unwrap().unwrap();
    assert!(db.complete_command(row, &pending[1].command.result).unwrap());
    assert_eq!(db.pending_commands().unwrap().len(), 1);
}

#[test]
fn executed_steps_are_recorded_on_completion() {
    let env = TestEnv::new();
    let alice = env.add_account("alice", "twitter", CredentialsStatus::Succeeded);
    let ctx = env.holder.get();
    let db = ctx.database().unwrap();

    let command = CommandData::fetch_timeline(alice.account_name().clone(), TimelineType::Home);
    let row = db.enqueue_command(&command).unwrap();

    let mut exec = CommandExecutionContext::new(command, Arc::clone(&ctx));
    for downloaded in [3, 4] {
        exec.on_one_exec_step_launch().unwrap();
        exec.result_mut().executed_count += 1;
        exec.result_mut().downloaded_count += downloaded;
        exec.on_one_exec_step_end().unwrap();
    }
    let finished = exec.into_command().unwrap();
    assert_eq!(finished.result.executed_count, 2);
    assert_eq!(finished.result.downloaded_count, 7);

    assert!(db.complete_command(row, &finished.result).unwrap());
    assert!(db.pending_commands().unwrap().is_empty());
    assert!(!db.complete_command(row, &finished.result).unwrap());
}
