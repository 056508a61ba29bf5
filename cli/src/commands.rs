use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use warble_config::WarbleConfig;
use warble_context::LatestTimelineItem;
use warble_engine::{
    AppContext, CommandQueue, ContextHolder, EditorSettings, MessageEditor, SendAttempt,
    UserDirectory,
};
use warble_types::{
    Account, AccountName, CommandData, CommandKind, CredentialsStatus, MessageId, TimelineType,
    UserId, truncate_with_ellipsis,
};

use crate::{AccountAction, Command, load_preferences};

pub(crate) async fn run(
    command: Command,
    holder: &Arc<ContextHolder>,
    config_path: Option<&Path>,
) -> Result<()> {
    match command {
        Command::Status => status(holder),
        Command::Accounts { action: None } => list_accounts(holder),
        Command::Accounts {
            action: Some(AccountAction::Add { name, verified }),
        } => add_account(holder, &name, verified),
        Command::Accounts {
            action: Some(AccountAction::Use { name }),
        } => use_account(holder, &name, config_path),
        Command::Post {
            text,
            account,
            reply_to,
            to,
        } => {
            post(
                holder,
                &text,
                account.as_deref(),
                MessageId::new(reply_to),
                UserId::new(to),
            )
            .await
        }
        Command::Outbox => outbox(&holder.get()),
        Command::Timeline { timeline, user } => show_timeline(&holder.get(), &timeline, user),
    }
}

fn status(holder: &ContextHolder) -> Result<()> {
    let ctx = holder.get();
    println!("{ctx}");
    println!("origins: {}", ctx.persistent_origins().len());
    println!("accounts: {}", ctx.persistent_accounts().len());
    match ctx.current_account() {
        Some(account) => println!("current account: {account}"),
        None => println!("current account: none"),
    }
    if let Some(db) = ctx.database() {
        println!("outbox: {} pending", db.pending_commands()?.len());
    }
    Ok(())
}

fn list_accounts(holder: &ContextHolder) -> Result<()> {
    let ctx = holder.get();
    let current = ctx.current_account();
    for account in ctx.persistent_accounts().iter() {
        let marker = if current
            .as_ref()
            .is_some_and(|c| c.account_name() == account.account_name())
        {
            "*"
        } else {
            " "
        };
        println!("{marker} {account}");
    }
    Ok(())
}

fn add_account(holder: &ContextHolder, name: &str, verified: bool) -> Result<()> {
    let ctx = holder.get();
    let name = AccountName::parse(name)?;
    let origin = ctx
        .persistent_origins()
        .from_name(name.origin_name())
        .cloned()
        .ok_or_else(|| anyhow!("unknown origin '{}'", name.origin_name()))?;
    let db = ctx.database().context("storage is not open")?;

    let user_id = db.insert_user(origin.id, name.username(), None)?;
    let credentials = if verified {
        CredentialsStatus::Succeeded
    } else {
        CredentialsStatus::Never
    };
    let mut accounts = ctx.persistent_accounts().clone();
    accounts.save(db, Account::new(name.clone(), user_id, origin, credentials))?;

    // Loaded accounts are part of the context; rebuild it to see the new one.
    ctx.set_expired();
    holder.initialize("accounts add");
    println!("Saved {name}");
    Ok(())
}

fn use_account(holder: &ContextHolder, name: &str, config_path: Option<&Path>) -> Result<()> {
    if holder.account_by_name(name).is_none() {
        bail!("no such account '{name}'");
    }
    let path = config_path.context("no config file location")?;
    WarbleConfig::persist_current_account(path, name)
        .with_context(|| format!("failed to update {}", path.display()))?;

    let (prefs, warning) = load_preferences(Some(path));
    if let Some(warning) = warning {
        bail!(warning);
    }
    let ctx = holder.reload(prefs, "accounts use");
    match ctx.current_account() {
        Some(account) => println!("Current account: {account}"),
        None => println!("Current account: none"),
    }
    Ok(())
}

/// Persist every queued command until all senders are gone.
fn spawn_outbox_writer(
    ctx: Arc<AppContext>,
    mut commands: mpsc::UnboundedReceiver<CommandData>,
) -> JoinHandle<usize> {
    tokio::spawn(async move {
        let mut written = 0;
        while let Some(command) = commands.recv().await {
            let Some(db) = ctx.database() else {
                tracing::warn!(%command, "No storage; command dropped");
                continue;
            };
            match db.enqueue_command(&command) {
                Ok(row) => {
                    tracing::debug!(row, %command, "Command queued in outbox");
                    written += 1;
                }
                Err(e) => tracing::warn!(%command, "Failed to queue command: {e}"),
            }
        }
        written
    })
}

async fn post(
    holder: &Arc<ContextHolder>,
    text: &str,
    account_name: Option<&str>,
    reply_to: MessageId,
    recipient: UserId,
) -> Result<()> {
    let account = match account_name {
        Some(name) => holder.account_by_name(name),
        None => holder.current_account(),
    }
    .context("no account to post as; add one with `warble accounts add`")?;

    let (queue, receiver) = CommandQueue::channel();
    let writer = spawn_outbox_writer(holder.get(), receiver);

    let prefs = holder.preferences();
    let mut editor = MessageEditor::new(
        holder.clone(),
        Arc::new(queue),
        EditorSettings::from(prefs.as_ref()),
        holder.log_switch().clone(),
    );
    editor.start_editing_message(text, reply_to, recipient, Some(account), false);
    if let Some(label) = editor.detail_label() {
        println!("{label}");
    }
    let attempt = editor.send_message_and_close_editor();
    drop(editor);

    let written = writer.await.context("outbox writer failed")?;
    match attempt {
        SendAttempt::Sent(id) => {
            println!("Queued message #{id} ({written} command(s) in outbox)");
            Ok(())
        }
        SendAttempt::Rejected(notice) => bail!("{notice}"),
    }
}

fn outbox(ctx: &AppContext) -> Result<()> {
    let db = ctx.database().context("storage is not open")?;
    let pending = db.pending_commands()?;
    if pending.is_empty() {
        println!("Outbox is empty");
    }
    for entry in pending {
        match &entry.command.kind {
            CommandKind::UpdateStatus { text, .. } => println!(
                "{:>4}  {}  {}",
                entry.row_id,
                entry.command,
                truncate_with_ellipsis(text, 40)
            ),
            _ => println!("{:>4}  {}", entry.row_id, entry.command),
        }
    }
    Ok(())
}

fn show_timeline(ctx: &AppContext, timeline: &str, user: i64) -> Result<()> {
    let timeline_type = TimelineType::load(timeline);
    if timeline_type == TimelineType::Unknown {
        bail!("unknown timeline '{timeline}'");
    }
    let db = ctx.database().context("storage is not open")?;
    let item = LatestTimelineItem::load(db, timeline_type, UserId::new(user))?;
    println!("timeline: {timeline_type}");
    println!("position: {}", item.position().as_str());
    println!("latest item date: {}", item.timeline_item_date());
    println!("downloaded date: {}", item.timeline_downloaded_date());
    Ok(())
}
