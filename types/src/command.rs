//! Commands handed to the background command layer, and their results.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::account::AccountName;
use crate::ids::{CommandId, MessageId, UserId};
use crate::timeline::TimelineType;

static NEXT_COMMAND_ID: AtomicU64 = AtomicU64::new(1);

fn next_command_id() -> CommandId {
    CommandId::new(NEXT_COMMAND_ID.fetch_add(1, Ordering::Relaxed))
}

/// What a command asks the command layer to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandKind {
    /// Post a status update or, with a recipient, a direct message.
    UpdateStatus {
        text: String,
        reply_to: MessageId,
        recipient: UserId,
    },
    RateLimitStatus,
    FetchAvatar {
        user_id: UserId,
    },
    FetchTimeline,
}

impl CommandKind {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::UpdateStatus { .. } => "update_status",
            Self::RateLimitStatus => "rate_limit_status",
            Self::FetchAvatar { .. } => "fetch_avatar",
            Self::FetchTimeline => "fetch_timeline",
        }
    }
}

/// Counters and notes accumulated while executing a command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    pub executed_count: u32,
    pub downloaded_count: u32,
    pub new_messages_count: u32,
    pub auth_errors: u32,
    pub io_errors: u32,
    pub parse_errors: u32,
    #[serde(default)]
    pub messages: Vec<String>,
}

impl CommandResult {
    /// Merge a finished exec step's result into this (parent) result.
    pub fn accumulate(&mut self, step: &CommandResult) {
        self.executed_count += step.executed_count;
        self.downloaded_count += step.downloaded_count;
        self.new_messages_count += step.new_messages_count;
        self.auth_errors += step.auth_errors;
        self.io_errors += step.io_errors;
        self.parse_errors += step.parse_errors;
        self.messages.extend(step.messages.iter().cloned());
    }

    /// Errors that retrying will not fix.
    #[must_use]
    pub fn has_hard_error(&self) -> bool {
        self.auth_errors > 0 || self.parse_errors > 0
    }

    /// Errors that may go away on retry (network trouble).
    #[must_use]
    pub fn has_soft_error(&self) -> bool {
        self.io_errors > 0
    }

    #[must_use]
    pub fn has_error(&self) -> bool {
        self.has_hard_error() || self.has_soft_error()
    }
}

impl fmt::Display for CommandResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "executed:{}", self.executed_count)?;
        if self.downloaded_count > 0 {
            write!(f, ",downloaded:{}", self.downloaded_count)?;
        }
        if self.new_messages_count > 0 {
            write!(f, ",new:{}", self.new_messages_count)?;
        }
        if self.has_error() {
            write!(
                f,
                ",errors(auth:{},io:{},parse:{})",
                self.auth_errors, self.io_errors, self.parse_errors
            )?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandData {
    id: CommandId,
    pub kind: CommandKind,
    pub account_name: Option<AccountName>,
    pub timeline_type: TimelineType,
    pub timeline_user_id: UserId,
    pub in_foreground: bool,
    pub result: CommandResult,
}

impl CommandData {
    #[must_use]
    pub fn new(kind: CommandKind, account_name: Option<AccountName>) -> Self {
        Self {
            id: next_command_id(),
            kind,
            account_name,
            timeline_type: TimelineType::Unknown,
            timeline_user_id: UserId::NONE,
            in_foreground: false,
            result: CommandResult::default(),
        }
    }

    #[must_use]
    pub fn update_status(
        account_name: AccountName,
        text: impl Into<String>,
        reply_to: MessageId,
        recipient: UserId,
    ) -> Self {
        Self::new(
            CommandKind::UpdateStatus {
                text: text.into(),
                reply_to,
                recipient,
            },
            Some(account_name),
        )
    }

    #[must_use]
    pub fn rate_limit_status(account_name: AccountName) -> Self {
        Self::new(CommandKind::RateLimitStatus, Some(account_name))
    }

    #[must_use]
    pub fn fetch_avatar(user_id: UserId) -> Self {
        Self::new(CommandKind::FetchAvatar { user_id }, None)
    }

    #[must_use]
    pub fn fetch_timeline(account_name: AccountName, timeline_type: TimelineType) -> Self {
        let mut command = Self::new(CommandKind::FetchTimeline, Some(account_name));
        command.timeline_type = timeline_type;
        command
    }

    /// A fresh record for one nested execution step of `parent`.
    ///
    /// The step runs the same kind of command, but against the account and
    /// timeline the execution context is currently positioned at, and starts
    /// with an empty result.
    #[must_use]
    pub fn for_one_exec_step(
        parent: &CommandData,
        account_name: Option<AccountName>,
        timeline_type: TimelineType,
        timeline_user_id: UserId,
    ) -> Self {
        let mut step = Self::new(parent.kind.clone(), account_name);
        step.timeline_type = timeline_type;
        step.timeline_user_id = timeline_user_id;
        step.in_foreground = parent.in_foreground;
        step
    }

    #[must_use]
    pub fn id(&self) -> CommandId {
        self.id
    }

    /// Merge the result of a finished exec step into this command.
    pub fn accumulate_one_step(&mut self, step: &CommandData) {
        self.result.accumulate(&step.result);
    }
}

impl fmt::Display for CommandData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind.name(), self.id)?;
        if let Some(account) = &self.account_name {
            write!(f, ",account:{account}")?;
        }
        if self.timeline_type != TimelineType::Unknown {
            write!(f, ",timeline:{}", self.timeline_type)?;
        }
        write!(f, ",{}", self.result)
    }
}

/// Completion report sent back by the command layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutcome {
    pub command_id: CommandId,
    pub result: CommandResult,
}

impl CommandOutcome {
    #[must_use]
    pub fn new(command_id: CommandId, result: CommandResult) -> Self {
        Self { command_id, result }
    }

    #[must_use]
    pub fn succeeded(&self) -> bool {
        !self.result.has_error()
    }
}
