//! Per-command execution state for the command-processing layer.
//!
//! A command may run as several nested steps (one per account, per
//! timeline, ...). Each step gets its own record and result; ending a step
//! folds its result back into the parent.

use std::fmt;
use std::mem;
use std::sync::Arc;

use thiserror::Error;
use warble_types::{Account, CommandData, CommandResult, TimelineType, UserId};

use crate::AppContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ExecStepError {
    #[error("exec step ended without a matching launch")]
    Underflow,
    #[error("exec steps nested deeper than {max}")]
    TooDeep { max: usize },
    #[error("{open} exec step(s) still running")]
    Unfinished { open: usize },
}

/// Bounded LIFO of parent commands.
#[derive(Debug, Default)]
pub struct ExecStepStack {
    parents: Vec<CommandData>,
}

impl ExecStepStack {
    pub const MAX_DEPTH: usize = 16;

    pub fn push(&mut self, parent: CommandData) -> Result<(), ExecStepError> {
        if self.parents.len() >= Self::MAX_DEPTH {
            return Err(ExecStepError::TooDeep {
                max: Self::MAX_DEPTH,
            });
        }
        self.parents.push(parent);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<CommandData, ExecStepError> {
        self.parents.pop().ok_or(ExecStepError::Underflow)
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.parents.len()
    }
}

#[derive(Debug)]
pub struct CommandExecutionContext {
    command: CommandData,
    stack: ExecStepStack,
    account: Option<Account>,
    timeline_type: TimelineType,
    timeline_user_id: UserId,
    context: Arc<AppContext>,
}

impl CommandExecutionContext {
    /// Position at the command's own account (resolved against `context`)
    /// and timeline.
    #[must_use]
    pub fn new(command: CommandData, context: Arc<AppContext>) -> Self {
        let account = command
            .account_name
            .as_ref()
            .and_then(|name| context.persistent_accounts().from_account_name(name.as_str()))
            .cloned();
        let timeline_type = command.timeline_type;
        let timeline_user_id = command.timeline_user_id;
        Self {
            command,
            stack: ExecStepStack::default(),
            account,
            timeline_type,
            timeline_user_id,
            context,
        }
    }

    /// Start a nested step for the current position. The current command is
    /// kept as the parent until [`Self::on_one_exec_step_end`].
    pub fn on_one_exec_step_launch(&mut self) -> Result<(), ExecStepError> {
        let step = CommandData::for_one_exec_step(
            &self.command,
            self.account.as_ref().map(|a| a.account_name().clone()),
            self.timeline_type,
            self.timeline_user_id,
        );
        self.stack.push(self.command.clone())?;
        self.command = step;
        tracing::trace!(depth = self.stack.depth(), command = %self.command, "Exec step launched");
        Ok(())
    }

    /// Finish the current step: merge its result into the parent and make
    /// the parent current again. Fails, leaving state untouched, when no
    /// step is running.
    pub fn on_one_exec_step_end(&mut self) -> Result<(), ExecStepError> {
        let mut parent = self.stack.pop()?;
        parent.accumulate_one_step(&self.command);
        let step = mem::replace(&mut self.command, parent);
        tracing::trace!(depth = self.stack.depth(), step = %step, "Exec step ended");
        Ok(())
    }

    #[must_use]
    pub fn command(&self) -> &CommandData {
        &self.command
    }

    #[must_use]
    pub fn result(&self) -> &CommandResult {
        &self.command.result
    }

    pub fn result_mut(&mut self) -> &mut CommandResult {
        &mut self.command.result
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.depth()
    }

    #[must_use]
    pub fn account(&self) -> Option<&Account> {
        self.account.as_ref()
    }

    #[must_use]
    pub fn set_account(mut self, account: Option<Account>) -> Self {
        self.account = account;
        self
    }

    #[must_use]
    pub fn timeline_type(&self) -> TimelineType {
        self.timeline_type
    }

    #[must_use]
    pub fn set_timeline_type(mut self, timeline_type: TimelineType) -> Self {
        self.timeline_type = timeline_type;
        self
    }

    #[must_use]
    pub fn timeline_user_id(&self) -> UserId {
        self.timeline_user_id
    }

    #[must_use]
    pub fn set_timeline_user_id(mut self, user_id: UserId) -> Self {
        self.timeline_user_id = user_id;
        self
    }

    #[must_use]
    pub fn context(&self) -> &Arc<AppContext> {
        &self.context
    }

    /// Hand the top-level command back once all steps have ended.
    pub fn into_command(self) -> Result<CommandData, ExecStepError> {
        match self.stack.depth() {
            0 => Ok(self.command),
            open => Err(ExecStepError::Unfinished { open }),
        }
    }
}

impl fmt::Display for CommandExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.account {
            Some(account) => write!(f, "{}", account.account_name())?,
            None => f.write_str("no account")?,
        }
        if self.timeline_type != TimelineType::Unknown {
            write!(f, ", {}", self.timeline_type)?;
        }
        if !self.timeline_user_id.is_none() {
            write!(f, ", user:{}", self.timeline_user_id)?;
        }
        write!(f, ", {}", self.command)
    }
}
