//! Hand-off of commands to the command-processing layer, and the channel
//! that layer reports completions on.

use tokio::sync::mpsc;
use warble_types::{CommandData, CommandOutcome};

/// Fire-and-forget command submission. Implementations must not block.
pub trait CommandDispatcher: Send + Sync {
    fn send_foreground_command(&self, command: CommandData);
}

pub type OutcomeSender = mpsc::UnboundedSender<CommandOutcome>;
pub type OutcomeReceiver = mpsc::UnboundedReceiver<CommandOutcome>;

/// Channel for reporting how dispatched commands actually ended.
#[must_use]
pub fn outcome_channel() -> (OutcomeSender, OutcomeReceiver) {
    mpsc::unbounded_channel()
}

/// In-process [`CommandDispatcher`] backed by an unbounded channel.
#[derive(Debug, Clone)]
pub struct CommandQueue {
    sender: mpsc::UnboundedSender<CommandData>,
}

impl CommandQueue {
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<CommandData>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl CommandDispatcher for CommandQueue {
    fn send_foreground_command(&self, mut command: CommandData) {
        command.in_foreground = true;
        tracing::debug!(%command, "Queueing foreground command");
        if let Err(err) = self.sender.send(command) {
            tracing::warn!(command = %err.0, "Command queue closed; command dropped");
        }
    }
}
