//! Message composition editor.
//!
//! # State machine
//!
//! ```text
//!            toggle / start_editing_message / create button
//!   Hidden ─────────────────────────────────────────────────▶ Visible
//!     ▲                                                          │
//!     └───────── hide / toggle / successful send ───────────────┘
//! ```
//!
//! A visible editor always has an account. Sending is two-phase: the editor
//! clears its draft as soon as the command is dispatched, and keeps a copy
//! until the command layer reports the outcome. Each failed send is queued
//! as loaded state, so [`MessageEditor::continue_editing_loaded_state`]
//! reopens it.

mod session;
mod snapshot;

use std::collections::VecDeque;
use std::fmt;
use std::mem;
use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::mpsc::error::TryRecvError;
use warble_config::Preferences;
use warble_types::{
    Account, ApiRoutine, CommandData, CommandId, CommandOutcome, CredentialsStatus, MessageId,
    TimelineType, UserId,
};

use session::CompositionSession;
pub use snapshot::EditorSnapshot;

use crate::{CommandDispatcher, LogSwitch, OutcomeReceiver, UserDirectory};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditorVisibility {
    #[default]
    Hidden,
    Visible,
}

/// What the front end should do with the on-screen keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputSurface {
    Shown,
    #[default]
    Dismissed,
}

/// Transient, dismissible messages for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorNotice {
    EmptyMessage,
    MessageTooLong { characters_left: i64 },
    NoAccount,
    SendFailed { command_id: CommandId, reason: String },
}

impl fmt::Display for EditorNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyMessage => f.write_str("Cannot send an empty message"),
            Self::MessageTooLong { characters_left } => {
                write!(f, "Message is too long ({characters_left})")
            }
            Self::NoAccount => f.write_str("No account to send the message from"),
            Self::SendFailed { reason, .. } => write!(f, "Sending failed: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendAttempt {
    /// Dispatched; the outcome arrives later via [`MessageEditor::on_command_outcome`].
    Sent(CommandId),
    Rejected(EditorNotice),
}

/// Presentation of the "create message" button next to the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateMessageButton {
    Hidden,
    Create,
    Hide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorSettings {
    pub enter_sends_message: bool,
    pub sending_messages_log_enabled: bool,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            enter_sends_message: true,
            sending_messages_log_enabled: false,
        }
    }
}

impl From<&Preferences> for EditorSettings {
    fn from(prefs: &Preferences) -> Self {
        Self {
            enter_sends_message: prefs.enter_sends_message,
            sending_messages_log_enabled: prefs.sending_messages_log_enabled,
        }
    }
}

#[derive(Debug)]
struct PendingSend {
    command_id: CommandId,
    draft: EditorSnapshot,
}

pub struct MessageEditor {
    directory: Arc<dyn UserDirectory>,
    dispatcher: Arc<dyn CommandDispatcher>,
    settings: EditorSettings,
    log_switch: LogSwitch,
    session: CompositionSession,
    visibility: EditorVisibility,
    input_surface: InputSurface,
    /// Drafts waiting to be reopened, oldest first.
    loaded: VecDeque<EditorSnapshot>,
    pending: Vec<PendingSend>,
    notices: Vec<EditorNotice>,
    timeline_type: TimelineType,
    timeline_combined: bool,
}

impl fmt::Debug for MessageEditor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageEditor")
            .field("session", &self.session)
            .field("visibility", &self.visibility)
            .field("loaded", &self.loaded)
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

impl MessageEditor {
    /// A hidden editor with an empty draft.
    #[must_use]
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        dispatcher: Arc<dyn CommandDispatcher>,
        settings: EditorSettings,
        log_switch: LogSwitch,
    ) -> Self {
        Self {
            directory,
            dispatcher,
            settings,
            log_switch,
            session: CompositionSession::default(),
            visibility: EditorVisibility::Hidden,
            input_surface: InputSurface::Dismissed,
            loaded: VecDeque::new(),
            pending: Vec::new(),
            notices: Vec::new(),
            timeline_type: TimelineType::Unknown,
            timeline_combined: false,
        }
    }

    #[must_use]
    pub fn visibility(&self) -> EditorVisibility {
        self.visibility
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visibility == EditorVisibility::Visible
    }

    #[must_use]
    pub fn input_surface(&self) -> InputSurface {
        self.input_surface
    }

    #[must_use]
    pub fn body_text(&self) -> &str {
        &self.session.body_text
    }

    /// `None` when there is nothing to show.
    #[must_use]
    pub fn detail_label(&self) -> Option<&str> {
        Some(self.session.detail_label.as_str()).filter(|label| !label.is_empty())
    }

    #[must_use]
    pub fn reply_to_id(&self) -> MessageId {
        self.session.reply_to_id
    }

    #[must_use]
    pub fn recipient_id(&self) -> UserId {
        self.session.recipient_id
    }

    #[must_use]
    pub fn account(&self) -> Option<&Account> {
        self.session.account.as_ref()
    }

    #[must_use]
    pub fn show_account_label(&self) -> bool {
        self.session.show_account_label
    }

    /// Characters the draft may still grow by; `None` without an account.
    #[must_use]
    pub fn characters_left(&self) -> Option<i64> {
        self.session
            .account
            .as_ref()
            .map(|account| account.characters_left_for_message(&self.session.body_text))
    }

    pub fn set_body_text(&mut self, text: impl Into<String>) {
        self.session.body_text = text.into();
    }

    /// Flip visibility and return the new state.
    ///
    /// Showing needs an account: without one in the draft the current
    /// account is used, and with no account at all the editor stays hidden.
    pub fn toggle_visibility(&mut self) -> bool {
        if self.is_visible() {
            self.hide();
        } else {
            self.show();
        }
        self.is_visible()
    }

    /// Show the editor as it is. Returns `false` when there is no account
    /// to compose as.
    pub fn show(&mut self) -> bool {
        if self.session.account.is_none() {
            let Some(account) = self.directory.current_account() else {
                tracing::debug!("No account to show the editor for");
                return false;
            };
            self.session = CompositionSession::start(
                self.directory.as_ref(),
                &self.session.body_text,
                MessageId::NONE,
                UserId::NONE,
                account,
                false,
            );
        }
        self.visibility = EditorVisibility::Visible;
        self.input_surface = InputSurface::Shown;
        true
    }

    pub fn hide(&mut self) {
        self.visibility = EditorVisibility::Hidden;
        self.input_surface = InputSurface::Dismissed;
    }

    /// Start (or continue) composing a public message, reply or direct
    /// message as `account`.
    ///
    /// When the target (reply, recipient, account, label flag) matches the
    /// current draft its text is kept; otherwise the draft restarts from
    /// `text`. Does nothing without an account.
    pub fn start_editing_message(
        &mut self,
        text: &str,
        reply_to_id: MessageId,
        recipient_id: UserId,
        account: Option<Account>,
        show_account_label: bool,
    ) {
        let Some(account) = account else {
            tracing::debug!("start_editing_message without an account ignored");
            return;
        };
        if !self
            .session
            .targets(reply_to_id, recipient_id, &account, show_account_label)
        {
            self.session = CompositionSession::start(
                self.directory.as_ref(),
                text,
                reply_to_id,
                recipient_id,
                account.clone(),
                show_account_label,
            );
        }
        self.open_for(&account);
    }

    fn open_for(&mut self, account: &Account) {
        if account.is_api_supported(ApiRoutine::AccountRateLimitStatus) {
            self.dispatcher
                .send_foreground_command(CommandData::rate_limit_status(
                    account.account_name().clone(),
                ));
        }
        self.show();
    }

    /// Validate the draft and hand it to the command layer.
    ///
    /// On rejection the editor stays as it is and the notice is both
    /// returned and queued for [`Self::take_notices`].
    pub fn send_message_and_close_editor(&mut self) -> SendAttempt {
        let Some(account) = self.session.account.clone() else {
            return self.reject(EditorNotice::NoAccount);
        };
        let text = self.session.body_text.clone();
        if text.trim().is_empty() {
            return self.reject(EditorNotice::EmptyMessage);
        }
        let characters_left = account.characters_left_for_message(&text);
        if characters_left < 0 {
            return self.reject(EditorNotice::MessageTooLong { characters_left });
        }

        if self.settings.sending_messages_log_enabled {
            self.log_switch.enable();
        }
        let draft = self.draft_snapshot(&account);
        let command = CommandData::update_status(
            account.account_name().clone(),
            text,
            self.session.reply_to_id,
            self.session.recipient_id,
        );
        let command_id = command.id();
        tracing::info!(command = %command, "Sending message");
        self.pending.push(PendingSend { command_id, draft });
        self.dispatcher.send_foreground_command(command);

        self.session = CompositionSession::default();
        self.hide();
        SendAttempt::Sent(command_id)
    }

    fn reject(&mut self, notice: EditorNotice) -> SendAttempt {
        tracing::debug!(%notice, "Message not sent");
        self.notices.push(notice.clone());
        SendAttempt::Rejected(notice)
    }

    fn draft_snapshot(&self, account: &Account) -> EditorSnapshot {
        EditorSnapshot {
            message_text: self.session.body_text.clone(),
            in_reply_to_id: self.session.reply_to_id,
            recipient_id: self.session.recipient_id,
            account_name: account.account_name().to_string(),
            show_account: self.session.show_account_label,
        }
    }

    /// Enter either sends or inserts a newline. Returns `None` when a
    /// newline was inserted.
    pub fn on_enter_key(&mut self, alt_pressed: bool) -> Option<SendAttempt> {
        if alt_pressed || !self.settings.enter_sends_message {
            self.session.body_text.push('\n');
            return None;
        }
        Some(self.send_message_and_close_editor())
    }

    pub fn on_center_key(&mut self) -> SendAttempt {
        self.send_message_and_close_editor()
    }

    /// Reconcile a dispatched send with how it actually ended. Returns
    /// `false` for outcomes of commands this editor did not send.
    pub fn on_command_outcome(&mut self, outcome: &CommandOutcome) -> bool {
        let Some(index) = self
            .pending
            .iter()
            .position(|p| p.command_id == outcome.command_id)
        else {
            return false;
        };
        let pending = self.pending.remove(index);
        if outcome.succeeded() {
            tracing::debug!(command_id = %pending.command_id, "Message sent");
            return true;
        }

        tracing::warn!(command_id = %pending.command_id, result = %outcome.result, "Sending failed");
        self.notices.push(EditorNotice::SendFailed {
            command_id: pending.command_id,
            reason: outcome.result.to_string(),
        });
        self.loaded.push_back(pending.draft);
        true
    }

    /// Apply every outcome already waiting on `outcomes` without blocking.
    pub fn drain_outcomes(&mut self, outcomes: &mut OutcomeReceiver) -> usize {
        let mut handled = 0;
        loop {
            match outcomes.try_recv() {
                Ok(outcome) => {
                    if self.on_command_outcome(&outcome) {
                        handled += 1;
                    }
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        handled
    }

    /// Sends still waiting for an outcome.
    #[must_use]
    pub fn pending_sends(&self) -> usize {
        self.pending.len()
    }

    pub fn take_notices(&mut self) -> Vec<EditorNotice> {
        mem::take(&mut self.notices)
    }

    /// Snapshot the draft for later restoration. Only a non-blank draft with
    /// an account is worth saving. Loaded but unconsumed drafts are
    /// dropped.
    pub fn save_state(&mut self) -> Option<EditorSnapshot> {
        self.loaded.clear();
        let account = self.session.account.as_ref()?;
        if self.session.body_text.trim().is_empty() {
            return None;
        }
        Some(self.draft_snapshot(account))
    }

    pub fn save_state_to(&mut self, bundle: &mut Map<String, Value>) -> bool {
        match self.save_state() {
            Some(snapshot) => {
                snapshot.write_to(bundle);
                true
            }
            None => false,
        }
    }

    /// Queue `snapshot` for [`Self::continue_editing_loaded_state`]. An
    /// empty message is ignored.
    pub fn load_state(&mut self, snapshot: &EditorSnapshot) -> bool {
        if snapshot.message_text.is_empty() {
            return false;
        }
        self.loaded.push_back(snapshot.clone());
        true
    }

    /// Like [`Self::load_state`], from a key-value bundle. Missing required
    /// keys leave nothing loaded.
    pub fn load_state_from(&mut self, bundle: &Map<String, Value>) -> bool {
        EditorSnapshot::read_from(bundle).is_some_and(|snapshot| self.load_state(&snapshot))
    }

    #[must_use]
    pub fn is_state_loaded(&self) -> bool {
        !self.loaded.is_empty()
    }

    /// Drafts still waiting to be reopened.
    #[must_use]
    pub fn loaded_drafts(&self) -> usize {
        self.loaded.len()
    }

    /// Reopen the oldest loaded draft, replacing whatever is being composed.
    /// Each draft is consumed, so once the queue is empty this does nothing.
    pub fn continue_editing_loaded_state(&mut self) {
        let Some(loaded) = self.loaded.pop_front() else {
            return;
        };
        let Some(account) = self.directory.account_by_name(&loaded.account_name) else {
            tracing::warn!(account = %loaded.account_name, "Loaded draft's account is gone");
            return;
        };
        self.session = CompositionSession::start(
            self.directory.as_ref(),
            &loaded.message_text,
            loaded.in_reply_to_id,
            loaded.recipient_id,
            account.clone(),
            loaded.show_account,
        );
        self.open_for(&account);
    }

    /// The timeline shown next to the editor; drives the create button.
    pub fn set_timeline(&mut self, timeline_type: TimelineType, combined: bool) {
        self.timeline_type = timeline_type;
        self.timeline_combined = combined;
    }

    fn account_for_create_button(&self) -> Option<Account> {
        if self.is_visible() {
            return self.session.account.clone();
        }
        self.directory
            .current_account()
            .filter(|a| a.credentials_verified() == CredentialsStatus::Succeeded)
    }

    #[must_use]
    pub fn create_message_button(&self) -> CreateMessageButton {
        if self.is_visible() {
            return CreateMessageButton::Hide;
        }
        let creatable = !matches!(
            self.timeline_type,
            TimelineType::Direct | TimelineType::MessagesToAct
        );
        if creatable && self.account_for_create_button().is_some() {
            CreateMessageButton::Create
        } else {
            CreateMessageButton::Hidden
        }
    }

    pub fn on_create_message_button(&mut self) {
        match self.account_for_create_button() {
            Some(account) if !self.is_visible() => {
                let combined = self.timeline_combined;
                self.start_editing_message(
                    "",
                    MessageId::NONE,
                    UserId::NONE,
                    Some(account),
                    combined,
                );
            }
            _ => self.hide(),
        }
    }
}
