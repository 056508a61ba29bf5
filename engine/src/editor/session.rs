use warble_types::{Account, MessageId, UserId};

use crate::UserDirectory;

/// The message being composed and who it is addressed to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(super) struct CompositionSession {
    pub(super) reply_to_id: MessageId,
    pub(super) recipient_id: UserId,
    pub(super) account: Option<Account>,
    pub(super) show_account_label: bool,
    pub(super) body_text: String,
    pub(super) detail_label: String,
}

impl CompositionSession {
    /// Whether editing this target means continuing the current draft.
    pub(super) fn targets(
        &self,
        reply_to_id: MessageId,
        recipient_id: UserId,
        account: &Account,
        show_account_label: bool,
    ) -> bool {
        self.reply_to_id == reply_to_id
            && self.recipient_id == recipient_id
            && self
                .account
                .as_ref()
                .is_some_and(|a| a.account_name() == account.account_name())
            && self.show_account_label == show_account_label
    }

    /// A new draft for the given target. Replies get the author mention
    /// prefilled unless `text` already starts with it;
    /// the label names the account (when shown) and the reply or direct
    /// recipient.
    pub(super) fn start(
        directory: &dyn UserDirectory,
        text: &str,
        reply_to_id: MessageId,
        recipient_id: UserId,
        account: Account,
        show_account_label: bool,
    ) -> Self {
        let mut body_text = text.to_string();
        let mut label = Vec::new();
        if show_account_label {
            label.push(account.account_name().to_string());
        }
        if recipient_id.is_none() {
            if !reply_to_id.is_none()
                && let Some(author) = directory.message_author_name(reply_to_id)
            {
                let mention = format!("@{author}");
                if !text.starts_with(&mention) {
                    body_text = format!("{mention} {text}");
                }
                label.push(format!("in reply to {author}"));
            }
        } else if let Some(recipient) = directory.user_name(recipient_id)
            && !recipient.is_empty()
        {
            label.push(format!("to {recipient}"));
        }

        Self {
            reply_to_id,
            recipient_id,
            account: Some(account),
            show_account_label,
            body_text,
            detail_label: label.join(" "),
        }
    }
}
