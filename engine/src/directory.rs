use warble_types::{Account, MessageId, UserId};

/// Name and account lookups the editor needs while composing.
pub trait UserDirectory: Send + Sync {
    /// Username of the author of message `msg_id`.
    fn message_author_name(&self, msg_id: MessageId) -> Option<String>;

    fn user_name(&self, user_id: UserId) -> Option<String>;

    fn account_by_name(&self, name: &str) -> Option<Account>;

    /// The account new messages are composed as by default.
    fn current_account(&self) -> Option<Account>;
}
