//! Restorable copy of an unfinished message.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use warble_types::{MessageId, UserId};

/// What a front end persists across process recreation. The field names are
/// the bundle keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorSnapshot {
    pub message_text: String,
    pub in_reply_to_id: MessageId,
    #[serde(default)]
    pub recipient_id: UserId,
    #[serde(default)]
    pub account_name: String,
    #[serde(default)]
    pub show_account: bool,
}

impl EditorSnapshot {
    pub const KEY_MESSAGE_TEXT: &'static str = "message_text";
    pub const KEY_IN_REPLY_TO_ID: &'static str = "in_reply_to_id";
    pub const KEY_RECIPIENT_ID: &'static str = "recipient_id";
    pub const KEY_ACCOUNT_NAME: &'static str = "account_name";
    pub const KEY_SHOW_ACCOUNT: &'static str = "show_account";

    /// Write the snapshot into a key-value bundle.
    pub fn write_to(&self, bundle: &mut Map<String, Value>) {
        bundle.insert(
            Self::KEY_MESSAGE_TEXT.to_string(),
            Value::from(self.message_text.clone()),
        );
        bundle.insert(
            Self::KEY_IN_REPLY_TO_ID.to_string(),
            Value::from(self.in_reply_to_id.value()),
        );
        bundle.insert(
            Self::KEY_RECIPIENT_ID.to_string(),
            Value::from(self.recipient_id.value()),
        );
        bundle.insert(
            Self::KEY_ACCOUNT_NAME.to_string(),
            Value::from(self.account_name.clone()),
        );
        bundle.insert(
            Self::KEY_SHOW_ACCOUNT.to_string(),
            Value::from(self.show_account),
        );
    }

    /// Read a snapshot back. The message text and reply-to keys are
    /// required; anything else missing falls back to its default. Values of
    /// the wrong type make the whole bundle unusable.
    #[must_use]
    pub fn read_from(bundle: &Map<String, Value>) -> Option<Self> {
        let message_text = bundle.get(Self::KEY_MESSAGE_TEXT)?.as_str()?.to_string();
        let in_reply_to_id = MessageId::new(bundle.get(Self::KEY_IN_REPLY_TO_ID)?.as_i64()?);
        let recipient_id = match bundle.get(Self::KEY_RECIPIENT_ID) {
            Some(v) => UserId::new(v.as_i64()?),
            None => UserId::NONE,
        };
        let account_name = match bundle.get(Self::KEY_ACCOUNT_NAME) {
            Some(v) => v.as_str()?.to_string(),
            None => String::new(),
        };
        let show_account = match bundle.get(Self::KEY_SHOW_ACCOUNT) {
            Some(v) => v.as_bool()?,
            None => false,
        };
        Some(Self {
            message_text,
            in_reply_to_id,
            recipient_id,
            account_name,
            show_account,
        })
    }
}
