//! Accounts: a user identity on one origin.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::UserId;
use crate::origin::{ApiRoutine, Origin};
use crate::text::count_chars;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountNameError {
    #[error("account name must look like user@origin, got {0:?}")]
    Malformed(String),
}

/// Globally unique account name of the form `username@origin`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountName(String);

impl AccountName {
    pub fn new(username: &str, origin_name: &str) -> Result<Self, AccountNameError> {
        Self::parse(&format!("{}@{}", username.trim(), origin_name.trim()))
    }

    /// Parse a stored account name. The username part may itself contain `@`
    /// (pump.io webfinger ids), so the origin is everything after the last one.
    pub fn parse(raw: &str) -> Result<Self, AccountNameError> {
        let raw = raw.trim();
        match raw.rsplit_once('@') {
            Some((user, origin)) if !user.is_empty() && !origin.is_empty() => {
                Ok(Self(raw.to_string()))
            }
            _ => Err(AccountNameError::Malformed(raw.to_string())),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn username(&self) -> &str {
        self.0.rsplit_once('@').map_or("", |(user, _)| user)
    }

    #[must_use]
    pub fn origin_name(&self) -> &str {
        self.0.rsplit_once('@').map_or("", |(_, origin)| origin)
    }
}

impl TryFrom<String> for AccountName {
    type Error = AccountNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AccountName> for String {
    fn from(value: AccountName) -> Self {
        value.0
    }
}

impl fmt::Display for AccountName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of the last credentials check against the origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialsStatus {
    #[default]
    Never,
    Failed,
    Succeeded,
}

impl CredentialsStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Never => "never",
            Self::Failed => "failed",
            Self::Succeeded => "succeeded",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "succeeded" => Self::Succeeded,
            "failed" => Self::Failed,
            _ => Self::Never,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    name: AccountName,
    user_id: UserId,
    origin: Origin,
    credentials: CredentialsStatus,
}

impl Account {
    #[must_use]
    pub fn new(
        name: AccountName,
        user_id: UserId,
        origin: Origin,
        credentials: CredentialsStatus,
    ) -> Self {
        Self {
            name,
            user_id,
            origin,
            credentials,
        }
    }

    #[must_use]
    pub fn account_name(&self) -> &AccountName {
        &self.name
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    #[must_use]
    pub fn credentials_verified(&self) -> CredentialsStatus {
        self.credentials
    }

    #[must_use]
    pub fn is_api_supported(&self, routine: ApiRoutine) -> bool {
        self.origin.is_api_supported(routine)
    }

    /// How many characters may still be added to `text` before it exceeds the
    /// origin's limit. Negative when the text is already too long.
    #[must_use]
    pub fn characters_left_for_message(&self, text: &str) -> i64 {
        if self.origin.text_limit == 0 {
            return i64::from(u32::MAX);
        }
        i64::from(self.origin.text_limit) - count_chars(text) as i64
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.credentials.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::OriginId;
    use crate::origin::OriginKind;

    fn twitter_account() -> Account {
        Account::new(
            AccountName::new("alice", "twitter").unwrap(),
            UserId::new(7),
            Origin::new(OriginId::new(1), "twitter", OriginKind::Twitter),
            CredentialsStatus::Succeeded,
        )
    }

    #[test]
    fn account_name_parts() {
        let name = AccountName::parse("acct:bob@example.org@pumpio").unwrap();
        assert_eq!(name.username(), "acct:bob@example.org");
        assert_eq!(name.origin_name(), "pumpio");
    }

    #[test]
    fn account_name_rejects_malformed() {
        assert!(AccountName::parse("alice").is_err());
        assert!(AccountName::parse("@twitter").is_err());
        assert!(AccountName::parse("alice@").is_err());
    }

    #[test]
    fn characters_left_counts_down_from_limit() {
        let account = twitter_account();
        assert_eq!(account.characters_left_for_message(""), 140);
        assert_eq!(account.characters_left_for_message("hello"), 135);
        assert_eq!(account.characters_left_for_message(&"x".repeat(141)), -1);
    }

    #[test]
    fn unlimited_origin_never_runs_out() {
        let account = Account::new(
            AccountName::new("carol", "pumpio").unwrap(),
            UserId::new(9),
            Origin::new(OriginId::new(2), "pumpio", OriginKind::PumpIo),
            CredentialsStatus::Succeeded,
        );
        assert!(account.characters_left_for_message(&"x".repeat(10_000)) > 0);
    }
}
