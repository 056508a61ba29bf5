use std::fmt;

use serde::{Deserialize, Serialize};

/// Which timeline a view or command is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineType {
    #[default]
    Unknown,
    Home,
    Mentions,
    Direct,
    Favorites,
    User,
    Public,
    Followers,
    /// Mentions and direct messages combined: things the user should act upon.
    MessagesToAct,
}

impl TimelineType {
    pub const ALL: &[Self] = &[
        Self::Unknown,
        Self::Home,
        Self::Mentions,
        Self::Direct,
        Self::Favorites,
        Self::User,
        Self::Public,
        Self::Followers,
        Self::MessagesToAct,
    ];

    /// Stable code used in storage.
    #[must_use]
    pub const fn save(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Home => "home",
            Self::Mentions => "mentions",
            Self::Direct => "direct",
            Self::Favorites => "favorites",
            Self::User => "user",
            Self::Public => "public",
            Self::Followers => "followers",
            Self::MessagesToAct => "messages_to_act",
        }
    }

    #[must_use]
    pub fn load(code: &str) -> Self {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.save() == code)
            .unwrap_or_default()
    }

    /// Whether "last seen" dates are worth remembering for this timeline.
    ///
    /// The public timeline is a firehose; its positions go stale immediately.
    #[must_use]
    pub const fn remembers_dates(self) -> bool {
        !matches!(self, Self::Public | Self::Unknown)
    }
}

impl fmt::Display for TimelineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.save())
    }
}

/// Opaque position of an item within a remote timeline (usually the remote message id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimelinePosition(String);

impl TimelinePosition {
    #[must_use]
    pub fn new(position: impl Into<String>) -> Self {
        Self(position.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}
