//! Origins: the social-network services an account lives on.

use serde::{Deserialize, Serialize};

use crate::ids::OriginId;

/// API calls whose availability differs between origin kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApiRoutine {
    AccountRateLimitStatus,
    AccountVerifyCredentials,
    StatusesUpdate,
    PostDirectMessage,
    DirectMessages,
    SearchMessages,
}

/// The protocol family of an origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OriginKind {
    #[default]
    Twitter,
    StatusNet,
    PumpIo,
}

impl OriginKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Twitter => "twitter",
            Self::StatusNet => "statusnet",
            Self::PumpIo => "pumpio",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "twitter" => Some(Self::Twitter),
            "statusnet" | "gnusocial" => Some(Self::StatusNet),
            "pumpio" | "pump.io" => Some(Self::PumpIo),
            _ => None,
        }
    }

    /// Default message length limit; `0` means the origin imposes none.
    #[must_use]
    pub const fn default_text_limit(self) -> u32 {
        match self {
            Self::Twitter | Self::StatusNet => 140,
            Self::PumpIo => 0,
        }
    }

    #[must_use]
    pub const fn is_api_supported(self, routine: ApiRoutine) -> bool {
        match self {
            Self::Twitter | Self::StatusNet => true,
            Self::PumpIo => !matches!(
                routine,
                ApiRoutine::AccountRateLimitStatus | ApiRoutine::SearchMessages
            ),
        }
    }
}

/// A configured origin (e.g. "twitter", or a particular StatusNet site).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Origin {
    pub id: OriginId,
    pub name: String,
    pub kind: OriginKind,
    /// Maximum message length in characters, `0` for unlimited.
    pub text_limit: u32,
}

impl Origin {
    #[must_use]
    pub fn new(id: OriginId, name: impl Into<String>, kind: OriginKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            text_limit: kind.default_text_limit(),
        }
    }

    #[must_use]
    pub fn with_text_limit(mut self, text_limit: u32) -> Self {
        self.text_limit = text_limit;
        self
    }

    #[must_use]
    pub fn is_api_supported(&self, routine: ApiRoutine) -> bool {
        self.kind.is_api_supported(routine)
    }
}
