use std::path::PathBuf;

use warble_context::AvatarFile;
use warble_types::{CommandData, UserId};

use crate::{AppContext, CommandDispatcher};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    #[must_use]
    pub fn from_light(light_theme: bool) -> Self {
        if light_theme { Self::Light } else { Self::Dark }
    }
}

/// What to draw for a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Avatar {
    Cached(PathBuf),
    /// Built-in placeholder for the theme.
    Default(Theme),
}

#[derive(Debug, Clone)]
pub struct AvatarDrawable {
    user_id: UserId,
    file: AvatarFile,
}

impl AvatarDrawable {
    #[must_use]
    pub fn new(user_id: UserId, file: AvatarFile) -> Self {
        Self { user_id, file }
    }

    #[must_use]
    pub fn for_user(context: &AppContext, user_id: UserId) -> Self {
        Self::new(user_id, context.avatar_file(user_id))
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn default_drawable(theme: Theme) -> Avatar {
        Avatar::Default(theme)
    }

    /// The cached image, or the placeholder plus a background download
    /// request. A miss asks again on every call until the file appears.
    pub fn drawable(&self, theme: Theme, dispatcher: &dyn CommandDispatcher) -> Avatar {
        if self.file.exists()
            && let Some(path) = self.file.path()
        {
            return Avatar::Cached(path.to_path_buf());
        }
        tracing::debug!(user = %self.user_id, file = %self.file, "Avatar not cached");
        dispatcher.send_foreground_command(CommandData::fetch_avatar(self.user_id));
        Self::default_drawable(theme)
    }
}
