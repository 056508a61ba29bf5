//! Avatar files in the local cache directory.

use std::fmt;
use std::path::{Path, PathBuf};

use warble_types::UserId;

use crate::{Database, StorageError};

/// A user's avatar image in the cache directory. The file may not exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvatarFile {
    file_name: Option<String>,
    path: Option<PathBuf>,
}

impl AvatarFile {
    #[must_use]
    pub fn new(avatar_dir: &Path, file_name: Option<String>) -> Self {
        let file_name = file_name.filter(|name| is_plain_file_name(name));
        let path = file_name.as_ref().map(|name| avatar_dir.join(name));
        Self { file_name, path }
    }

    /// Look up the stored file name for `user_id`.
    pub fn for_user(
        db: &Database,
        avatar_dir: &Path,
        user_id: UserId,
    ) -> Result<Self, StorageError> {
        Ok(Self::new(avatar_dir, db.avatar_file_name(user_id)?))
    }

    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.as_deref().is_some_and(Path::is_file)
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl fmt::Display for AvatarFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file_name {
            Some(name) => write!(f, "AvatarFile[{name}]"),
            None => f.write_str("AvatarFile[none]"),
        }
    }
}

/// Stored names come from remote URLs; never let one escape the cache dir.
fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
}
