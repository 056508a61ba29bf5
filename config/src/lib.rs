//! Configuration loading, parsing, and persistence for Warble.
//!
//! The raw TOML structs keep `Option` fields so an absent section is
//! distinguishable from an explicit value. [`Preferences`] is the resolved
//! view the rest of the application reads.

use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde::Deserialize;
use tempfile::NamedTempFile;
use thiserror::Error;
use toml::de;
use toml_edit::{DocumentMut, Item, Table};

// Default value function for serde (bool::default() is false, so only true needs a fn)
pub(crate) const fn default_true() -> bool {
    true
}

/// Seconds the app is still considered in foreground after going to background.
pub const DEFAULT_BACKGROUND_GRACE_SECONDS: u64 = 20;

#[derive(Debug, Default, Deserialize)]
pub struct WarbleConfig {
    pub app: Option<AppConfig>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: de::Error,
    },
}

impl ConfigError {
    pub fn path(&self) -> &PathBuf {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    /// Directory holding the database, avatars and logs. `${VAR}` is expanded.
    pub data_dir: Option<String>,
    /// Enter sends the message; Alt+Enter inserts a newline. Default: true.
    #[serde(default = "default_true")]
    pub enter_sends_message: bool,
    /// Turn on file logging when a message is sent.
    #[serde(default)]
    pub sending_messages_log_enabled: bool,
    #[serde(default)]
    pub light_theme: bool,
    pub background_grace_seconds: Option<u64>,
    /// Account used by the "create message" button.
    pub current_account: Option<String>,
}

/// Fully resolved preferences; every field has a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preferences {
    pub data_dir: PathBuf,
    pub enter_sends_message: bool,
    pub sending_messages_log_enabled: bool,
    pub light_theme: bool,
    pub background_grace: Duration,
    pub current_account: Option<String>,
    /// When the preferences file last changed (`UNIX_EPOCH` if there is none).
    pub change_time: SystemTime,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            enter_sends_message: true,
            sending_messages_log_enabled: false,
            light_theme: false,
            background_grace: Duration::from_secs(DEFAULT_BACKGROUND_GRACE_SECONDS),
            current_account: None,
            change_time: SystemTime::UNIX_EPOCH,
        }
    }
}

impl Preferences {
    /// Preferences rooted at `data_dir`, otherwise default.
    #[must_use]
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("warble.sqlite")
    }

    #[must_use]
    pub fn avatar_dir(&self) -> PathBuf {
        self.data_dir.join("avatars")
    }

    #[must_use]
    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}

pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let var = &after[..end];
                if var.is_empty() {
                    out.push_str("${}");
                } else {
                    out.push_str(&env::var(var).unwrap_or_default());
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);

    out
}

fn expand_home(value: &str) -> PathBuf {
    match value.strip_prefix("~/") {
        Some(rest) => dirs::home_dir().map_or_else(|| PathBuf::from(value), |home| home.join(rest)),
        None => PathBuf::from(value),
    }
}

impl WarbleConfig {
    pub fn load() -> Result<Option<Self>, ConfigError> {
        let path = match config_path() {
            Some(path) => path,
            None => return Ok(None),
        };
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        match toml::from_str(&content) {
            Ok(config) => Ok(Some(config)),
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        }
    }

    #[must_use]
    pub fn path() -> Option<PathBuf> {
        config_path()
    }

    /// Resolve into [`Preferences`], filling defaults for absent values.
    ///
    /// `change_time` is taken from the file at `source` when given.
    #[must_use]
    pub fn resolve(&self, source: Option<&Path>) -> Preferences {
        let mut prefs = Preferences::default();
        if let Some(app) = &self.app {
            if let Some(dir) = app.data_dir.as_deref() {
                prefs.data_dir = expand_home(&expand_env_vars(dir));
            }
            prefs.enter_sends_message = app.enter_sends_message;
            prefs.sending_messages_log_enabled = app.sending_messages_log_enabled;
            prefs.light_theme = app.light_theme;
            if let Some(secs) = app.background_grace_seconds {
                prefs.background_grace = Duration::from_secs(secs);
            }
            prefs.current_account = app
                .current_account
                .as_ref()
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty());
        }
        if let Some(path) = source {
            prefs.change_time = fs::metadata(path)
                .and_then(|meta| meta.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
        }
        prefs
    }

    /// Persist the current account to the config file at `path`.
    ///
    /// Uses `toml_edit` to preserve comments and formatting, and writes
    /// through a temp file + rename so a crash never leaves a torn file.
    pub fn persist_current_account(path: &Path, account_name: &str) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::{MetadataExt, PermissionsExt};
                let metadata = fs::metadata(parent)?;
                // Only modify permissions if we own the directory
                let our_uid = unsafe { libc::getuid() };
                if metadata.uid() == our_uid {
                    let mode = metadata.permissions().mode() & 0o777;
                    if mode & 0o077 != 0 {
                        fs::set_permissions(parent, fs::Permissions::from_mode(0o700))?;
                    }
                }
            }
        }

        let content = if path.exists() {
            fs::read_to_string(path)?
        } else {
            String::new()
        };

        let mut doc = content
            .parse::<DocumentMut>()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        if !doc.contains_key("app") {
            doc["app"] = Item::Table(Table::new());
        }
        doc["app"]["current_account"] = toml_edit::value(account_name);

        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut tmp = NamedTempFile::new_in(parent)?;
        tmp.write_all(doc.to_string().as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;

        tracing::debug!(path = %path.display(), account = account_name, "Persisted current account");
        Ok(())
    }
}

#[must_use]
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".warble").join("config.toml"))
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir().map_or_else(|| PathBuf::from(".warble"), |home| home.join(".warble"))
}
