//! Warble CLI - binary entry point.
//!
//! # Architecture
//!
//! ```text
//! main() -> load config -> ContextHolder::initialize() -> subcommand
//!                                   |                          |
//!                                   v                          v
//!                       upgrade schema if needed     CommandQueue -> outbox writer
//! ```
//!
//! There is no network layer here: commands produced by the editor are
//! persisted to the outbox for a command service to pick up.

mod commands;

use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, filter::filter_fn, fmt, prelude::*};

use warble_config::{Preferences, WarbleConfig};
use warble_engine::{ContextHolder, ContextState, LogSwitch};

#[derive(Parser, Debug)]
#[command(name = "warble")]
#[command(about = "Microblogging client core")]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to ~/.warble/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the application context and storage state
    Status,
    /// List accounts, or change them
    Accounts {
        #[command(subcommand)]
        action: Option<AccountAction>,
    },
    /// Compose and send a message through the editor
    Post {
        text: String,
        /// Account to send as (defaults to the current account)
        #[arg(long)]
        account: Option<String>,
        /// Message id this is a reply to
        #[arg(long, default_value_t = 0)]
        reply_to: i64,
        /// User id of the direct-message recipient
        #[arg(long, default_value_t = 0)]
        to: i64,
    },
    /// Show commands waiting in the outbox
    Outbox,
    /// Show "last seen" bookkeeping of a timeline
    Timeline {
        /// Timeline type, e.g. home, mentions, public
        timeline: String,
        #[arg(long, default_value_t = 0)]
        user: i64,
    },
}

#[derive(Subcommand, Debug)]
pub enum AccountAction {
    /// Add (or update) an account, e.g. `alice@twitter`
    Add {
        name: String,
        /// Mark the account's credentials as verified
        #[arg(long)]
        verified: bool,
    },
    /// Make an account current and remember it in the config file
    Use { name: String },
}

fn init_tracing(prefs: &Preferences, log_switch: &LogSwitch) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (log_file, init_warnings) = open_log_file(&log_file_candidates(prefs, "warble.log"));

    let Some((log_path, file)) = log_file else {
        // Stdout is for command output; no log file means no logs.
        tracing_subscriber::registry().with(env_filter).init();
        return;
    };

    let sending_layer = log_path
        .parent()
        .map(|dir| dir.join("sending.log"))
        .and_then(|path| OpenOptions::new().create(true).append(true).open(path).ok())
        .map(|file| {
            let switch = log_switch.clone();
            fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .with_filter(filter_fn(move |_| switch.is_enabled()))
        });

    tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .with(sending_layer)
        .with(env_filter)
        .init();

    tracing::info!(path = %log_path.display(), "Logging initialized");
    for warning in init_warnings {
        tracing::warn!("{warning}");
    }
}

fn open_log_file(candidates: &[PathBuf]) -> (Option<(PathBuf, fs::File)>, Vec<String>) {
    let mut warnings = Vec::new();

    for candidate in candidates {
        if let Some(parent) = candidate.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warnings.push(format!(
                "Failed to create log dir {}: {e}",
                parent.display()
            ));
            continue;
        }

        match OpenOptions::new().create(true).append(true).open(candidate) {
            Ok(file) => return (Some((candidate.clone(), file)), warnings),
            Err(e) => {
                warnings.push(format!(
                    "Failed to open log file {}: {e}",
                    candidate.display()
                ));
            }
        }
    }

    (None, warnings)
}

fn log_file_candidates(prefs: &Preferences, file_name: &str) -> Vec<PathBuf> {
    vec![
        // Primary: <data dir>/logs, i.e. ~/.warble/logs by default
        prefs.log_dir().join(file_name),
        // Fallback: ./.warble/logs (useful in constrained environments)
        PathBuf::from(".warble").join("logs").join(file_name),
    ]
}

/// Read preferences from `path`. A missing file means defaults; a broken one
/// is reported and also falls back to defaults.
pub(crate) fn load_preferences(path: Option<&Path>) -> (Preferences, Option<String>) {
    let Some(path) = path else {
        return (Preferences::default(), None);
    };
    match WarbleConfig::load_from(path) {
        Ok(Some(config)) => (config.resolve(Some(path)), None),
        Ok(None) => (Preferences::default(), None),
        Err(e) => (
            Preferences::default(),
            Some(format!("Ignoring config {}: {e}", e.path().display())),
        ),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.clone().or_else(WarbleConfig::path);

    let (prefs, config_warning) = load_preferences(config_path.as_deref());
    let holder = Arc::new(ContextHolder::new(prefs));
    init_tracing(&holder.preferences(), holder.log_switch());
    if let Some(warning) = config_warning {
        tracing::warn!("{warning}");
        eprintln!("{warning}");
    }

    let mut ctx = holder.initialize("cli");
    if ctx.state() == ContextState::Upgrading {
        println!("Upgrading database...");
        ctx.upgrade_database().context("database upgrade failed")?;
        ctx.set_expired();
        ctx = holder.initialize("cli after upgrade");
    }
    if !ctx.is_ready() {
        anyhow::bail!("storage is not usable: {ctx}");
    }

    commands::run(cli.command, &holder, config_path.as_deref()).await
}
