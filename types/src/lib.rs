//! Core domain types for Warble.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory
#![allow(clippy::missing_panics_doc)] // Panics are documented in assertions

mod account;
mod command;
mod ids;
mod origin;
mod text;
mod timeline;

pub use account::{Account, AccountName, AccountNameError, CredentialsStatus};
pub use command::{CommandData, CommandKind, CommandOutcome, CommandResult};
pub use ids::{CommandId, MessageId, OriginId, UserId};
pub use origin::{ApiRoutine, Origin, OriginKind};
pub use text::{count_chars, truncate_with_ellipsis};
pub use timeline::{TimelinePosition, TimelineType};
