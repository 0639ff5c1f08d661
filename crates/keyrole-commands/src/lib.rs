//! # keyrole commands
//!
//! Slash commands for configuring the keyword role bot, the audit log
//! notifier, and the [`GuildGateway`] seam the handlers talk to Discord
//! through.
//!
//! Command handlers defer before any storage I/O and keep their decisions
//! in [`ConfigService`], which can be driven without a Discord connection.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod framework;
pub mod gateway;
pub mod notifier;
pub mod ping;
pub mod reply;
pub mod service;
pub mod set_channel;
pub mod set_config;
pub mod set_log_channel;
pub mod show_config;

#[cfg(any(test, feature = "testing"))]
pub mod test_utils;

pub use framework::*;
pub use gateway::{classify, ChannelInfo, GuildGateway, RoleInfo, SerenityGateway};
pub use notifier::{AuditEntry, LogNotifier, NotifyOutcome, Severity};
pub use service::*;
