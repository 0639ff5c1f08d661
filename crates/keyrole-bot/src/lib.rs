//! # keyrole bot
//!
//! Discord bot that grants a role when a configured keyword is posted in a
//! watched channel.
//!
//! This is the binary crate that wires the store, the slash commands and
//! the message watcher together, and serves the keep-alive endpoints.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod bot;
pub mod error;
pub mod keep_alive;
pub mod watcher;

pub use bot::*;
pub use error::*;
pub use watcher::*;
