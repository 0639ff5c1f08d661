//! # keyrole config
//!
//! Type-safe process settings for the keyrole bot.
//!
//! Settings come from an optional TOML file and are then overridden by
//! environment variables, which is how the bot is usually deployed.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod defaults;
pub mod loader;
pub mod schema;
pub mod validator;

pub use loader::*;
pub use schema::*;
pub use validator::*;
