//! # keyrole common
//!
//! Shared types, the error taxonomy, and logging setup for the keyrole bot.
//!
//! This crate provides the foundational types used across all other crates
//! in the workspace. It deliberately has no Discord dependency so the store
//! and configuration crates can be built and tested on their own.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod logging;
pub mod types;

#[cfg(any(test, feature = "testing"))]
pub mod test_utils;

pub use error::{ErrorKind, KeyroleError, Result};
pub use logging::{init_logging, LogFormat, LoggingConfig};
pub use types::*;
