//! Test utilities and shared test helpers for the keyrole workspace.
//!
//! Enabled through the `testing` feature so other crates can pull these
//! helpers into their dev-dependencies.

use crate::{ChannelId, GuildId, RoleId, UserId};
use std::sync::Once;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize test logging once per test run.
static INIT: Once = Once::new();

/// Initialize logging for tests with a sensible default configuration.
/// This function is safe to call multiple times and will only initialize once.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

        let _ = fmt().with_test_writer().with_env_filter(filter).try_init();
    });
}

/// Create a temporary directory for tests that automatically cleans up.
#[cfg(feature = "tempfile")]
pub fn create_temp_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temporary directory")
}

/// Discord-related test fixtures.
pub mod discord_fixtures {
    use super::*;

    /// A test server ID.
    pub fn test_guild_id() -> GuildId {
        GuildId(111_111_111_111_111_111)
    }

    /// The watched channel used across fixtures.
    pub fn test_channel_id() -> ChannelId {
        ChannelId(123_456_789_012_345_678)
    }

    /// The log channel used across fixtures.
    pub fn test_log_channel_id() -> ChannelId {
        ChannelId(223_456_789_012_345_678)
    }

    /// The granted role used across fixtures.
    pub fn test_role_id() -> RoleId {
        RoleId(333_333_333_333_333_333)
    }

    /// A message author.
    pub fn test_user_id() -> UserId {
        UserId(987_654_321_098_765_432)
    }
}
