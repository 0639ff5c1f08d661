//! Settings schema definitions using serde.

use keyrole_common::{LoggingConfig, MatchPolicy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Main settings structure for the keyrole bot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Discord connection settings.
    pub discord: DiscordSettings,
    /// Per-server configuration storage.
    pub store: StoreSettings,
    /// Message watcher behaviour.
    pub watcher: WatcherSettings,
    /// Keep-alive HTTP endpoints.
    pub keep_alive: KeepAliveSettings,
    /// Logging output.
    pub logging: LoggingConfig,
}

/// Discord bot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordSettings {
    /// Bot token. Usually supplied through `DISCORD_TOKEN`.
    pub token: String,
    /// Register slash commands globally on startup.
    pub register_globally: bool,
}

/// Which storage backend holds server configurations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// A single JSON file.
    #[default]
    File,
    /// A MongoDB collection.
    Mongo,
    /// A PostgreSQL table.
    Postgres,
    /// In-process map; nothing survives a restart.
    Memory,
}

impl BackendKind {
    /// The lowercase name used in settings and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Mongo => "mongo",
            Self::Postgres => "postgres",
            Self::Memory => "memory",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" | "json" => Ok(Self::File),
            "mongo" | "mongodb" => Ok(Self::Mongo),
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown store backend '{other}'")),
        }
    }
}

/// Storage backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Selected backend.
    pub backend: BackendKind,
    /// JSON file used by the file backend.
    pub file_path: PathBuf,
    /// MongoDB connection string.
    pub mongo_uri: Option<String>,
    /// MongoDB database name.
    pub mongo_database: String,
    /// MongoDB collection name.
    pub mongo_collection: String,
    /// PostgreSQL connection string.
    pub postgres_url: Option<String>,
    /// PostgreSQL table name.
    pub postgres_table: String,
    /// How long to wait for the backend at startup, in seconds.
    pub connect_timeout_secs: u64,
}

/// Message watcher settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherSettings {
    /// How message content is compared with the keyword.
    pub match_policy: MatchPolicy,
    /// Lifetime of the in-channel notice after a grant attempt, in seconds.
    pub confirmation_ttl_secs: u64,
}

/// Keep-alive HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeepAliveSettings {
    /// Serve the keep-alive endpoints at all.
    pub enabled: bool,
    /// Bind address.
    pub host: String,
    /// Bind port. Hosting platforms usually pass it through `PORT`.
    pub port: u16,
    /// Platform name reported by `/health`.
    pub platform: String,
}
