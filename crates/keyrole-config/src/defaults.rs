//! Default values for every settings section.

use crate::schema::*;
use keyrole_common::MatchPolicy;
use std::path::PathBuf;

/// Default JSON file for the file backend.
pub const DEFAULT_FILE_PATH: &str = "server_configs.json";
/// Default MongoDB database.
pub const DEFAULT_MONGO_DATABASE: &str = "discord_bot_db";
/// Default MongoDB collection.
pub const DEFAULT_MONGO_COLLECTION: &str = "server_configs";
/// Default PostgreSQL table.
pub const DEFAULT_POSTGRES_TABLE: &str = "server_configs";
/// Default keep-alive port.
pub const DEFAULT_PORT: u16 = 8080;

impl Default for DiscordSettings {
    fn default() -> Self {
        Self {
            token: String::new(),
            register_globally: true,
        }
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: BackendKind::File,
            file_path: PathBuf::from(DEFAULT_FILE_PATH),
            mongo_uri: None,
            mongo_database: DEFAULT_MONGO_DATABASE.to_string(),
            mongo_collection: DEFAULT_MONGO_COLLECTION.to_string(),
            postgres_url: None,
            postgres_table: DEFAULT_POSTGRES_TABLE.to_string(),
            connect_timeout_secs: 10,
        }
    }
}

impl Default for WatcherSettings {
    fn default() -> Self {
        Self {
            match_policy: MatchPolicy::Contains,
            confirmation_ttl_secs: 10,
        }
    }
}

impl Default for KeepAliveSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            platform: "render".to_string(),
        }
    }
}
