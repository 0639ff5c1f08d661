//! Runtime validation of loaded settings.

use crate::schema::{BackendKind, Settings};
use keyrole_common::KeyroleError;

/// Returns whether `name` is safe to splice into SQL as a table name.
#[must_use]
pub fn is_sql_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && name.len() <= 63
}

impl Settings {
    /// Validates values that would make startup pointless.
    ///
    /// Missing credentials are not validation failures: they stop the bot
    /// from connecting but leave the keep-alive server running. See
    /// [`Settings::missing_credentials`].
    pub fn validate(&self) -> Result<(), KeyroleError> {
        if !is_sql_identifier(&self.store.postgres_table) {
            return Err(KeyroleError::validation_field(
                format!(
                    "'{}' is not a valid table name",
                    self.store.postgres_table
                ),
                "store.postgres_table",
            ));
        }

        if self.store.mongo_database.trim().is_empty() {
            return Err(KeyroleError::validation_field(
                "MongoDB database name cannot be empty",
                "store.mongo_database",
            ));
        }

        if self.store.mongo_collection.trim().is_empty() {
            return Err(KeyroleError::validation_field(
                "MongoDB collection name cannot be empty",
                "store.mongo_collection",
            ));
        }

        if self.store.backend == BackendKind::File && self.store.file_path.as_os_str().is_empty() {
            return Err(KeyroleError::validation_field(
                "file backend needs a file path",
                "store.file_path",
            ));
        }

        if self.store.connect_timeout_secs == 0 {
            return Err(KeyroleError::validation_field(
                "connect timeout must be at least one second",
                "store.connect_timeout_secs",
            ));
        }

        Ok(())
    }

    /// Names of the environment inputs the bot needs but does not have.
    #[must_use]
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();

        if self.discord.token.trim().is_empty() {
            missing.push("DISCORD_TOKEN");
        }

        let blank = |value: &Option<String>| value.as_deref().map_or(true, |v| v.trim().is_empty());
        match self.store.backend {
            BackendKind::Mongo if blank(&self.store.mongo_uri) => missing.push("MONGO_URI"),
            BackendKind::Postgres if blank(&self.store.postgres_url) => {
                missing.push("DATABASE_URL");
            }
            _ => {}
        }

        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_rules() {
        assert!(is_sql_identifier("server_configs"));
        assert!(is_sql_identifier("_t1"));
        assert!(!is_sql_identifier("1table"));
        assert!(!is_sql_identifier("configs; DROP TABLE x"));
        assert!(!is_sql_identifier(""));
    }

    #[test]
    fn test_defaults_validate() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_bad_table_name_rejected() {
        let mut settings = Settings::default();
        settings.store.postgres_table = "bad-name".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_missing_credentials_follow_backend() {
        let mut settings = Settings::default();
        assert_eq!(settings.missing_credentials(), vec!["DISCORD_TOKEN"]);

        settings.discord.token = "token".to_string();
        settings.store.backend = BackendKind::Postgres;
        assert_eq!(settings.missing_credentials(), vec!["DATABASE_URL"]);

        settings.store.postgres_url = Some("postgres://localhost/keyrole".to_string());
        assert!(settings.missing_credentials().is_empty());

        settings.store.backend = BackendKind::Mongo;
        assert_eq!(settings.missing_credentials(), vec!["MONGO_URI"]);
    }
}
