//! Settings loading: TOML file first, environment variable overrides second.

use crate::schema::Settings;
use keyrole_common::KeyroleError;
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Settings file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "keyrole.toml";

/// Environment variable naming an explicit settings file.
pub const CONFIG_PATH_VAR: &str = "KEYROLE_CONFIG";

/// Settings loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error when reading the settings file
    #[error("Failed to read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error
    #[error("Failed to parse settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Environment variable parsing error
    #[error("Failed to parse environment variable '{var}': {message}")]
    EnvParse {
        var: &'static str,
        message: String,
    },
}

impl From<ConfigError> for KeyroleError {
    fn from(err: ConfigError) -> Self {
        KeyroleError::config_with_source("failed to load settings", err)
    }
}

/// Settings produced by [`ConfigLoader::load_reporting`], together with
/// every input that had to be ignored to produce them.
#[derive(Debug)]
pub struct LoadReport {
    /// Best-effort settings: defaults wherever an input was unusable.
    pub settings: Settings,
    /// Inputs that were rejected, in the order they were found.
    pub problems: Vec<KeyroleError>,
}

impl LoadReport {
    /// Whether every input was accepted.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Settings loader for the application
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load settings from `path`, `KEYROLE_CONFIG`, or `keyrole.toml`, in that
    /// order, then apply environment overrides. Without any file the defaults
    /// are used.
    ///
    /// Fails on the first rejected input.
    pub fn load(path: Option<&Path>) -> Result<Settings, KeyroleError> {
        let report = Self::load_reporting(path);
        match report.problems.into_iter().next() {
            Some(problem) => Err(problem),
            None => Ok(report.settings),
        }
    }

    /// Like [`ConfigLoader::load`], but never fails: an unreadable file falls
    /// back to the defaults and a malformed variable leaves its setting
    /// untouched. The rejected inputs are returned alongside the settings.
    #[must_use]
    pub fn load_reporting(path: Option<&Path>) -> LoadReport {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| env::var_os(CONFIG_PATH_VAR).map(PathBuf::from))
            .or_else(|| {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                default.exists().then_some(default)
            });
        Self::load_reporting_with(path.as_deref(), |key| env::var(key).ok())
    }

    /// [`ConfigLoader::load_reporting`] with an explicit file and variable
    /// lookup.
    #[must_use]
    pub fn load_reporting_with<F>(path: Option<&Path>, lookup: F) -> LoadReport
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut problems = Vec::new();

        let mut settings = match path {
            Some(path) => {
                info!("Loading settings from {}", path.display());
                Self::load_file(path).unwrap_or_else(|e| {
                    problems.push(KeyroleError::from(e));
                    Settings::default()
                })
            }
            None => {
                debug!("No settings file found, using defaults");
                Settings::default()
            }
        };

        problems.extend(
            Self::apply_valid_overrides(&mut settings, lookup)
                .into_iter()
                .map(KeyroleError::from),
        );
        if let Err(e) = settings.validate() {
            problems.push(e);
        }

        LoadReport { settings, problems }
    }

    /// Parse a settings file without applying overrides.
    pub fn load_file(path: &Path) -> Result<Settings, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse settings from TOML text.
    pub fn parse(content: &str) -> Result<Settings, toml::de::Error> {
        toml::from_str(content)
    }

    /// Apply environment overrides read through `lookup`, failing on the
    /// first malformed value.
    ///
    /// Empty values are ignored so an exported-but-blank variable does not
    /// wipe a value from the settings file.
    pub fn apply_overrides<F>(settings: &mut Settings, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match Self::apply_valid_overrides(settings, lookup).into_iter().next() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Apply every well-formed override and return the malformed ones.
    pub fn apply_valid_overrides<F>(settings: &mut Settings, lookup: F) -> Vec<ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut problems = Vec::new();

        if let Some(token) = get("DISCORD_TOKEN") {
            settings.discord.token = token.trim().to_string();
        }

        if let Some(backend) = get("KEYROLE_STORE") {
            match backend.parse() {
                Ok(backend) => settings.store.backend = backend,
                Err(message) => problems.push(ConfigError::EnvParse {
                    var: "KEYROLE_STORE",
                    message,
                }),
            }
        }

        if let Some(path) = get("KEYROLE_STORE_PATH") {
            settings.store.file_path = PathBuf::from(path);
        }

        if let Some(uri) = get("MONGO_URI") {
            settings.store.mongo_uri = Some(uri);
        }

        if let Some(url) = get("DATABASE_URL") {
            settings.store.postgres_url = Some(url);
        }

        if let Some(policy) = get("KEYROLE_MATCH_POLICY") {
            match policy.parse() {
                Ok(policy) => settings.watcher.match_policy = policy,
                Err(message) => problems.push(ConfigError::EnvParse {
                    var: "KEYROLE_MATCH_POLICY",
                    message,
                }),
            }
        }

        if let Some(port) = get("PORT") {
            match port.trim().parse() {
                Ok(port) => settings.keep_alive.port = port,
                Err(e) => problems.push(ConfigError::EnvParse {
                    var: "PORT",
                    message: format!("{e}"),
                }),
            }
        }

        problems
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::BackendKind;
    use keyrole_common::MatchPolicy;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_overrides_apply() {
        let mut settings = Settings::default();
        ConfigLoader::apply_overrides(
            &mut settings,
            env_of(&[
                ("DISCORD_TOKEN", "  abc.def.ghi "),
                ("KEYROLE_STORE", "mongodb"),
                ("MONGO_URI", "mongodb://localhost:27017"),
                ("KEYROLE_MATCH_POLICY", "exact"),
                ("PORT", "10000"),
            ]),
        )
        .unwrap();

        assert_eq!(settings.discord.token, "abc.def.ghi");
        assert_eq!(settings.store.backend, BackendKind::Mongo);
        assert_eq!(
            settings.store.mongo_uri.as_deref(),
            Some("mongodb://localhost:27017")
        );
        assert_eq!(settings.watcher.match_policy, MatchPolicy::Exact);
        assert_eq!(settings.keep_alive.port, 10000);
    }

    #[test]
    fn test_blank_values_are_ignored() {
        let mut settings = Settings::default();
        settings.discord.token = "from-file".to_string();
        ConfigLoader::apply_overrides(&mut settings, env_of(&[("DISCORD_TOKEN", "   ")])).unwrap();
        assert_eq!(settings.discord.token, "from-file");
    }

    #[test]
    fn test_bad_port_is_reported() {
        let mut settings = Settings::default();
        let err = ConfigLoader::apply_overrides(&mut settings, env_of(&[("PORT", "eighty")]))
            .unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_unknown_backend_is_reported() {
        let mut settings = Settings::default();
        let err = ConfigLoader::apply_overrides(&mut settings, env_of(&[("KEYROLE_STORE", "redis")]))
            .unwrap_err();
        assert!(err.to_string().contains("redis"));
    }

    #[test]
    fn test_malformed_overrides_do_not_block_valid_ones() {
        let mut settings = Settings::default();
        let problems = ConfigLoader::apply_valid_overrides(
            &mut settings,
            env_of(&[
                ("DISCORD_TOKEN", "token"),
                ("KEYROLE_MATCH_POLICY", "fuzzy"),
                ("PORT", "eighty"),
                ("KEYROLE_STORE", "memory"),
            ]),
        );

        assert_eq!(problems.len(), 2);
        assert_eq!(settings.discord.token, "token");
        assert_eq!(settings.store.backend, BackendKind::Memory);
        assert_eq!(settings.watcher.match_policy, MatchPolicy::Contains);
        assert_eq!(settings.keep_alive.port, 8080);
    }

    #[test]
    fn test_reporting_load_survives_missing_file() {
        let report = ConfigLoader::load_reporting_with(
            Some(Path::new("/nonexistent/keyrole.toml")),
            env_of(&[("PORT", "9000"), ("KEYROLE_STORE", "redis")]),
        );

        assert!(!report.is_clean());
        assert_eq!(report.problems.len(), 2);
        assert!(report
            .problems
            .iter()
            .all(|p| p.kind() == keyrole_common::ErrorKind::Config));
        assert_eq!(report.settings.keep_alive.port, 9000);
        assert_eq!(report.settings.store.backend, BackendKind::File);
    }

    #[test]
    fn test_reporting_load_without_file_is_clean() {
        let report = ConfigLoader::load_reporting_with(None, env_of(&[]));
        assert!(report.is_clean());
        assert_eq!(report.settings.keep_alive.port, 8080);
    }
}
