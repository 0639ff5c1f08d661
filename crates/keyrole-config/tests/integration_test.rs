//! Integration tests for keyrole-config crate.

use keyrole_common::{LogFormat, MatchPolicy};
use keyrole_common::test_utils::create_temp_dir;
use keyrole_config::{BackendKind, ConfigLoader, Settings};

#[test]
fn test_default_settings() {
    let settings = Settings::default();

    assert_eq!(settings.store.backend, BackendKind::File);
    assert_eq!(settings.store.mongo_database, "discord_bot_db");
    assert_eq!(settings.store.mongo_collection, "server_configs");
    assert_eq!(settings.watcher.match_policy, MatchPolicy::Contains);
    assert_eq!(settings.watcher.confirmation_ttl_secs, 10);
    assert_eq!(settings.keep_alive.port, 8080);
    assert!(settings.keep_alive.enabled);
}

#[test]
fn test_partial_toml_keeps_defaults() {
    let settings = ConfigLoader::parse(
        r#"
        [store]
        backend = "postgres"
        postgres_table = "guild_settings"

        [watcher]
        match_policy = "exact"

        [logging]
        format = "json"
        "#,
    )
    .unwrap();

    assert_eq!(settings.store.backend, BackendKind::Postgres);
    assert_eq!(settings.store.postgres_table, "guild_settings");
    assert_eq!(settings.store.mongo_collection, "server_configs");
    assert_eq!(settings.watcher.match_policy, MatchPolicy::Exact);
    assert_eq!(settings.watcher.confirmation_ttl_secs, 10);
    assert_eq!(settings.logging.format, LogFormat::Json);
    assert_eq!(settings.keep_alive.port, 8080);
}

#[test]
fn test_load_file_reports_path_on_parse_error() {
    let dir = create_temp_dir();
    let path = dir.path().join("keyrole.toml");
    std::fs::write(&path, "[store\nbackend = 1\n").unwrap();

    let err = ConfigLoader::load_file(&path).unwrap_err();
    assert!(err.to_string().contains(&path.display().to_string()));
}

#[test]
fn test_load_file_reads_values() {
    let dir = create_temp_dir();
    let path = dir.path().join("keyrole.toml");
    std::fs::write(
        &path,
        "[keep_alive]\nenabled = false\nport = 3000\n\n[discord]\nregister_globally = false\n",
    )
    .unwrap();

    let settings = ConfigLoader::load_file(&path).unwrap();
    assert!(!settings.keep_alive.enabled);
    assert_eq!(settings.keep_alive.port, 3000);
    assert!(!settings.discord.register_globally);
}

#[test]
fn test_unparsable_file_falls_back_to_defaults_when_reporting() {
    let dir = create_temp_dir();
    let path = dir.path().join("keyrole.toml");
    std::fs::write(&path, "[keep_alive\nport = 1\n").unwrap();

    let report = ConfigLoader::load_reporting_with(Some(&path), |key| {
        (key == "DISCORD_TOKEN").then(|| "token".to_string())
    });

    assert_eq!(report.problems.len(), 1);
    assert_eq!(report.settings.keep_alive.port, 8080);
    assert_eq!(report.settings.discord.token, "token");
    assert!(ConfigLoader::load_file(&path).is_err());
}
