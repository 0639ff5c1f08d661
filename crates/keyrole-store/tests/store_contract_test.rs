//! Behaviour every in-process backend shares through `dyn ConfigStore`.

use keyrole_common::test_utils::{create_temp_dir, discord_fixtures::*, init_test_logging};
use keyrole_common::{ChannelId, ErrorKind, GuildId};
use keyrole_config::BackendKind;
use keyrole_store::{ConfigPatch, ConfigStore, DisabledStore, JsonFileStore, MemoryStore};
use std::path::Path;
use std::sync::Arc;

async fn writable_stores(dir: &Path) -> Vec<Arc<dyn ConfigStore>> {
    vec![
        Arc::new(MemoryStore::new()),
        Arc::new(
            JsonFileStore::open(dir.join("server_configs.json"))
                .await
                .unwrap(),
        ),
    ]
}

#[tokio::test]
async fn test_unknown_server_reads_empty_on_every_backend() {
    init_test_logging();
    let dir = create_temp_dir();
    let mut stores = writable_stores(dir.path()).await;
    stores.push(Arc::new(DisabledStore::new(BackendKind::Postgres)));

    for store in stores {
        let config = store.get(GuildId(404)).await.unwrap();
        assert!(config.is_empty(), "{} returned data", store.backend());
    }
}

#[tokio::test]
async fn test_sequential_patches_merge() {
    init_test_logging();
    let dir = create_temp_dir();

    for store in writable_stores(dir.path()).await {
        let guild = test_guild_id();
        store
            .set(guild, &ConfigPatch::new().channel(test_channel_id()))
            .await
            .unwrap();
        store
            .set(guild, &ConfigPatch::new().keyword("open").role(test_role_id()))
            .await
            .unwrap();
        store
            .set(guild, &ConfigPatch::new().log_channel(test_log_channel_id()))
            .await
            .unwrap();

        let config = store.get(guild).await.unwrap();
        assert_eq!(config.channel_id, Some(test_channel_id()));
        assert_eq!(config.keyword.as_deref(), Some("open"));
        assert_eq!(config.role_id, Some(test_role_id()));
        assert_eq!(config.log_channel_id, Some(test_log_channel_id()));

        let rule = config.watch_rule().unwrap();
        assert_eq!(rule.channel_id, test_channel_id());
    }
}

#[tokio::test]
async fn test_repeated_patch_is_idempotent() {
    let dir = create_temp_dir();

    for store in writable_stores(dir.path()).await {
        let guild = GuildId(7);
        let patch = ConfigPatch::new().channel(ChannelId(8)).keyword("go");
        store.set(guild, &patch).await.unwrap();
        let first = store.get(guild).await.unwrap();
        store.set(guild, &patch).await.unwrap();
        assert_eq!(store.get(guild).await.unwrap(), first);
    }
}

#[tokio::test]
async fn test_servers_are_isolated() {
    let dir = create_temp_dir();

    for store in writable_stores(dir.path()).await {
        store
            .set(GuildId(1), &ConfigPatch::new().keyword("one"))
            .await
            .unwrap();
        store
            .set(GuildId(2), &ConfigPatch::new().keyword("two"))
            .await
            .unwrap();

        assert_eq!(store.get(GuildId(1)).await.unwrap().keyword.as_deref(), Some("one"));
        assert_eq!(store.get(GuildId(2)).await.unwrap().keyword.as_deref(), Some("two"));
    }
}

#[tokio::test]
async fn test_file_store_persists_across_instances() {
    let dir = create_temp_dir();
    let path = dir.path().join("nested").join("server_configs.json");

    let first = JsonFileStore::open(&path).await.unwrap();
    first
        .set(test_guild_id(), &ConfigPatch::new().role(test_role_id()))
        .await
        .unwrap();
    drop(first);

    let second = JsonFileStore::open(&path).await.unwrap();
    assert_eq!(
        second.get(test_guild_id()).await.unwrap().role_id,
        Some(test_role_id())
    );
}

#[tokio::test]
async fn test_file_store_concurrent_writes_are_not_lost() {
    let dir = create_temp_dir();
    let store = Arc::new(
        JsonFileStore::open(dir.path().join("server_configs.json"))
            .await
            .unwrap(),
    );

    let handles: Vec<_> = (1..=16_u64)
        .map(|id| {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                store
                    .set(GuildId(id), &ConfigPatch::new().channel(ChannelId(id * 10)))
                    .await
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    for id in 1..=16_u64 {
        assert_eq!(
            store.get(GuildId(id)).await.unwrap().channel_id,
            Some(ChannelId(id * 10))
        );
    }
}

#[tokio::test]
async fn test_memory_store_counts_writes() {
    let store = MemoryStore::new();
    store
        .set(GuildId(1), &ConfigPatch::new().keyword("x"))
        .await
        .unwrap();
    store.set(GuildId(1), &ConfigPatch::new()).await.unwrap();
    assert_eq!(store.write_count(), 1);
}

#[tokio::test]
async fn test_disabled_store_reports_unavailable_on_write() {
    let store: Arc<dyn ConfigStore> = Arc::new(DisabledStore::new(BackendKind::File));
    assert!(!store.is_available());
    let err = store
        .set(GuildId(1), &ConfigPatch::new().keyword("x"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BackendUnavailable);
}
