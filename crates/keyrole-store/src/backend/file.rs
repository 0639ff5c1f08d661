//! Single JSON file backend.

use crate::record::{ConfigPatch, ServerConfig};
use crate::store::ConfigStore;
use async_trait::async_trait;
use keyrole_common::{GuildId, KeyroleError, Result};
use keyrole_config::BackendKind;
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

type Document = BTreeMap<String, Value>;

/// Keeps every server's record in one JSON object keyed by server id.
///
/// Each write re-reads the file, merges the patch and replaces the file
/// through a temporary sibling. Writes are serialised by an async mutex.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Opens the store at `path`, creating the parent directory if missing.
    /// The file itself is created on the first write.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        debug!(path = %path.display(), "Opened JSON config store");
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_document(&self) -> Result<Document> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Document::new()),
            Err(e) => return Err(e.into()),
        };
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Ok(Document::new());
        }
        match serde_json::from_slice::<Document>(&raw) {
            Ok(document) => Ok(document),
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Config file is corrupt, treating it as empty"
                );
                Ok(Document::new())
            }
        }
    }

    async fn write_document(&self, document: &Document) -> Result<()> {
        let serialized = serde_json::to_string_pretty(document)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        tokio::fs::write(&tmp, serialized).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

fn decode_entry(guild: GuildId, value: Value) -> ServerConfig {
    serde_json::from_value(value).unwrap_or_else(|e| {
        warn!(%guild, error = %e, "Stored config entry is malformed, treating it as empty");
        ServerConfig::default()
    })
}

#[async_trait]
impl ConfigStore for JsonFileStore {
    fn backend(&self) -> BackendKind {
        BackendKind::File
    }

    async fn get(&self, guild: GuildId) -> Result<ServerConfig> {
        let mut document = self.read_document().await?;
        Ok(document
            .remove(&guild.to_string())
            .map(|value| decode_entry(guild, value))
            .unwrap_or_default())
    }

    async fn set(&self, guild: GuildId, patch: &ConfigPatch) -> Result<()> {
        if patch.is_empty() {
            return Ok(());
        }
        let _guard = self.write_lock.lock().await;

        let mut document = self.read_document().await?;
        let key = guild.to_string();
        let existed = document.contains_key(&key);
        let mut config = document
            .remove(&key)
            .map(|value| decode_entry(guild, value))
            .unwrap_or_default();

        if !config.apply(patch) && existed {
            debug!(%guild, "Config unchanged, skipping write");
            return Ok(());
        }

        document.insert(key, serde_json::to_value(&config)?);
        self.write_document(&document).await.map_err(|e| {
            KeyroleError::backend("file", format!("failed to write {}: {e}", self.path.display()))
        })?;
        debug!(%guild, fields = ?patch.fields(), "Config written");
        Ok(())
    }

    async fn ping(&self) -> Result<Duration> {
        let started = Instant::now();
        self.read_document().await?;
        Ok(started.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyrole_common::test_utils::create_temp_dir;
    use keyrole_common::{ChannelId, RoleId};

    #[tokio::test]
    async fn test_missing_file_reads_empty() {
        let dir = create_temp_dir();
        let store = JsonFileStore::open(dir.path().join("none.json")).await.unwrap();
        assert!(store.get(GuildId(1)).await.unwrap().is_empty());
        assert!(store.ping().await.is_ok());
    }

    #[tokio::test]
    async fn test_corrupt_file_reads_empty_and_is_replaced() {
        let dir = create_temp_dir();
        let path = dir.path().join("configs.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = JsonFileStore::open(&path).await.unwrap();
        assert!(store.get(GuildId(1)).await.unwrap().is_empty());

        store
            .set(GuildId(1), &ConfigPatch::new().channel(ChannelId(2)))
            .await
            .unwrap();
        assert_eq!(
            store.get(GuildId(1)).await.unwrap().channel_id,
            Some(ChannelId(2))
        );
    }

    #[tokio::test]
    async fn test_non_utf8_file_reads_empty_and_is_replaced() {
        let dir = create_temp_dir();
        let path = dir.path().join("configs.json");
        std::fs::write(&path, [0xff, 0xfe, 0x00, 0x7b]).unwrap();

        let store = JsonFileStore::open(&path).await.unwrap();
        assert!(store.get(GuildId(1)).await.unwrap().is_empty());

        store
            .set(GuildId(1), &ConfigPatch::new().keyword("open"))
            .await
            .unwrap();
        assert_eq!(
            store.get(GuildId(1)).await.unwrap().keyword.as_deref(),
            Some("open")
        );
    }

    #[tokio::test]
    async fn test_whitespace_file_reads_empty() {
        let dir = create_temp_dir();
        let path = dir.path().join("configs.json");
        std::fs::write(&path, " \n\t").unwrap();

        let store = JsonFileStore::open(&path).await.unwrap();
        assert!(store.get(GuildId(1)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_entry_keeps_other_servers() {
        let dir = create_temp_dir();
        let path = dir.path().join("configs.json");
        std::fs::write(
            &path,
            r#"{"1": "garbage", "2": {"keyword": "open", "role_id": "5"}}"#,
        )
        .unwrap();

        let store = JsonFileStore::open(&path).await.unwrap();
        assert!(store.get(GuildId(1)).await.unwrap().is_empty());

        let second = store.get(GuildId(2)).await.unwrap();
        assert_eq!(second.keyword.as_deref(), Some("open"));
        assert_eq!(second.role_id, Some(RoleId(5)));
    }

    #[tokio::test]
    async fn test_file_layout_uses_string_keys() {
        let dir = create_temp_dir();
        let path = dir.path().join("configs.json");
        let store = JsonFileStore::open(&path).await.unwrap();

        store
            .set(GuildId(42), &ConfigPatch::new().keyword("hello"))
            .await
            .unwrap();

        let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["42"]["keyword"], "hello");
        assert!(raw["42"].get("channel_id").is_none());
    }
}
