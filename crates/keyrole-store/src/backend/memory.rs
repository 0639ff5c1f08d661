//! In-process backend; nothing survives a restart.

use crate::record::{ConfigPatch, ServerConfig};
use crate::store::ConfigStore;
use async_trait::async_trait;
use keyrole_common::{GuildId, Result};
use keyrole_config::BackendKind;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

/// In-process store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<GuildId, ServerConfig>>,
    writes: AtomicUsize,
}

impl MemoryStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-filled with `records`.
    #[must_use]
    pub fn with_records(records: impl IntoIterator<Item = (GuildId, ServerConfig)>) -> Self {
        Self {
            records: RwLock::new(records.into_iter().collect()),
            writes: AtomicUsize::new(0),
        }
    }

    /// Number of `set` calls that reached the map.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConfigStore for MemoryStore {
    fn backend(&self) -> BackendKind {
        BackendKind::Memory
    }

    async fn get(&self, guild: GuildId) -> Result<ServerConfig> {
        Ok(self.records.read().await.get(&guild).cloned().unwrap_or_default())
    }

    async fn set(&self, guild: GuildId, patch: &ConfigPatch) -> Result<()> {
        if patch.is_empty() {
            return Ok(());
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.records.write().await.entry(guild).or_default().apply(patch);
        Ok(())
    }

    async fn ping(&self) -> Result<Duration> {
        Ok(Duration::ZERO)
    }
}
