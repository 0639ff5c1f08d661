//! Stand-in used when the configured backend could not be reached.

use crate::record::{ConfigPatch, ServerConfig};
use crate::store::ConfigStore;
use async_trait::async_trait;
use keyrole_common::{GuildId, KeyroleError, Result};
use keyrole_config::BackendKind;
use std::time::Duration;
use tracing::warn;

/// Stand-in used when the configured backend could not be reached.
///
/// Reads return empty records, so every server looks unconfigured and the
/// watcher stays idle. Writes are dropped and reported as unavailable.
#[derive(Debug, Clone, Copy)]
pub struct DisabledStore {
    intended: BackendKind,
}

impl DisabledStore {
    /// A disabled store standing in for `intended`.
    #[must_use]
    pub const fn new(intended: BackendKind) -> Self {
        Self { intended }
    }
}

#[async_trait]
impl ConfigStore for DisabledStore {
    fn backend(&self) -> BackendKind {
        self.intended
    }

    fn is_available(&self) -> bool {
        false
    }

    async fn get(&self, _guild: GuildId) -> Result<ServerConfig> {
        Ok(ServerConfig::default())
    }

    async fn set(&self, guild: GuildId, patch: &ConfigPatch) -> Result<()> {
        warn!(%guild, fields = ?patch.fields(), "Config store disabled, dropping write");
        Err(KeyroleError::unavailable(self.intended.as_str()))
    }

    async fn ping(&self) -> Result<Duration> {
        Err(KeyroleError::unavailable(self.intended.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyrole_common::{ChannelId, ErrorKind};

    #[tokio::test]
    async fn test_disabled_store_drops_writes() {
        let store = DisabledStore::new(BackendKind::Mongo);
        let err = store
            .set(GuildId(1), &ConfigPatch::new().channel(ChannelId(2)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BackendUnavailable);
        assert!(store.get(GuildId(1)).await.unwrap().is_empty());
        assert!(store.ping().await.is_err());
    }
}
