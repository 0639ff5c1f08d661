//! The [`ConfigStore`] contract and backend selection.

use crate::backend::{DisabledStore, JsonFileStore, MemoryStore};
use crate::record::{ConfigPatch, ServerConfig};
use async_trait::async_trait;
use keyrole_common::{GuildId, KeyroleError, Result};
use keyrole_config::{BackendKind, StoreSettings};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Async access to per-server configuration records.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Backend serving this store.
    fn backend(&self) -> BackendKind;

    /// Whether writes can succeed at all. `false` only for the degraded store.
    fn is_available(&self) -> bool {
        true
    }

    /// Record for `guild`, or an empty record if none was ever written.
    async fn get(&self, guild: GuildId) -> Result<ServerConfig>;

    /// Merges `patch` into the record for `guild`, creating it if needed.
    async fn set(&self, guild: GuildId, patch: &ConfigPatch) -> Result<()>;

    /// Round-trip time of a trivial backend request.
    async fn ping(&self) -> Result<Duration>;
}

/// Opens the configured backend, degrading to [`DisabledStore`] on failure.
pub async fn connect(settings: &StoreSettings) -> Arc<dyn ConfigStore> {
    match try_connect(settings).await {
        Ok(store) => {
            info!(backend = %settings.backend, "Config store connected");
            store
        }
        Err(e) => {
            error!(
                backend = %settings.backend,
                error = %e,
                "Config store unavailable, configuration will not be saved"
            );
            Arc::new(DisabledStore::new(settings.backend))
        }
    }
}

/// Opens the configured backend within `connect_timeout_secs`.
pub async fn try_connect(settings: &StoreSettings) -> Result<Arc<dyn ConfigStore>> {
    let timeout = Duration::from_secs(settings.connect_timeout_secs.max(1));
    tokio::time::timeout(timeout, open(settings))
        .await
        .map_err(|_| {
            KeyroleError::backend(
                settings.backend.as_str(),
                format!("connection timed out after {}s", timeout.as_secs()),
            )
        })?
}

async fn open(settings: &StoreSettings) -> Result<Arc<dyn ConfigStore>> {
    match settings.backend {
        BackendKind::File => Ok(Arc::new(JsonFileStore::open(&settings.file_path).await?)),
        BackendKind::Memory => Ok(Arc::new(MemoryStore::new())),
        BackendKind::Mongo => open_mongo(settings).await,
        BackendKind::Postgres => open_postgres(settings).await,
    }
}

#[cfg(feature = "mongo")]
async fn open_mongo(settings: &StoreSettings) -> Result<Arc<dyn ConfigStore>> {
    let uri = settings
        .mongo_uri
        .as_deref()
        .ok_or_else(|| KeyroleError::unavailable("mongo (MONGO_URI not set)"))?;
    let store = crate::backend::MongoStore::connect(
        uri,
        &settings.mongo_database,
        &settings.mongo_collection,
    )
    .await?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "mongo"))]
async fn open_mongo(_settings: &StoreSettings) -> Result<Arc<dyn ConfigStore>> {
    Err(KeyroleError::unavailable("mongo (built without the `mongo` feature)"))
}

#[cfg(feature = "postgres")]
async fn open_postgres(settings: &StoreSettings) -> Result<Arc<dyn ConfigStore>> {
    let url = settings
        .postgres_url
        .as_deref()
        .ok_or_else(|| KeyroleError::unavailable("postgres (DATABASE_URL not set)"))?;
    let store = crate::backend::PostgresStore::connect(url, &settings.postgres_table).await?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "postgres"))]
async fn open_postgres(_settings: &StoreSettings) -> Result<Arc<dyn ConfigStore>> {
    Err(KeyroleError::unavailable(
        "postgres (built without the `postgres` feature)",
    ))
}
