//! MongoDB backend: one document per server in a single collection.

use crate::record::{snowflake_from_i64, ConfigPatch, Field, FieldValue, ServerConfig};
use crate::store::ConfigStore;
use async_trait::async_trait;
use keyrole_common::{ChannelId, GuildId, KeyroleError, Result, RoleId};
use keyrole_config::BackendKind;
use mongodb::bson::{doc, Bson, Document};
use mongodb::options::{ClientOptions, UpdateOptions};
use mongodb::{Client, Collection, Database};
use std::time::{Duration, Instant};
use tracing::{debug, info};

const BACKEND: &str = "mongo";

/// Documents are keyed by `_id` = server id string.
#[derive(Debug, Clone)]
pub struct MongoStore {
    database: Database,
    collection: Collection<Document>,
}

impl MongoStore {
    /// Connects to `uri` and pings the server before returning.
    pub async fn connect(uri: &str, database: &str, collection: &str) -> Result<Self> {
        let mut options = ClientOptions::parse(uri)
            .await
            .map_err(|e| KeyroleError::backend_with_source(BACKEND, "invalid MONGO_URI", e))?;
        options.app_name = Some("keyrole".to_string());

        let client = Client::with_options(options)
            .map_err(|e| KeyroleError::backend_with_source(BACKEND, "failed to build client", e))?;
        let database = client.database(database);
        let store = Self {
            collection: database.collection::<Document>(collection),
            database,
        };

        store.ping().await?;
        info!(
            database = store.database.name(),
            collection = store.collection.name(),
            "Connected to MongoDB"
        );
        Ok(store)
    }
}

#[async_trait]
impl ConfigStore for MongoStore {
    fn backend(&self) -> BackendKind {
        BackendKind::Mongo
    }

    async fn get(&self, guild: GuildId) -> Result<ServerConfig> {
        let found = self
            .collection
            .find_one(doc! { "_id": guild.to_string() }, None)
            .await
            .map_err(|e| KeyroleError::backend_with_source(BACKEND, "find_one failed", e))?;
        Ok(found.map(|d| config_from_document(&d)).unwrap_or_default())
    }

    async fn set(&self, guild: GuildId, patch: &ConfigPatch) -> Result<()> {
        if patch.is_empty() {
            return Ok(());
        }
        let fields = patch_to_document(patch)?;
        let options = UpdateOptions::builder().upsert(Some(true)).build();
        let result = self
            .collection
            .update_one(doc! { "_id": guild.to_string() }, doc! { "$set": fields }, options)
            .await
            .map_err(|e| KeyroleError::backend_with_source(BACKEND, "update_one failed", e))?;
        debug!(
            %guild,
            matched = result.matched_count,
            upserted = result.upserted_id.is_some(),
            "Config written"
        );
        Ok(())
    }

    async fn ping(&self) -> Result<Duration> {
        let started = Instant::now();
        self.database
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| KeyroleError::backend_with_source(BACKEND, "ping failed", e))?;
        Ok(started.elapsed())
    }
}

/// The `$set` body for `patch`. Ids are stored as `Int64`.
pub fn patch_to_document(patch: &ConfigPatch) -> Result<Document> {
    let mut document = Document::new();
    for (field, value) in patch.bind_values()? {
        let value = match value {
            FieldValue::Id(id) => Bson::Int64(id),
            FieldValue::Text(text) => Bson::String(text),
        };
        document.insert(field.name(), value);
    }
    Ok(document)
}

/// Reads a stored document. Values of an unexpected type read as unset.
#[must_use]
pub fn config_from_document(document: &Document) -> ServerConfig {
    let id = |field: Field| document.get(field.name()).and_then(bson_to_snowflake);
    ServerConfig {
        channel_id: id(Field::ChannelId).map(ChannelId),
        keyword: match document.get(Field::Keyword.name()) {
            Some(Bson::String(keyword)) => Some(keyword.clone()),
            _ => None,
        },
        role_id: id(Field::RoleId).map(RoleId),
        log_channel_id: id(Field::LogChannelId).map(ChannelId),
    }
}

fn bson_to_snowflake(value: &Bson) -> Option<u64> {
    match value {
        Bson::Int64(n) => snowflake_from_i64(*n),
        Bson::Int32(n) => u64::try_from(*n).ok(),
        Bson::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_document_contains_only_patched_fields() {
        let patch = ConfigPatch::new().keyword("open").role(RoleId(77));
        let document = patch_to_document(&patch).unwrap();

        assert_eq!(document.len(), 2);
        assert_eq!(document.get_str("keyword").unwrap(), "open");
        assert_eq!(document.get_i64("role_id").unwrap(), 77);
        assert!(document.get("channel_id").is_none());
    }

    #[test]
    fn test_document_conversion_tolerates_id_types() {
        let document = doc! {
            "_id": "1",
            "channel_id": 10_i64,
            "role_id": 20_i32,
            "log_channel_id": "30",
            "keyword": "hi",
        };
        let config = config_from_document(&document);

        assert_eq!(config.channel_id, Some(ChannelId(10)));
        assert_eq!(config.role_id, Some(RoleId(20)));
        assert_eq!(config.log_channel_id, Some(ChannelId(30)));
        assert_eq!(config.keyword.as_deref(), Some("hi"));
    }

    #[test]
    fn test_document_conversion_drops_bad_values() {
        let document = doc! { "_id": "1", "channel_id": true, "keyword": 5, "role_id": -3_i64 };
        assert!(config_from_document(&document).is_empty());
    }
}
