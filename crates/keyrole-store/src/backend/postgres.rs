//! PostgreSQL backend: one row per server.

use crate::record::{
    snowflake_from_i64, snowflake_to_i64, ConfigPatch, Field, FieldValue, ServerConfig,
};
use crate::store::ConfigStore;
use async_trait::async_trait;
use keyrole_common::{ChannelId, GuildId, KeyroleError, Result, RoleId};
use keyrole_config::{is_sql_identifier, BackendKind};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use std::time::{Duration, Instant};
use tracing::{debug, info};

const BACKEND: &str = "postgres";

/// Rows live in a configurable table keyed by `server_id BIGINT`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
    table: String,
}

impl PostgresStore {
    /// Connects to `url` and creates `table` if it does not exist.
    pub async fn connect(url: &str, table: &str) -> Result<Self> {
        if !is_sql_identifier(table) {
            return Err(KeyroleError::config(format!(
                "'{table}' is not a valid table name"
            )));
        }

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(10))
            .connect(url)
            .await
            .map_err(|e| KeyroleError::backend_with_source(BACKEND, "connect failed", e))?;

        let store = Self {
            pool,
            table: table.to_string(),
        };
        store.initialize_schema().await?;
        info!(table = %store.table, "Connected to PostgreSQL");
        Ok(store)
    }

    async fn initialize_schema(&self) -> Result<()> {
        sqlx::query(&create_table_sql(&self.table))
            .execute(&self.pool)
            .await
            .map_err(|e| KeyroleError::backend_with_source(BACKEND, "failed to create table", e))?;
        Ok(())
    }
}

/// `CREATE TABLE IF NOT EXISTS` statement for the config table.
#[must_use]
pub fn create_table_sql(table: &str) -> String {
    format!(
        r"CREATE TABLE IF NOT EXISTS {table} (
            server_id BIGINT PRIMARY KEY,
            channel_id BIGINT,
            keyword TEXT,
            role_id BIGINT,
            log_channel_id BIGINT
        )"
    )
}

/// Upsert statement that writes exactly `fields`.
///
/// `$1` is the server id; the fields follow as `$2..` in the given order.
#[must_use]
pub fn build_upsert_sql(table: &str, fields: &[Field]) -> String {
    let columns: Vec<&str> = fields.iter().map(|f| f.name()).collect();
    let placeholders: Vec<String> = (2..=fields.len() + 1).map(|i| format!("${i}")).collect();
    let updates: Vec<String> = columns
        .iter()
        .map(|c| format!("{c} = EXCLUDED.{c}"))
        .collect();

    let mut sql = format!("INSERT INTO {table} (server_id");
    for column in &columns {
        sql.push_str(", ");
        sql.push_str(column);
    }
    sql.push_str(") VALUES ($1");
    for placeholder in &placeholders {
        sql.push_str(", ");
        sql.push_str(placeholder);
    }
    sql.push_str(") ON CONFLICT (server_id) ");
    if updates.is_empty() {
        sql.push_str("DO NOTHING");
    } else {
        sql.push_str("DO UPDATE SET ");
        sql.push_str(&updates.join(", "));
    }
    sql
}

fn config_from_row(row: &PgRow) -> Result<ServerConfig> {
    let id = |field: Field| -> Result<Option<u64>> {
        let value: Option<i64> = row.try_get(field.name()).map_err(|e| {
            KeyroleError::backend_with_source(BACKEND, format!("bad column {}", field.name()), e)
        })?;
        Ok(value.and_then(snowflake_from_i64))
    };
    let keyword: Option<String> = row
        .try_get(Field::Keyword.name())
        .map_err(|e| KeyroleError::backend_with_source(BACKEND, "bad column keyword", e))?;

    Ok(ServerConfig {
        channel_id: id(Field::ChannelId)?.map(ChannelId),
        keyword,
        role_id: id(Field::RoleId)?.map(RoleId),
        log_channel_id: id(Field::LogChannelId)?.map(ChannelId),
    })
}

/// `server_id` for `guild`, or `None` when the id does not fit `BIGINT`.
fn row_key(guild: GuildId) -> Option<i64> {
    i64::try_from(guild.get()).ok()
}

#[async_trait]
impl ConfigStore for PostgresStore {
    fn backend(&self) -> BackendKind {
        BackendKind::Postgres
    }

    async fn get(&self, guild: GuildId) -> Result<ServerConfig> {
        let Some(key) = row_key(guild) else {
            debug!(%guild, "Server id cannot be stored, no row can exist");
            return Ok(ServerConfig::default());
        };
        let sql = format!(
            "SELECT channel_id, keyword, role_id, log_channel_id FROM {} WHERE server_id = $1",
            self.table
        );
        let row = sqlx::query(&sql)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| KeyroleError::backend_with_source(BACKEND, "select failed", e))?;

        row.as_ref()
            .map_or_else(|| Ok(ServerConfig::default()), config_from_row)
    }

    async fn set(&self, guild: GuildId, patch: &ConfigPatch) -> Result<()> {
        if patch.is_empty() {
            return Ok(());
        }
        let values = patch.bind_values()?;
        let fields: Vec<Field> = values.iter().map(|(field, _)| *field).collect();
        let sql = build_upsert_sql(&self.table, &fields);

        let mut query = sqlx::query(&sql).bind(snowflake_to_i64(guild.get())?);
        for (_, value) in values {
            query = match value {
                FieldValue::Id(id) => query.bind(id),
                FieldValue::Text(text) => query.bind(text),
            };
        }
        query
            .execute(&self.pool)
            .await
            .map_err(|e| KeyroleError::backend_with_source(BACKEND, "upsert failed", e))?;

        debug!(%guild, ?fields, "Config written");
        Ok(())
    }

    async fn ping(&self) -> Result<Duration> {
        let started = Instant::now();
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| KeyroleError::backend_with_source(BACKEND, "ping failed", e))?;
        Ok(started.elapsed())
    }
}
