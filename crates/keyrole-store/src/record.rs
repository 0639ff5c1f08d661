//! The per-server configuration record and its partial-update type.

use keyrole_common::{ChannelId, KeyroleError, RoleId};
use serde::{Deserialize, Serialize};

/// Configuration of one server. Every field is optional until set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Channel the watcher listens in.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::snowflake"
    )]
    pub channel_id: Option<ChannelId>,
    /// Keyword that triggers the grant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    /// Role granted on a match.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::snowflake"
    )]
    pub role_id: Option<RoleId>,
    /// Channel audit entries are posted to.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::snowflake"
    )]
    pub log_channel_id: Option<ChannelId>,
}

/// The three fields the watcher needs, all present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchRule {
    /// Watched channel.
    pub channel_id: ChannelId,
    /// Non-empty keyword.
    pub keyword: String,
    /// Role to grant.
    pub role_id: RoleId,
}

impl ServerConfig {
    /// Whether nothing has been stored for this server.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// The watch rule, if channel, keyword and role are all set.
    #[must_use]
    pub fn watch_rule(&self) -> Option<WatchRule> {
        let keyword = self.keyword.as_deref().filter(|k| !k.is_empty())?;
        Some(WatchRule {
            channel_id: self.channel_id?,
            keyword: keyword.to_string(),
            role_id: self.role_id?,
        })
    }

    /// Merges `patch` into this record. Returns whether anything changed.
    pub fn apply(&mut self, patch: &ConfigPatch) -> bool {
        let before = self.clone();
        if let Some(channel_id) = patch.channel_id {
            self.channel_id = Some(channel_id);
        }
        if let Some(keyword) = &patch.keyword {
            self.keyword = Some(keyword.clone());
        }
        if let Some(role_id) = patch.role_id {
            self.role_id = Some(role_id);
        }
        if let Some(log_channel_id) = patch.log_channel_id {
            self.log_channel_id = Some(log_channel_id);
        }
        *self != before
    }
}

/// A stored column / document key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// `channel_id`
    ChannelId,
    /// `keyword`
    Keyword,
    /// `role_id`
    RoleId,
    /// `log_channel_id`
    LogChannelId,
}

impl Field {
    /// Every field in storage order.
    pub const ALL: [Field; 4] = [
        Field::ChannelId,
        Field::Keyword,
        Field::RoleId,
        Field::LogChannelId,
    ];

    /// Persisted name of the field.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ChannelId => "channel_id",
            Self::Keyword => "keyword",
            Self::RoleId => "role_id",
            Self::LogChannelId => "log_channel_id",
        }
    }
}

/// A value carried by a patch, in the shape backends bind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// A snowflake, already narrowed to a signed 64-bit integer.
    Id(i64),
    /// Free text.
    Text(String),
}

/// Partial update of a [`ServerConfig`]. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigPatch {
    /// New watched channel.
    pub channel_id: Option<ChannelId>,
    /// New keyword.
    pub keyword: Option<String>,
    /// New role.
    pub role_id: Option<RoleId>,
    /// New log channel.
    pub log_channel_id: Option<ChannelId>,
}

impl ConfigPatch {
    /// An empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the watched channel.
    #[must_use]
    pub fn channel(mut self, channel_id: ChannelId) -> Self {
        self.channel_id = Some(channel_id);
        self
    }

    /// Sets the keyword.
    #[must_use]
    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    /// Sets the role.
    #[must_use]
    pub fn role(mut self, role_id: RoleId) -> Self {
        self.role_id = Some(role_id);
        self
    }

    /// Sets the log channel.
    #[must_use]
    pub fn log_channel(mut self, channel_id: ChannelId) -> Self {
        self.log_channel_id = Some(channel_id);
        self
    }

    /// Whether the patch touches no field.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// The fields this patch sets, in storage order.
    #[must_use]
    pub fn fields(&self) -> Vec<Field> {
        self.entries().into_iter().map(|(field, _)| field).collect()
    }

    /// The fields this patch sets with their values, in storage order.
    ///
    /// Values are unchecked; use [`ConfigPatch::bind_values`] before handing
    /// them to a database.
    fn entries(&self) -> Vec<(Field, PatchValue<'_>)> {
        let mut entries = Vec::with_capacity(4);
        if let Some(id) = self.channel_id {
            entries.push((Field::ChannelId, PatchValue::Id(id.get())));
        }
        if let Some(keyword) = &self.keyword {
            entries.push((Field::Keyword, PatchValue::Text(keyword)));
        }
        if let Some(id) = self.role_id {
            entries.push((Field::RoleId, PatchValue::Id(id.get())));
        }
        if let Some(id) = self.log_channel_id {
            entries.push((Field::LogChannelId, PatchValue::Id(id.get())));
        }
        entries
    }

    /// The fields this patch sets with database-ready values.
    pub fn bind_values(&self) -> Result<Vec<(Field, FieldValue)>, KeyroleError> {
        self.entries()
            .into_iter()
            .map(|(field, value)| {
                let value = match value {
                    PatchValue::Id(id) => FieldValue::Id(snowflake_to_i64(id)?),
                    PatchValue::Text(text) => FieldValue::Text(text.to_string()),
                };
                Ok((field, value))
            })
            .collect()
    }
}

enum PatchValue<'a> {
    Id(u64),
    Text(&'a str),
}

/// Narrows a snowflake for databases without unsigned 64-bit integers.
pub fn snowflake_to_i64(id: u64) -> Result<i64, KeyroleError> {
    i64::try_from(id).map_err(|_| KeyroleError::malformed(format!("id {id} does not fit in BIGINT")))
}

/// Widens a stored integer back into a snowflake. Negative values are dropped.
#[must_use]
pub fn snowflake_from_i64(value: i64) -> Option<u64> {
    u64::try_from(value).ok()
}

mod lenient {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
        Other(serde_json::Value),
    }

    /// Accepts a number or numeric string; anything else reads as unset.
    pub fn snowflake<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: From<u64>,
    {
        Ok(match Option::<Raw>::deserialize(deserializer)? {
            Some(Raw::Number(n)) => Some(T::from(n)),
            Some(Raw::Text(s)) => s.trim().parse::<u64>().ok().map(T::from),
            Some(Raw::Other(_)) | None => None,
        })
    }
}
