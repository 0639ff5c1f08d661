//! Decisions behind the configuration commands, independent of poise.

use crate::gateway::{GuildGateway, RoleInfo};
use keyrole_common::{ChannelId, ErrorKind, GuildId, KeyroleError, Result, RoleId};
use keyrole_store::{ConfigPatch, ConfigStore};
use tracing::info;

/// Shown for fields that are absent or no longer resolve.
pub const NOT_SET: &str = "Not set";

/// Result of `/set_config`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeywordRoleOutcome {
    /// Keyword and role were saved.
    Saved {
        /// Saved keyword.
        keyword: String,
        /// Saved role.
        role: RoleId,
    },
    /// The bot cannot manage the role; nothing was written.
    RoleNotBelowBot {
        /// The rejected role.
        role: RoleId,
        /// Its position.
        role_position: u16,
        /// The bot's highest role position.
        bot_position: u16,
    },
}

/// `/show_config` output, one display string per field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigView {
    /// Watched channel mention or [`NOT_SET`].
    pub channel: String,
    /// Keyword or [`NOT_SET`].
    pub keyword: String,
    /// Role mention or [`NOT_SET`].
    pub role: String,
    /// Log channel mention or [`NOT_SET`].
    pub log_channel: String,
}

impl ConfigView {
    /// `(label, value)` pairs in display order.
    #[must_use]
    pub fn fields(&self) -> [(&'static str, &str); 4] {
        [
            ("Watched channel", self.channel.as_str()),
            ("Keyword", self.keyword.as_str()),
            ("Role to grant", self.role.as_str()),
            ("Log channel", self.log_channel.as_str()),
        ]
    }
}

/// Channel mention markup.
#[must_use]
pub fn channel_mention(channel: ChannelId) -> String {
    format!("<#{channel}>")
}

/// Role mention markup.
#[must_use]
pub fn role_mention(role: RoleId) -> String {
    format!("<@&{role}>")
}

/// What the user is told when a store call fails.
#[must_use]
pub fn describe_failure(error: &KeyroleError) -> &'static str {
    match error.kind() {
        ErrorKind::BackendUnavailable => {
            "Settings storage is unavailable right now, so nothing was saved."
        }
        ErrorKind::Validation => "The keyword cannot be empty.",
        ErrorKind::PermissionDenied => "I am missing permissions for that.",
        _ => "Something went wrong while saving. Please try again later.",
    }
}

/// Configuration reads and writes for one server.
pub struct ConfigService<'a> {
    store: &'a dyn ConfigStore,
    gateway: &'a dyn GuildGateway,
}

impl<'a> ConfigService<'a> {
    /// A service over `store`, resolving names through `gateway`.
    pub fn new(store: &'a dyn ConfigStore, gateway: &'a dyn GuildGateway) -> Self {
        Self { store, gateway }
    }

    /// Sets the channel the watcher listens in.
    pub async fn set_watched_channel(&self, guild: GuildId, channel: ChannelId) -> Result<()> {
        self.store
            .set(guild, &ConfigPatch::new().channel(channel))
            .await?;
        info!(%guild, %channel, "Watched channel set");
        Ok(())
    }

    /// Sets keyword and role, provided the bot outranks the role.
    pub async fn set_keyword_and_role(
        &self,
        guild: GuildId,
        keyword: &str,
        role: &RoleInfo,
    ) -> Result<KeywordRoleOutcome> {
        if keyword.trim().is_empty() {
            return Err(KeyroleError::validation_field(
                "keyword cannot be empty",
                "keyword",
            ));
        }

        let bot_position = self.gateway.bot_top_role_position(guild).await?;
        if bot_position <= role.position {
            info!(
                %guild,
                role = %role.id,
                role_position = role.position,
                bot_position,
                "Rejected role above the bot"
            );
            return Ok(KeywordRoleOutcome::RoleNotBelowBot {
                role: role.id,
                role_position: role.position,
                bot_position,
            });
        }

        self.store
            .set(guild, &ConfigPatch::new().keyword(keyword).role(role.id))
            .await?;
        info!(%guild, role = %role.id, keyword, "Keyword and role set");
        Ok(KeywordRoleOutcome::Saved {
            keyword: keyword.to_string(),
            role: role.id,
        })
    }

    /// Sets the channel audit entries go to.
    pub async fn set_log_channel(&self, guild: GuildId, channel: ChannelId) -> Result<()> {
        self.store
            .set(guild, &ConfigPatch::new().log_channel(channel))
            .await?;
        info!(%guild, %channel, "Log channel set");
        Ok(())
    }

    /// Current settings, with dangling references shown as [`NOT_SET`].
    pub async fn read_config(&self, guild: GuildId) -> Result<ConfigView> {
        let config = self.store.get(guild).await?;

        Ok(ConfigView {
            channel: self.display_channel(guild, config.channel_id).await,
            keyword: config
                .keyword
                .filter(|k| !k.is_empty())
                .unwrap_or_else(|| NOT_SET.to_string()),
            role: self.display_role(guild, config.role_id).await,
            log_channel: self.display_channel(guild, config.log_channel_id).await,
        })
    }

    async fn display_channel(&self, guild: GuildId, channel: Option<ChannelId>) -> String {
        let Some(channel) = channel else {
            return NOT_SET.to_string();
        };
        match self.gateway.channel(guild, channel).await {
            Ok(Some(found)) => channel_mention(found.id),
            _ => NOT_SET.to_string(),
        }
    }

    async fn display_role(&self, guild: GuildId, role: Option<RoleId>) -> String {
        let Some(role) = role else {
            return NOT_SET.to_string();
        };
        match self.gateway.role(guild, role).await {
            Ok(Some(found)) => role_mention(found.id),
            _ => NOT_SET.to_string(),
        }
    }
}
