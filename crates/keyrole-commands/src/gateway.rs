//! The Discord operations handlers depend on, behind a trait.

use crate::notifier::AuditEntry;
use async_trait::async_trait;
use keyrole_common::{ChannelId, GuildId, KeyroleError, Result, RoleId, UserId};
use poise::serenity_prelude as serenity;
use ::serenity::http::HttpError;
use ::serenity::model::ModelError;
use serenity::{CreateEmbed, CreateMessage, Timestamp};
use std::collections::HashMap;
use std::num::NonZeroU64;
use std::time::Duration;
use tracing::{debug, warn};

/// A role as seen by the handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleInfo {
    /// Role id.
    pub id: RoleId,
    /// Display name.
    pub name: String,
    /// Position in the server's role list; higher outranks lower.
    pub position: u16,
}

impl From<&serenity::Role> for RoleInfo {
    fn from(role: &serenity::Role) -> Self {
        Self {
            id: RoleId(role.id.get()),
            name: role.name.clone(),
            position: role.position,
        }
    }
}

/// A channel as seen by the handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    /// Channel id.
    pub id: ChannelId,
    /// Display name.
    pub name: String,
}

/// Lookups and side effects against one Discord server.
#[async_trait]
pub trait GuildGateway: Send + Sync {
    /// Resolves a role, `None` if it no longer exists.
    async fn role(&self, guild: GuildId, role: RoleId) -> Result<Option<RoleInfo>>;

    /// Resolves a channel, `None` if it no longer exists.
    async fn channel(&self, guild: GuildId, channel: ChannelId) -> Result<Option<ChannelInfo>>;

    /// Position of the bot's highest role. `0` when it only has `@everyone`.
    async fn bot_top_role_position(&self, guild: GuildId) -> Result<u16>;

    /// Roles currently held by `user`.
    async fn member_roles(&self, guild: GuildId, user: UserId) -> Result<Vec<RoleId>>;

    /// Adds `role` to `user`.
    async fn grant_role(&self, guild: GuildId, user: UserId, role: RoleId) -> Result<()>;

    /// Posts an audit embed to `channel`.
    async fn post_embed(&self, channel: ChannelId, entry: &AuditEntry) -> Result<()>;

    /// Posts `content` to `channel` and deletes it after `ttl`.
    async fn post_transient(&self, channel: ChannelId, content: &str, ttl: Duration)
        -> Result<()>;
}

/// [`GuildGateway`] over a live serenity context. Reads the cache first and
/// falls back to HTTP.
#[derive(Clone)]
pub struct SerenityGateway {
    ctx: serenity::Context,
}

impl std::fmt::Debug for SerenityGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerenityGateway").finish_non_exhaustive()
    }
}

impl SerenityGateway {
    /// Wraps a serenity context.
    #[must_use]
    pub fn new(ctx: serenity::Context) -> Self {
        Self { ctx }
    }

    async fn roles(&self, guild: serenity::GuildId) -> Result<HashMap<serenity::RoleId, RoleInfo>> {
        let cached = self.ctx.cache.guild(guild).map(|g| {
            g.roles
                .iter()
                .map(|(id, role)| (*id, RoleInfo::from(role)))
                .collect::<HashMap<_, _>>()
        });
        if let Some(roles) = cached {
            return Ok(roles);
        }

        debug!(%guild, "Roles not cached, fetching over HTTP");
        let roles = guild
            .roles(&self.ctx.http)
            .await
            .map_err(|e| classify(e, "fetch roles"))?;
        Ok(roles
            .iter()
            .map(|(id, role)| (*id, RoleInfo::from(role)))
            .collect())
    }
}

fn nonzero(id: u64) -> Result<NonZeroU64> {
    NonZeroU64::new(id).ok_or_else(|| KeyroleError::malformed("snowflake id is zero"))
}

fn to_guild(id: GuildId) -> Result<serenity::GuildId> {
    nonzero(id.get()).map(serenity::GuildId::from)
}

fn to_channel(id: ChannelId) -> Result<serenity::ChannelId> {
    nonzero(id.get()).map(serenity::ChannelId::from)
}

fn to_role(id: RoleId) -> Result<serenity::RoleId> {
    nonzero(id.get()).map(serenity::RoleId::from)
}

fn to_user(id: UserId) -> Result<serenity::UserId> {
    nonzero(id.get()).map(serenity::UserId::from)
}

/// Maps a serenity failure onto the error taxonomy.
///
/// HTTP 403 and model-level permission checks become `PermissionDenied`.
#[must_use]
pub fn classify(error: ::serenity::Error, action: &str) -> KeyroleError {
    let status = match &error {
        ::serenity::Error::Http(http) => http_status(http),
        _ => None,
    };
    let forbidden = status == Some(403)
        || matches!(
            &error,
            ::serenity::Error::Model(ModelError::InvalidPermissions { .. } | ModelError::Hierarchy)
        );

    if forbidden {
        KeyroleError::permission_denied(format!("{action}: {error}"))
    } else {
        KeyroleError::discord_with_source(format!("{action} failed"), status, error)
    }
}

fn http_status(error: &HttpError) -> Option<u16> {
    error.status_code().map(|code| code.as_u16())
}

#[async_trait]
impl GuildGateway for SerenityGateway {
    async fn role(&self, guild: GuildId, role: RoleId) -> Result<Option<RoleInfo>> {
        let role = to_role(role)?;
        Ok(self.roles(to_guild(guild)?).await?.remove(&role))
    }

    async fn channel(&self, guild: GuildId, channel: ChannelId) -> Result<Option<ChannelInfo>> {
        let guild = to_guild(guild)?;
        let channel = to_channel(channel)?;

        let cached = self.ctx.cache.guild(guild).map(|g| {
            g.channels.get(&channel).map(|c| ChannelInfo {
                id: ChannelId(c.id.get()),
                name: c.name.clone(),
            })
        });
        if let Some(found) = cached {
            return Ok(found);
        }

        let channels = guild
            .channels(&self.ctx.http)
            .await
            .map_err(|e| classify(e, "fetch channels"))?;
        Ok(channels.get(&channel).map(|c| ChannelInfo {
            id: ChannelId(c.id.get()),
            name: c.name.clone(),
        }))
    }

    async fn bot_top_role_position(&self, guild: GuildId) -> Result<u16> {
        let guild = to_guild(guild)?;
        let bot_id = self.ctx.cache.current_user().id;
        let member = guild
            .member(&self.ctx, bot_id)
            .await
            .map_err(|e| classify(e, "fetch bot member"))?;
        let roles = self.roles(guild).await?;

        Ok(member
            .roles
            .iter()
            .filter_map(|id| roles.get(id))
            .map(|role| role.position)
            .max()
            .unwrap_or(0))
    }

    async fn member_roles(&self, guild: GuildId, user: UserId) -> Result<Vec<RoleId>> {
        let member = to_guild(guild)?
            .member(&self.ctx, to_user(user)?)
            .await
            .map_err(|e| classify(e, "fetch member"))?;
        Ok(member.roles.iter().map(|id| RoleId(id.get())).collect())
    }

    async fn grant_role(&self, guild: GuildId, user: UserId, role: RoleId) -> Result<()> {
        self.ctx
            .http
            .add_member_role(
                to_guild(guild)?,
                to_user(user)?,
                to_role(role)?,
                Some("Keyword role grant"),
            )
            .await
            .map_err(|e| classify(e, "grant role"))
    }

    async fn post_embed(&self, channel: ChannelId, entry: &AuditEntry) -> Result<()> {
        let embed = CreateEmbed::new()
            .title(&entry.title)
            .description(&entry.description)
            .colour(entry.severity.colour())
            .timestamp(Timestamp::now());
        to_channel(channel)?
            .send_message(&self.ctx.http, CreateMessage::new().embed(embed))
            .await
            .map_err(|e| classify(e, "post audit entry"))?;
        Ok(())
    }

    async fn post_transient(
        &self,
        channel: ChannelId,
        content: &str,
        ttl: Duration,
    ) -> Result<()> {
        let channel = to_channel(channel)?;
        let message = channel
            .say(&self.ctx.http, content)
            .await
            .map_err(|e| classify(e, "post notice"))?;

        let http = self.ctx.http.clone();
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            if let Err(e) = channel.delete_message(&http, message.id).await {
                warn!(%channel, error = %e, "Failed to delete transient notice");
            }
        });
        Ok(())
    }
}
