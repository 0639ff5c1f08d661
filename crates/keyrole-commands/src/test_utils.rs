//! A recording [`GuildGateway`] for tests.

use crate::gateway::{ChannelInfo, GuildGateway, RoleInfo};
use crate::notifier::AuditEntry;
use async_trait::async_trait;
use keyrole_common::{ChannelId, GuildId, KeyroleError, Result, RoleId, UserId};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// One call made against [`FakeGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    /// `role`
    Role(RoleId),
    /// `channel`
    Channel(ChannelId),
    /// `bot_top_role_position`
    BotTopRole,
    /// `member_roles`
    MemberRoles(UserId),
    /// `grant_role`
    Grant {
        /// Member.
        user: UserId,
        /// Role.
        role: RoleId,
    },
    /// `post_embed`
    Embed {
        /// Target channel.
        channel: ChannelId,
        /// The posted entry.
        entry: AuditEntry,
    },
    /// `post_transient`
    Transient {
        /// Target channel.
        channel: ChannelId,
        /// Message text.
        content: String,
        /// Requested lifetime.
        ttl: Duration,
    },
}

impl GatewayCall {
    /// Whether the call changes anything on Discord.
    #[must_use]
    pub const fn is_side_effect(&self) -> bool {
        matches!(
            self,
            Self::Grant { .. } | Self::Embed { .. } | Self::Transient { .. }
        )
    }
}

/// In-memory server with configurable roles, channels and failures.
#[derive(Debug, Default)]
pub struct FakeGateway {
    roles: HashMap<RoleId, RoleInfo>,
    channels: HashMap<ChannelId, ChannelInfo>,
    members: Mutex<HashMap<UserId, Vec<RoleId>>>,
    bot_position: u16,
    deny_grants: bool,
    deny_posts: bool,
    calls: Mutex<Vec<GatewayCall>>,
}

impl FakeGateway {
    /// An empty server where the bot holds only `@everyone`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a role at `position`.
    #[must_use]
    pub fn with_role(mut self, id: RoleId, name: &str, position: u16) -> Self {
        self.roles.insert(
            id,
            RoleInfo {
                id,
                name: name.to_string(),
                position,
            },
        );
        self
    }

    /// Adds a channel.
    #[must_use]
    pub fn with_channel(mut self, id: ChannelId, name: &str) -> Self {
        self.channels.insert(
            id,
            ChannelInfo {
                id,
                name: name.to_string(),
            },
        );
        self
    }

    /// Gives `user` the listed roles.
    #[must_use]
    pub fn with_member(self, user: UserId, roles: Vec<RoleId>) -> Self {
        self.lock_members().insert(user, roles);
        self
    }

    /// Sets the bot's highest role position.
    #[must_use]
    pub fn with_bot_position(mut self, position: u16) -> Self {
        self.bot_position = position;
        self
    }

    /// Makes every grant fail with `PermissionDenied`.
    #[must_use]
    pub fn deny_grants(mut self) -> Self {
        self.deny_grants = true;
        self
    }

    /// Makes every post fail with `PermissionDenied`.
    #[must_use]
    pub fn deny_posts(mut self) -> Self {
        self.deny_posts = true;
        self
    }

    /// Every call so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Calls that would have changed something on Discord.
    #[must_use]
    pub fn side_effects(&self) -> Vec<GatewayCall> {
        self.calls()
            .into_iter()
            .filter(GatewayCall::is_side_effect)
            .collect()
    }

    /// `(user, role)` of every grant attempt.
    #[must_use]
    pub fn grants(&self) -> Vec<(UserId, RoleId)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                GatewayCall::Grant { user, role } => Some((user, role)),
                _ => None,
            })
            .collect()
    }

    /// Every audit entry posted, with its channel.
    #[must_use]
    pub fn embeds(&self) -> Vec<(ChannelId, AuditEntry)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                GatewayCall::Embed { channel, entry } => Some((channel, entry)),
                _ => None,
            })
            .collect()
    }

    /// Every transient notice posted.
    #[must_use]
    pub fn transients(&self) -> Vec<(ChannelId, String, Duration)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                GatewayCall::Transient {
                    channel,
                    content,
                    ttl,
                } => Some((channel, content, ttl)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: GatewayCall) {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(call);
    }

    fn lock_members(&self) -> std::sync::MutexGuard<'_, HashMap<UserId, Vec<RoleId>>> {
        self.members
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl GuildGateway for FakeGateway {
    async fn role(&self, _guild: GuildId, role: RoleId) -> Result<Option<RoleInfo>> {
        self.record(GatewayCall::Role(role));
        Ok(self.roles.get(&role).cloned())
    }

    async fn channel(&self, _guild: GuildId, channel: ChannelId) -> Result<Option<ChannelInfo>> {
        self.record(GatewayCall::Channel(channel));
        Ok(self.channels.get(&channel).cloned())
    }

    async fn bot_top_role_position(&self, _guild: GuildId) -> Result<u16> {
        self.record(GatewayCall::BotTopRole);
        Ok(self.bot_position)
    }

    async fn member_roles(&self, _guild: GuildId, user: UserId) -> Result<Vec<RoleId>> {
        self.record(GatewayCall::MemberRoles(user));
        Ok(self.lock_members().get(&user).cloned().unwrap_or_default())
    }

    async fn grant_role(&self, _guild: GuildId, user: UserId, role: RoleId) -> Result<()> {
        self.record(GatewayCall::Grant { user, role });
        if self.deny_grants {
            return Err(KeyroleError::permission_denied("missing Manage Roles"));
        }
        self.lock_members().entry(user).or_default().push(role);
        Ok(())
    }

    async fn post_embed(&self, channel: ChannelId, entry: &AuditEntry) -> Result<()> {
        self.record(GatewayCall::Embed {
            channel,
            entry: entry.clone(),
        });
        if self.deny_posts {
            return Err(KeyroleError::permission_denied("missing Send Messages"));
        }
        Ok(())
    }

    async fn post_transient(
        &self,
        channel: ChannelId,
        content: &str,
        ttl: Duration,
    ) -> Result<()> {
        self.record(GatewayCall::Transient {
            channel,
            content: content.to_string(),
            ttl,
        });
        if self.deny_posts {
            return Err(KeyroleError::permission_denied("missing Send Messages"));
        }
        Ok(())
    }
}
