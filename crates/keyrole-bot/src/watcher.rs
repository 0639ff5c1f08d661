//! Grants the configured role when the keyword is posted in the watched
//! channel.

use keyrole_commands::{AuditEntry, GuildGateway, LogNotifier, NotifyOutcome, Severity};
use keyrole_common::{ChannelId, ErrorKind, GuildId, MatchPolicy, RoleId, UserId};
use keyrole_config::WatcherSettings;
use keyrole_store::ConfigStore;
use poise::serenity_prelude as serenity;
use std::time::Duration;
use tracing::{debug, info, warn};

/// The parts of a Discord message the watcher looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Server the message was posted in; `None` for DMs.
    pub guild: Option<GuildId>,
    /// Channel the message was posted in.
    pub channel: ChannelId,
    /// Author.
    pub author: UserId,
    /// Whether the author is a bot or webhook.
    pub author_is_bot: bool,
    /// Author's roles when the gateway included them.
    pub author_roles: Option<Vec<RoleId>>,
    /// Message text.
    pub content: String,
}

impl From<&serenity::Message> for InboundMessage {
    fn from(message: &serenity::Message) -> Self {
        Self {
            guild: message.guild_id.map(|id| GuildId(id.get())),
            channel: ChannelId(message.channel_id.get()),
            author: UserId(message.author.id.get()),
            author_is_bot: message.author.bot || message.webhook_id.is_some(),
            author_roles: message
                .member
                .as_ref()
                .map(|m| m.roles.iter().map(|id| RoleId(id.get())).collect()),
            content: message.content.clone(),
        }
    }
}

/// Why a message did not lead to a grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleReason {
    /// Posted outside a server.
    NotInGuild,
    /// Posted by a bot or webhook.
    AutomatedAuthor,
    /// The store could not be read.
    StoreFailed,
    /// Channel, keyword or role is not set.
    NotConfigured,
    /// Posted outside the watched channel.
    OtherChannel,
    /// Content does not match the keyword.
    NoMatch,
    /// The configured role no longer exists.
    RoleMissing,
    /// The author already holds the role.
    AlreadyHasRole,
    /// The author's roles could not be looked up.
    MemberLookupFailed,
}

/// Where a message left the watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchOutcome {
    /// A guard short-circuited.
    Idle(IdleReason),
    /// The role was granted.
    Granted {
        /// Member who received the role.
        user: UserId,
        /// Granted role.
        role: RoleId,
        /// Audit log result.
        notify: NotifyOutcome,
    },
    /// The grant was attempted and failed.
    GrantFailed {
        /// Member who should have received the role.
        user: UserId,
        /// Role that could not be granted.
        role: RoleId,
        /// Category of the failure.
        kind: ErrorKind,
        /// Audit log result.
        notify: NotifyOutcome,
    },
}

/// Evaluates one message at a time against the server's configuration.
pub struct MessageWatcher<'a> {
    store: &'a dyn ConfigStore,
    gateway: &'a dyn GuildGateway,
    policy: MatchPolicy,
    notice_ttl: Duration,
}

impl<'a> MessageWatcher<'a> {
    /// A watcher using `settings` for matching and notice lifetime.
    pub fn new(
        store: &'a dyn ConfigStore,
        gateway: &'a dyn GuildGateway,
        settings: &WatcherSettings,
    ) -> Self {
        Self {
            store,
            gateway,
            policy: settings.match_policy,
            notice_ttl: Duration::from_secs(settings.confirmation_ttl_secs),
        }
    }

    /// Runs the guards and, if they all pass, grants the role.
    pub async fn handle(&self, message: &InboundMessage) -> WatchOutcome {
        let Some(guild) = message.guild else {
            return WatchOutcome::Idle(IdleReason::NotInGuild);
        };
        if message.author_is_bot {
            return WatchOutcome::Idle(IdleReason::AutomatedAuthor);
        }

        let config = match self.store.get(guild).await {
            Ok(config) => config,
            Err(e) => {
                warn!(%guild, error = %e, "Could not read config for message");
                return WatchOutcome::Idle(IdleReason::StoreFailed);
            }
        };
        let Some(rule) = config.watch_rule() else {
            return WatchOutcome::Idle(IdleReason::NotConfigured);
        };
        if message.channel != rule.channel_id {
            return WatchOutcome::Idle(IdleReason::OtherChannel);
        }
        if !self.policy.matches(&message.content, &rule.keyword) {
            return WatchOutcome::Idle(IdleReason::NoMatch);
        }

        let role = match self.gateway.role(guild, rule.role_id).await {
            Ok(Some(role)) => role,
            Ok(None) => return WatchOutcome::Idle(IdleReason::RoleMissing),
            Err(e) => {
                warn!(%guild, role = %rule.role_id, error = %e, "Could not resolve role");
                return WatchOutcome::Idle(IdleReason::RoleMissing);
            }
        };
        let held = match &message.author_roles {
            Some(roles) => roles.clone(),
            None => match self.gateway.member_roles(guild, message.author).await {
                Ok(roles) => roles,
                Err(e) => {
                    warn!(%guild, user = %message.author, error = %e, "Could not read member roles");
                    return WatchOutcome::Idle(IdleReason::MemberLookupFailed);
                }
            },
        };
        if held.contains(&role.id) {
            return WatchOutcome::Idle(IdleReason::AlreadyHasRole);
        }

        let user = message.author;
        let mention = format!("<@{user}>");
        let notifier = LogNotifier::new(self.store, self.gateway);

        match self.gateway.grant_role(guild, user, role.id).await {
            Ok(()) => {
                info!(%guild, %user, role = %role.id, "Role granted");
                self.post_notice(
                    message.channel,
                    &format!("{mention} received the **{}** role!", role.name),
                )
                .await;
                let entry = AuditEntry::new(
                    "Role granted",
                    format!("Granted **{}** to {mention}", role.name),
                    Severity::Success,
                );
                let notify = notifier.notify(guild, &entry).await;
                WatchOutcome::Granted {
                    user,
                    role: role.id,
                    notify,
                }
            }
            Err(e) => {
                warn!(%guild, %user, role = %role.id, error = %e, "Role grant failed");
                self.post_notice(
                    message.channel,
                    &format!("Could not give {mention} the **{}** role.", role.name),
                )
                .await;
                let reason = if e.is_permission_denied() {
                    "missing permissions".to_string()
                } else {
                    e.to_string()
                };
                let entry = AuditEntry::new(
                    "Role grant failed",
                    format!("Could not grant **{}** to {mention}: {reason}", role.name),
                    Severity::Failure,
                );
                let notify = notifier.notify(guild, &entry).await;
                WatchOutcome::GrantFailed {
                    user,
                    role: role.id,
                    kind: e.kind(),
                    notify,
                }
            }
        }
    }

    async fn post_notice(&self, channel: ChannelId, content: &str) {
        if let Err(e) = self
            .gateway
            .post_transient(channel, content, self.notice_ttl)
            .await
        {
            debug!(%channel, error = %e, "Could not post notice");
        }
    }
}
