//! Audit entries posted to a server's configured log channel.

use crate::gateway::GuildGateway;
use keyrole_common::{ChannelId, GuildId};
use keyrole_store::ConfigStore;
use tracing::{debug, warn};

/// How an audit entry is coloured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Green.
    Success,
    /// Red.
    Failure,
    /// Blue.
    Info,
}

impl Severity {
    /// Embed colour as `0xRRGGBB`.
    #[must_use]
    pub const fn colour(self) -> u32 {
        match self {
            Self::Success => 0x002E_CC71,
            Self::Failure => 0x00E7_4C3C,
            Self::Info => 0x0034_98DB,
        }
    }
}

/// One line in the audit log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    /// Embed title.
    pub title: String,
    /// Embed body.
    pub description: String,
    /// Embed colour.
    pub severity: Severity,
}

impl AuditEntry {
    /// A new entry.
    pub fn new(title: impl Into<String>, description: impl Into<String>, severity: Severity) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity,
        }
    }
}

/// What [`LogNotifier::notify`] ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// Posted to the log channel.
    Sent(ChannelId),
    /// No log channel configured.
    NotConfigured,
    /// The configured log channel no longer exists.
    ChannelMissing(ChannelId),
    /// The store could not be read.
    StoreFailed,
    /// Posting failed; logged locally.
    SendFailed(ChannelId),
}

/// Posts audit entries to the log channel of a server, when one is set.
///
/// Never fails: every problem is logged and folded into a [`NotifyOutcome`].
pub struct LogNotifier<'a> {
    store: &'a dyn ConfigStore,
    gateway: &'a dyn GuildGateway,
}

impl<'a> LogNotifier<'a> {
    /// A notifier reading log channels from `store`.
    pub fn new(store: &'a dyn ConfigStore, gateway: &'a dyn GuildGateway) -> Self {
        Self { store, gateway }
    }

    /// Posts `entry` to the log channel of `guild`.
    pub async fn notify(&self, guild: GuildId, entry: &AuditEntry) -> NotifyOutcome {
        let config = match self.store.get(guild).await {
            Ok(config) => config,
            Err(e) => {
                warn!(%guild, error = %e, "Could not read log channel");
                return NotifyOutcome::StoreFailed;
            }
        };
        let Some(channel) = config.log_channel_id else {
            debug!(%guild, "No log channel configured");
            return NotifyOutcome::NotConfigured;
        };

        match self.gateway.channel(guild, channel).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                debug!(%guild, %channel, "Log channel no longer exists");
                return NotifyOutcome::ChannelMissing(channel);
            }
            Err(e) => {
                warn!(%guild, %channel, error = %e, "Could not resolve log channel");
                return NotifyOutcome::ChannelMissing(channel);
            }
        }

        match self.gateway.post_embed(channel, entry).await {
            Ok(()) => NotifyOutcome::Sent(channel),
            Err(e) => {
                warn!(%guild, %channel, error = %e, "Failed to post audit entry");
                NotifyOutcome::SendFailed(channel)
            }
        }
    }
}
