//! Poise framework setup and command registration logic.

use crate::reply::{PoiseReplies, Responder};
use keyrole_common::GuildId;
use keyrole_config::Settings;
use keyrole_store::ConfigStore;
use poise::CreateReply;
use std::sync::Arc;
use tracing::{error, warn};

/// Told to users who lack Manage Server.
pub const MISSING_PERMISSION_MESSAGE: &str =
    "This command requires the Manage Server permission.";

/// Told to users when a command fails unexpectedly.
pub const GENERIC_FAILURE_MESSAGE: &str = "An unexpected error occurred.";

/// Application data accessible in all commands.
pub struct Data {
    /// Per-server configuration.
    pub store: Arc<dyn ConfigStore>,
    /// Process settings.
    pub settings: Arc<Settings>,
}

impl std::fmt::Debug for Data {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Data")
            .field("store", &self.store.backend())
            .field("settings", &"<Settings>")
            .finish()
    }
}

/// Application error type for commands.
pub type Error = Box<dyn std::error::Error + Send + Sync>;

/// Command context type.
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Server the command was invoked in.
pub(crate) fn invoking_guild(ctx: Context<'_>) -> Option<GuildId> {
    ctx.guild_id().map(|id| GuildId(id.get()))
}

/// Every slash command the bot registers.
#[must_use]
pub fn commands() -> Vec<poise::Command<Data, Error>> {
    vec![
        crate::set_channel::set_channel(),
        crate::set_config::set_config(),
        crate::set_log_channel::set_log_channel(),
        crate::show_config::show_config(),
        crate::ping::ping(),
    ]
}

/// Framework options with commands and error handling filled in.
///
/// The caller supplies the event handler.
#[must_use]
pub fn framework_options() -> poise::FrameworkOptions<Data, Error> {
    poise::FrameworkOptions {
        commands: commands(),
        on_error: |error| Box::pin(on_error(error)),
        ..Default::default()
    }
}

/// Global error handler for the framework
pub async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::MissingUserPermissions { ctx, .. } => {
            warn!(
                command = %ctx.command().qualified_name,
                user = %ctx.author().id,
                "Rejected command from user without Manage Server"
            );
            reply_ephemeral(ctx, MISSING_PERMISSION_MESSAGE).await;
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!(
                command = %ctx.command().qualified_name,
                error = %error,
                "Command failed"
            );
            reply_ephemeral(ctx, GENERIC_FAILURE_MESSAGE).await;
        }
        poise::FrameworkError::Setup { error, .. } => {
            error!(error = %error, "Framework setup failed");
        }
        poise::FrameworkError::EventHandler { error, event, .. } => {
            error!(event = event.snake_case_name(), error = %error, "Event handler failed");
        }
        other => {
            if let Err(e) = poise::builtins::on_error(other).await {
                error!(error = %e, "Error while handling framework error");
            }
        }
    }
}

async fn reply_ephemeral(ctx: Context<'_>, content: &str) {
    let reply = CreateReply::default().content(content).ephemeral(true);
    if let Err(e) = ctx.send(reply).await {
        warn!(error = %e, "Could not deliver error reply");
    }
}

/// Acknowledges the invocation and returns the reply handle.
pub(crate) async fn acknowledge(ctx: Context<'_>) -> Responder<PoiseReplies<'_>> {
    Responder::acknowledge(PoiseReplies::new(ctx)).await
}
