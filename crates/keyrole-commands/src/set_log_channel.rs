//! `/set_log_channel`: choose where audit entries are posted.

use crate::framework::{acknowledge, invoking_guild, Context, Error};
use crate::gateway::SerenityGateway;
use crate::service::{channel_mention, describe_failure, ConfigService};
use keyrole_common::ChannelId;
use poise::serenity_prelude as serenity;
use tracing::warn;

/// Sets the channel that receives role grant logs.
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "MANAGE_GUILD",
    default_member_permissions = "MANAGE_GUILD"
)]
pub async fn set_log_channel(
    ctx: Context<'_>,
    #[description = "Channel for logs"]
    #[channel_types("Text")]
    log_channel: serenity::GuildChannel,
) -> Result<(), Error> {
    let responder = acknowledge(ctx).await;
    let Some(guild) = invoking_guild(ctx) else {
        return Ok(());
    };
    let channel = ChannelId(log_channel.id.get());

    let gateway = SerenityGateway::new(ctx.serenity_context().clone());
    let service = ConfigService::new(ctx.data().store.as_ref(), &gateway);
    match service.set_log_channel(guild, channel).await {
        Ok(()) => {
            responder
                .say(format!("Logs will be sent to {}.", channel_mention(channel)))
                .await;
        }
        Err(e) => {
            warn!(%guild, error = %e, "Failed to set log channel");
            responder.say(describe_failure(&e)).await;
        }
    }
    Ok(())
}
