//! `/set_channel`: choose the channel the keyword is watched in.

use crate::framework::{acknowledge, invoking_guild, Context, Error};
use crate::gateway::SerenityGateway;
use crate::service::{channel_mention, describe_failure, ConfigService};
use keyrole_common::ChannelId;
use poise::serenity_prelude as serenity;
use tracing::warn;

/// Sets the channel watched for the keyword.
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "MANAGE_GUILD",
    default_member_permissions = "MANAGE_GUILD"
)]
pub async fn set_channel(
    ctx: Context<'_>,
    #[description = "Channel to watch"]
    #[channel_types("Text")]
    channel: serenity::GuildChannel,
) -> Result<(), Error> {
    let responder = acknowledge(ctx).await;
    let Some(guild) = invoking_guild(ctx) else {
        return Ok(());
    };
    let channel = ChannelId(channel.id.get());

    let gateway = SerenityGateway::new(ctx.serenity_context().clone());
    let service = ConfigService::new(ctx.data().store.as_ref(), &gateway);
    match service.set_watched_channel(guild, channel).await {
        Ok(()) => {
            responder
                .say(format!("Now watching {}.", channel_mention(channel)))
                .await;
        }
        Err(e) => {
            warn!(%guild, error = %e, "Failed to set watched channel");
            responder.say(describe_failure(&e)).await;
        }
    }
    Ok(())
}
