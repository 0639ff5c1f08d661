//! `/show_config`: display the current settings.

use crate::framework::{acknowledge, invoking_guild, Context, Error};
use crate::gateway::SerenityGateway;
use crate::notifier::Severity;
use crate::service::{describe_failure, ConfigService, ConfigView};
use poise::serenity_prelude::CreateEmbed;
use tracing::warn;

/// Shows the current settings.
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "MANAGE_GUILD",
    default_member_permissions = "MANAGE_GUILD"
)]
pub async fn show_config(ctx: Context<'_>) -> Result<(), Error> {
    let responder = acknowledge(ctx).await;
    let Some(guild) = invoking_guild(ctx) else {
        return Ok(());
    };

    let gateway = SerenityGateway::new(ctx.serenity_context().clone());
    let service = ConfigService::new(ctx.data().store.as_ref(), &gateway);
    match service.read_config(guild).await {
        Ok(view) => responder.embed(config_embed(&view)).await,
        Err(e) => {
            warn!(%guild, error = %e, "Failed to read config");
            responder.say(describe_failure(&e)).await;
        }
    }
    Ok(())
}

fn config_embed(view: &ConfigView) -> CreateEmbed {
    view.fields().into_iter().fold(
        CreateEmbed::new()
            .title("Current settings")
            .colour(Severity::Info.colour()),
        |embed, (name, value)| embed.field(name, value, false),
    )
}
