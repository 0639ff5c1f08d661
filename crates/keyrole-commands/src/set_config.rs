//! `/set_config`: choose the keyword and the role it grants.

use crate::framework::{acknowledge, invoking_guild, Context, Error};
use crate::gateway::{RoleInfo, SerenityGateway};
use crate::service::{describe_failure, role_mention, ConfigService, KeywordRoleOutcome};
use poise::serenity_prelude as serenity;
use tracing::warn;

/// Sets the keyword and the role granted for it.
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "MANAGE_GUILD",
    default_member_permissions = "MANAGE_GUILD"
)]
pub async fn set_config(
    ctx: Context<'_>,
    #[description = "Keyword to react to"] keyword: String,
    #[description = "Role to grant"] role: serenity::Role,
) -> Result<(), Error> {
    let responder = acknowledge(ctx).await;
    let Some(guild) = invoking_guild(ctx) else {
        return Ok(());
    };
    let role = RoleInfo::from(&role);

    let gateway = SerenityGateway::new(ctx.serenity_context().clone());
    let service = ConfigService::new(ctx.data().store.as_ref(), &gateway);
    match service.set_keyword_and_role(guild, &keyword, &role).await {
        Ok(KeywordRoleOutcome::Saved { keyword, role }) => {
            responder
                .say(format!(
                    "Keyword set to **{keyword}** and role set to {}.",
                    role_mention(role)
                ))
                .await;
        }
        Ok(KeywordRoleOutcome::RoleNotBelowBot { role, .. }) => {
            responder
                .say(format!(
                    "Move my role above {} so I can grant it.",
                    role_mention(role)
                ))
                .await;
        }
        Err(e) => {
            warn!(%guild, error = %e, "Failed to set keyword and role");
            responder.say(describe_failure(&e)).await;
        }
    }
    Ok(())
}
