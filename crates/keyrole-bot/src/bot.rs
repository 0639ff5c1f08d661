//! Core bot logic using the Poise framework.

use crate::error::BotResult;
use crate::watcher::{InboundMessage, MessageWatcher};
use keyrole_commands::{framework_options, Data, Error, SerenityGateway};
use keyrole_config::Settings;
use keyrole_store::ConfigStore;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Gateway intents the bot needs: commands, message content and member roles.
#[must_use]
pub fn intents() -> serenity::GatewayIntents {
    serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT
        | serenity::GatewayIntents::GUILD_MEMBERS
}

/// Main bot structure.
pub struct KeyroleBot {
    settings: Arc<Settings>,
    store: Arc<dyn ConfigStore>,
}

impl KeyroleBot {
    /// Creates a new bot instance.
    pub fn new(settings: Settings, store: Arc<dyn ConfigStore>) -> Self {
        Self {
            settings: Arc::new(settings),
            store,
        }
    }

    /// Connects to Discord and runs until shutdown.
    pub async fn start(&self) -> BotResult<()> {
        let settings = Arc::clone(&self.settings);
        let store = Arc::clone(&self.store);

        let mut options = framework_options();
        options.event_handler = |ctx, event, framework, data| {
            Box::pin(event_handler(ctx, event, framework, data))
        };

        let framework = poise::Framework::builder()
            .options(options)
            .setup(move |ctx, ready, framework| {
                Box::pin(async move {
                    info!(user = %ready.user.name, guilds = ready.guilds.len(), "Bot connected");
                    let commands = &framework.options().commands;
                    if settings.discord.register_globally {
                        poise::builtins::register_globally(ctx, commands).await?;
                        info!(count = commands.len(), "Slash commands registered globally");
                    } else {
                        for guild in &ready.guilds {
                            poise::builtins::register_in_guild(ctx, commands, guild.id).await?;
                        }
                        info!(count = commands.len(), "Slash commands registered per server");
                    }
                    Ok(Data { store, settings })
                })
            })
            .build();

        let mut client = serenity::ClientBuilder::new(&self.settings.discord.token, intents())
            .framework(framework)
            .await?;

        let shard_manager = client.shard_manager.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
                return;
            }
            info!("Received shutdown signal, disconnecting");
            shard_manager.shutdown_all().await;
        });

        client.start().await?;
        info!("Bot has shut down");
        Ok(())
    }
}

/// Central event handler for Discord events
async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Ready { data_about_bot } => {
            info!(user = %data_about_bot.user.name, "Ready");
        }
        serenity::FullEvent::Message { new_message } => {
            let gateway = SerenityGateway::new(ctx.clone());
            let watcher =
                MessageWatcher::new(data.store.as_ref(), &gateway, &data.settings.watcher);
            let outcome = watcher.handle(&InboundMessage::from(new_message)).await;
            debug!(message = %new_message.id, ?outcome, "Message processed");
        }
        _ => {}
    }
    Ok(())
}
