//! Acknowledge-first replies.
//!
//! Commands defer before touching the store. If the deferral fails the
//! response window is gone, so the command still does its work but every
//! later reply is skipped.

use crate::framework::Context;
use crate::gateway::classify;
use async_trait::async_trait;
use keyrole_common::KeyroleError;
use poise::serenity_prelude::CreateEmbed;
use poise::CreateReply;
use tracing::warn;

/// One ephemeral reply.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Plain text.
    Text(String),
    /// A single embed.
    Embed(CreateEmbed),
}

/// Where an invocation's acknowledgment and replies go.
#[async_trait]
pub trait ReplySink: Send + Sync {
    /// Invoked command name, for logs.
    fn command_name(&self) -> String;

    /// Defers the interaction as ephemeral.
    async fn defer(&self) -> Result<(), KeyroleError>;

    /// Delivers one reply.
    async fn send(&self, reply: Reply) -> Result<(), KeyroleError>;
}

/// [`ReplySink`] over a poise invocation.
pub struct PoiseReplies<'a> {
    ctx: Context<'a>,
}

impl<'a> PoiseReplies<'a> {
    /// Wraps the invocation context.
    #[must_use]
    pub const fn new(ctx: Context<'a>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl<'a> ReplySink for PoiseReplies<'a> {
    fn command_name(&self) -> String {
        self.ctx.command().qualified_name.clone()
    }

    async fn defer(&self) -> Result<(), KeyroleError> {
        self.ctx
            .defer_ephemeral()
            .await
            .map_err(|e| KeyroleError::deadline_exceeded(e.to_string()))
    }

    async fn send(&self, reply: Reply) -> Result<(), KeyroleError> {
        let builder = match reply {
            Reply::Text(content) => CreateReply::default().content(content),
            Reply::Embed(embed) => CreateReply::default().embed(embed),
        };
        self.ctx
            .send(builder.ephemeral(true))
            .await
            .map(|_| ())
            .map_err(|e| classify(e, "send reply"))
    }
}

/// Reply handle for one invocation.
pub struct Responder<S> {
    sink: S,
    acknowledged: bool,
}

impl<S: ReplySink> Responder<S> {
    /// Acknowledges through `sink`.
    pub async fn acknowledge(sink: S) -> Self {
        let acknowledged = match sink.defer().await {
            Ok(()) => true,
            Err(error) => {
                warn!(
                    command = %sink.command_name(),
                    error = %error,
                    "Could not acknowledge interaction, replies will be skipped"
                );
                false
            }
        };
        Self { sink, acknowledged }
    }

    /// Whether replies can still be delivered.
    #[must_use]
    pub const fn is_acknowledged(&self) -> bool {
        self.acknowledged
    }

    /// Sends an ephemeral text reply.
    pub async fn say(&self, content: impl Into<String>) {
        self.send(Reply::Text(content.into())).await;
    }

    /// Sends an ephemeral embed reply.
    pub async fn embed(&self, embed: CreateEmbed) {
        self.send(Reply::Embed(embed)).await;
    }

    async fn send(&self, reply: Reply) {
        if !self.acknowledged {
            return;
        }
        if let Err(e) = self.sink.send(reply).await {
            warn!(
                command = %self.sink.command_name(),
                error = %e,
                "Failed to send reply"
            );
        }
    }
}
