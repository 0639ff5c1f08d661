//! `/ping`: gateway latency and a store round trip.

use crate::framework::{acknowledge, Context, Error};
use keyrole_common::KeyroleError;
use std::time::Duration;

/// Checks that the bot and its storage respond.
#[poise::command(slash_command)]
pub async fn ping(ctx: Context<'_>) -> Result<(), Error> {
    let responder = acknowledge(ctx).await;

    let gateway = ctx.ping().await;
    let store = ctx.data().store.as_ref();
    let store_ping = if store.is_available() {
        Some(store.ping().await)
    } else {
        None
    };

    responder.say(format_ping(gateway, store_ping)).await;
    Ok(())
}

/// Renders the `/ping` reply. `store` is `None` when storage is disabled.
#[must_use]
pub fn format_ping(gateway: Duration, store: Option<Result<Duration, KeyroleError>>) -> String {
    let gateway = if gateway.is_zero() {
        "N/A".to_string()
    } else {
        millis(gateway)
    };
    let database = match store {
        None => "N/A".to_string(),
        Some(Ok(elapsed)) => millis(elapsed),
        Some(Err(_)) => "failed".to_string(),
    };
    format!("Pong!\nDiscord gateway: {gateway}\nDatabase: {database}")
}

fn millis(duration: Duration) -> String {
    format!("{:.2}ms", duration.as_secs_f64() * 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_ping() {
        let text = format_ping(Duration::from_millis(42), Some(Ok(Duration::from_micros(1500))));
        assert!(text.contains("Discord gateway: 42.00ms"));
        assert!(text.contains("Database: 1.50ms"));
    }

    #[test]
    fn test_format_ping_without_store() {
        let text = format_ping(Duration::ZERO, None);
        assert!(text.contains("Discord gateway: N/A"));
        assert!(text.contains("Database: N/A"));

        let failed = format_ping(
            Duration::from_millis(1),
            Some(Err(KeyroleError::backend("mongo", "timeout"))),
        );
        assert!(failed.ends_with("Database: failed"));
    }
}
