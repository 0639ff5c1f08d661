//! Main entry point for keyrole.

use anyhow::Result;
use clap::Parser;
use keyrole_bot::{keep_alive, KeyroleBot};
use keyrole_common::{init_logging, LoggingConfig};
use keyrole_config::{ConfigLoader, LoadReport};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info, warn};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, env = "KEYROLE_CONFIG")]
    config: Option<PathBuf>,

    /// Log level, overriding the settings file
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let started = Instant::now();
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let LoadReport {
        mut settings,
        problems,
    } = ConfigLoader::load_reporting(args.config.as_deref());
    if let Some(level) = args.log_level {
        settings.logging.level = level;
    }
    let (_log_guard, logging_problem) = match init_logging(&settings.logging) {
        Ok(guard) => (guard, None),
        Err(e) => (init_logging(&LoggingConfig::default()).ok().flatten(), Some(e)),
    };

    info!(version = env!("CARGO_PKG_VERSION"), "Starting keyrole");
    if let Some(e) = logging_problem {
        error!(error = %e, "Configured logging failed, logging to stdout");
    }
    for problem in &problems {
        error!(error = %problem, "Ignored invalid setting");
    }

    let keep_alive_task = settings.keep_alive.enabled.then(|| {
        let keep_alive_settings = settings.keep_alive.clone();
        tokio::spawn(async move {
            if let Err(e) = keep_alive::serve(keep_alive_settings, started).await {
                error!(error = %e, "Keep-alive server stopped");
            }
        })
    });

    let missing = settings.missing_credentials();
    for variable in &missing {
        error!(variable, "Required setting is not set, not connecting to Discord");
    }
    if !missing.is_empty() || !problems.is_empty() {
        if !problems.is_empty() {
            error!(count = problems.len(), "Settings are invalid, not connecting to Discord");
        }
        if keep_alive_task.is_some() {
            warn!("Serving keep-alive endpoints only until shutdown");
            tokio::signal::ctrl_c().await?;
        }
        return Ok(());
    }

    let store = keyrole_store::connect(&settings.store).await;
    let bot = KeyroleBot::new(settings, store);

    if let Err(e) = bot.start().await {
        error!(error = %e, "Bot failed to start");
        return Err(e.into());
    }

    Ok(())
}
