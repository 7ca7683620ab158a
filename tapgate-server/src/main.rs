use std::collections::HashSet;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use tapgate_common::config::AppConfig;
use tapgate_common::Error;
use tapgate_core::platforms::telegram::TelegramRuntime;

mod context;
use context::ServerContext;

#[derive(Parser, Debug, Clone)]
#[command(name = "tapgate")]
#[command(author, version, about = "NFC-gated invite bot for a closed Telegram chat")]
struct Args {
    /// Path to the SQLite database file. Falls back to DB_PATH, then a local
    /// default.
    #[arg(long)]
    db_path: Option<String>,
}

fn require_env(key: &str) -> Result<String, Error> {
    std::env::var(key).map_err(|_| Error::Config(format!("{} is not set", key)))
}

fn load_config(args: &Args) -> Result<AppConfig, Error> {
    let bot_token = require_env("BOT_TOKEN")?;

    let target_chat_id = require_env("TARGET_CHAT_ID")?
        .parse::<i64>()
        .map_err(|e| Error::Config(format!("TARGET_CHAT_ID: {}", e)))?;

    let admin_ids = std::env::var("ADMINS")
        .unwrap_or_default()
        .split(',')
        .filter_map(|s| {
            let s = s.trim();
            (!s.is_empty()).then(|| s.parse::<i64>())
        })
        .collect::<Result<HashSet<i64>, _>>()
        .map_err(|e| Error::Config(format!("ADMINS: {}", e)))?;

    let invite_ttl_minutes = match std::env::var("INVITE_TTL_MINUTES") {
        Ok(raw) => raw
            .parse::<i64>()
            .map_err(|e| Error::Config(format!("INVITE_TTL_MINUTES: {}", e)))?,
        Err(_) => 10,
    };

    let db_path = args
        .db_path
        .clone()
        .or_else(|| std::env::var("DB_PATH").ok())
        .unwrap_or_else(|| "nfc_access.db".to_string());

    Ok(AppConfig {
        bot_token,
        target_chat_id,
        admin_ids,
        invite_ttl_minutes,
        db_path,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;

    let ctx = ServerContext::new(config).await?;
    info!("tapgate started; target chat: {}", ctx.config.target_chat_id);

    let runtime = TelegramRuntime::new(ctx.telegram.clone(), ctx.command_service.clone());
    tokio::select! {
        res = runtime.run() => {
            if let Err(e) = res {
                error!("Telegram runtime exited with error: {:?}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    Ok(())
}
