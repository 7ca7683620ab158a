//! tapgate-server/src/context.rs
//!
//! Wires the database, repositories, services and the Telegram client into
//! one bag of references the binary runs from.

use std::sync::Arc;

use tracing::info;

use tapgate_common::config::AppConfig;
use tapgate_core::db::Database;
use tapgate_core::platforms::telegram::TelegramClient;
use tapgate_core::repositories::{
    SqliteAccessLogRepository, SqliteNfcKeyRepository, SqliteUserRepository,
};
use tapgate_core::services::{ClaimService, CommandService, KeyAdminService};
use tapgate_core::Error;

pub struct ServerContext {
    pub config: AppConfig,
    pub db: Database,
    pub telegram: Arc<TelegramClient>,
    pub command_service: Arc<CommandService>,
}

impl ServerContext {
    pub async fn new(config: AppConfig) -> Result<Self, Error> {
        let db = Database::new(&config.db_path).await?;
        db.migrate().await?;

        let user_repo = Arc::new(SqliteUserRepository::new(db.pool().clone()));
        let key_repo = Arc::new(SqliteNfcKeyRepository::new(db.pool().clone()));
        let log_repo = Arc::new(SqliteAccessLogRepository::new(db.pool().clone()));

        let claims = Arc::new(ClaimService::new(key_repo.clone(), log_repo.clone()));
        let key_admin = Arc::new(KeyAdminService::new(key_repo, log_repo));

        let telegram = Arc::new(TelegramClient::new(&config.bot_token, config.target_chat_id));
        let me = telegram.get_me().await?;
        let bot_username = me
            .username
            .ok_or_else(|| Error::Platform("Bot account has no username".to_string()))?;
        info!("Authenticated to Telegram as @{}", bot_username);

        let command_service = Arc::new(CommandService::new(
            config.clone(),
            bot_username,
            user_repo,
            claims,
            key_admin,
            telegram.clone(),
        ));

        Ok(Self {
            config,
            db,
            telegram,
            command_service,
        })
    }
}
