// tapgate-common/src/config.rs

use std::collections::HashSet;

/// Immutable runtime configuration, built once at startup and passed
/// explicitly to the components that need it.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Telegram bot token.
    pub bot_token: String,
    /// Chat id of the closed channel/supergroup invites point into.
    pub target_chat_id: i64,
    /// Telegram user ids allowed to run admin commands.
    pub admin_ids: HashSet<i64>,
    /// How long an issued invite link stays valid.
    pub invite_ttl_minutes: i64,
    /// Path to the SQLite database file.
    pub db_path: String,
}

impl AppConfig {
    pub fn is_admin(&self, user_id: i64) -> bool {
        self.admin_ids.contains(&user_id)
    }
}
