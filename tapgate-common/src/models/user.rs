use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A Telegram user the bot has seen at least once. Keyed by the platform's
/// numeric user id; the username is refreshed on every contact.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    pub user_id: i64,
    pub username: Option<String>,
    pub first_seen: DateTime<Utc>,
}
