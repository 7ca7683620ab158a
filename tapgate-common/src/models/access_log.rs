use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogAction {
    Attempt,
    Granted,
    Rejected,
    InviteCreated,
}

impl LogAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogAction::Attempt => "attempt",
            LogAction::Granted => "granted",
            LogAction::Rejected => "rejected",
            LogAction::InviteCreated => "invite_created",
        }
    }
}

impl std::str::FromStr for LogAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "attempt" => Ok(LogAction::Attempt),
            "granted" => Ok(LogAction::Granted),
            "rejected" => Ok(LogAction::Rejected),
            "invite_created" => Ok(LogAction::InviteCreated),
            other => Err(Error::Parse(format!("unknown log action '{}'", other))),
        }
    }
}

/// One immutable fact in the append-only access log. `id` is assigned by the
/// database on insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessLogEntry {
    pub id: i64,
    pub user_id: Option<i64>,
    pub code: Option<String>,
    pub action: LogAction,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

impl AccessLogEntry {
    pub fn new(user_id: Option<i64>, code: Option<&str>, action: LogAction, reason: &str) -> Self {
        Self {
            id: 0,
            user_id,
            code: code.map(String::from),
            action,
            reason: reason.to_string(),
            created_at: Utc::now(),
        }
    }
}
