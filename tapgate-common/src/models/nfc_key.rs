use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Lifecycle of a key: `new` until the first successful claim, `claimed`
/// afterwards, `revoked` terminally. No transition leaves `revoked`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyStatus {
    New,
    Claimed,
    Revoked,
}

impl KeyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyStatus::New => "new",
            KeyStatus::Claimed => "claimed",
            KeyStatus::Revoked => "revoked",
        }
    }
}

impl std::str::FromStr for KeyStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "new" => Ok(KeyStatus::New),
            "claimed" => Ok(KeyStatus::Claimed),
            "revoked" => Ok(KeyStatus::Revoked),
            other => Err(Error::Parse(format!("unknown key status '{}'", other))),
        }
    }
}

/// One physical NFC tag's redemption right. `assigned_user_id` is set at most
/// once; revocation flips the status but never clears the owner.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NfcKey {
    pub code: String,
    pub product_id: Option<String>,
    pub assigned_user_id: Option<i64>,
    pub status: KeyStatus,
    pub created_at: DateTime<Utc>,
    pub claimed_at: Option<DateTime<Utc>>,
}

impl NfcKey {
    pub fn new(code: &str, product_id: Option<&str>) -> Self {
        Self {
            code: code.to_string(),
            product_id: product_id.map(String::from),
            assigned_user_id: None,
            status: KeyStatus::New,
            created_at: Utc::now(),
            claimed_at: None,
        }
    }
}
