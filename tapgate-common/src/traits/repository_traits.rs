use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Error;
use crate::models::access_log::AccessLogEntry;
use crate::models::nfc_key::NfcKey;
use crate::models::user::User;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts the user on first contact, otherwise refreshes the username.
    /// `first_seen` is preserved across upserts.
    async fn upsert(&self, user_id: i64, username: Option<&str>) -> Result<User, Error>;

    async fn get(&self, user_id: i64) -> Result<Option<User>, Error>;
}

#[async_trait]
pub trait NfcKeyRepository: Send + Sync {
    /// Inserts a fresh key. Returns `false` when the code already exists; the
    /// uniqueness check is part of the insert itself, so concurrent
    /// generators cannot race past it.
    async fn insert_new(&self, key: &NfcKey) -> Result<bool, Error>;

    async fn get(&self, code: &str) -> Result<Option<NfcKey>, Error>;

    /// Compare-and-swap claim: binds the key to `user_id` only if it is still
    /// in `new` status with no owner. Returns `true` when this call won the
    /// transition.
    async fn try_claim(
        &self,
        code: &str,
        user_id: i64,
        claimed_at: DateTime<Utc>,
    ) -> Result<bool, Error>;

    /// Marks the key revoked regardless of its prior status. Returns `false`
    /// when the code does not exist.
    async fn revoke(&self, code: &str) -> Result<bool, Error>;

    /// Most recently claimed code owned by `user_id`, by `claimed_at`
    /// descending.
    async fn latest_claimed_for(&self, user_id: i64) -> Result<Option<String>, Error>;
}

#[async_trait]
pub trait AccessLogRepository: Send + Sync {
    async fn append(&self, entry: &AccessLogEntry) -> Result<(), Error>;

    /// Newest entries first.
    async fn recent(&self, limit: i64) -> Result<Vec<AccessLogEntry>, Error>;
}
