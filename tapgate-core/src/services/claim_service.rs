use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use tapgate_common::models::access_log::{AccessLogEntry, LogAction};
use tapgate_common::models::nfc_key::KeyStatus;
use tapgate_common::traits::repository_traits::{AccessLogRepository, NfcKeyRepository};

use crate::Error;

/// Outcome of a claim attempt. Callers branch on the variant; rejections are
/// ordinary values, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// The key was unowned and is now bound to the requesting user.
    GrantedNew,
    /// The key was already bound to the requesting user; nothing changed.
    GrantedExisting,
    /// No key exists for the presented code.
    NotFound,
    /// The key exists but has been revoked.
    RejectedRevoked,
    /// The key belongs to a different user.
    RejectedOwnedByOther,
}

impl ClaimOutcome {
    pub fn is_granted(&self) -> bool {
        matches!(self, ClaimOutcome::GrantedNew | ClaimOutcome::GrantedExisting)
    }

    /// Reason string recorded in the access log for this outcome.
    pub fn log_reason(&self) -> &'static str {
        match self {
            ClaimOutcome::GrantedNew => "claimed_new",
            ClaimOutcome::GrantedExisting => "claimed_existing",
            ClaimOutcome::NotFound => "code_not_found",
            ClaimOutcome::RejectedRevoked => "code_revoked",
            ClaimOutcome::RejectedOwnedByOther => "owned_by_another",
        }
    }
}

/// Decides whether a presented code grants access and performs the
/// NEW -> CLAIMED transition. All ownership mutation funnels through here.
pub struct ClaimService {
    key_repo: Arc<dyn NfcKeyRepository + Send + Sync>,
    log_repo: Arc<dyn AccessLogRepository + Send + Sync>,
}

impl ClaimService {
    pub fn new(
        key_repo: Arc<dyn NfcKeyRepository + Send + Sync>,
        log_repo: Arc<dyn AccessLogRepository + Send + Sync>,
    ) -> Self {
        Self { key_repo, log_repo }
    }

    /// Attempts to bind `code` to `user_id`. Every call appends an `attempt`
    /// entry and exactly one `granted`/`rejected` entry to the access log
    /// before the outcome is returned.
    pub async fn attempt_claim(&self, code: &str, user_id: i64) -> Result<ClaimOutcome, Error> {
        self.log(user_id, code, LogAction::Attempt, "claim").await?;

        let outcome = self.classify_and_claim(code, user_id).await?;

        let action = if outcome.is_granted() {
            LogAction::Granted
        } else {
            LogAction::Rejected
        };
        self.log(user_id, code, action, outcome.log_reason()).await?;

        Ok(outcome)
    }

    async fn classify_and_claim(&self, code: &str, user_id: i64) -> Result<ClaimOutcome, Error> {
        loop {
            let Some(key) = self.key_repo.get(code).await? else {
                return Ok(ClaimOutcome::NotFound);
            };

            if key.status == KeyStatus::Revoked {
                return Ok(ClaimOutcome::RejectedRevoked);
            }

            match key.assigned_user_id {
                Some(owner) if owner == user_id => return Ok(ClaimOutcome::GrantedExisting),
                Some(_) => return Ok(ClaimOutcome::RejectedOwnedByOther),
                None => {
                    // Unowned: take it with a conditional update. If a
                    // concurrent request wins the race, the update touches
                    // zero rows and we re-read against the new state. Status
                    // only moves forward, so this converges.
                    if self.key_repo.try_claim(code, user_id, Utc::now()).await? {
                        return Ok(ClaimOutcome::GrantedNew);
                    }
                    debug!("Lost claim race for code={}, re-reading", code);
                }
            }
        }
    }

    /// Most recently claimed code owned by `user_id`, if any. Read-only; used
    /// by the re-issuance path.
    pub async fn latest_claim_for(&self, user_id: i64) -> Result<Option<String>, Error> {
        self.key_repo.latest_claimed_for(user_id).await
    }

    /// Records that an invite link was issued against a code.
    pub async fn log_invite_created(
        &self,
        user_id: i64,
        code: &str,
        reason: &str,
    ) -> Result<(), Error> {
        self.log(user_id, code, LogAction::InviteCreated, reason).await
    }

    async fn log(
        &self,
        user_id: i64,
        code: &str,
        action: LogAction,
        reason: &str,
    ) -> Result<(), Error> {
        self.log_repo
            .append(&AccessLogEntry::new(Some(user_id), Some(code), action, reason))
            .await
    }
}
