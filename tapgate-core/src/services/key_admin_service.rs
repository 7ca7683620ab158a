use std::sync::Arc;

use rand::Rng;
use tracing::info;

use tapgate_common::models::access_log::AccessLogEntry;
use tapgate_common::models::nfc_key::NfcKey;
use tapgate_common::traits::repository_traits::{AccessLogRepository, NfcKeyRepository};

use crate::Error;

/// Alphabet for generated codes. 36^12 possible values, so a collision on
/// insert is astronomically rare and simply retried.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const CODE_LEN: usize = 12;

/// Operator-facing key management: batch generation, revocation, inspection
/// and log paging.
pub struct KeyAdminService {
    key_repo: Arc<dyn NfcKeyRepository + Send + Sync>,
    log_repo: Arc<dyn AccessLogRepository + Send + Sync>,
}

impl KeyAdminService {
    pub fn new(
        key_repo: Arc<dyn NfcKeyRepository + Send + Sync>,
        log_repo: Arc<dyn AccessLogRepository + Send + Sync>,
    ) -> Self {
        Self { key_repo, log_repo }
    }

    /// Generates `count` fresh codes in `new` status. Uniqueness is enforced
    /// by the insert path; a rejected insert rolls a new code and tries again.
    pub async fn generate_batch(
        &self,
        count: usize,
        product_id: Option<&str>,
    ) -> Result<Vec<String>, Error> {
        let mut codes = Vec::with_capacity(count);
        for _ in 0..count {
            loop {
                let code = random_code();
                let key = NfcKey::new(&code, product_id);
                if self.key_repo.insert_new(&key).await? {
                    codes.push(code);
                    break;
                }
            }
        }
        info!("Generated {} new NFC keys", codes.len());
        Ok(codes)
    }

    /// Marks the key revoked. Terminal: there is no un-revoke.
    pub async fn revoke(&self, code: &str) -> Result<bool, Error> {
        let revoked = self.key_repo.revoke(code).await?;
        if revoked {
            info!("Revoked NFC key {}", code);
        }
        Ok(revoked)
    }

    pub async fn inspect(&self, code: &str) -> Result<Option<NfcKey>, Error> {
        self.key_repo.get(code).await
    }

    pub async fn recent_logs(&self, limit: i64) -> Result<Vec<AccessLogEntry>, Error> {
        self.log_repo.recent(limit).await
    }
}

fn random_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LEN)
        .map(|_| {
            let idx = rng.random_range(0..CODE_ALPHABET.len());
            CODE_ALPHABET[idx] as char
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_come_from_the_expected_alphabet() {
        for _ in 0..100 {
            let code = random_code();
            assert_eq!(code.len(), CODE_LEN);
            assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
        }
    }
}
