// tests/services_tests.rs
//
// Command routing and key administration against a real database, with a
// stub invite issuer standing in for Telegram.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use tapgate_common::config::AppConfig;
use tapgate_common::models::nfc_key::{KeyStatus, NfcKey};
use tapgate_common::traits::repository_traits::NfcKeyRepository;
use tapgate_core::platforms::telegram::client::TelegramUser;
use tapgate_core::platforms::{InviteIssuer, InviteLink};
use tapgate_core::repositories::{
    SqliteAccessLogRepository, SqliteNfcKeyRepository, SqliteUserRepository,
};
use tapgate_core::services::{ClaimService, CommandService, KeyAdminService};
use tapgate_core::{Database, Error};

const ADMIN_ID: i64 = 99;

struct StubIssuer {
    fail: AtomicBool,
    labels: Mutex<Vec<String>>,
}

impl StubIssuer {
    fn new(fail: bool) -> Self {
        Self {
            fail: AtomicBool::new(fail),
            labels: Mutex::new(Vec::new()),
        }
    }

    fn call_count(&self) -> usize {
        self.labels.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl InviteIssuer for StubIssuer {
    async fn create_invite(
        &self,
        label: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<InviteLink, Error> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Platform("invite issuance unavailable".to_string()));
        }
        let mut labels = self.labels.lock().unwrap();
        labels.push(label.to_string());
        Ok(InviteLink {
            url: format!("https://t.me/+stub{}", labels.len()),
            expires_at,
        })
    }
}

struct Harness {
    key_repo: Arc<SqliteNfcKeyRepository>,
    key_admin: Arc<KeyAdminService>,
    issuer: Arc<StubIssuer>,
    commands: Arc<CommandService>,
    _dir: tempfile::TempDir,
}

async fn setup(issuer_fails: bool) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("test.db");
    let db = Database::new(db_path.to_str().unwrap()).await.unwrap();
    db.migrate().await.unwrap();

    let user_repo = Arc::new(SqliteUserRepository::new(db.pool().clone()));
    let key_repo = Arc::new(SqliteNfcKeyRepository::new(db.pool().clone()));
    let log_repo = Arc::new(SqliteAccessLogRepository::new(db.pool().clone()));

    let claims = Arc::new(ClaimService::new(key_repo.clone(), log_repo.clone()));
    let key_admin = Arc::new(KeyAdminService::new(key_repo.clone(), log_repo));
    let issuer = Arc::new(StubIssuer::new(issuer_fails));

    let config = AppConfig {
        bot_token: "test-token".to_string(),
        target_chat_id: -1001234567890,
        admin_ids: HashSet::from([ADMIN_ID]),
        invite_ttl_minutes: 10,
        db_path: db_path.to_string_lossy().into_owned(),
    };

    let commands = Arc::new(CommandService::new(
        config,
        "tapgate_bot".to_string(),
        user_repo,
        claims,
        key_admin.clone(),
        issuer.clone(),
    ));

    Harness {
        key_repo,
        key_admin,
        issuer,
        commands,
        _dir: dir,
    }
}

fn user(id: i64, username: &str) -> TelegramUser {
    TelegramUser {
        id,
        username: Some(username.to_string()),
        first_name: None,
    }
}

#[tokio::test]
async fn start_with_a_fresh_code_claims_and_issues_an_invite() -> Result<(), Error> {
    let h = setup(false).await;
    h.key_repo
        .insert_new(&NfcKey::new("ABC123456789", Some("sku-1")))
        .await?;

    let replies = h
        .commands
        .handle_message(&user(1, "alice"), "/start ABC123456789")
        .await?;
    assert_eq!(replies.len(), 1);
    assert!(replies[0].contains("Key confirmed"));
    assert!(replies[0].contains("https://t.me/+stub1"));
    assert!(replies[0].contains("sku-1"));
    assert_eq!(h.issuer.call_count(), 1);

    let key = h.key_repo.get("ABC123456789").await?.expect("key should exist");
    assert_eq!(key.status, KeyStatus::Claimed);
    assert_eq!(key.assigned_user_id, Some(1));
    Ok(())
}

#[tokio::test]
async fn start_with_someone_elses_code_is_refused_without_issuance() -> Result<(), Error> {
    let h = setup(false).await;
    h.key_repo.insert_new(&NfcKey::new("ABC123456789", None)).await?;

    h.commands
        .handle_message(&user(1, "alice"), "/start ABC123456789")
        .await?;
    let replies = h
        .commands
        .handle_message(&user(2, "bob"), "/start ABC123456789")
        .await?;

    assert!(replies[0].contains("another owner"));
    // Only alice's grant produced an invite.
    assert_eq!(h.issuer.call_count(), 1);
    Ok(())
}

#[tokio::test]
async fn bare_start_sends_the_greeting() -> Result<(), Error> {
    let h = setup(false).await;
    let replies = h.commands.handle_message(&user(1, "alice"), "/start").await?;
    assert!(replies[0].contains("private club"));
    assert_eq!(h.issuer.call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn issuer_failure_leaves_the_claim_in_place() -> Result<(), Error> {
    let h = setup(true).await;
    h.key_repo.insert_new(&NfcKey::new("ABC123456789", None)).await?;

    let replies = h
        .commands
        .handle_message(&user(1, "alice"), "/start ABC123456789")
        .await?;
    assert!(replies[0].contains("/access"));

    // The claim already succeeded and must not be rolled back.
    let key = h.key_repo.get("ABC123456789").await?.expect("key should exist");
    assert_eq!(key.status, KeyStatus::Claimed);
    assert_eq!(key.assigned_user_id, Some(1));

    // Once the issuer recovers, /access hands out a link without re-scanning.
    h.issuer.fail.store(false, Ordering::SeqCst);
    let replies = h.commands.handle_message(&user(1, "alice"), "/access").await?;
    assert!(replies[0].contains("https://t.me/+stub1"));
    Ok(())
}

#[tokio::test]
async fn access_without_any_claim_reports_no_key() -> Result<(), Error> {
    let h = setup(false).await;
    let replies = h.commands.handle_message(&user(5, "carol"), "/access").await?;
    assert!(replies[0].contains("No key found"));
    assert_eq!(h.issuer.call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn admin_commands_are_gated() -> Result<(), Error> {
    let h = setup(false).await;

    for cmd in ["/gen 5", "/revoke ABC123456789", "/who ABC123456789", "/logs"] {
        let replies = h.commands.handle_message(&user(1, "alice"), cmd).await?;
        assert!(
            replies[0].contains("administrators only"),
            "{} slipped past the admin gate",
            cmd
        );
    }
    Ok(())
}

#[tokio::test]
async fn gen_creates_codes_and_renders_deep_links() -> Result<(), Error> {
    let h = setup(false).await;

    let replies = h
        .commands
        .handle_message(&user(ADMIN_ID, "boss"), "/gen 3 sku-9")
        .await?;
    assert!(replies[0].contains("Created codes"));
    assert_eq!(replies[0].matches("https://t.me/tapgate_bot?start=").count(), 3);

    let bad = h
        .commands
        .handle_message(&user(ADMIN_ID, "boss"), "/gen lots")
        .await?;
    assert!(bad[0].contains("Usage"));
    Ok(())
}

#[tokio::test]
async fn generate_batch_produces_distinct_new_codes() -> Result<(), Error> {
    let h = setup(false).await;

    let first = h.key_admin.generate_batch(25, None).await?;
    let second = h.key_admin.generate_batch(25, Some("sku-2")).await?;
    assert_eq!(first.len(), 25);
    assert_eq!(second.len(), 25);

    let all: HashSet<&String> = first.iter().chain(second.iter()).collect();
    assert_eq!(all.len(), 50);

    for code in first.iter().chain(second.iter()) {
        let key = h.key_repo.get(code).await?.expect("generated key should exist");
        assert_eq!(key.status, KeyStatus::New);
        assert!(key.assigned_user_id.is_none());
    }
    Ok(())
}

#[tokio::test]
async fn revoke_who_and_logs_round_trip() -> Result<(), Error> {
    let h = setup(false).await;
    let admin = user(ADMIN_ID, "boss");
    h.key_repo.insert_new(&NfcKey::new("ABC123456789", None)).await?;

    h.commands
        .handle_message(&user(1, "alice"), "/start ABC123456789")
        .await?;

    let replies = h
        .commands
        .handle_message(&admin, "/revoke ABC123456789")
        .await?;
    assert_eq!(replies[0], "Ok");

    let missing = h.commands.handle_message(&admin, "/revoke NOPE00000000").await?;
    assert_eq!(missing[0], "Code not found");

    let who = h.commands.handle_message(&admin, "/who ABC123456789").await?;
    assert!(who[0].contains("revoked"));
    assert!(who[0].contains("Owner:</b> 1"));

    let logs = h.commands.handle_message(&admin, "/logs").await?;
    assert!(logs[0].contains("claimed_new"));
    assert!(logs[0].contains("invite_created"));
    Ok(())
}

#[tokio::test]
async fn plain_chatter_is_ignored() -> Result<(), Error> {
    let h = setup(false).await;
    let replies = h
        .commands
        .handle_message(&user(1, "alice"), "hello there")
        .await?;
    assert!(replies.is_empty());
    Ok(())
}
