use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{error, info};

use tapgate_common::config::AppConfig;
use tapgate_common::models::nfc_key::NfcKey;
use tapgate_common::traits::repository_traits::UserRepository;

use crate::platforms::telegram::client::TelegramUser;
use crate::platforms::{InviteIssuer, InviteLink};
use crate::services::claim_service::{ClaimOutcome, ClaimService};
use crate::services::key_admin_service::KeyAdminService;
use crate::Error;

/// Telegram rejects messages over 4096 characters; stay under with headroom
/// for the HTML wrapper.
const MAX_REPLY_CHARS: usize = 3900;

const DEFAULT_LOG_LIMIT: i64 = 20;
const DEFAULT_GEN_COUNT: usize = 10;

/// Routes inbound messages to the claim engine, re-issuance and the admin
/// operations, and renders the replies. Every sender is upserted into the
/// users table on contact.
pub struct CommandService {
    config: AppConfig,
    bot_username: String,
    user_repo: Arc<dyn UserRepository + Send + Sync>,
    claims: Arc<ClaimService>,
    key_admin: Arc<KeyAdminService>,
    issuer: Arc<dyn InviteIssuer + Send + Sync>,
}

impl CommandService {
    pub fn new(
        config: AppConfig,
        bot_username: String,
        user_repo: Arc<dyn UserRepository + Send + Sync>,
        claims: Arc<ClaimService>,
        key_admin: Arc<KeyAdminService>,
        issuer: Arc<dyn InviteIssuer + Send + Sync>,
    ) -> Self {
        Self {
            config,
            bot_username,
            user_repo,
            claims,
            key_admin,
            issuer,
        }
    }

    /// Handles one inbound message and returns the reply lines to send.
    /// Non-command chatter is ignored.
    pub async fn handle_message(
        &self,
        from: &TelegramUser,
        text: &str,
    ) -> Result<Vec<String>, Error> {
        self.user_repo
            .upsert(from.id, from.username.as_deref())
            .await?;

        let Some((command, args)) = split_command(text) else {
            return Ok(Vec::new());
        };

        match command {
            "/start" => self.cmd_start(from, args).await,
            "/access" => self.cmd_access(from).await,
            "/gen" => self.admin_gated(from, self.cmd_gen(args)).await,
            "/revoke" => self.admin_gated(from, self.cmd_revoke(args)).await,
            "/who" => self.admin_gated(from, self.cmd_who(args)).await,
            "/logs" => self.admin_gated(from, self.cmd_logs(args)).await,
            _ => Ok(Vec::new()),
        }
    }

    async fn admin_gated(
        &self,
        from: &TelegramUser,
        fut: impl Future<Output = Result<Vec<String>, Error>>,
    ) -> Result<Vec<String>, Error> {
        if !self.config.is_admin(from.id) {
            return Ok(vec![
                "This command is available to administrators only.".to_string(),
            ]);
        }
        fut.await
    }

    async fn cmd_start(&self, from: &TelegramUser, args: &str) -> Result<Vec<String>, Error> {
        let code = args.trim();
        if code.is_empty() {
            return Ok(vec![
                "Hi! This is a private club.\n\n\
                 If you have an NFC tag, tap it and follow the link it opens.\n\
                 Already an owner? Send /access to request entry."
                    .to_string(),
            ]);
        }

        let outcome = self.claims.attempt_claim(code, from.id).await?;
        let reply = match outcome {
            ClaimOutcome::NotFound => {
                "<b>Code not found.</b> Check the URL from your NFC tag or contact support."
                    .to_string()
            }
            ClaimOutcome::RejectedRevoked => {
                "This key has been <b>revoked</b>. Please contact support.".to_string()
            }
            ClaimOutcome::RejectedOwnedByOther => {
                "This code is already bound to another owner. \
                 If you believe this is a mistake, contact support."
                    .to_string()
            }
            ClaimOutcome::GrantedNew | ClaimOutcome::GrantedExisting => {
                let label = format!("NFC {} -> @{}", code, display_name(from));
                match self.issue_invite(from, code, &label, "start_flow").await {
                    Ok(link) => {
                        let key = self.key_admin.inspect(code).await?;
                        self.render_claim_success(key.as_ref(), &link)
                    }
                    Err(e) => {
                        error!("Invite issuance failed after claim: {:?}", e);
                        "Your key checks out, but creating the invite link failed. \
                         Please try /access in a moment."
                            .to_string()
                    }
                }
            }
        };

        Ok(vec![reply])
    }

    async fn cmd_access(&self, from: &TelegramUser) -> Result<Vec<String>, Error> {
        let Some(code) = self.claims.latest_claim_for(from.id).await? else {
            return Ok(vec![
                "No key found. Scan your NFC tag (or open the link with the code parameter)."
                    .to_string(),
            ]);
        };

        let label = format!("/access {} -> @{}", code, display_name(from));
        let reply = match self.issue_invite(from, &code, &label, "access_cmd").await {
            Ok(link) => format!(
                "Your new invite link (valid {} min, 1 use):\n{}",
                self.config.invite_ttl_minutes, link.url
            ),
            Err(e) => {
                error!("Invite issuance failed on /access: {:?}", e);
                "Creating the invite link failed. Please try again in a moment.".to_string()
            }
        };

        Ok(vec![reply])
    }

    async fn cmd_gen(&self, args: &str) -> Result<Vec<String>, Error> {
        let mut parts = args.split_whitespace();
        let count = match parts.next() {
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) => n,
                Err(_) => return Ok(vec!["Usage: /gen <count> [product_id]".to_string()]),
            },
            None => DEFAULT_GEN_COUNT,
        };
        let product_id = parts.next();

        let codes = self.key_admin.generate_batch(count, product_id).await?;
        info!("Admin batch generated {} codes", codes.len());

        let base = format!("https://t.me/{}?start=", self.bot_username);
        let lines = codes
            .iter()
            .map(|c| format!("{}\t{}{}", c, base, c))
            .collect::<Vec<_>>()
            .join("\n");

        Ok(vec![clamp_reply(format!(
            "Created codes (code\turl):\n<code>{}</code>",
            lines
        ))])
    }

    async fn cmd_revoke(&self, args: &str) -> Result<Vec<String>, Error> {
        let code = args.trim();
        if code.is_empty() {
            return Ok(vec!["Usage: /revoke <code>".to_string()]);
        }
        let ok = self.key_admin.revoke(code).await?;
        Ok(vec![if ok {
            "Ok".to_string()
        } else {
            "Code not found".to_string()
        }])
    }

    async fn cmd_who(&self, args: &str) -> Result<Vec<String>, Error> {
        let code = args.trim();
        if code.is_empty() {
            return Ok(vec!["Usage: /who <code>".to_string()]);
        }
        let Some(key) = self.key_admin.inspect(code).await? else {
            return Ok(vec!["Code not found".to_string()]);
        };

        let owner = key
            .assigned_user_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());
        let claimed = key
            .claimed_at
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "-".to_string());

        Ok(vec![format!(
            "<b>Code:</b> <code>{}</code>\n\
             <b>Status:</b> {}\n\
             <b>Owner:</b> {}\n\
             <b>Product:</b> <code>{}</code>\n\
             <b>Created:</b> {}\n\
             <b>Claimed:</b> {}",
            key.code,
            key.status.as_str(),
            owner,
            key.product_id.as_deref().unwrap_or("-"),
            key.created_at.to_rfc3339(),
            claimed,
        )])
    }

    async fn cmd_logs(&self, args: &str) -> Result<Vec<String>, Error> {
        let limit = args.trim().parse::<i64>().unwrap_or(DEFAULT_LOG_LIMIT);
        let entries = self.key_admin.recent_logs(limit).await?;
        if entries.is_empty() {
            return Ok(vec!["Log is empty.".to_string()]);
        }

        let lines = entries
            .iter()
            .map(|e| {
                format!(
                    "{} | uid={} | code={} | {} | {}",
                    e.created_at.to_rfc3339(),
                    e.user_id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string()),
                    e.code.as_deref().unwrap_or("-"),
                    e.action.as_str(),
                    e.reason,
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        Ok(vec![clamp_reply(format!("<code>{}</code>", lines))])
    }

    async fn issue_invite(
        &self,
        from: &TelegramUser,
        code: &str,
        label: &str,
        flow: &str,
    ) -> Result<InviteLink, Error> {
        let expires_at = Utc::now() + Duration::minutes(self.config.invite_ttl_minutes);
        let link = self.issuer.create_invite(label, expires_at).await?;
        self.claims.log_invite_created(from.id, code, flow).await?;
        Ok(link)
    }

    fn render_claim_success(&self, key: Option<&NfcKey>, link: &InviteLink) -> String {
        let product_line = key
            .and_then(|k| k.product_id.as_deref())
            .map(|p| format!("\nProduct: <code>{}</code>", p))
            .unwrap_or_default();

        format!(
            "Key confirmed ✅{}\n\n\
             Your personal link is valid for <b>{}</b> min and <b>1</b> join:\n\
             {}\n\n\
             If it expires, use /access to get a fresh one.",
            product_line, self.config.invite_ttl_minutes, link.url
        )
    }
}

fn display_name(from: &TelegramUser) -> String {
    from.username.clone().unwrap_or_else(|| from.id.to_string())
}

/// Splits `"/cmd@botname args"` into `("/cmd", "args")`. Returns `None` for
/// plain chatter.
fn split_command(text: &str) -> Option<(&str, &str)> {
    let text = text.trim();
    if !text.starts_with('/') {
        return None;
    }
    let (cmd, rest) = text.split_once(char::is_whitespace).unwrap_or((text, ""));
    let cmd = cmd.split('@').next().unwrap_or(cmd);
    Some((cmd, rest.trim()))
}

fn clamp_reply(mut s: String) -> String {
    if s.len() > MAX_REPLY_CHARS {
        let mut cut = MAX_REPLY_CHARS;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        s.truncate(cut);
    }
    s
}
