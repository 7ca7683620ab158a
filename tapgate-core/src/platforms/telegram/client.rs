use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::platforms::{InviteIssuer, InviteLink};
use crate::Error;

/// Thin wrapper over the handful of Telegram Bot API methods the bot uses.
pub struct TelegramClient {
    token: String,
    target_chat_id: i64,
    http_client: Client,
}

/// Envelope every Bot API response arrives in.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramMessage {
    pub from: Option<TelegramUser>,
    pub chat: TelegramChat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramUpdate {
    pub update_id: i64,
    pub message: Option<TelegramMessage>,
}

/// JSON shape for `createChatInviteLink` results; we only need the URL.
#[derive(Debug, Deserialize)]
struct ChatInviteLinkJson {
    invite_link: String,
}

impl TelegramClient {
    pub fn new(token: &str, target_chat_id: i64) -> Self {
        Self {
            token: token.to_string(),
            target_chat_id,
            http_client: Client::new(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("https://api.telegram.org/bot{}/{}", self.token, method)
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: Value) -> Result<T, Error> {
        let resp = self
            .http_client
            .post(self.method_url(method))
            .json(&body)
            .send()
            .await?;

        let parsed: ApiResponse<T> = resp.json().await?;
        if !parsed.ok {
            let description = parsed
                .description
                .unwrap_or_else(|| "no description".to_string());
            return Err(Error::Platform(format!(
                "Telegram {} failed: {}",
                method, description
            )));
        }
        parsed
            .result
            .ok_or_else(|| Error::Platform(format!("Telegram {} returned no result", method)))
    }

    pub async fn get_me(&self) -> Result<TelegramUser, Error> {
        self.call("getMe", json!({})).await
    }

    /// Long-polls for new updates. Blocks up to `timeout_secs` server-side.
    pub async fn get_updates(
        &self,
        offset: i64,
        timeout_secs: u64,
    ) -> Result<Vec<TelegramUpdate>, Error> {
        self.call(
            "getUpdates",
            json!({
                "offset": offset,
                "timeout": timeout_secs,
                "allowed_updates": ["message"],
            }),
        )
        .await
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), Error> {
        let _: Value = self
            .call(
                "sendMessage",
                json!({
                    "chat_id": chat_id,
                    "text": text,
                    "parse_mode": "HTML",
                }),
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl InviteIssuer for TelegramClient {
    async fn create_invite(
        &self,
        label: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<InviteLink, Error> {
        let link: ChatInviteLinkJson = self
            .call(
                "createChatInviteLink",
                json!({
                    "chat_id": self.target_chat_id,
                    "name": label,
                    "expire_date": expires_at.timestamp(),
                    "member_limit": 1,
                    "creates_join_request": false,
                }),
            )
            .await?;

        Ok(InviteLink {
            url: link.invite_link,
            expires_at,
        })
    }
}
