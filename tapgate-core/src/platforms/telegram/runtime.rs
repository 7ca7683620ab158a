use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::error;

use crate::platforms::telegram::client::{TelegramClient, TelegramUpdate};
use crate::services::command_service::CommandService;
use crate::Error;

const POLL_TIMEOUT_SECS: u64 = 30;
const RETRY_BACKOFF_SECS: u64 = 5;

/// Long-poll loop pulling updates from Telegram and handing each message to
/// the command service. A failed update is logged and skipped; the loop
/// itself only ends when the task is dropped.
pub struct TelegramRuntime {
    client: Arc<TelegramClient>,
    commands: Arc<CommandService>,
}

impl TelegramRuntime {
    pub fn new(client: Arc<TelegramClient>, commands: Arc<CommandService>) -> Self {
        Self { client, commands }
    }

    pub async fn run(&self) -> Result<(), Error> {
        let mut offset: i64 = 0;
        loop {
            let updates = match self.client.get_updates(offset, POLL_TIMEOUT_SECS).await {
                Ok(u) => u,
                Err(e) => {
                    error!("getUpdates failed: {:?}", e);
                    sleep(Duration::from_secs(RETRY_BACKOFF_SECS)).await;
                    continue;
                }
            };

            for update in updates {
                offset = offset.max(update.update_id + 1);
                if let Err(e) = self.handle_update(update).await {
                    error!("Error handling update: {:?}", e);
                }
            }
        }
    }

    async fn handle_update(&self, update: TelegramUpdate) -> Result<(), Error> {
        let Some(message) = update.message else {
            return Ok(());
        };
        let (Some(from), Some(text)) = (message.from, message.text) else {
            return Ok(());
        };

        let replies = self.commands.handle_message(&from, &text).await?;
        for reply in replies {
            self.client.send_message(message.chat.id, &reply).await?;
        }
        Ok(())
    }
}
