use crate::{TelegramClient, Update};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use watcher_core::{CoreError, Disposition, ErrorReporter, IncomingCommand, TelegramError};

const ERROR_PAUSE: Duration = Duration::from_secs(5);

/// Long-polls `getUpdates` and forwards each text message as a command.
pub struct UpdatePoller {
    client: TelegramClient,
    poll_timeout_secs: u64,
    offset: i64,
}

impl UpdatePoller {
    pub fn new(client: TelegramClient, poll_timeout_secs: u64) -> Self {
        Self {
            client,
            poll_timeout_secs,
            offset: 0,
        }
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// Advances the offset past `updates` and extracts the text messages.
    /// Updates without text (stickers, joins, edits) are acknowledged and
    /// dropped.
    pub fn commands_from(&mut self, updates: Vec<Update>) -> Vec<IncomingCommand> {
        let mut commands = Vec::new();
        for update in updates {
            self.offset = self.offset.max(update.update_id + 1);

            let Some(message) = update.message else {
                debug!("Skipping update {} without a message", update.update_id);
                continue;
            };
            match message.text {
                Some(text) => commands.push(IncomingCommand {
                    user_id: message.chat.id,
                    text,
                }),
                None => debug!("Skipping non-text message from chat {}", message.chat.id),
            }
        }
        commands
    }

    pub async fn run(mut self, commands: mpsc::Sender<IncomingCommand>) -> Result<(), CoreError> {
        let reporter = ErrorReporter::new();
        info!("Listening for Telegram commands");

        loop {
            match self.client.get_updates(self.offset, self.poll_timeout_secs).await {
                Ok(updates) => {
                    for command in self.commands_from(updates) {
                        if commands.send(command).await.is_err() {
                            info!("Command channel closed, poller stopping");
                            return Ok(());
                        }
                    }
                }
                // Long poll expired on our side; nothing arrived.
                Err(CoreError::Telegram(TelegramError::RequestTimeout)) => {}
                Err(e) => {
                    if reporter.report(&e) == Disposition::Fatal {
                        return Err(e);
                    }
                    warn!("Retrying getUpdates in {:?}", ERROR_PAUSE);
                    sleep(ERROR_PAUSE).await;
                }
            }

            if commands.is_closed() {
                return Ok(());
            }
        }
    }
}
