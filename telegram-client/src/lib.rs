pub mod api;
pub mod poller;


pub use api::{ApiResponse, Chat, Message, Update, User};
pub use poller::UpdatePoller;

use api::{GetUpdatesRequest, SendMessageRequest};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error, warn};
use watcher_core::{CoreError, Notifier, SendError, TelegramConfig, TelegramError, UserId};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Thin Bot API client. Cloning shares the underlying connection pool.
#[derive(Clone)]
pub struct TelegramClient {
    http_client: Client,
    api_base: String,
    token: String,
}

impl TelegramClient {
    pub fn new(config: &TelegramConfig) -> Result<Self, CoreError> {
        let http_client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http_client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    async fn call<B, T>(
        &self,
        method: &str,
        body: &B,
        timeout: Duration,
    ) -> Result<T, CoreError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!("Calling Bot API method {}", method);
        let response = self
            .http_client
            .post(self.method_url(method))
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CoreError::Telegram(TelegramError::RequestTimeout)
                } else {
                    // The URL carries the token; keep it out of the logs.
                    CoreError::Network(e.without_url())
                }
            })?;

        let status = response.status();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::NOT_FOUND => {
                return Err(TelegramError::Unauthorized.into());
            }
            StatusCode::CONFLICT => return Err(TelegramError::Conflict.into()),
            _ => {}
        }

        let envelope: ApiResponse<T> = response.json().await.map_err(|e| {
            error!("Failed to parse {} response: {}", method, e);
            TelegramError::InvalidResponse {
                details: format!("{} returned status {}", method, status),
            }
        })?;

        if !envelope.ok {
            let code = envelope.error_code.unwrap_or(i64::from(status.as_u16()));
            let description = envelope
                .description
                .unwrap_or_else(|| "no description".to_string());
            if let Some(retry_after) = envelope.parameters.and_then(|p| p.retry_after) {
                warn!("Bot API asked to retry {} after {}s", method, retry_after);
            }
            return Err(TelegramError::Api { code, description }.into());
        }

        envelope.result.ok_or_else(|| {
            TelegramError::InvalidResponse {
                details: format!("{} returned no result", method),
            }
            .into()
        })
    }

    /// Identity of the bot. Used at startup to verify the token.
    pub async fn get_me(&self) -> Result<User, CoreError> {
        self.call("getMe", &serde_json::json!({}), REQUEST_TIMEOUT)
            .await
    }

    /// Long-polls for updates with `update_id >= offset`.
    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>, CoreError> {
        let request = GetUpdatesRequest {
            offset,
            timeout: timeout_secs,
            allowed_updates: vec!["message".to_string()],
        };
        self.call(
            "getUpdates",
            &request,
            Duration::from_secs(timeout_secs) + REQUEST_TIMEOUT,
        )
        .await
    }

    pub async fn send_html(&self, chat_id: i64, text: &str) -> Result<Message, CoreError> {
        let request = SendMessageRequest {
            chat_id,
            text,
            parse_mode: "HTML",
            disable_web_page_preview: true,
        };
        self.call("sendMessage", &request, REQUEST_TIMEOUT).await
    }
}

#[async_trait]
impl Notifier for TelegramClient {
    async fn send_message(&self, user_id: UserId, text: &str) -> Result<(), SendError> {
        match self.send_html(user_id, text).await {
            Ok(_) => Ok(()),
            Err(e) => Err(to_send_error(user_id, e)),
        }
    }
}

fn to_send_error(user_id: UserId, error: CoreError) -> SendError {
    match error {
        CoreError::Network(e) => SendError::Network(e),
        CoreError::Telegram(TelegramError::RequestTimeout) => SendError::Timeout,
        CoreError::Telegram(TelegramError::Api { code, description }) => SendError::Rejected {
            user_id,
            description: format!("{} ({})", description, code),
        },
        other => SendError::Rejected {
            user_id,
            description: other.to_string(),
        },
    }
}
