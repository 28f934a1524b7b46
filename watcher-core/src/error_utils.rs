use crate::error::*;
use tracing::{error, info, warn};

/// What the caller should do after an operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Abandon the current event and wait for the next one.
    Drop,
    /// Log and carry on with the next step of the current event.
    Continue,
    /// The process cannot make progress.
    Fatal,
}

pub trait ErrorExt {
    fn log_error(&self) -> &Self;
    fn log_warn(&self) -> &Self;
    fn disposition(&self) -> Disposition;
    fn user_friendly_message(&self) -> String;
    fn error_code(&self) -> String;
}

impl ErrorExt for CoreError {
    fn log_error(&self) -> &Self {
        error!("CoreError: {}", self);
        match self {
            CoreError::Storage(e) => {
                error!("Storage error details: {:?}", e);
            }
            CoreError::Send(e) => {
                error!("Send error details: {:?}", e);
            }
            CoreError::RedditApi(e) => {
                error!("Reddit API error details: {:?}", e);
            }
            CoreError::Telegram(e) => {
                error!("Telegram error details: {:?}", e);
            }
            CoreError::Config(e) => {
                error!("Configuration error details: {:?}", e);
            }
            _ => {}
        }
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("CoreError (warning): {}", self);
        self
    }

    fn disposition(&self) -> Disposition {
        match self {
            CoreError::Parse(_) | CoreError::UnknownCategory { .. } => Disposition::Drop,
            CoreError::InvalidInput { .. } => Disposition::Drop,

            // In-memory state stays authoritative; delivery must not stall on disk.
            CoreError::Storage(_) | CoreError::Send(_) => Disposition::Continue,

            CoreError::RedditApi(e) => match e {
                RedditApiError::AuthenticationFailed { .. }
                | RedditApiError::SubredditNotFound { .. } => Disposition::Fatal,
                _ => Disposition::Continue,
            },
            CoreError::Telegram(e) => match e {
                TelegramError::Unauthorized | TelegramError::Conflict => Disposition::Fatal,
                _ => Disposition::Continue,
            },

            CoreError::Io(_) | CoreError::Serialization(_) | CoreError::Network(_) => {
                Disposition::Continue
            }

            CoreError::Config(_) => Disposition::Fatal,
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            CoreError::Parse(e) => format!("Post skipped, {}", e),
            CoreError::UnknownCategory { category } => {
                format!("No subscriptions are kept for '{}' posts.", category)
            }
            CoreError::Storage(_) => {
                "Changes are active but could not be saved to disk.".to_string()
            }
            CoreError::Send(_) => "A chat message could not be delivered.".to_string(),
            CoreError::RedditApi(e) => e.user_friendly_message(),
            CoreError::Telegram(e) => e.user_friendly_message(),
            CoreError::Config(e) => e.user_friendly_message(),
            CoreError::Network(_) => {
                "Network connection error. Please check your internet connection.".to_string()
            }
            CoreError::InvalidInput { .. } => {
                "Invalid input provided. Please check your input and try again.".to_string()
            }
            _ => "An unexpected error occurred.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            CoreError::Parse(_) => "PARSE".to_string(),
            CoreError::UnknownCategory { .. } => "UNKNOWN_CATEGORY".to_string(),
            CoreError::Storage(_) => "STORAGE".to_string(),
            CoreError::Send(_) => "SEND".to_string(),
            CoreError::RedditApi(_) => "REDDIT_API".to_string(),
            CoreError::Telegram(_) => "TELEGRAM".to_string(),
            CoreError::Config(_) => "CONFIG".to_string(),
            CoreError::Io(_) => "IO".to_string(),
            CoreError::Serialization(_) => "SERIALIZATION".to_string(),
            CoreError::Network(_) => "NETWORK".to_string(),
            CoreError::InvalidInput { .. } => "INVALID_INPUT".to_string(),
        }
    }
}

impl RedditApiError {
    fn user_friendly_message(&self) -> String {
        match self {
            RedditApiError::AuthenticationFailed { .. } => {
                "Reddit authentication failed. Please check your credentials.".to_string()
            }
            RedditApiError::RateLimitExceeded { retry_after } => format!(
                "Too many requests. Reddit asked to wait {} seconds.",
                retry_after
            ),
            RedditApiError::SubredditNotFound { subreddit } => {
                format!("Subreddit '{}' not found or is private.", subreddit)
            }
            RedditApiError::InvalidToken => {
                "Reddit authentication token is invalid. Please re-authenticate.".to_string()
            }
            RedditApiError::RequestTimeout => "Request to Reddit timed out.".to_string(),
            _ => "Reddit API error occurred.".to_string(),
        }
    }
}

impl TelegramError {
    fn user_friendly_message(&self) -> String {
        match self {
            TelegramError::Unauthorized => {
                "Telegram rejected the bot token. Please check your configuration.".to_string()
            }
            TelegramError::Conflict => {
                "Another process is already polling updates for this bot.".to_string()
            }
            TelegramError::Api { description, .. } => format!("Telegram said: {}", description),
            _ => "Telegram API error occurred.".to_string(),
        }
    }
}

impl ConfigError {
    fn user_friendly_message(&self) -> String {
        match self {
            ConfigError::Unreadable { path, .. } => {
                format!("Configuration file '{}' could not be read.", path)
            }
            ConfigError::MissingField { field } => {
                format!("Required configuration field '{}' is missing.", field)
            }
            ConfigError::InvalidValue { field, .. } => {
                format!("Invalid value for configuration field '{}'.", field)
            }
            ConfigError::Parse(_) => {
                "Configuration file is not valid TOML. Please check its syntax.".to_string()
            }
        }
    }
}

/// Logs an error at the level its disposition calls for.
#[derive(Debug, Default, Clone, Copy)]
pub struct ErrorReporter;

impl ErrorReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn report(&self, error: &CoreError) -> Disposition {
        let disposition = error.disposition();
        match disposition {
            Disposition::Drop => info!("[{}] {}", error.error_code(), error),
            Disposition::Continue => self.report_warning(error),
            Disposition::Fatal => self.report_error(error),
        }
        disposition
    }

    pub fn report_error(&self, error: &CoreError) {
        error.log_error();
        info!("Error code: {}", error.error_code());
        info!("User message: {}", error.user_friendly_message());
    }

    pub fn report_warning(&self, error: &CoreError) {
        error.log_warn();
    }
}
