use crate::types::UserId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Unable to parse title: {0}")]
    Parse(#[from] ParseError),

    #[error("Unknown category: {category}")]
    UnknownCategory { category: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Send error: {0}")]
    Send(#[from] SendError),

    #[error("Reddit API error: {0}")]
    RedditApi(#[from] RedditApiError),

    #[error("Telegram error: {0}")]
    Telegram(#[from] TelegramError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },
}

/// A post title that does not fit any known marketplace shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("not parsable: {title}")]
pub struct ParseError {
    pub title: String,
}

impl ParseError {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO failure on {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization failure on {key}: {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("Invalid blob key: {key}")]
    InvalidKey { key: String },

    #[error("Storage backend failure: {message}")]
    Backend { message: String },
}

#[derive(Error, Debug)]
pub enum SendError {
    #[error("Message to {user_id} rejected: {description}")]
    Rejected { user_id: UserId, description: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Request timeout")]
    Timeout,
}

#[derive(Error, Debug, Clone)]
pub enum RedditApiError {
    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Rate limit exceeded. Retry after {retry_after} seconds")]
    RateLimitExceeded { retry_after: u64 },

    #[error("Forbidden access to resource: {resource}")]
    Forbidden { resource: String },

    #[error("Subreddit not found: {subreddit}")]
    SubredditNotFound { subreddit: String },

    #[error("Invalid OAuth token")]
    InvalidToken,

    #[error("Request timeout")]
    RequestTimeout,

    #[error("Invalid API response: {details}")]
    InvalidResponse { details: String },

    #[error("Server error: {status_code}")]
    ServerError { status_code: u16 },
}

#[derive(Error, Debug, Clone)]
pub enum TelegramError {
    #[error("Bot token rejected")]
    Unauthorized,

    #[error("Bot API error {code}: {description}")]
    Api { code: i64, description: String },

    #[error("Conflicting getUpdates consumer")]
    Conflict,

    #[error("Request timeout")]
    RequestTimeout,

    #[error("Invalid API response: {details}")]
    InvalidResponse { details: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not readable: {path}: {reason}")]
    Unreadable { path: String, reason: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Configuration parsing error: {0}")]
    Parse(#[from] toml::de::Error),
}
