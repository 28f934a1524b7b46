use watcher_core::{
    ConfigError, CoreError, Disposition, ErrorExt, ErrorReporter, ParseError, RedditApiError,
    SendError, StorageError, TelegramError,
};

#[test]
fn test_error_codes() {
    let parse_error = CoreError::Parse(ParseError::new("May Confirmed Trade Thread"));
    assert_eq!(parse_error.error_code(), "PARSE");

    let storage_error = CoreError::Storage(StorageError::Backend {
        message: "disk full".to_string(),
    });
    assert_eq!(storage_error.error_code(), "STORAGE");

    let send_error = CoreError::Send(SendError::Timeout);
    assert_eq!(send_error.error_code(), "SEND");

    let reddit_error = CoreError::RedditApi(RedditApiError::InvalidToken);
    assert_eq!(reddit_error.error_code(), "REDDIT_API");

    let config_error = CoreError::Config(ConfigError::MissingField {
        field: "telegram.token".to_string(),
    });
    assert_eq!(config_error.error_code(), "CONFIG");
}

#[test]
fn test_parse_error_message() {
    let error = ParseError::new("May Confirmed Trade Thread");
    assert_eq!(error.to_string(), "not parsable: May Confirmed Trade Thread");

    let wrapped: CoreError = error.into();
    assert_eq!(
        wrapped.to_string(),
        "Unable to parse title: not parsable: May Confirmed Trade Thread"
    );
}

#[test]
fn test_dispositions() {
    let parse_error = CoreError::Parse(ParseError::new(""));
    assert_eq!(parse_error.disposition(), Disposition::Drop);

    let unknown = CoreError::UnknownCategory {
        category: "buying".to_string(),
    };
    assert_eq!(unknown.disposition(), Disposition::Drop);

    let storage_error = CoreError::Storage(StorageError::Backend {
        message: "disk full".to_string(),
    });
    assert_eq!(storage_error.disposition(), Disposition::Continue);

    let send_error = CoreError::Send(SendError::Rejected {
        user_id: 1,
        description: "Forbidden: bot was blocked by the user".to_string(),
    });
    assert_eq!(send_error.disposition(), Disposition::Continue);

    let unauthorized = CoreError::Telegram(TelegramError::Unauthorized);
    assert_eq!(unauthorized.disposition(), Disposition::Fatal);

    let rate_limited = CoreError::RedditApi(RedditApiError::RateLimitExceeded { retry_after: 60 });
    assert_eq!(rate_limited.disposition(), Disposition::Continue);
}

#[test]
fn test_user_friendly_messages() {
    let reddit_error = CoreError::RedditApi(RedditApiError::InvalidToken);
    let message = reddit_error.user_friendly_message();
    assert!(message.contains("authentication token is invalid"));

    let config_error = CoreError::Config(ConfigError::MissingField {
        field: "telegram.token".to_string(),
    });
    let message = config_error.user_friendly_message();
    assert!(message.contains("telegram.token"));
}

#[test]
fn test_error_reporter() {
    let reporter = ErrorReporter::new();

    let error = CoreError::Send(SendError::Timeout);
    assert_eq!(reporter.report(&error), Disposition::Continue);

    let error = CoreError::Telegram(TelegramError::Conflict);
    assert_eq!(reporter.report(&error), Disposition::Fatal);

    let error = CoreError::UnknownCategory {
        category: "meta".to_string(),
    };
    assert_eq!(reporter.report(&error), Disposition::Drop);
}
