pub mod api;
pub mod scanner;


pub use api::{RedditListing, RedditPostData};
pub use scanner::PostScanner;

use api::{RedditErrorBody, REDDIT_WEB_BASE};
use oauth2::basic::BasicClient;
use oauth2::reqwest::async_http_client;
use oauth2::{AuthUrl, ClientId, ClientSecret, TokenResponse, TokenUrl};
use reqwest::{Client, Response, StatusCode};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use url::Url;
use watcher_core::{CoreError, RedditApiError};

const REDDIT_API_BASE: &str = "https://oauth.reddit.com";
const REDDIT_AUTH_URL: &str = "https://www.reddit.com/api/v1/authorize";
const REDDIT_TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";

/// Refresh tokens a little before Reddit expires them.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone)]
struct AccessToken {
    secret: String,
    expires_at: Instant,
}

impl AccessToken {
    fn is_fresh(&self) -> bool {
        Instant::now() + TOKEN_EXPIRY_MARGIN < self.expires_at
    }
}

/// Read-only access to subreddit listings.
///
/// Without credentials the public JSON endpoints are used. With an app's
/// client id and secret an application-only token is fetched through the
/// OAuth2 client-credentials grant and requests go to the OAuth host.
pub struct RedditClient {
    http_client: Client,
    user_agent: String,
    oauth: Option<BasicClient>,
    token: Mutex<Option<AccessToken>>,
}

impl RedditClient {
    pub fn new(user_agent: String, credentials: Option<RedditCredentials>) -> Result<Self, CoreError> {
        let http_client = Client::builder()
            .user_agent(&user_agent)
            .timeout(Duration::from_secs(30))
            .build()?;

        let oauth = credentials
            .map(|credentials| {
                let auth_url = AuthUrl::new(REDDIT_AUTH_URL.to_string());
                let token_url = TokenUrl::new(REDDIT_TOKEN_URL.to_string());
                match (auth_url, token_url) {
                    (Ok(auth_url), Ok(token_url)) => Ok(BasicClient::new(
                        ClientId::new(credentials.client_id),
                        Some(ClientSecret::new(credentials.client_secret)),
                        auth_url,
                        Some(token_url),
                    )),
                    (Err(e), _) | (_, Err(e)) => Err(RedditApiError::AuthenticationFailed {
                        reason: format!("invalid OAuth endpoint: {}", e),
                    }),
                }
            })
            .transpose()?;

        Ok(Self {
            http_client,
            user_agent,
            oauth,
            token: Mutex::new(None),
        })
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn uses_oauth(&self) -> bool {
        self.oauth.is_some()
    }

    /// Current bearer token, fetching a new one when needed. `None` in
    /// anonymous mode.
    pub async fn access_token(&self) -> Result<Option<String>, CoreError> {
        let Some(oauth) = &self.oauth else {
            return Ok(None);
        };

        let mut token = self.token.lock().await;
        if let Some(current) = token.as_ref().filter(|t| t.is_fresh()) {
            return Ok(Some(current.secret.clone()));
        }

        debug!("Requesting application-only Reddit token");
        let response = oauth
            .exchange_client_credentials()
            .request_async(async_http_client)
            .await
            .map_err(|e| {
                error!("Reddit token request failed: {}", e);
                RedditApiError::AuthenticationFailed {
                    reason: e.to_string(),
                }
            })?;

        let fresh = AccessToken {
            secret: response.access_token().secret().clone(),
            expires_at: Instant::now()
                + response.expires_in().unwrap_or(Duration::from_secs(3600)),
        };
        info!("Obtained Reddit token valid for {:?}", fresh.expires_at - Instant::now());

        let secret = fresh.secret.clone();
        *token = Some(fresh);
        Ok(Some(secret))
    }

    fn listing_url(&self, subreddit: &str) -> Result<Url, CoreError> {
        let (base, path) = if self.uses_oauth() {
            (REDDIT_API_BASE, format!("/r/{}/new", subreddit))
        } else {
            (REDDIT_WEB_BASE, format!("/r/{}/new.json", subreddit))
        };

        Url::parse(base)
            .and_then(|base| base.join(&path))
            .map_err(|e| CoreError::InvalidInput {
                message: format!("bad subreddit {}: {}", subreddit, e),
            })
    }

    pub async fn make_request(
        &self,
        url: Url,
        query_params: &[(&str, String)],
    ) -> Result<Response, CoreError> {
        let mut request_builder = self.http_client.get(url.clone()).query(query_params);
        if let Some(token) = self.access_token().await? {
            request_builder = request_builder.bearer_auth(token);
        }

        debug!("Making Reddit request: GET {}", url.path());
        let response = match request_builder.send().await {
            Ok(response) => response,
            Err(e) => {
                error!("Network error for GET {}: {}", url.path(), e);
                if e.is_timeout() {
                    return Err(RedditApiError::RequestTimeout.into());
                }
                return Err(CoreError::Network(e));
            }
        };

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        error!("Request failed with status: {} for {}", status, url.path());
        match status {
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|value| value.to_str().ok())
                    .and_then(|value| value.parse::<u64>().ok())
                    .unwrap_or(60);
                warn!("Rate limited, retry after {} seconds", retry_after);
                Err(RedditApiError::RateLimitExceeded { retry_after }.into())
            }
            StatusCode::UNAUTHORIZED => {
                // Force a new token on the next request.
                *self.token.lock().await = None;
                Err(RedditApiError::InvalidToken.into())
            }
            StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => {
                let reason = response
                    .json::<RedditErrorBody>()
                    .await
                    .ok()
                    .and_then(|body| body.reason.or(body.message))
                    .unwrap_or_else(|| status.to_string());
                if status == StatusCode::NOT_FOUND {
                    Err(RedditApiError::SubredditNotFound {
                        subreddit: format!("{} ({})", url.path(), reason),
                    }
                    .into())
                } else {
                    Err(RedditApiError::Forbidden {
                        resource: format!("{} ({})", url.path(), reason),
                    }
                    .into())
                }
            }
            _ if status.is_server_error() => Err(RedditApiError::ServerError {
                status_code: status.as_u16(),
            }
            .into()),
            _ => Err(RedditApiError::InvalidResponse {
                details: format!("unexpected status {}", status),
            }
            .into()),
        }
    }

    /// Newest posts of `subreddit`, newest first.
    pub async fn get_new_posts(
        &self,
        subreddit: &str,
        limit: u32,
    ) -> Result<Vec<RedditPostData>, CoreError> {
        let url = self.listing_url(subreddit)?;
        let params = [("limit", limit.to_string()), ("raw_json", "1".to_string())];

        let response = self.make_request(url, &params).await?;
        let listing: RedditListing<RedditPostData> = response.json().await.map_err(|e| {
            error!("Failed to parse subreddit posts: {}", e);
            RedditApiError::InvalidResponse {
                details: format!("Failed to parse posts for r/{}", subreddit),
            }
        })?;

        debug!(
            "Retrieved {} posts from r/{}",
            listing.data.children.len(),
            subreddit
        );
        Ok(listing.into_items())
    }
}
