use crate::{RedditClient, RedditPostData};
use std::collections::{HashSet, VecDeque};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use watcher_core::{CoreError, Disposition, ErrorReporter, Post, RedditApiError, RedditConfig};

/// How many post ids are remembered for de-duplication.
const SEEN_CAPACITY: usize = 500;

const MAX_BACKOFF: Duration = Duration::from_secs(300);
const JITTER_FACTOR: f64 = 0.1;

/// Polls a subreddit's newest posts and forwards each unseen one exactly
/// once, oldest first.
///
/// The first successful poll only primes the seen set so a restart does not
/// replay the whole front page.
pub struct PostScanner {
    client: RedditClient,
    subreddit: String,
    limit: u32,
    poll_interval: Duration,
    primed: bool,
    seen_order: VecDeque<String>,
    seen: HashSet<String>,
}

impl PostScanner {
    pub fn new(client: RedditClient, config: &RedditConfig) -> Self {
        Self {
            client,
            subreddit: config.subreddit.clone(),
            limit: config.limit,
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            primed: false,
            seen_order: VecDeque::with_capacity(SEEN_CAPACITY),
            seen: HashSet::with_capacity(SEEN_CAPACITY),
        }
    }

    pub fn subreddit(&self) -> &str {
        &self.subreddit
    }

    /// Filters a newest-first listing down to posts not forwarded before,
    /// returned oldest first.
    pub fn fresh_posts(&mut self, listing: Vec<RedditPostData>) -> Vec<Post> {
        let mut fresh = Vec::new();
        for post_data in listing.into_iter().rev() {
            if post_data.stickied || self.seen.contains(&post_data.id) {
                continue;
            }
            self.remember(post_data.id.clone());
            fresh.push(Post::from(post_data));
        }

        if !self.primed {
            self.primed = true;
            debug!("Primed r/{} with {} existing posts", self.subreddit, fresh.len());
            return Vec::new();
        }
        fresh
    }

    fn remember(&mut self, id: String) {
        if self.seen_order.len() == SEEN_CAPACITY {
            if let Some(oldest) = self.seen_order.pop_front() {
                self.seen.remove(&oldest);
            }
        }
        self.seen.insert(id.clone());
        self.seen_order.push_back(id);
    }

    pub async fn poll_once(&mut self) -> Result<Vec<Post>, CoreError> {
        let listing = self.client.get_new_posts(&self.subreddit, self.limit).await?;
        Ok(self.fresh_posts(listing))
    }

    /// Polls until the receiver goes away or an error leaves nothing to
    /// retry.
    pub async fn run(mut self, posts: mpsc::Sender<Post>) -> Result<(), CoreError> {
        let reporter = ErrorReporter::new();
        let mut failures = 0u32;
        info!(
            "Watching r/{} every {:?} ({})",
            self.subreddit,
            self.poll_interval,
            if self.client.uses_oauth() { "oauth" } else { "anonymous" }
        );

        loop {
            let delay = match self.poll_once().await {
                Ok(fresh) => {
                    failures = 0;
                    for post in fresh {
                        debug!("New post {}: {}", post.id, post.title);
                        if posts.send(post).await.is_err() {
                            info!("Post channel closed, scanner stopping");
                            return Ok(());
                        }
                    }
                    next_delay(self.poll_interval, 0)
                }
                Err(e) => {
                    if reporter.report(&e) == Disposition::Fatal {
                        return Err(e);
                    }
                    failures = failures.saturating_add(1);
                    match e {
                        CoreError::RedditApi(RedditApiError::RateLimitExceeded { retry_after }) => {
                            Duration::from_secs(retry_after)
                        }
                        _ => next_delay(self.poll_interval, failures),
                    }
                }
            };

            if posts.is_closed() {
                return Ok(());
            }
            if failures > 0 {
                warn!("Polling r/{} again in {:?}", self.subreddit, delay);
            }
            sleep(delay).await;
        }
    }
}

/// Poll interval doubled for each consecutive failure, with a little jitter.
pub fn next_delay(interval: Duration, failures: u32) -> Duration {
    let base = interval
        .saturating_mul(2u32.saturating_pow(failures.min(16)))
        .min(MAX_BACKOFF.max(interval));

    let jitter_range = (base.as_millis() as f64 * JITTER_FACTOR) as u64;
    let jitter = fastrand::u64(0..=jitter_range);
    base + Duration::from_millis(jitter)
}
