use serde::{Deserialize, Serialize};
use watcher_core::Post;

pub const REDDIT_WEB_BASE: &str = "https://www.reddit.com";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListing<T> {
    pub kind: String,
    pub data: RedditListingData<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingData<T> {
    pub children: Vec<RedditListingChild<T>>,
    pub after: Option<String>,
    pub before: Option<String>,
    #[serde(default)]
    pub dist: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingChild<T> {
    pub kind: String,
    pub data: T,
}

impl<T> RedditListing<T> {
    pub fn into_items(self) -> Vec<T> {
        self.data.children.into_iter().map(|child| child.data).collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RedditPostData {
    pub id: String,
    /// Fullname, e.g. `t3_abc123`.
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub selftext: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub subreddit: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub permalink: String,
    #[serde(default)]
    pub created_utc: f64,
    #[serde(default)]
    pub stickied: bool,
    #[serde(default)]
    pub is_self: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RedditErrorBody {
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl From<RedditPostData> for Post {
    fn from(post_data: RedditPostData) -> Self {
        let permalink = if post_data.permalink.starts_with('/') {
            format!("{}{}", REDDIT_WEB_BASE, post_data.permalink)
        } else {
            post_data.permalink
        };

        Self {
            id: post_data.id,
            title: post_data.title,
            self_text: post_data.selftext,
            url: post_data.url,
            permalink,
        }
    }
}
