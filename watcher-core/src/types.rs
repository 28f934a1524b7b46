use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Chat identifier used both as subscriber key and reply target.
pub type UserId = i64;

/// Keywords watched by a single user, with the number of hits for each.
pub type Keywords = std::collections::BTreeMap<String, u64>;

/// Matches every post of a category.
pub const WILDCARD: &str = "*";

/// Region that is always delivered, alongside posts without a region.
pub const HOME_REGION: &str = "US";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Buying,
    Selling,
    Vendor,
    Artisan,
    GroupBuy,
    InterestCheck,
    Giveaway,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Buying,
        Category::Selling,
        Category::Vendor,
        Category::Artisan,
        Category::GroupBuy,
        Category::InterestCheck,
        Category::Giveaway,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Buying => "buying",
            Category::Selling => "selling",
            Category::Vendor => "vendor",
            Category::Artisan => "artisan",
            Category::GroupBuy => "groupbuy",
            Category::InterestCheck => "interestcheck",
            Category::Giveaway => "giveaway",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_ascii_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == lowered)
            .ok_or(CoreError::UnknownCategory {
                category: s.to_string(),
            })
    }
}

/// Structured view of a post title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedItem {
    pub category: Category,
    pub content: String,
    /// Upper-case region code, empty when the title carries none.
    pub region: String,
}

impl ParsedItem {
    /// Posts without a region or from the home region are delivered;
    /// any other explicit region is suppressed.
    pub fn is_deliverable(&self) -> bool {
        self.region.is_empty() || self.region == HOME_REGION
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub self_text: String,
    pub url: String,
    pub permalink: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingCommand {
    pub user_id: UserId,
    pub text: String,
}
