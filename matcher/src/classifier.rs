use regex::Regex;
use std::sync::LazyLock;
use watcher_core::{Category, ParseError, ParsedItem};

// [TAG] Something
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\[(vendor|artisan|gb|groupbuy|ic|interestcheck|giveaway)\]\s*(.*)$")
        .expect("tag pattern is valid")
});

// [COUNTRY-STATE] [H] Something [W] Something else
static TRADE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\[(\w+)(?:-\w+)?\]\s*\[H\]\s*(.*)\s*\[W\]\s*(.*)$")
        .expect("trade pattern is valid")
});

static PAYMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(paypal|cash)").expect("payment pattern is valid"));

fn tag_category(tag: &str) -> Option<Category> {
    match tag.to_ascii_lowercase().as_str() {
        "vendor" => Some(Category::Vendor),
        "artisan" => Some(Category::Artisan),
        "gb" | "groupbuy" => Some(Category::GroupBuy),
        "ic" | "interestcheck" => Some(Category::InterestCheck),
        "giveaway" => Some(Category::Giveaway),
        _ => None,
    }
}

/// Classifies a raw post title.
///
/// Bracket tags such as `[Vendor]` win over the trade shape
/// `[US-CA] [H] ... [W] ...`. A trade whose want side mentions a payment
/// method is a sale of the have side; anything else is a purchase of the
/// want side.
pub fn classify(title: &str) -> Result<ParsedItem, ParseError> {
    if let Some(caps) = TAG_RE.captures(title) {
        if let Some(category) = tag_category(&caps[1]) {
            return Ok(ParsedItem {
                category,
                content: caps[2].trim().to_string(),
                region: String::new(),
            });
        }
    }

    let caps = TRADE_RE
        .captures(title)
        .ok_or_else(|| ParseError::new(title))?;

    let region = caps[1].to_ascii_uppercase();
    let have = &caps[2];
    let want = &caps[3];

    if PAYMENT_RE.is_match(want) {
        Ok(ParsedItem {
            category: Category::Selling,
            content: have.trim().to_string(),
            region,
        })
    } else {
        Ok(ParsedItem {
            category: Category::Buying,
            content: want.trim().to_string(),
            region,
        })
    }
}
