//! Chat texts, rendered for Telegram's HTML parse mode.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use watcher_core::{Category, Keywords, Post, WILDCARD};

pub const UNKNOWN_COMMAND: &str = "That command doesn't look like anything to me.";

const PROJECT_URL: &str = "https://github.com/stjohnjohnson/reddit-watcher";

static BRACKET_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\[[^\]]+\])").expect("tag pattern is valid"));

const HELP_TEXT: &str = "

You can subscribe or unsubscribe to events by using the following commands:
 /buying <keyword> - something being bought
 /selling <keyword> - something being sold
 /vendor <keyword> - updates from vendors
 /artisan <keyword> - updates from artisans
 /groupbuy <keyword> - updates about group buys
 /interestcheck <keyword> - feedback about a design
 /giveaway <keyword> - something being given away

Other options:
 /items - returns list of watched items
 /stats - returns stats about the current bot
 /help - gets this help message
";

const START_TEXT: &str = "

Let's say you are looking for a new Tada68, well you can ask me to look for people selling one by saying:
 /selling tada68

If you want to be notified about the next Fugu sale, just tell me:
 /artisan fugu

What if you want to be notified about ALL artisan posts, send me this:
 /artisan

Unsubscribe at anytime by sending the same message (e.g. /selling tada68). Learn more with /help";

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn introduction(version: &str, body: &str) -> String {
    format!(
        "Hi, I'm <a href=\"{}\">mechwatch@{}</a>. I watch /r/mechmarket for specific keywords{}",
        PROJECT_URL,
        version,
        escape_html(body)
    )
}

pub fn help(version: &str) -> String {
    introduction(version, HELP_TEXT)
}

pub fn start(version: &str) -> String {
    introduction(version, START_TEXT)
}

pub fn watching(category: Category, keyword: &str) -> String {
    format!(
        "Okay, I'm going to watch for <b>{}</b> posts that match <b>{}</b>",
        category,
        escape_html(keyword)
    )
}

pub fn unwatching(category: Category, keyword: &str) -> String {
    format!(
        "I'm no longer watching for <b>{}</b> posts that match <b>{}</b>",
        category,
        escape_html(keyword)
    )
}

/// One section per category with at least one keyword.
pub fn watchlist(entries: &[(Category, Keywords)]) -> String {
    let mut lines = Vec::new();
    for (category, keywords) in entries {
        if keywords.is_empty() {
            continue;
        }
        lines.push(format!("<b>{}:</b>", category.as_str().to_uppercase()));
        for (keyword, hits) in keywords {
            lines.push(format!(" - {} <i>({} hits)</i>", escape_html(keyword), hits));
        }
        lines.push(String::new());
    }

    if lines.is_empty() {
        "There are no items on your watch list".to_string()
    } else {
        format!("These are your current watch items:\n{}", lines.join("\n"))
    }
}

pub fn stats(fields: &BTreeMap<String, String>) -> String {
    let mut lines = vec!["<b>Interesting Statistics:</b>".to_string()];
    for (field, value) in fields {
        lines.push(format!(" - {} <i>({})</i>", escape_html(field), escape_html(value)));
    }
    lines.join("\n")
}

/// Bolds every occurrence of `keyword` in the title, or the bracket tags
/// when the wildcard matched. Matching runs on the raw title so entities
/// produced by escaping are never split.
pub fn highlight_title(title: &str, keyword: &str) -> String {
    if keyword == WILDCARD {
        return bold_matches(title, &BRACKET_TAG_RE);
    }

    let pattern = format!("(?i){}", regex::escape(keyword));
    match Regex::new(&pattern) {
        Ok(re) => bold_matches(title, &re),
        Err(_) => escape_html(title),
    }
}

fn bold_matches(text: &str, re: &Regex) -> String {
    let mut highlighted = String::with_capacity(text.len());
    let mut last = 0;
    for found in re.find_iter(text) {
        if found.as_str().is_empty() {
            continue;
        }
        highlighted.push_str(&escape_html(&text[last..found.start()]));
        highlighted.push_str("<b>");
        highlighted.push_str(&escape_html(found.as_str()));
        highlighted.push_str("</b>");
        last = found.end();
    }
    highlighted.push_str(&escape_html(&text[last..]));
    highlighted
}

pub fn notification(post: &Post, category: Category, keyword: &str) -> String {
    format!(
        "{} [<a href=\"{}\">web</a>] [<a href=\"{}\">reddit</a>] <i>(matched {} {})</i>",
        highlight_title(&post.title, keyword),
        escape_html(&post.url),
        escape_html(&post.permalink),
        category,
        escape_html(keyword)
    )
}
