use regex::Regex;
use std::sync::LazyLock;
use watcher_core::{Category, WILDCARD};

// `/command`, `/command@botname`, optionally followed by an argument.
static COMMAND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^/(\w+)(?:@\w+)?(?:\s+(.+))?$").expect("command pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Watch or unwatch `keyword` in `category`.
    Toggle { category: Category, keyword: String },
    Items,
    Stats,
    Help,
    Start,
    Unknown(String),
}

/// `None` when `text` is not a slash command at all.
pub fn parse_command(text: &str) -> Option<Command> {
    let captures = COMMAND_RE.captures(text.trim())?;
    let name = captures[1].to_lowercase();
    let argument = captures
        .get(2)
        .map(|m| m.as_str().trim())
        .filter(|arg| !arg.is_empty());

    let command = match name.as_str() {
        "items" => Command::Items,
        "stats" => Command::Stats,
        "help" => Command::Help,
        "start" => Command::Start,
        other => match other.parse::<Category>() {
            Ok(category) => Command::Toggle {
                category,
                keyword: argument.unwrap_or(WILDCARD).to_string(),
            },
            Err(_) => Command::Unknown(name),
        },
    };
    Some(command)
}
