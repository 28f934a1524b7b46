//! Pure functions turning a post title into a [`ParsedItem`] and finding
//! which watched keywords it hits.
//!
//! [`ParsedItem`]: watcher_core::ParsedItem

pub mod classifier;
pub mod keywords;

pub use classifier::classify;
pub use keywords::find_matches;
