pub mod config;
pub mod error;
pub mod error_utils;
pub mod notifier;
pub mod types;

pub use config::*;
pub use error::*;
pub use error_utils::*;
pub use notifier::*;
pub use types::*;
