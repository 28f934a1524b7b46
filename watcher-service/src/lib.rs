pub mod commands;
pub mod dispatcher;
pub mod replies;

#[cfg(test)]
mod tests;

pub use commands::{parse_command, Command};
pub use dispatcher::Dispatcher;
