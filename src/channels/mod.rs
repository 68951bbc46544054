//! Channels the user can chat through.

pub mod cli;
pub mod telegram;

pub use cli::{CliChannel, Command};
pub use telegram::TelegramChannel;
