//! Telegram integration

pub mod bot;
pub mod delivery;
pub mod handlers;

pub use bot::{create_bot, setup_bot_commands, Command};
pub use delivery::TelegramDelivery;
pub use handlers::{schema, HandlerDeps, HandlerError};

/// Bot type used throughout the crate
pub type Bot = teloxide::Bot;
