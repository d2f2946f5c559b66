//! riffbot - Telegram front end of riffgrab
//!
//! # Module Structure
//!
//! - `cli`: command line arguments
//! - `telegram`: bot construction, dispatcher schema and the Bot API implementation of `ChatDelivery`

pub mod cli;
pub mod telegram;

pub use telegram::{create_bot, schema, setup_bot_commands, HandlerDeps, TelegramDelivery};
