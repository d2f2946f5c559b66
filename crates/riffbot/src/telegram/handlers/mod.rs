//! Telegram bot handler tree configuration
//!
//! The same schema is used in production and in tests.

mod commands;
mod schema;
mod types;

pub use commands::greeting_text;
pub use schema::schema;
pub use types::{request_origin, HandlerDeps, HandlerError};
