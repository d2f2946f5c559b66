//! Core utilities, configuration, and common functionality

pub mod config;
pub mod error;
pub mod logging;
pub mod process;
pub mod validation;

// Re-exports for convenience
pub use error::{AppError, AppResult, DownloadError};
pub use logging::{init_logger, log_cookies_configuration, log_download_configuration};
pub use validation::{validate_media_url, ValidationError};
