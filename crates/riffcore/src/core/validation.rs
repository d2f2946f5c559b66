//! Input validation for incoming messages

use thiserror::Error;
use url::Url;

/// Validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Not a URL at all
    #[error("Not a URL: {0}")]
    NotAUrl(String),

    /// URL with a scheme other than http/https
    #[error("Unsupported scheme '{scheme}' in {url}")]
    UnsupportedScheme { url: String, scheme: String },

    /// URL without a host part
    #[error("URL has no host: {0}")]
    MissingHost(String),
}

/// Validates that a message looks like an absolute http(s) URL.
///
/// Surrounding whitespace is ignored. Anything that is not `http://` or
/// `https://` with a host is rejected before any job is created.
///
/// # Examples
/// ```
/// use riffcore::core::validation::validate_media_url;
///
/// assert!(validate_media_url("https://youtu.be/dQw4w9WgXcQ").is_ok());
/// assert!(validate_media_url("  http://example.com/video  ").is_ok());
///
/// assert!(validate_media_url("ftp://example.com/video").is_err());
/// assert!(validate_media_url("youtube.com/watch?v=x").is_err());
/// assert!(validate_media_url("hello").is_err());
/// ```
pub fn validate_media_url(input: &str) -> Result<Url, ValidationError> {
    let input = input.trim();

    // Cheap prefix check first; Url::parse happily accepts "mailto:" and friends
    let lower = input.to_ascii_lowercase();
    if !(lower.starts_with("http://") || lower.starts_with("https://")) {
        return match Url::parse(input) {
            Ok(url) => Err(ValidationError::UnsupportedScheme {
                url: input.to_string(),
                scheme: url.scheme().to_string(),
            }),
            Err(_) => Err(ValidationError::NotAUrl(input.to_string())),
        };
    }

    let url = Url::parse(input).map_err(|_| ValidationError::NotAUrl(input.to_string()))?;
    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(ValidationError::MissingHost(input.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_http_and_https() {
        assert!(validate_media_url("https://www.youtube.com/watch?v=abc").is_ok());
        assert!(validate_media_url("http://example.com/video").is_ok());
        assert!(validate_media_url("HTTPS://EXAMPLE.COM/x").is_ok());
    }

    #[test]
    fn test_trims_whitespace() {
        let url = validate_media_url("\n  https://example.com/video \t").unwrap();
        assert_eq!(url.as_str(), "https://example.com/video");
    }

    #[test]
    fn test_rejects_other_schemes() {
        assert_eq!(
            validate_media_url("ftp://example.com/file"),
            Err(ValidationError::UnsupportedScheme {
                url: "ftp://example.com/file".to_string(),
                scheme: "ftp".to_string(),
            })
        );
        assert!(matches!(
            validate_media_url("file:///etc/passwd"),
            Err(ValidationError::UnsupportedScheme { .. })
        ));
    }

    #[test]
    fn test_rejects_plain_text() {
        assert!(matches!(validate_media_url("hello there"), Err(ValidationError::NotAUrl(_))));
        assert!(matches!(validate_media_url(""), Err(ValidationError::NotAUrl(_))));
        assert!(matches!(
            validate_media_url("youtube.com/watch?v=abc"),
            Err(ValidationError::NotAUrl(_))
        ));
    }

    #[test]
    fn test_rejects_missing_host() {
        assert!(validate_media_url("http://").is_err());
        assert!(validate_media_url("https://").is_err());
    }
}
