use thiserror::Error;

const ALLOWED_HOSTS: [&str; 2] = ["youtube.com/", "youtu.be/"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UrlError {
    #[error("no URL provided")]
    Empty,
    #[error("error text is not a URL")]
    ErrorText,
    #[error("URL must start with http:// or https://")]
    Scheme,
    #[error("a YouTube link is expected")]
    Host,
}

impl UrlError {
    /// Localization key for the status bar message.
    pub fn message_key(&self) -> &'static str {
        match self {
            UrlError::Empty => "error-no-url",
            UrlError::ErrorText => "error-url-is-error-text",
            UrlError::Scheme => "error-url-scheme",
            UrlError::Host => "error-url-host",
        }
    }
}

/// Returns the trimmed URL if it looks like a YouTube link.
pub fn validate_url(input: &str) -> Result<String, UrlError> {
    let url = input.trim();
    if url.is_empty() {
        return Err(UrlError::Empty);
    }
    let lower = url.to_lowercase();
    if lower.starts_with("error:") {
        return Err(UrlError::ErrorText);
    }
    if !(lower.starts_with("http://") || lower.starts_with("https://")) {
        return Err(UrlError::Scheme);
    }
    if !ALLOWED_HOSTS.iter().any(|host| lower.contains(host)) {
        return Err(UrlError::Host);
    }
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_youtube_links() {
        assert_eq!(
            validate_url("  https://youtu.be/abc123 "),
            Ok("https://youtu.be/abc123".to_string())
        );
        assert!(validate_url("https://www.youtube.com/playlist?list=PL123").is_ok());
        assert!(validate_url("HTTP://M.YOUTUBE.COM/watch?v=x").is_ok());
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(validate_url("   "), Err(UrlError::Empty));
        assert_eq!(validate_url("ERROR: [youtube] x: Private video"), Err(UrlError::ErrorText));
        assert_eq!(validate_url("youtube.com/watch?v=x"), Err(UrlError::Scheme));
        assert_eq!(validate_url("https://vimeo.com/123"), Err(UrlError::Host));
    }
}
