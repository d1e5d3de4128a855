//! Request URL resolution against the app origin.

use url::Url;

/// Error type for URL resolution failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Resolve what a page would pass to `fetch()` into an absolute URL.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Resolve relative references (`/api/x`, `logo.png`) against `origin`
/// 3. Lowercase the host
/// 4. Remove fragment (#...)
/// 5. Keep query string intact (do not reorder)
pub fn resolve(origin: &Url, input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut parsed = match Url::parse(trimmed) {
        Ok(absolute) => absolute,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            origin.join(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?
        }
        Err(e) => return Err(UrlError::InvalidUrl(e.to_string())),
    };

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    if let Some(host) = parsed.host_str() {
        let lowered = host.to_lowercase();
        parsed
            .set_host(Some(&lowered))
            .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse("https://legallyup.example").unwrap()
    }

    #[test]
    fn test_resolve_absolute_path() {
        let url = resolve(&origin(), "/api/documents?page=2").unwrap();
        assert_eq!(url.as_str(), "https://legallyup.example/api/documents?page=2");
    }

    #[test]
    fn test_resolve_bare_relative() {
        let url = resolve(&origin(), "vite.svg").unwrap();
        assert_eq!(url.as_str(), "https://legallyup.example/vite.svg");
    }

    #[test]
    fn test_resolve_keeps_cross_origin() {
        let url = resolve(&origin(), "https://FONTS.example.com/inter.woff2").unwrap();
        assert_eq!(url.host_str(), Some("fonts.example.com"));
    }

    #[test]
    fn test_resolve_remove_fragment() {
        let url = resolve(&origin(), "/privacy#section").unwrap();
        assert_eq!(url.fragment(), None);
        assert_eq!(url.path(), "/privacy");
    }

    #[test]
    fn test_resolve_trim_whitespace() {
        let url = resolve(&origin(), "  /  ").unwrap();
        assert_eq!(url.as_str(), "https://legallyup.example/");
    }

    #[test]
    fn test_resolve_unsupported_scheme() {
        let result = resolve(&origin(), "file:///etc/passwd");
        assert!(matches!(result, Err(UrlError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_resolve_empty() {
        assert!(matches!(resolve(&origin(), ""), Err(UrlError::Empty)));
        assert!(matches!(resolve(&origin(), "   "), Err(UrlError::Empty)));
    }
}
