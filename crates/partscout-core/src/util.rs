use url::Url;

use crate::error::AppError;

/// Build a vendor search URL from its origin, path and query parameters.
///
/// Parameters are percent-encoded, so free-text queries such as
/// `"M12 5P/90°"` are safe to embed.
pub fn search_url(origin: &Url, path: &str, params: &[(&str, &str)]) -> Result<Url, AppError> {
    let mut url = origin
        .join(path)
        .map_err(|e| AppError::ConfigError(format!("Invalid search path '{path}': {e}")))?;
    if !params.is_empty() {
        url.query_pairs_mut().extend_pairs(params);
    }
    Ok(url)
}

/// Rewrite a possibly relative `href` into an absolute link on `origin`.
///
/// Already-absolute links pass through unchanged.
pub fn absolute_link(origin: &Url, href: &str) -> Result<String, AppError> {
    let href = href.trim();
    if href.is_empty() {
        return Err(AppError::ParseError("empty product link".into()));
    }
    origin
        .join(href)
        .map(String::from)
        .map_err(|e| AppError::ParseError(format!("bad product link '{href}': {e}")))
}

/// Collapse runs of whitespace in scraped text into single spaces.
pub fn squash_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
