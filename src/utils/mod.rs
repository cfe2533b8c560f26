//! Utility functions and helpers.

pub mod http;
pub mod json;
pub mod log;

use url::Url;

use crate::error::Result;

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Resolve a URL string against a base URL string.
pub fn resolve(base_url: &str, href: &str) -> Result<String> {
    let base = Url::parse(base_url)?;
    Ok(resolve_url(&base, href))
}
