//! Utility functions and helpers.

pub mod http;

use url::Url;

use crate::error::Result;

/// Resolve a portal path against the portal base URL.
pub fn resolve_url(base_url: &str, path: &str) -> Result<Url> {
    Ok(Url::parse(base_url)?.join(path)?)
}

/// Whether `url` points at the portal's login page.
pub fn is_login_page(url: &Url, login_path: &str) -> bool {
    !login_path.is_empty() && url.path().starts_with(login_path)
}
