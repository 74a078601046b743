// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::COOKIE;
use url::Url;

use crate::error::Result;
use crate::models::PortalConfig;

/// A fetched page and the URL it finally resolved to.
#[derive(Debug, Clone)]
pub struct Page {
    /// URL after redirects
    pub url: Url,
    pub body: String,
}

/// Create a configured asynchronous HTTP client.
pub fn create_client(config: &PortalConfig) -> Result<Client> {
    let client = Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Fetch a page, sending `cookie` as the session when non-empty.
pub async fn fetch_page(client: &Client, url: &Url, cookie: &str) -> Result<Page> {
    let mut request = client.get(url.clone());
    if !cookie.is_empty() {
        request = request.header(COOKIE, cookie);
    }
    let response = request.send().await?.error_for_status()?;
    let url = response.url().clone();
    let body = response.text().await?;
    Ok(Page { url, body })
}
