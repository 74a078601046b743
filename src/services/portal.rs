// src/services/portal.rs

//! Portal scrapers.
//!
//! Both scrapers report "no result" (`Ok(None)`) when the portal did not
//! hand over a usable page, including a page without the grades table. That
//! is different from a grades table with zero courses.

use std::path::PathBuf;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Exam, PortalConfig, Snapshot};
use crate::services::PortalScraper;
use crate::services::exams::parse_exams;
use crate::services::grades::parse_grades;
use crate::utils::http::{create_client, fetch_page};
use crate::utils::{is_login_page, resolve_url};

/// Reads pages previously saved from the portal.
#[derive(Debug, Clone, Default)]
pub struct SavedPageScraper {
    grades_html: Option<PathBuf>,
    exams_html: Option<PathBuf>,
}

impl SavedPageScraper {
    pub fn new(grades_html: Option<PathBuf>, exams_html: Option<PathBuf>) -> Self {
        Self {
            grades_html,
            exams_html,
        }
    }

    async fn read_page(path: Option<&PathBuf>) -> Result<Option<String>> {
        let Some(path) = path else {
            return Ok(None);
        };
        match tokio::fs::read_to_string(path).await {
            Ok(html) => Ok(Some(html)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("Saved page not found: {}", path.display());
                Ok(None)
            }
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

#[async_trait]
impl PortalScraper for SavedPageScraper {
    async fn fetch_grades(&self) -> Result<Option<Snapshot>> {
        match Self::read_page(self.grades_html.as_ref()).await? {
            Some(html) => parse_grades(&html),
            None => Ok(None),
        }
    }

    async fn fetch_exams(&self) -> Result<Option<Vec<Exam>>> {
        match Self::read_page(self.exams_html.as_ref()).await? {
            Some(html) => Ok(Some(parse_exams(&html)?)),
            None => Ok(None),
        }
    }
}

/// Fetches the live portal with an already authenticated session cookie.
///
/// Logging in (and the CAPTCHA in front of it) happens outside this crate;
/// an expired session shows up as a redirect to the login page.
pub struct HttpScraper {
    client: Client,
    grades_url: Url,
    exams_url: Url,
    login_path: String,
    session_cookie: String,
}

impl HttpScraper {
    pub fn new(config: &PortalConfig) -> Result<Self> {
        Ok(Self {
            client: create_client(config)?,
            grades_url: resolve_url(&config.base_url, &config.grades_path)?,
            exams_url: resolve_url(&config.base_url, &config.exams_path)?,
            login_path: config.login_path.clone(),
            session_cookie: config.session_cookie.clone(),
        })
    }

    async fn fetch_html(&self, url: &Url) -> Result<Option<String>> {
        if self.session_cookie.is_empty() {
            log::warn!("No portal session cookie configured; skipping {url}");
            return Ok(None);
        }

        let page = fetch_page(&self.client, url, &self.session_cookie).await?;
        if is_login_page(&page.url, &self.login_path) {
            log::warn!("Portal redirected {url} to the login page; session expired");
            return Ok(None);
        }
        Ok(Some(page.body))
    }
}

#[async_trait]
impl PortalScraper for HttpScraper {
    async fn fetch_grades(&self) -> Result<Option<Snapshot>> {
        match self.fetch_html(&self.grades_url).await? {
            Some(html) => parse_grades(&html),
            None => Ok(None),
        }
    }

    async fn fetch_exams(&self) -> Result<Option<Vec<Exam>>> {
        match self.fetch_html(&self.exams_url).await? {
            Some(html) => Ok(Some(parse_exams(&html)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_saved_pages_parse() {
        let tmp = TempDir::new().unwrap();
        let grades = tmp.path().join("grades.html");
        std::fs::write(
            &grades,
            r#"<table class="a4"><tr><th class="belge_satir">1410211007 - Calculus</th></tr></table>"#,
        )
        .unwrap();

        let scraper = SavedPageScraper::new(Some(grades), None);
        let snapshot = scraper.fetch_grades().await.unwrap().unwrap();
        assert!(snapshot.contains("1410211007"));
        assert!(scraper.fetch_exams().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_saved_page_is_no_result() {
        let tmp = TempDir::new().unwrap();
        let scraper = SavedPageScraper::new(Some(tmp.path().join("gone.html")), None);
        assert!(scraper.fetch_grades().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_saved_login_page_is_no_result() {
        let tmp = TempDir::new().unwrap();
        let grades = tmp.path().join("grades.html");
        std::fs::write(&grades, r#"<form action="/auth/login"><input name="username"></form>"#)
            .unwrap();

        let scraper = SavedPageScraper::new(Some(grades), None);
        assert!(scraper.fetch_grades().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_http_scraper_without_cookie_is_no_result() {
        let scraper = HttpScraper::new(&PortalConfig::default()).unwrap();
        assert!(scraper.fetch_grades().await.unwrap().is_none());
        assert!(scraper.fetch_exams().await.unwrap().is_none());
    }

    #[test]
    fn test_http_scraper_rejects_bad_base_url() {
        let config = PortalConfig {
            base_url: "::".to_string(),
            ..PortalConfig::default()
        };
        assert!(matches!(HttpScraper::new(&config), Err(AppError::Url(_))));
    }
}
