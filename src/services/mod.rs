//! Service layer for the grade watcher.
//!
//! This module contains the collaborators around the change-detection core:
//! - Page parsing (`parse_grades`, `parse_exams`)
//! - Portal access (`SavedPageScraper`, `HttpScraper`)
//! - Delivery (`ConsoleNotifier`, `TelegramNotifier`)

pub mod exams;
pub mod grades;
mod notifier;
mod portal;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Exam, Snapshot};

pub use exams::parse_exams;
pub use grades::parse_grades;
pub use notifier::{ConsoleNotifier, Notifier, TelegramNotifier, split_message};
pub use portal::{HttpScraper, SavedPageScraper};

/// Source of portal data.
///
/// `Ok(None)` means the scrape produced no result (login or CAPTCHA
/// failure, expired session, missing page). It must not be confused with a
/// snapshot that has zero courses.
#[async_trait]
pub trait PortalScraper: Send + Sync {
    async fn fetch_grades(&self) -> Result<Option<Snapshot>>;

    async fn fetch_exams(&self) -> Result<Option<Vec<Exam>>>;
}
