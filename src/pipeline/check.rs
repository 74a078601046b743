// src/pipeline/check.rs

//! One grade/exam check cycle.
//!
//! Callers run at most one cycle at a time; the scraper reuses a single
//! portal session.

use chrono::{DateTime, Local};

use crate::error::Result;
use crate::models::{Exam, Snapshot};
use crate::pipeline::diff::{ChangeEvent, compare_and_update};
use crate::services::PortalScraper;
use crate::storage::SnapshotStore;

/// Process-lifetime state carried between check cycles.
#[derive(Debug, Clone, Default)]
pub struct CheckSession {
    /// Successful grade checks so far
    pub check_count: u64,
    /// Time of the last successful grade check
    pub last_check: Option<DateTime<Local>>,
    /// Exams seen on the last successful schedule fetch
    pub exam_count: usize,
    /// Human-readable result of the last cycle
    pub last_status: String,
}

impl CheckSession {
    pub fn new() -> Self {
        Self::default()
    }

    fn record_check(&mut self) {
        self.check_count += 1;
        self.last_check = Some(Local::now());
    }

    /// Store the latest exam count; true when it grew.
    pub fn observe_exams(&mut self, count: usize) -> bool {
        let increased = count > self.exam_count;
        self.exam_count = count;
        increased
    }
}

/// Result of a grade check.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutcome {
    /// The scraper produced nothing; stored state was left alone.
    ScrapeFailed,
    /// The snapshot was diffed and persisted.
    Completed {
        events: Vec<ChangeEvent>,
        snapshot: Snapshot,
    },
}

impl CheckOutcome {
    /// Change events, empty when the scrape failed.
    pub fn events(&self) -> &[ChangeEvent] {
        match self {
            Self::ScrapeFailed => &[],
            Self::Completed { events, .. } => events,
        }
    }
}

/// Result of an exam schedule check.
#[derive(Debug, Clone, PartialEq)]
pub enum ExamOutcome {
    ScrapeFailed,
    Unchanged { count: usize },
    /// More exams are listed than on the previous fetch.
    Published { exams: Vec<Exam> },
}

/// Scrape grades, diff them against the store and persist the new snapshot.
pub async fn run_check(
    session: &mut CheckSession,
    scraper: &dyn PortalScraper,
    store: &dyn SnapshotStore,
) -> Result<CheckOutcome> {
    log::info!("Checking grades...");

    let snapshot = match scraper.fetch_grades().await {
        Ok(Some(snapshot)) => snapshot,
        Ok(None) => {
            log::warn!("Grade scrape returned no result; keeping stored state");
            session.last_status = "grade scrape failed".to_string();
            return Ok(CheckOutcome::ScrapeFailed);
        }
        Err(e) => {
            log::warn!("Grade scrape failed: {e}; keeping stored state");
            session.last_status = format!("grade scrape failed: {e}");
            return Ok(CheckOutcome::ScrapeFailed);
        }
    };

    session.record_check();
    log::info!(
        "Scraped {} courses with {} components",
        snapshot.len(),
        snapshot.component_count()
    );

    let events = compare_and_update(store, &snapshot)?;
    session.last_status = format!(
        "{} courses, {} changes",
        snapshot.len(),
        events.len()
    );

    Ok(CheckOutcome::Completed { events, snapshot })
}

/// Scrape the exam schedule and report whether new exams were listed.
pub async fn run_exam_check(
    session: &mut CheckSession,
    scraper: &dyn PortalScraper,
) -> ExamOutcome {
    let exams = match scraper.fetch_exams().await {
        Ok(Some(exams)) => exams,
        Ok(None) => {
            log::warn!("Exam scrape returned no result");
            return ExamOutcome::ScrapeFailed;
        }
        Err(e) => {
            log::warn!("Exam scrape failed: {e}");
            return ExamOutcome::ScrapeFailed;
        }
    };

    let previous = session.exam_count;
    if session.observe_exams(exams.len()) {
        log::info!("Exam schedule grew: {} → {} exams", previous, exams.len());
        ExamOutcome::Published { exams }
    } else {
        ExamOutcome::Unchanged { count: exams.len() }
    }
}
