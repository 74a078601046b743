// src/pipeline/monitor.rs

//! Periodic monitoring loop.

use std::time::Duration;

use tokio::time::MissedTickBehavior;

use crate::error::Result;
use crate::models::MonitorConfig;
use crate::pipeline::check::{CheckOutcome, CheckSession, ExamOutcome, run_check, run_exam_check};
use crate::pipeline::render::{render_changes, render_exams};
use crate::services::{Notifier, PortalScraper};
use crate::storage::SnapshotStore;

/// Monitoring loop settings.
#[derive(Debug, Clone)]
pub struct MonitorOptions {
    /// Time between the starts of two cycles
    pub interval: Duration,
    /// Also check the exam schedule each cycle
    pub watch_exams: bool,
    /// Stop after this many cycles; `None` runs forever
    pub max_cycles: Option<u64>,
}

impl From<&MonitorConfig> for MonitorOptions {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            interval: Duration::from_secs(config.check_interval_secs.max(1)),
            watch_exams: config.notify_exams,
            max_cycles: None,
        }
    }
}

/// What one cycle sent out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub change_count: usize,
    pub grades_notified: bool,
    pub exams_notified: bool,
}

/// Run one check cycle and deliver any resulting notifications.
///
/// Delivery failures are logged and do not stop the cycle. The grade
/// baseline is already persisted at that point; an undelivered exam update
/// leaves the exam count where it was so the next cycle publishes it again.
/// Only a failed snapshot save is returned as an error.
pub async fn run_cycle(
    session: &mut CheckSession,
    scraper: &dyn PortalScraper,
    store: &dyn SnapshotStore,
    notifier: &dyn Notifier,
    watch_exams: bool,
) -> Result<CycleReport> {
    let mut report = CycleReport::default();

    if let CheckOutcome::Completed { events, .. } = run_check(session, scraper, store).await? {
        report.change_count = events.len();
        let text = render_changes(&events);
        if !text.is_empty() {
            match notifier.send(&text).await {
                Ok(()) => report.grades_notified = true,
                Err(e) => log::error!("Grade notification failed: {e}"),
            }
        }
    }

    if watch_exams {
        let previous = session.exam_count;
        if let ExamOutcome::Published { exams } = run_exam_check(session, scraper).await {
            match notifier.send(&render_exams(&exams)).await {
                Ok(()) => report.exams_notified = true,
                Err(e) => {
                    log::error!("Exam notification failed: {e}; will retry next cycle");
                    session.exam_count = previous;
                }
            }
        }
    }

    Ok(report)
}

/// Run check cycles on a fixed interval.
///
/// Cycle errors are logged and the loop keeps going. The first cycle starts
/// immediately.
pub async fn run_monitor(
    options: &MonitorOptions,
    session: &mut CheckSession,
    scraper: &dyn PortalScraper,
    store: &dyn SnapshotStore,
    notifier: &dyn Notifier,
) {
    log::info!(
        "Monitoring started (interval {}s, exams {})",
        options.interval.as_secs(),
        if options.watch_exams { "on" } else { "off" }
    );

    let mut ticker = tokio::time::interval(options.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut cycles = 0u64;
    loop {
        if options.max_cycles.is_some_and(|max| cycles >= max) {
            break;
        }
        ticker.tick().await;
        cycles += 1;

        match run_cycle(session, scraper, store, notifier, options.watch_exams).await {
            Ok(report) => log::info!(
                "Cycle {} done: {}{}",
                cycles,
                session.last_status,
                if report.exams_notified { ", exam schedule updated" } else { "" }
            ),
            Err(e) => log::error!("Cycle {} failed: {}", cycles, e),
        }
    }

    log::info!("Monitoring stopped after {} cycles", cycles);
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::error::AppError;
    use crate::models::{Course, Snapshot};
    use crate::pipeline::check::tests::{ScriptedScraper, exam};
    use crate::storage::MemoryStore;

    /// Records delivered messages after failing the first `failures` sends.
    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<String>>,
        failures: Mutex<usize>,
    }

    impl RecordingNotifier {
        fn failing(failures: usize) -> Self {
            Self {
                failures: Mutex::new(failures),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, text: &str) -> Result<()> {
            let mut failures = self.failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(AppError::notify("chat unreachable"));
            }
            self.sent.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    fn snapshot_with(letter: &str) -> Snapshot {
        let mut course = Course::new("C1", "Calc");
        course.letter_grade = Some(letter.to_string());
        [course].into_iter().collect()
    }

    #[tokio::test]
    async fn test_cycle_notifies_only_on_changes() {
        let store = MemoryStore::new();
        let scraper = ScriptedScraper::with_grades(vec![
            Ok(Some(snapshot_with("A"))),
            Ok(Some(snapshot_with("A"))),
        ]);
        let notifier = RecordingNotifier::default();
        let mut session = CheckSession::new();

        let first = run_cycle(&mut session, &scraper, &store, &notifier, false)
            .await
            .unwrap();
        let second = run_cycle(&mut session, &scraper, &store, &notifier, false)
            .await
            .unwrap();

        assert!(first.grades_notified);
        assert!(!second.grades_notified);
        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("📚 *Calc*"));
    }

    #[tokio::test]
    async fn test_cycle_notifies_new_exams() {
        let store = MemoryStore::new();
        let scraper = ScriptedScraper::default();
        scraper.push_exams(Some(vec![exam("C1")]));
        let notifier = RecordingNotifier::default();
        let mut session = CheckSession::new();

        let report = run_cycle(&mut session, &scraper, &store, &notifier, true)
            .await
            .unwrap();

        assert!(report.exams_notified);
        assert!(!report.grades_notified);
        assert!(notifier.sent.lock().unwrap()[0].contains("Exam schedule"));
    }

    #[tokio::test]
    async fn test_grade_delivery_failure_still_checks_exams() {
        let store = MemoryStore::new();
        let scraper = ScriptedScraper::with_grades(vec![Ok(Some(snapshot_with("B")))]);
        scraper.push_exams(Some(vec![exam("C1")]));
        let notifier = RecordingNotifier::failing(1);
        let mut session = CheckSession::new();

        let report = run_cycle(&mut session, &scraper, &store, &notifier, true)
            .await
            .unwrap();

        assert_eq!(report.change_count, 1);
        assert!(!report.grades_notified);
        assert!(report.exams_notified);
        assert!(store.load().contains("C1"));
        assert_eq!(session.exam_count, 1);
        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("Exam schedule"));
    }

    #[tokio::test]
    async fn test_undelivered_exam_update_is_published_again() {
        let store = MemoryStore::new();
        let scraper = ScriptedScraper::default();
        scraper.push_exams(Some(vec![exam("C1")]));
        scraper.push_exams(Some(vec![exam("C1")]));
        let notifier = RecordingNotifier::failing(1);
        let mut session = CheckSession::new();

        let first = run_cycle(&mut session, &scraper, &store, &notifier, true)
            .await
            .unwrap();
        assert!(!first.exams_notified);
        assert_eq!(session.exam_count, 0);

        let second = run_cycle(&mut session, &scraper, &store, &notifier, true)
            .await
            .unwrap();
        assert!(second.exams_notified);
        assert_eq!(session.exam_count, 1);
        assert_eq!(notifier.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_monitor_runs_bounded_cycles() {
        let store = MemoryStore::new();
        let scraper = ScriptedScraper::with_grades(vec![
            Ok(Some(snapshot_with("B"))),
            Ok(None),
            Ok(Some(snapshot_with("A"))),
        ]);
        let notifier = RecordingNotifier::default();
        let mut session = CheckSession::new();
        let options = MonitorOptions {
            interval: Duration::from_millis(1),
            watch_exams: false,
            max_cycles: Some(3),
        };

        run_monitor(&options, &mut session, &scraper, &store, &notifier).await;

        assert_eq!(session.check_count, 2);
        assert_eq!(notifier.sent.lock().unwrap().len(), 2);
        assert_eq!(
            store.load().get("C1").unwrap().letter_grade.as_deref(),
            Some("A")
        );
    }

    #[test]
    fn test_options_from_config() {
        let options = MonitorOptions::from(&MonitorConfig::default());
        assert_eq!(options.interval, Duration::from_secs(300));
        assert!(options.watch_exams);
        assert!(options.max_cycles.is_none());
    }
}
