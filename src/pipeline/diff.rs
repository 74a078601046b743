//! Diff calculation for grade notifications.
//!
//! Compares a freshly scraped snapshot against the stored one and yields
//! typed change events. Only additions and changes are reported: courses or
//! components that disappear are dropped silently, and the stored snapshot
//! is replaced by the new one regardless.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{Course, GradeComponent, Snapshot};
use crate::storage::SnapshotStore;

/// A detected difference between two snapshots.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChangeEvent {
    /// A letter grade was posted or changed.
    LetterGradeChanged {
        course_code: String,
        course_name: String,
        old: Option<String>,
        new: String,
        success_score: Option<f64>,
    },
    /// A component appeared that was not there before.
    NewScore {
        course_code: String,
        course_name: String,
        component: String,
        weight: Option<u32>,
        score: f64,
        date: Option<String>,
    },
    /// A known component now carries a different score.
    ScoreChanged {
        course_code: String,
        course_name: String,
        component: String,
        weight: Option<u32>,
        old_score: f64,
        new_score: f64,
        date: Option<String>,
    },
}

impl ChangeEvent {
    pub fn course_code(&self) -> &str {
        match self {
            Self::LetterGradeChanged { course_code, .. }
            | Self::NewScore { course_code, .. }
            | Self::ScoreChanged { course_code, .. } => course_code,
        }
    }

    pub fn course_name(&self) -> &str {
        match self {
            Self::LetterGradeChanged { course_name, .. }
            | Self::NewScore { course_name, .. }
            | Self::ScoreChanged { course_name, .. } => course_name,
        }
    }
}

/// Compute the change events between `previous` and `current`.
///
/// Events follow `current`'s course order; within a course the letter-grade
/// event comes first, then component events in component order.
pub fn diff_snapshots(previous: &Snapshot, current: &Snapshot) -> Vec<ChangeEvent> {
    let mut events = Vec::new();
    for course in current.courses() {
        diff_course(previous.get(&course.code), course, &mut events);
    }
    events
}

fn diff_course(old: Option<&Course>, new: &Course, events: &mut Vec<ChangeEvent>) {
    let old_letter = old.and_then(|c| c.letter_grade.as_ref());
    if let Some(new_letter) = &new.letter_grade {
        if old_letter != Some(new_letter) {
            events.push(ChangeEvent::LetterGradeChanged {
                course_code: new.code.clone(),
                course_name: new.name.clone(),
                old: old_letter.cloned(),
                new: new_letter.clone(),
                success_score: new.success_score,
            });
        }
    }

    // Duplicate keys in the old list collapse to the last one.
    let old_components: HashMap<(&str, Option<u32>), &GradeComponent> = old
        .map(|c| c.components.iter().map(|comp| (comp.key(), comp)).collect())
        .unwrap_or_default();

    for component in &new.components {
        match old_components.get(&component.key()) {
            None => events.push(ChangeEvent::NewScore {
                course_code: new.code.clone(),
                course_name: new.name.clone(),
                component: component.name.clone(),
                weight: component.weight,
                score: component.score,
                date: component.date.clone(),
            }),
            Some(previous) if previous.score != component.score => {
                events.push(ChangeEvent::ScoreChanged {
                    course_code: new.code.clone(),
                    course_name: new.name.clone(),
                    component: component.name.clone(),
                    weight: component.weight,
                    old_score: previous.score,
                    new_score: component.score,
                    date: component.date.clone(),
                })
            }
            Some(_) => {}
        }
    }
}

/// Diff `current` against the stored snapshot, then persist `current`.
///
/// The store is overwritten even when no events were produced. Only a
/// failed write is reported as an error.
pub fn compare_and_update(
    store: &dyn SnapshotStore,
    current: &Snapshot,
) -> Result<Vec<ChangeEvent>> {
    let previous = store.load();
    let events = diff_snapshots(&previous, current);

    if !events.is_empty() {
        log::info!(
            "Diff: {} changes across {} courses",
            events.len(),
            current.len()
        );
    }

    store.save(current)?;
    Ok(events)
}
