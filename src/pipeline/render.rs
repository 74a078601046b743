//! Notification text rendering.
//!
//! All functions here are pure: same input, same bytes out. Text uses the
//! Telegram Markdown flavor (`*bold*`).

use crate::models::{Course, Exam, Snapshot};
use crate::pipeline::check::CheckSession;
use crate::pipeline::diff::ChangeEvent;

/// Shown in place of a missing value.
pub const PLACEHOLDER: &str = "—";

/// Message used when nothing has been stored yet.
pub const EMPTY_MESSAGE: &str = "📭 No grades recorded yet.";

const CHANGES_HEADER: &str = "🔔 *Grade update!*";
const FULL_HEADER: &str = "📊 *Current Grades*";
const EXAMS_HEADER: &str = "📅 *Exam schedule updated!*";

/// Format a score the way the portal shows it (`86.0`, `72.5`).
pub fn format_score(score: f64) -> String {
    if score.fract() == 0.0 && score.is_finite() {
        format!("{score:.1}")
    } else {
        format!("{score}")
    }
}

/// ` %40` for a weighted component; nothing for a missing or zero weight.
fn format_weight(weight: Option<u32>) -> String {
    weight
        .filter(|w| *w != 0)
        .map(|w| format!(" %{w}"))
        .unwrap_or_default()
}

fn format_optional_score(score: Option<f64>) -> String {
    score.map(format_score).unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Changes collected for one course while grouping events.
struct CourseChanges<'a> {
    code: &'a str,
    name: &'a str,
    grade_line: Option<String>,
    component_lines: Vec<String>,
}

/// Render change events grouped by course.
///
/// Returns an empty string for an empty event list so callers can skip
/// sending.
pub fn render_changes(events: &[ChangeEvent]) -> String {
    if events.is_empty() {
        return String::new();
    }

    let mut groups: Vec<CourseChanges<'_>> = Vec::new();
    for event in events {
        let index = match groups.iter().position(|g| g.code == event.course_code()) {
            Some(index) => index,
            None => {
                groups.push(CourseChanges {
                    code: event.course_code(),
                    name: event.course_name(),
                    grade_line: None,
                    component_lines: Vec::new(),
                });
                groups.len() - 1
            }
        };
        let group = &mut groups[index];

        match event {
            ChangeEvent::LetterGradeChanged {
                old,
                new,
                success_score,
                ..
            } => {
                let old = old.as_deref().unwrap_or(PLACEHOLDER);
                let score = success_score
                    .map(|s| format!(" ({})", format_score(s)))
                    .unwrap_or_default();
                group.grade_line = Some(format!("   Grade: {old} → *{new}*{score}"));
            }
            ChangeEvent::NewScore {
                component,
                weight,
                score,
                ..
            } => group.component_lines.push(format!(
                "   • {component}{}: *{}*",
                format_weight(*weight),
                format_score(*score)
            )),
            ChangeEvent::ScoreChanged {
                component,
                old_score,
                new_score,
                ..
            } => group.component_lines.push(format!(
                "   • {component}: {} → *{}*",
                format_score(*old_score),
                format_score(*new_score)
            )),
        }
    }

    let mut lines = vec![CHANGES_HEADER.to_string(), String::new()];
    for group in groups {
        let title = if group.name.is_empty() {
            group.code
        } else {
            group.name
        };
        lines.push(format!("📚 *{title}*"));
        lines.extend(group.grade_line);
        lines.extend(group.component_lines);
        lines.push(String::new());
    }

    lines.join("\n").trim_end().to_string()
}

fn push_course_block(lines: &mut Vec<String>, course: &Course) {
    lines.push(format!("📚 *{}*", course.display_name()));

    if course.letter_grade.is_some() || course.success_score.is_some() {
        lines.push(format!(
            "   Grade: *{}* ({})",
            course.letter_grade.as_deref().unwrap_or(PLACEHOLDER),
            format_optional_score(course.success_score)
        ));
    }

    for component in &course.components {
        lines.push(format!(
            "   • {}{}: *{}*",
            component.name,
            format_weight(component.weight),
            format_score(component.score)
        ));
    }
    lines.push(String::new());
}

/// Render every stored course with all of its components.
pub fn render_full(snapshot: &Snapshot) -> String {
    if snapshot.is_empty() {
        return EMPTY_MESSAGE.to_string();
    }

    let mut lines = vec![FULL_HEADER.to_string(), String::new()];
    for course in snapshot.courses() {
        push_course_block(&mut lines, course);
    }
    lines.join("\n").trim_end().to_string()
}

/// One line per course: name, letter grade and score.
pub fn render_summary(snapshot: &Snapshot) -> String {
    if snapshot.is_empty() {
        return EMPTY_MESSAGE.to_string();
    }

    let mut lines = vec![FULL_HEADER.to_string(), String::new()];
    lines.extend(snapshot.courses().map(|course| {
        format!(
            "• *{}*: {} ({})",
            course.display_name(),
            course.letter_grade.as_deref().unwrap_or(PLACEHOLDER),
            format_optional_score(course.success_score)
        )
    }));
    lines.join("\n")
}

/// Render the exam schedule; empty input renders nothing.
pub fn render_exams(exams: &[Exam]) -> String {
    if exams.is_empty() {
        return String::new();
    }

    let mut lines = vec![EXAMS_HEADER.to_string(), String::new()];
    for exam in exams {
        lines.push(exam.format("📝 *{name}* ({code})"));
        lines.push(exam.format("   🕐 {datetime}"));
        lines.push(exam.format("   📍 {campus} / {classroom}"));
        if !exam.instructor.is_empty() {
            lines.push(exam.format("   👤 {instructor}"));
        }
        lines.push(String::new());
    }
    lines.join("\n").trim_end().to_string()
}

/// State of a live session followed by the grade summary.
///
/// Only meaningful for the process that ran the checks; a session is never
/// persisted.
pub fn render_status(session: &CheckSession, interval_secs: u64, snapshot: &Snapshot) -> String {
    let last_check = session
        .last_check
        .map(|t| t.format("%d/%m/%Y %H:%M:%S").to_string())
        .unwrap_or_else(|| "no check yet".to_string());
    let last_result = if session.last_status.is_empty() {
        PLACEHOLDER
    } else {
        session.last_status.as_str()
    };

    format!(
        "🕐 Last check: {last_check}\n\
         📝 Last result: {last_result}\n\
         🔄 Total checks: {}\n\
         ⏰ Interval: {} min\n\n\
         {}",
        session.check_count,
        interval_secs / 60,
        render_summary(snapshot)
    )
}
