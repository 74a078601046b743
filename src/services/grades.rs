// src/services/grades.rs

//! Grades page parser.
//!
//! Turns the portal's exam-results document into a [`Snapshot`]. Course
//! headers and component rows share `table.a4`; a header row starts a new
//! course and the component rows that follow belong to it.

use std::sync::OnceLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{Course, GradeComponent, Snapshot};

const TABLE_SELECTOR: &str = "table.a4";
const ROW_SELECTOR: &str = "tr";
const HEADER_SELECTOR: &str = "th.belge_satir";
const CELL_SELECTOR: &str = "td.belge_satir";
const GRADE_SELECTOR: &str = "h3";

fn course_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{10})\s*-\s*(.+?)(?:\s*\||$)").expect("valid regex"))
}

fn letter_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-F][+-]?$").expect("valid regex"))
}

fn success_score_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Başarı Puanı:\s*([\d.]+)").expect("valid regex"))
}

fn weight_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\(%(\d+)\)").expect("valid regex"))
}

pub(crate) fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| AppError::selector(css, e))
}

/// Concatenated, trimmed text of an element.
pub(crate) fn element_text(element: &ElementRef<'_>) -> String {
    element.text().map(str::trim).collect()
}

/// Header text with each text node trimmed and joined by ` | `.
fn header_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Name not yet used by `existing`: `base`, then `base 2`, `base 3`, ...
pub fn unique_component_name(existing: &[GradeComponent], base: &str) -> String {
    let taken = |name: &str| existing.iter().any(|c| c.name == name);
    let mut name = base.to_string();
    let mut counter = 1;
    while taken(&name) {
        counter += 1;
        name = format!("{base} {counter}");
    }
    name
}

fn parse_course_header(header: &ElementRef<'_>, grade_sel: &Selector) -> Option<Course> {
    let full_text = header_text(header);
    let caps = course_regex().captures(&full_text)?;

    let code = caps.get(1)?.as_str();
    let raw_name = caps.get(2)?.as_str().trim();
    let name = raw_name.split(" | ").next().unwrap_or(raw_name);

    let mut course = Course::new(code, name);
    for h3 in header.select(grade_sel) {
        let text = element_text(&h3);
        if letter_regex().is_match(&text) {
            course.letter_grade = Some(text.clone());
        }
        if let Some(score) = success_score_regex()
            .captures(&text)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .filter(|s| s.is_finite())
        {
            course.success_score = Some(score);
        }
    }

    log::debug!("Found course {} - {}", course.code, course.name);
    Some(course)
}

fn parse_component_row(cells: &[ElementRef<'_>], course: &Course) -> Option<GradeComponent> {
    let weight = weight_regex()
        .captures(&element_text(&cells[0]))
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok());
    let base_name = element_text(&cells[1]);
    let score = element_text(&cells[2])
        .parse::<f64>()
        .ok()
        .filter(|s| s.is_finite())?;
    let date = cells
        .get(3)
        .map(element_text)
        .filter(|d| !d.is_empty());

    if base_name.is_empty() {
        return None;
    }

    Some(GradeComponent {
        name: unique_component_name(&course.components, &base_name),
        weight,
        score,
        date,
    })
}

/// Parse the grades document into a snapshot.
///
/// Returns `None` when the document has no grades table at all (a login form
/// or an error page served in its place). Component rows without a finite
/// numeric score are dropped. Repeated component names within a course get a
/// running counter so `(name, weight)` stays unique per course.
pub fn parse_grades(html: &str) -> Result<Option<Snapshot>> {
    let document = Html::parse_document(html);
    let table_sel = selector(TABLE_SELECTOR)?;
    let row_sel = selector(ROW_SELECTOR)?;
    let header_sel = selector(HEADER_SELECTOR)?;
    let cell_sel = selector(CELL_SELECTOR)?;
    let grade_sel = selector(GRADE_SELECTOR)?;

    if document.select(&table_sel).next().is_none() {
        log::warn!("No grades table in document");
        return Ok(None);
    }

    let mut snapshot = Snapshot::new();
    let mut current: Option<String> = None;

    for table in document.select(&table_sel) {
        for row in table.select(&row_sel) {
            for header in row.select(&header_sel) {
                if let Some(course) = parse_course_header(&header, &grade_sel) {
                    current = Some(course.code.clone());
                    snapshot.insert(course);
                }
            }

            let cells: Vec<ElementRef<'_>> = row.select(&cell_sel).collect();
            if cells.len() < 3 {
                continue;
            }
            let Some(course) = current.as_deref().and_then(|code| snapshot.get_mut(code)) else {
                continue;
            };
            if let Some(component) = parse_component_row(&cells, course) {
                course.components.push(component);
            }
        }
    }

    log::debug!(
        "Parsed {} courses with {} components",
        snapshot.len(),
        snapshot.component_count()
    );
    Ok(Some(snapshot))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
<html><body>
<table class="a4">
  <tr>
    <th class="belge_satir">1410211007 - Calculus I
      <h3>B+</h3>
      <h3>Başarı Puanı: 78.5</h3>
    </th>
  </tr>
  <tr>
    <td class="belge_satir">(%30)</td>
    <td class="belge_satir">Ara Sınavlar</td>
    <td class="belge_satir">86.0</td>
    <td class="belge_satir">12.11.2025</td>
  </tr>
  <tr>
    <td class="belge_satir">(%30)</td>
    <td class="belge_satir">Ara Sınavlar</td>
    <td class="belge_satir">70</td>
    <td class="belge_satir"></td>
  </tr>
  <tr>
    <td class="belge_satir">(%40)</td>
    <td class="belge_satir">Final</td>
    <td class="belge_satir">GR</td>
  </tr>
  <tr>
    <th class="belge_satir">1410211008 - Physics</th>
  </tr>
  <tr>
    <td class="belge_satir"></td>
    <td class="belge_satir">Lab</td>
    <td class="belge_satir">95</td>
  </tr>
</table>
</body></html>
"#;

    #[test]
    fn test_parse_courses_and_grades() {
        let snapshot = parse_grades(PAGE).unwrap().unwrap();
        assert_eq!(snapshot.len(), 2);

        let calc = snapshot.get("1410211007").unwrap();
        assert_eq!(calc.name, "Calculus I");
        assert_eq!(calc.letter_grade.as_deref(), Some("B+"));
        assert_eq!(calc.success_score, Some(78.5));

        let physics = snapshot.get("1410211008").unwrap();
        assert_eq!(physics.name, "Physics");
        assert!(physics.letter_grade.is_none());
        assert_eq!(physics.components.len(), 1);
        assert_eq!(physics.components[0].weight, None);
    }

    #[test]
    fn test_duplicate_names_and_unparsable_scores() {
        let snapshot = parse_grades(PAGE).unwrap().unwrap();
        let calc = snapshot.get("1410211007").unwrap();

        let names: Vec<_> = calc.components.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Ara Sınavlar", "Ara Sınavlar 2"]);
        assert_eq!(calc.components[0].weight, Some(30));
        assert_eq!(calc.components[0].date.as_deref(), Some("12.11.2025"));
        assert_eq!(calc.components[1].score, 70.0);
        assert!(calc.components[1].date.is_none());
    }

    #[test]
    fn test_rows_before_any_course_are_ignored() {
        let html = r#"<table class="a4"><tr>
            <td class="belge_satir">(%10)</td>
            <td class="belge_satir">Quiz</td>
            <td class="belge_satir">50</td></tr></table>"#;
        assert!(parse_grades(html).unwrap().unwrap().is_empty());
    }

    #[test]
    fn test_page_without_grades_table_is_no_result() {
        let login = r#"<html><body><form action="/auth/login">
            <input name="username"><input type="password" name="password">
            </form></body></html>"#;
        assert!(parse_grades(login).unwrap().is_none());
        assert!(parse_grades("").unwrap().is_none());
    }

    #[test]
    fn test_non_finite_scores_are_dropped() {
        let html = r#"<table class="a4">
  <tr><th class="belge_satir">1410211007 - Calculus I</th></tr>
  <tr>
    <td class="belge_satir">(%30)</td>
    <td class="belge_satir">Quiz</td>
    <td class="belge_satir">NaN</td>
  </tr>
  <tr>
    <td class="belge_satir">(%30)</td>
    <td class="belge_satir">Lab</td>
    <td class="belge_satir">inf</td>
  </tr>
  <tr>
    <td class="belge_satir">(%40)</td>
    <td class="belge_satir">Project</td>
    <td class="belge_satir">-infinity</td>
  </tr>
  <tr>
    <td class="belge_satir">(%40)</td>
    <td class="belge_satir">Final</td>
    <td class="belge_satir">55</td>
  </tr>
</table>"#;
        let snapshot = parse_grades(html).unwrap().unwrap();
        let calc = snapshot.get("1410211007").unwrap();
        assert_eq!(calc.components.len(), 1);
        assert_eq!(calc.components[0].name, "Final");
        assert_eq!(calc.components[0].score, 55.0);
    }

    #[test]
    fn test_unique_component_name() {
        let existing = vec![
            GradeComponent {
                name: "Midterms".into(),
                weight: None,
                score: 1.0,
                date: None,
            },
            GradeComponent {
                name: "Midterms 2".into(),
                weight: None,
                score: 1.0,
                date: None,
            },
        ];
        assert_eq!(unique_component_name(&existing, "Midterms"), "Midterms 3");
        assert_eq!(unique_component_name(&existing, "Final"), "Final");
    }
}
