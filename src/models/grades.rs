//! Course and grade snapshot data structures.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One graded item within a course (e.g. a midterm).
///
/// Within a course the pair `(name, weight)` identifies the component across
/// scrapes. Producers must keep that pair unique per course.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GradeComponent {
    /// Display label, already disambiguated ("Midterms", "Midterms 2", ...)
    pub name: String,

    /// Percentage weight, when the portal shows one
    #[serde(default)]
    pub weight: Option<u32>,

    /// Numeric score
    pub score: f64,

    /// Opaque date string as shown on the portal
    #[serde(default)]
    pub date: Option<String>,
}

impl GradeComponent {
    /// Identity key used to match components across snapshots.
    pub fn key(&self) -> (&str, Option<u32>) {
        (self.name.as_str(), self.weight)
    }
}

/// The observed state of one course.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Course {
    /// Institution course number; stable across scrapes. Not written to the
    /// stored record, where the map key carries it.
    #[serde(default, skip_serializing)]
    pub code: String,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Final letter grade, absent until posted
    #[serde(default)]
    pub letter_grade: Option<String>,

    /// Composite success score
    #[serde(default)]
    pub success_score: Option<f64>,

    /// Graded items in portal order
    #[serde(default)]
    pub components: Vec<GradeComponent>,
}

impl Course {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            letter_grade: None,
            success_score: None,
            components: Vec::new(),
        }
    }

    /// Name to show to the user, falling back to the course code.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.code
        } else {
            &self.name
        }
    }
}

/// Every course observed in one scrape, keyed by course code.
///
/// Serializes as a plain JSON object `{ code: course, ... }`. Iteration is
/// ordered by course code so diffing and rendering are deterministic.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Snapshot {
    courses: BTreeMap<String, Course>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a course under its own code, replacing any previous entry.
    pub fn insert(&mut self, course: Course) {
        self.courses.insert(course.code.clone(), course);
    }

    pub fn get(&self, code: &str) -> Option<&Course> {
        self.courses.get(code)
    }

    pub fn get_mut(&mut self, code: &str) -> Option<&mut Course> {
        self.courses.get_mut(code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.courses.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    /// Courses in course-code order.
    pub fn courses(&self) -> impl Iterator<Item = &Course> {
        self.courses.values()
    }

    /// Total number of graded components across all courses.
    pub fn component_count(&self) -> usize {
        self.courses.values().map(|c| c.components.len()).sum()
    }

    /// Fill in course codes missing from stored records using their map key.
    pub(crate) fn normalize_codes(&mut self) {
        for (code, course) in self.courses.iter_mut() {
            if course.code.is_empty() {
                course.code = code.clone();
            }
        }
    }
}

impl FromIterator<Course> for Snapshot {
    fn from_iter<I: IntoIterator<Item = Course>>(iter: I) -> Self {
        let mut snapshot = Snapshot::new();
        for course in iter {
            snapshot.insert(course);
        }
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_plain_mapping() {
        let mut course = Course::new("1410211007", "Calculus");
        course.letter_grade = Some("A".into());
        course.components.push(GradeComponent {
            name: "Midterm".into(),
            weight: Some(40),
            score: 85.0,
            date: None,
        });
        let snapshot: Snapshot = [course].into_iter().collect();

        let value = serde_json::to_value(&snapshot).unwrap();
        let record = &value["1410211007"];
        assert!(record.get("code").is_none());
        assert_eq!(record["name"], "Calculus");
        assert_eq!(record["letter_grade"], "A");
        assert!(record["success_score"].is_null());
        assert_eq!(record["components"][0]["weight"], 40);
        assert!(record["components"][0]["date"].is_null());
    }

    #[test]
    fn test_normalize_codes_from_keys() {
        let json = r#"{"C1": {"name": "Calc", "letter_grade": null,
            "success_score": null, "components": []}}"#;
        let mut snapshot: Snapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.get("C1").unwrap().code, "");

        snapshot.normalize_codes();
        assert_eq!(snapshot.get("C1").unwrap().code, "C1");
    }

    #[test]
    fn test_display_name_falls_back_to_code() {
        let course = Course::new("C9", "");
        assert_eq!(course.display_name(), "C9");
    }

    #[test]
    fn test_courses_iterate_in_code_order() {
        let snapshot: Snapshot = [Course::new("B", "b"), Course::new("A", "a")]
            .into_iter()
            .collect();
        let codes: Vec<_> = snapshot.courses().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, vec!["A", "B"]);
    }
}
