//! Exam schedule entry.

use serde::{Deserialize, Serialize};

/// An exam listed on the portal's exam schedule page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Exam {
    /// Course code
    pub code: String,

    /// Course name
    pub name: String,

    /// Date and time as displayed
    pub datetime: String,

    pub campus: String,

    pub classroom: String,

    pub instructor: String,
}

impl Exam {
    /// Format exam for display using a template.
    ///
    /// Supported placeholders:
    /// - `{code}`, `{name}`, `{datetime}`
    /// - `{campus}`, `{classroom}`, `{instructor}`
    pub fn format(&self, template: &str) -> String {
        template
            .replace("{code}", &self.code)
            .replace("{name}", &self.name)
            .replace("{datetime}", &self.datetime)
            .replace("{campus}", &self.campus)
            .replace("{classroom}", &self.classroom)
            .replace("{instructor}", &self.instructor)
    }
}
