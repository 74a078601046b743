// src/services/exams.rs

//! Exam schedule parser.

use scraper::{ElementRef, Html};

use crate::error::Result;
use crate::models::Exam;
use crate::services::grades::{element_text, selector};

const ROW_SELECTOR: &str = "table.a4 tr";
const CELL_SELECTOR: &str = "td";

/// Parse the exam schedule document.
///
/// Expected columns: code, name, date/time, campus, classroom, instructor.
/// Header rows and rows with fewer cells are skipped.
pub fn parse_exams(html: &str) -> Result<Vec<Exam>> {
    let document = Html::parse_document(html);
    let row_sel = selector(ROW_SELECTOR)?;
    let cell_sel = selector(CELL_SELECTOR)?;

    let exams: Vec<Exam> = document
        .select(&row_sel)
        .filter_map(|row| {
            let cells: Vec<String> = row
                .select(&cell_sel)
                .map(|cell: ElementRef<'_>| element_text(&cell))
                .collect();
            if cells.len() < 6 || cells[0].is_empty() {
                return None;
            }
            Some(Exam {
                code: cells[0].clone(),
                name: cells[1].clone(),
                datetime: cells[2].clone(),
                campus: cells[3].clone(),
                classroom: cells[4].clone(),
                instructor: cells[5].clone(),
            })
        })
        .collect();

    log::debug!("Parsed {} exams", exams.len());
    Ok(exams)
}
